//! Push Channel
//!
//! Client side of the gateway push channel: a reconnecting duplex
//! connection that carries JSON text frames about table calls and
//! reminders.

mod client;
mod frame;
mod transport;

pub use client::{PushConfig, PushHandle, PushStatus};
pub use frame::{PushFrame, CALL_TITLE, REMINDER_TITLE};
pub use transport::{Connector, Transport, WsConnector, WsStream};

use thiserror::Error;

/// Errors on the push channel
///
/// None of these reach users; they are logged and show up only as the
/// connection flag.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}
