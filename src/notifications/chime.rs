//! Audible alert for incoming calls

use std::io::Write;
use thiserror::Error;

use crate::models::Notification;

#[derive(Error, Debug)]
pub enum ChimeError {
    #[error("Audio output failed: {0}")]
    Output(#[from] std::io::Error),

    #[error("No one is listening")]
    NoListeners,
}

/// Plays a sound for a notification. Failures are never fatal.
pub trait Chime: Send + Sync {
    fn play(&self, notification: &Notification) -> Result<(), ChimeError>;
}

/// Does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentChime;

impl Chime for SilentChime {
    fn play(&self, _notification: &Notification) -> Result<(), ChimeError> {
        Ok(())
    }
}

/// Rings the terminal bell on stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl Chime for TerminalBell {
    fn play(&self, _notification: &Notification) -> Result<(), ChimeError> {
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }
}
