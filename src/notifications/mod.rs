//! Notifications
//!
//! Application-owned list of dashboard notifications, fed by the push
//! channel and by staff actions such as sending a reminder.

mod chime;
mod store;

pub use chime::{Chime, ChimeError, SilentChime, TerminalBell};
pub use store::{NotificationEvent, NotificationStore};
