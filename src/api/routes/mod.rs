//! API Routes
//!
//! Route handlers organized by functionality.

pub mod auth;
pub mod devices;
pub mod gateways;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod overview;
pub mod reminders;
pub mod shops;
pub mod tables;
