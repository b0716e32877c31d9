//! Application layer for breath.
//!
//! This crate coordinates the pure session engine with persistence, timers
//! and the user-facing collaborators.

pub mod notification;
pub mod session;

pub use notification::{Navigator, Notification, NotificationLevel, UserNotifier};
pub use session::{
    Collaborators, DriverOutcome, SessionDriver, SessionOrchestrator, SessionSaver, UserAction,
};
