//! User-facing notifications and navigation.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// A dismissible message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Whether the message offers a retry action.
    pub retry: bool,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            retry: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            retry: false,
        }
    }

    /// An error message with a retry action attached.
    pub fn retryable_error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            retry: true,
        }
    }
}

/// Shows notifications to the user.
pub trait UserNotifier: Send + Sync {
    fn show(&self, notification: Notification);
}

/// Leaves the current screen.
pub trait Navigator: Send + Sync {
    fn go_back(&self);
}
