//! Preferences domain module.
//!
//! # Module Structure
//!
//! - `model`: The `UserPreferences` value object and its validation
//! - `preset`: Built-in session presets
//!
//! # Usage
//!
//! ```ignore
//! use breath_core::preferences::{UserPreferences, SessionPreset};
//! ```

mod model;
mod preset;

// Re-export public API
pub use model::UserPreferences;
pub use preset::SessionPreset;
