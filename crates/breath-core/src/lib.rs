pub mod clock;
pub mod config;
pub mod cue;
pub mod error;
pub mod preferences;
pub mod session;
pub mod stats;
pub mod storage;

// Re-export common error type
pub use error::BreathError;
