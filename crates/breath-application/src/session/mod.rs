//! Session application services.
//!
//! This module contains the save coordinator, the orchestrator that ties a
//! run to its collaborators, and the timer driver.

mod driver;
mod orchestrator;
mod saver;

pub use driver::{DriverOutcome, SessionDriver, UserAction};
pub use orchestrator::{
    Collaborators, SAVE_FAILED_MESSAGE, SAVE_RETRY_FAILED_MESSAGE, SAVE_SUCCEEDED_MESSAGE,
    SessionOrchestrator, SessionSummary,
};
pub use saver::SessionSaver;
