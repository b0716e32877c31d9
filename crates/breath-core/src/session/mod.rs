//! Session domain module.
//!
//! This module contains the session models, the phase state machine and the
//! repository interface.
//!
//! # Module Structure
//!
//! - `model`: `SessionRecord`, `SessionPhase`, `SessionPhaseState`, `SaveStatus`
//! - `engine`: The pure `PhaseEngine`
//! - `repository`: Repository trait for preferences and session history
//!
//! # Usage
//!
//! ```ignore
//! use breath_core::session::{PhaseEngine, SessionPhase, SessionRecord, SessionRepository};
//! ```

mod engine;
mod model;
mod repository;

// Re-export public API
pub use engine::PhaseEngine;
pub use model::{PhaseTransition, SaveStatus, SessionPhase, SessionPhaseState, SessionRecord};
pub use repository::{SessionRepository, StorageDiagnostics};
