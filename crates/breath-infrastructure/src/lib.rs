pub mod config_service;
pub mod file_store;
pub mod kv_session_repository;
pub mod memory_store;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::file_store::FileStore;
pub use crate::kv_session_repository::KvSessionRepository;
pub use crate::memory_store::MemoryStore;
pub use crate::paths::BreathPaths;
