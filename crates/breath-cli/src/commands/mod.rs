pub mod clear;
pub mod diagnostics;
pub mod history;
pub mod prefs;
pub mod session;
pub mod utils;
