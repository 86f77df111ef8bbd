//! Adapters for the outside world: Gemini API, configuration sources,
//! `SQLite` persistence, and logging.

pub mod config;
pub mod database;
pub mod gemini;
pub mod logging;
