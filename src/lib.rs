//! Plotweave: an authoring assistant for long-form Chinese webnovels.
//!
//! Layered layout:
//! - [`domain`]: models and ports, no IO
//! - [`services`]: consistency heuristics and prompt assembly, pure and sync
//! - [`infrastructure`]: Gemini client, SQLite store, config, logging
//! - [`cli`]: argument parsing and command handlers

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;
