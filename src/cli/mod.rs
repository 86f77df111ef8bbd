//! CLI surface: argument parsing, command handlers, and output helpers.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{AnalyzeCommands, Cli, Commands, ProjectCommands, ReportCommands};

/// Print an error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| err.to_string())
        );
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
