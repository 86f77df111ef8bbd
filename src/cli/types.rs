//! CLI type definitions
//!
//! Clap command structures defining the CLI interface.

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "plotweave")]
#[command(about = "Plotweave - 长篇小说创作助手", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to an explicit config file (defaults to .plotweave/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize Plotweave configuration and database
    Init {
        /// Force reinitialization even if already initialized
        #[arg(short, long)]
        force: bool,
    },

    /// Project management commands
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Model-assisted analysis over finished chapters
    #[command(subcommand)]
    Analyze(AnalyzeCommands),

    /// Consistency reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Validate chapter outlines of a volume against its boundaries
    Validate {
        /// Volume ID
        volume: Uuid,
    },

    /// Check whether the configured model has quota left
    Quota,
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project title
        title: String,

        /// Target scale: micro or million
        #[arg(short, long, default_value = "micro")]
        scale: String,

        /// Genres (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        genres: Vec<String>,
    },

    /// List all projects
    List,

    /// Show one project
    Show {
        /// Project ID
        id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum AnalyzeCommands {
    /// Analyze every chapter for character appearances, deaths, and
    /// relationships, and update the character sheets
    Chapters {
        /// Project ID
        project: Uuid,
    },

    /// Distill key points for volumes that lack them
    KeyPoints {
        /// Project ID
        project: Uuid,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Character roster with mortality status
    Characters {
        /// Project ID
        project: Uuid,
    },
}
