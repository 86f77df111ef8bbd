use clap::Parser;

use plotweave::cli::{commands, handle_error, Cli, Commands};
use plotweave::domain::models::LoggingConfig;
use plotweave::infrastructure::config::ConfigLoader;
use plotweave::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Before `init` has run there is no config file; log with defaults so
    // the init command itself stays observable.
    let logging_config = load_logging_config(cli.config.as_deref());
    if let Err(err) = logging::init(&logging_config) {
        handle_error(err, cli.json);
    }

    let result = match cli.command {
        Commands::Init { force } => commands::init::execute(force, cli.json).await,
        Commands::Project(cmd) => {
            commands::project::execute(cmd, cli.config.as_deref(), cli.json).await
        }
        Commands::Analyze(cmd) => {
            commands::analyze::execute(cmd, cli.config.as_deref(), cli.json).await
        }
        Commands::Report(cmd) => {
            commands::report::execute(cmd, cli.config.as_deref(), cli.json).await
        }
        Commands::Validate { volume } => {
            commands::validate::execute(volume, cli.config.as_deref(), cli.json).await
        }
        Commands::Quota => commands::quota::execute(cli.config.as_deref(), cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}

fn load_logging_config(path: Option<&str>) -> LoggingConfig {
    let loaded = match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    loaded.map(|config| config.logging).unwrap_or_default()
}
