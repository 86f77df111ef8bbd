use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::DatabaseConnection;

const CONFIG_DIR: &str = ".plotweave";
const CONFIG_FILE: &str = ".plotweave/config.yaml";

/// Default config written by init. Commented keys document the env
/// override path (PLOTWEAVE_GENERATOR__API_KEY etc.).
const DEFAULT_CONFIG: &str = r#"# Plotweave configuration.
# Every key can be overridden with PLOTWEAVE_<SECTION>__<KEY> env vars,
# e.g. PLOTWEAVE_GENERATOR__API_KEY.
generator:
  # api_key: "your-gemini-api-key"
  model: gemini-3-flash-preview
  timeout_secs: 60
  batch_delay_ms: 500

database:
  path: .plotweave/plotweave.db

logging:
  level: info
  format: pretty
"#;

pub async fn execute(force: bool, json: bool) -> Result<()> {
    if Path::new(CONFIG_FILE).exists() && !force {
        bail!("{CONFIG_FILE} already exists (use --force to overwrite)");
    }

    std::fs::create_dir_all(CONFIG_DIR).context("failed to create config directory")?;
    std::fs::write(CONFIG_FILE, DEFAULT_CONFIG).context("failed to write config file")?;

    // Creates the database file and applies the schema.
    let config = ConfigLoader::load()?;
    DatabaseConnection::connect(&config.database).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "config": CONFIG_FILE,
                "database": config.database.path,
            })
        );
    } else {
        println!("Plotweave 已初始化");
        println!("  配置文件: {CONFIG_FILE}");
        println!("  数据库: {}", config.database.path);
        println!("  请在配置文件中填入 Gemini API Key，或设置 PLOTWEAVE_GENERATOR__API_KEY");
    }
    Ok(())
}
