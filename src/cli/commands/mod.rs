//! CLI command implementations.

pub mod analyze;
pub mod init;
pub mod project;
pub mod quota;
pub mod report;
pub mod validate;

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::domain::models::Config;
use crate::domain::ports::TextGenerator;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::gemini::GeminiClient;

pub(crate) fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

pub(crate) async fn open_pool(config: &Config) -> Result<SqlitePool> {
    Ok(DatabaseConnection::connect(&config.database).await?.pool())
}

pub(crate) fn build_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let client = GeminiClient::new(&config.generator, &config.retry, &config.rate_limit)?;
    Ok(Arc::new(client))
}
