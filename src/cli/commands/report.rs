use anyhow::{anyhow, Result};
use uuid::Uuid;

use crate::cli::output::format_character_table;
use crate::cli::ReportCommands;
use crate::domain::ports::{CharacterRepository, ProjectRepository};
use crate::infrastructure::database::{CharacterRepositoryImpl, ProjectRepositoryImpl};
use crate::services::mortality;

pub async fn execute(command: ReportCommands, config_path: Option<&str>, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let pool = super::open_pool(&config).await?;

    match command {
        ReportCommands::Characters { project } => {
            characters_report(&pool, project, json).await
        }
    }
}

async fn characters_report(pool: &sqlx::SqlitePool, project_id: Uuid, json: bool) -> Result<()> {
    let projects = ProjectRepositoryImpl::new(pool.clone());
    let repo = CharacterRepositoryImpl::new(pool.clone());

    let project = projects
        .get(project_id)
        .await?
        .ok_or_else(|| anyhow!("project {project_id} not found"))?;
    let characters = repo.list_for_project(project_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&characters)?);
        return Ok(());
    }

    println!("《{}》角色档案", project.title);
    if characters.is_empty() {
        println!("暂无角色");
        return Ok(());
    }
    println!("{}", format_character_table(&characters));

    let deceased = mortality::deceased(&characters);
    if !deceased.is_empty() {
        println!(
            "已故角色 {} 名，撰写后续章节时将自动注入禁止出场约束",
            deceased.len()
        );
    }
    Ok(())
}
