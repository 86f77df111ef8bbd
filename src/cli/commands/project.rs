use anyhow::{anyhow, Context, Result};
use uuid::Uuid;

use crate::cli::output::format_project_table;
use crate::cli::ProjectCommands;
use crate::domain::models::{Project, Scale};
use crate::domain::ports::ProjectRepository;
use crate::infrastructure::database::ProjectRepositoryImpl;

pub async fn execute(command: ProjectCommands, config_path: Option<&str>, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let repo = ProjectRepositoryImpl::new(super::open_pool(&config).await?);

    match command {
        ProjectCommands::Create {
            title,
            scale,
            genres,
        } => {
            let scale = Scale::from_str(&scale)
                .ok_or_else(|| anyhow!("invalid scale '{scale}' (expected micro or million)"))?;
            let mut project = Project::new(title).with_scale(scale);
            project.genres = genres;
            repo.insert(&project).await.context("failed to create project")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else {
                println!("已创建项目《{}》", project.title);
                println!("  ID: {}", project.id);
            }
        }
        ProjectCommands::List => {
            let projects = repo.list().await.context("failed to list projects")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("暂无项目，使用 plotweave project create <标题> 创建");
            } else {
                println!("{}", format_project_table(&projects));
            }
        }
        ProjectCommands::Show { id } => {
            let project = get_project(&repo, id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&project)?);
            } else {
                println!("《{}》", project.title);
                println!("  ID: {}", project.id);
                println!("  规模: {}", project.scale.as_str());
                if !project.genres.is_empty() {
                    println!("  题材: {}", project.genres.join("、"));
                }
                if !project.summary.is_empty() {
                    println!("  简介: {}", project.summary);
                }
            }
        }
    }
    Ok(())
}

async fn get_project(repo: &ProjectRepositoryImpl, id: Uuid) -> Result<Project> {
    repo.get(id)
        .await
        .context("failed to load project")?
        .ok_or_else(|| anyhow!("project {id} not found"))
}
