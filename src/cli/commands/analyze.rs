use anyhow::{anyhow, Context, Result};
use uuid::Uuid;

use crate::cli::output::create_progress_bar;
use crate::cli::AnalyzeCommands;
use crate::domain::models::{Character, CharacterRole, Relationship};
use crate::domain::ports::{
    ChapterRepository, CharacterRepository, ProjectRepository, VolumeRepository,
};
use crate::infrastructure::database::{
    ChapterRepositoryImpl, CharacterRepositoryImpl, ProjectRepositoryImpl, VolumeRepositoryImpl,
};
use crate::services::analysis::{merge_character_analyses, CharacterArchiveEntry};
use crate::services::AnalysisService;

pub async fn execute(command: AnalyzeCommands, config_path: Option<&str>, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let pool = super::open_pool(&config).await?;
    let generator = super::build_generator(&config)?;
    let service = AnalysisService::new(generator, config.generator.clone());

    match command {
        AnalyzeCommands::Chapters { project } => {
            analyze_chapters(&service, &pool, project, json).await
        }
        AnalyzeCommands::KeyPoints { project } => {
            extract_key_points(&service, &pool, project, json).await
        }
    }
}

async fn analyze_chapters(
    service: &AnalysisService,
    pool: &sqlx::SqlitePool,
    project_id: Uuid,
    json: bool,
) -> Result<()> {
    let projects = ProjectRepositoryImpl::new(pool.clone());
    let volumes = VolumeRepositoryImpl::new(pool.clone());
    let chapters = ChapterRepositoryImpl::new(pool.clone());
    let characters = CharacterRepositoryImpl::new(pool.clone());

    projects
        .get(project_id)
        .await?
        .ok_or_else(|| anyhow!("project {project_id} not found"))?;

    let mut written: Vec<(String, String)> = Vec::new();
    for volume in volumes.list_for_project(project_id).await? {
        for chapter in chapters.list_for_volume(volume.id).await? {
            if !chapter.content.is_empty() {
                written.push((chapter.title, chapter.content));
            }
        }
    }
    if written.is_empty() {
        return Err(anyhow!("project has no written chapters to analyze"));
    }

    let pb = create_progress_bar(written.len() as u64);
    pb.set_message("分析章节");
    let analyses = service
        .analyze_all_chapters(&written, |done, _total| pb.set_position(done as u64))
        .await
        .context("chapter analysis failed")?;
    pb.finish_with_message("分析完成");

    let titles: Vec<String> = written.into_iter().map(|(title, _)| title).collect();
    let archive = merge_character_analyses(&titles, &analyses);
    let (updated, created) = apply_archive(&characters, project_id, &archive).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "chapters_analyzed": titles.len(),
                "characters_updated": updated,
                "characters_created": created,
            })
        );
    } else {
        println!(
            "已分析{}章：更新{}个角色档案，新建{}个",
            titles.len(),
            updated,
            created
        );
    }
    Ok(())
}

/// Fold the archive into the character sheets. Unknown names become new
/// supporting characters; deaths follow the first-death-wins rule on the
/// character model.
async fn apply_archive(
    characters: &CharacterRepositoryImpl,
    project_id: Uuid,
    archive: &[CharacterArchiveEntry],
) -> Result<(usize, usize)> {
    let mut updated = 0usize;
    let mut created = 0usize;

    for entry in archive {
        match characters.find_by_name(project_id, &entry.name).await? {
            Some(mut character) => {
                merge_entry(&mut character, entry);
                characters.update(&character).await?;
                updated += 1;
            }
            None => {
                let mut character =
                    Character::new(project_id, entry.name.clone(), CharacterRole::Supporting);
                merge_entry(&mut character, entry);
                characters.insert(&character).await?;
                created += 1;
            }
        }
    }
    Ok((updated, created))
}

fn merge_entry(character: &mut Character, entry: &CharacterArchiveEntry) {
    for title in &entry.appearances {
        character.record_appearance(title);
    }
    if let Some((chapter, _cause)) = &entry.death {
        character.mark_deceased(chapter.clone());
    }
    for (target, relation) in &entry.relationships {
        if !character
            .relationships
            .iter()
            .any(|r| &r.target_name == target)
        {
            character.relationships.push(Relationship {
                target_name: target.clone(),
                relation: relation.clone(),
            });
        }
    }
}

async fn extract_key_points(
    service: &AnalysisService,
    pool: &sqlx::SqlitePool,
    project_id: Uuid,
    json: bool,
) -> Result<()> {
    let repo = VolumeRepositoryImpl::new(pool.clone());
    let mut volumes = repo.list_for_project(project_id).await?;
    if volumes.is_empty() {
        return Err(anyhow!("project {project_id} has no volumes"));
    }

    let pb = create_progress_bar(volumes.len() as u64);
    pb.set_message("提炼关键点");
    service
        .extract_all_volume_key_points(&mut volumes, |done, _total| {
            pb.set_position(done as u64);
        })
        .await
        .context("key point extraction failed")?;
    pb.finish_with_message("提炼完成");

    let mut filled = 0usize;
    for volume in &volumes {
        if !volume.key_points.is_empty() {
            repo.update(volume).await?;
            filled += 1;
        }
    }

    if json {
        println!(
            "{}",
            serde_json::json!({ "volumes": volumes.len(), "with_key_points": filled })
        );
    } else {
        println!("{}卷中{}卷已有关键点", volumes.len(), filled);
        for (index, volume) in volumes.iter().enumerate() {
            println!(
                "  第{}卷《{}》: {}",
                index + 1,
                volume.title,
                volume.key_points.join("、")
            );
        }
    }
    Ok(())
}
