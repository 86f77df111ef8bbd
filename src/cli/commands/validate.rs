use anyhow::{anyhow, Result};
use uuid::Uuid;

use crate::domain::models::Chapter;
use crate::domain::ports::{ChapterRepository, VolumeRepository};
use crate::infrastructure::database::{ChapterRepositoryImpl, VolumeRepositoryImpl};
use crate::services::boundary::{
    build_volume_boundary, format_validation_result, validate, ChapterDraft,
};
use crate::services::Lexicon;

/// Validate every chapter outline of a volume against the boundaries
/// derived from its neighbor volumes.
pub async fn execute(volume_id: Uuid, config_path: Option<&str>, json: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let pool = super::open_pool(&config).await?;
    let volumes = VolumeRepositoryImpl::new(pool.clone());
    let chapters = ChapterRepositoryImpl::new(pool.clone());
    let lexicon = Lexicon::default();

    let volume = volumes
        .get(volume_id)
        .await?
        .ok_or_else(|| anyhow!("volume {volume_id} not found"))?;
    let siblings = volumes.list_for_project(volume.project_id).await?;
    let index = siblings
        .iter()
        .position(|v| v.id == volume.id)
        .ok_or_else(|| anyhow!("volume is not listed under its project"))?;
    let previous = index.checked_sub(1).and_then(|i| siblings.get(i));
    let next = siblings.get(index + 1);

    let boundary = build_volume_boundary(&volume, index, previous, next, &lexicon);

    let drafts = to_drafts(chapters.list_for_volume(volume.id).await?);
    if drafts.is_empty() {
        return Err(anyhow!("volume《{}》has no chapters to validate", volume.title));
    }
    let previous_drafts = match previous {
        Some(prev) => to_drafts(chapters.list_for_volume(prev.id).await?),
        None => Vec::new(),
    };

    let result = validate(
        &drafts,
        &boundary,
        &[],
        &previous_drafts,
        &config.heuristics,
        &lexicon,
    );

    if json {
        println!(
            "{}",
            serde_json::json!({
                "volume": volume.title,
                "is_valid": result.is_valid,
                "errors": result.errors.iter().map(|e| &e.description).collect::<Vec<_>>(),
                "warnings": result.warnings.iter().map(|w| &w.description).collect::<Vec<_>>(),
            })
        );
    } else {
        println!("《{}》边界校验", volume.title);
        print!("{}", format_validation_result(&result));
    }

    if !result.is_valid {
        std::process::exit(1);
    }
    Ok(())
}

fn to_drafts(chapters: Vec<Chapter>) -> Vec<ChapterDraft> {
    chapters
        .into_iter()
        .enumerate()
        .map(|(i, chapter)| ChapterDraft {
            number: i + 1,
            title: chapter.title,
            outline: chapter.outline,
        })
        .collect()
}
