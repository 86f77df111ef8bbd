//! Output helpers for the CLI: progress bars and tables.

use std::time::Duration;

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::models::{Character, Project};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg} ({eta})";
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// Progress bar for sequential batch analysis.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(PROGRESS_CHARS),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner for indeterminate operations (single model calls, probes).
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn format_project_table(projects: &[Project]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("ID").add_attribute(Attribute::Bold),
        Cell::new("标题").add_attribute(Attribute::Bold),
        Cell::new("规模").add_attribute(Attribute::Bold),
        Cell::new("题材").add_attribute(Attribute::Bold),
        Cell::new("创建时间").add_attribute(Attribute::Bold),
    ]);
    for project in projects {
        table.add_row(vec![
            project.id.to_string()[..8].to_string(),
            project.title.clone(),
            project.scale.as_str().to_string(),
            project.genres.join("、"),
            project.created_at.format("%Y-%m-%d").to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_character_table(characters: &[Character]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("姓名").add_attribute(Attribute::Bold),
        Cell::new("定位").add_attribute(Attribute::Bold),
        Cell::new("身份").add_attribute(Attribute::Bold),
        Cell::new("状态").add_attribute(Attribute::Bold),
        Cell::new("出场").add_attribute(Attribute::Bold),
    ]);
    for character in characters {
        let status = if character.is_deceased() {
            format!(
                "已故（{}）",
                character.death_chapter.as_deref().unwrap_or("未知章节")
            )
        } else {
            "存活".to_string()
        };
        table.add_row(vec![
            character.name.clone(),
            character.role.label().to_string(),
            character.identity.clone(),
            status,
            format!("{}章", character.appearances.len()),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CharacterRole;
    use uuid::Uuid;

    #[test]
    fn test_character_table_marks_deceased() {
        let mut dead = Character::new(Uuid::new_v4(), "赵虎", CharacterRole::Supporting);
        dead.mark_deceased("第十章");
        let table = format_character_table(&[dead]);
        assert!(table.contains("已故（第十章）"));
    }
}
