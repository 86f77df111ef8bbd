//! Entity registry maintenance: merging extraction results, searching, and
//! flagging dead characters that resurface.

use chrono::Utc;
use std::fmt::Write as _;
use tracing::debug;

use crate::domain::models::{
    AttributeRecord, Codex, CodexEntity, EntityExtraction, EntityRelation, EntityType,
};

/// Attribute key that tracks life status in the codex.
const STATUS_KEY: &str = "状态";
/// Attribute value that marks an entity as dead.
const DEAD_VALUE: &str = "死亡";

/// A deceased entity showing up after its death chapter.
#[derive(Debug, Clone)]
pub struct EntityConflict {
    pub entity_name: String,
    pub death_chapter: usize,
    pub issue: String,
    pub suggestion: String,
}

/// Resolve a free-form type string from the model to an [`EntityType`],
/// defaulting to Concept for anything unrecognized.
fn resolve_entity_type(raw: &str) -> EntityType {
    EntityType::from_str(raw.trim()).unwrap_or(EntityType::Concept)
}

/// Merge one chapter's extraction payload into the codex.
///
/// The merge is idempotent for repeated identical input: existing names are
/// never duplicated, appearances are a set union, attribute records are
/// skipped when the latest value for the key already matches, and relations
/// are deduplicated by (target, relation). The version counter bumps on
/// every call.
pub fn merge_extraction(codex: &mut Codex, extraction: &EntityExtraction, chapter_index: usize) {
    for new_entity in &extraction.new_entities {
        if new_entity.name.is_empty() {
            continue;
        }
        if let Some(existing) = codex.find_by_name_mut(&new_entity.name) {
            existing.record_appearance(chapter_index);
            continue;
        }
        let entity = CodexEntity::new(
            new_entity.name.clone(),
            resolve_entity_type(&new_entity.entity_type),
            chapter_index,
        )
        .with_aliases(new_entity.aliases.clone())
        .with_description(new_entity.description.clone());
        debug!(name = %entity.name, entity_type = entity.entity_type.as_str(), "codex entity added");
        codex.entities.push(entity);
    }

    for update in &extraction.entity_updates {
        let Some(entity) = codex.find_by_name_mut(&update.name) else {
            continue;
        };
        entity.record_appearance(chapter_index);
        for change in &update.attribute_changes {
            let already_current = entity
                .latest_attributes()
                .iter()
                .any(|(key, value, _)| *key == change.key && *value == change.value);
            if !already_current {
                entity.attributes.push(AttributeRecord {
                    chapter: chapter_index,
                    key: change.key.clone(),
                    value: change.value.clone(),
                });
            }
        }
    }

    for relation in &extraction.new_relations {
        let Some(target_id) = codex.find_by_name(&relation.target).map(|e| e.id) else {
            continue;
        };
        let Some(source) = codex.find_by_name_mut(&relation.source) else {
            continue;
        };
        let duplicate = source
            .relations
            .iter()
            .any(|r| r.target_id == target_id && r.relation == relation.relation);
        if !duplicate && source.id != target_id {
            source.relations.push(EntityRelation {
                target_id,
                relation: relation.relation.clone(),
                since: chapter_index,
            });
        }
    }

    codex.version += 1;
    codex.last_updated = Utc::now();
}

/// Case-insensitive substring search over name, aliases, and description.
pub fn search_entities<'a>(
    codex: &'a Codex,
    query: &str,
    entity_type: Option<EntityType>,
) -> Vec<&'a CodexEntity> {
    let needle = query.to_lowercase();
    codex
        .entities
        .iter()
        .filter(|e| entity_type.map_or(true, |t| e.entity_type == t))
        .filter(|e| {
            e.name.to_lowercase().contains(&needle)
                || e.aliases.iter().any(|a| a.to_lowercase().contains(&needle))
                || e.description.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Chapter index a character entity died in, per its attribute log.
fn death_chapter(entity: &CodexEntity) -> Option<usize> {
    entity
        .latest_attributes()
        .iter()
        .find(|(key, value, _)| *key == STATUS_KEY && *value == DEAD_VALUE)
        .map(|(_, _, chapter)| *chapter)
}

/// Flag dead character entities that appear in `chapter_content` after
/// their recorded death chapter. Advisory only.
pub fn detect_conflicts(
    codex: &Codex,
    chapter_content: &str,
    chapter_index: usize,
) -> Vec<EntityConflict> {
    let mut conflicts = Vec::new();
    for entity in &codex.entities {
        if entity.entity_type != EntityType::Character {
            continue;
        }
        let Some(died_at) = death_chapter(entity) else {
            continue;
        };
        if chapter_index <= died_at {
            continue;
        }
        let mentioned = chapter_content.contains(entity.name.as_str())
            || entity
                .aliases
                .iter()
                .any(|a| !a.is_empty() && chapter_content.contains(a.as_str()));
        if mentioned {
            conflicts.push(EntityConflict {
                entity_name: entity.name.clone(),
                death_chapter: died_at,
                issue: format!(
                    "角色\"{}\"已在第{}章死亡，但在本章内容中出现",
                    entity.name,
                    died_at + 1
                ),
                suggestion: "请检查是否为回忆场景，如是正文出场则需要修改".to_string(),
            });
        }
    }
    conflicts
}

/// Entities whose appearance log includes the chapter.
pub fn entities_in_chapter(codex: &Codex, chapter_index: usize) -> Vec<&CodexEntity> {
    codex
        .entities
        .iter()
        .filter(|e| e.appearances.binary_search(&chapter_index).is_ok())
        .collect()
}

/// Prompt fragment describing one entity's current state.
pub fn entity_brief(entity: &CodexEntity) -> String {
    let mut brief = format!("{}（{}）", entity.name, entity.entity_type.label());
    if !entity.aliases.is_empty() {
        let _ = write!(brief, " 别名：{}", entity.aliases.join("、"));
    }
    if !entity.description.is_empty() {
        let _ = write!(brief, "：{}", entity.description);
    }
    for (key, value, _) in entity.latest_attributes() {
        let _ = write!(brief, "；{key}：{value}");
    }
    brief
}

/// Markdown report of the whole codex, grouped by entity type.
pub fn codex_report(codex: &Codex) -> String {
    let mut report = String::from("# 设定集\n\n");
    let _ = writeln!(
        report,
        "共{}个条目，版本 {}\n",
        codex.entities.len(),
        codex.version
    );
    for entity_type in [
        EntityType::Character,
        EntityType::Location,
        EntityType::Item,
        EntityType::Faction,
        EntityType::Concept,
    ] {
        let entries: Vec<&CodexEntity> = codex
            .entities
            .iter()
            .filter(|e| e.entity_type == entity_type)
            .collect();
        if entries.is_empty() {
            continue;
        }
        let _ = writeln!(report, "## {}（{}）\n", entity_type.label(), entries.len());
        for entity in entries {
            let _ = writeln!(
                report,
                "- {}（首次出场：第{}章，出场{}次）",
                entity_brief(entity),
                entity.first_appearance + 1,
                entity.appearances.len()
            );
        }
        report.push('\n');
    }
    report
}
