use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kind of a codex entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Character,
    Location,
    Item,
    Faction,
    Concept,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Item => "item",
            Self::Faction => "faction",
            Self::Concept => "concept",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "character" => Some(Self::Character),
            "location" => Some(Self::Location),
            "item" => Some(Self::Item),
            "faction" => Some(Self::Faction),
            "concept" => Some(Self::Concept),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Character => "角色",
            Self::Location => "地点",
            Self::Item => "物品",
            Self::Faction => "势力",
            Self::Concept => "概念",
        }
    }
}

/// A timestamped attribute observation. Attributes form an append-only log;
/// the latest record per key is the current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Zero-based chapter index the observation came from.
    pub chapter: usize,
    pub key: String,
    pub value: String,
}

/// A typed relation to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRelation {
    pub target_id: Uuid,
    pub relation: String,
    /// Chapter index the relation was first observed.
    pub since: usize,
}

/// One tracked entity: a character, place, item, faction, or concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodexEntity {
    pub id: Uuid,
    pub name: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub description: String,
    /// Chapter index of the first appearance.
    pub first_appearance: usize,
    /// Chapter indices the entity appeared in, sorted and deduplicated.
    #[serde(default)]
    pub appearances: Vec<usize>,
    #[serde(default)]
    pub attributes: Vec<AttributeRecord>,
    #[serde(default)]
    pub relations: Vec<EntityRelation>,
}

impl CodexEntity {
    pub fn new(name: impl Into<String>, entity_type: EntityType, first_appearance: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            entity_type,
            aliases: Vec::new(),
            description: String::new(),
            first_appearance,
            appearances: vec![first_appearance],
            attributes: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// True if `name` matches the entity name or any alias exactly.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Latest value per attribute key, in first-seen key order.
    pub fn latest_attributes(&self) -> Vec<(&str, &str, usize)> {
        let mut order: Vec<&str> = Vec::new();
        let mut latest: HashMap<&str, (&str, usize)> = HashMap::new();
        for record in &self.attributes {
            if !latest.contains_key(record.key.as_str()) {
                order.push(&record.key);
            }
            latest.insert(&record.key, (&record.value, record.chapter));
        }
        order
            .into_iter()
            .map(|key| {
                let (value, chapter) = latest[key];
                (key, value, chapter)
            })
            .collect()
    }

    /// Record an appearance keeping `appearances` sorted and unique.
    pub fn record_appearance(&mut self, chapter: usize) {
        if let Err(pos) = self.appearances.binary_search(&chapter) {
            self.appearances.insert(pos, chapter);
        }
    }
}

/// The entity registry for one project. `version` increases on every merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Codex {
    pub entities: Vec<CodexEntity>,
    pub last_updated: DateTime<Utc>,
    pub version: u64,
}

impl Codex {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            last_updated: Utc::now(),
            version: 1,
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CodexEntity> {
        self.entities.iter().find(|e| e.answers_to(name))
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut CodexEntity> {
        self.entities.iter_mut().find(|e| e.answers_to(name))
    }

    pub fn get(&self, id: Uuid) -> Option<&CodexEntity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

impl Default for Codex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_attribute_wins() {
        let mut entity = CodexEntity::new("林风", EntityType::Character, 0);
        entity.attributes.push(AttributeRecord {
            chapter: 1,
            key: "境界".to_string(),
            value: "炼气期".to_string(),
        });
        entity.attributes.push(AttributeRecord {
            chapter: 8,
            key: "境界".to_string(),
            value: "筑基期".to_string(),
        });
        let latest = entity.latest_attributes();
        assert_eq!(latest, vec![("境界", "筑基期", 8)]);
    }

    #[test]
    fn test_appearances_stay_sorted_unique() {
        let mut entity = CodexEntity::new("青云山", EntityType::Location, 3);
        entity.record_appearance(1);
        entity.record_appearance(3);
        entity.record_appearance(2);
        assert_eq!(entity.appearances, vec![1, 2, 3]);
    }

    #[test]
    fn test_answers_to_alias() {
        let entity =
            CodexEntity::new("林风", EntityType::Character, 0).with_aliases(vec!["风哥".to_string()]);
        assert!(entity.answers_to("风哥"));
        assert!(!entity.answers_to("林"));
    }
}
