use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Narrative role of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CharacterRole {
    Protagonist,
    #[default]
    Supporting,
    Antagonist,
}

impl CharacterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protagonist => "protagonist",
            Self::Supporting => "supporting",
            Self::Antagonist => "antagonist",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "protagonist" => Some(Self::Protagonist),
            "supporting" => Some(Self::Supporting),
            "antagonist" => Some(Self::Antagonist),
            _ => None,
        }
    }

    /// Short label used in prompt blocks and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Protagonist => "主角",
            Self::Antagonist => "反派",
            Self::Supporting => "配角",
        }
    }
}

/// Life status of a character. `Deceased` is forward-only: once a character
/// dies, `death_chapter` records where, and later appearances are flagged by
/// the mortality guard rather than ever flipping the status back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifeStatus {
    #[default]
    Active,
    /// Planned but not yet introduced on the page.
    Pending,
    Deceased,
}

impl LifeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Deceased => "deceased",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "deceased" => Some(Self::Deceased),
            _ => None,
        }
    }
}

/// A directed relationship edge, by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub target_name: String,
    pub relation: String,
}

/// A character sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub role: CharacterRole,
    pub gender: String,
    pub age: String,
    /// One-line identity, e.g. "青云宗外门弟子".
    pub identity: String,
    pub description: String,
    /// Planned development arc.
    pub arc: String,
    pub status: LifeStatus,
    /// Chapter title where the character died, when status is Deceased.
    pub death_chapter: Option<String>,
    /// Chapter titles the character appeared in.
    #[serde(default)]
    pub appearances: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    pub fn new(project_id: Uuid, name: impl Into<String>, role: CharacterRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            role,
            gender: String::new(),
            age: String::new(),
            identity: String::new(),
            description: String::new(),
            arc: String::new(),
            status: LifeStatus::default(),
            death_chapter: None,
            appearances: Vec::new(),
            relationships: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_status(mut self, status: LifeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_relationships(mut self, relationships: Vec<Relationship>) -> Self {
        self.relationships = relationships;
        self
    }

    pub fn is_deceased(&self) -> bool {
        self.status == LifeStatus::Deceased
    }

    /// Mark the character dead at the given chapter. The first recorded
    /// death wins; later calls do not move the death chapter.
    pub fn mark_deceased(&mut self, chapter_title: impl Into<String>) {
        if self.status != LifeStatus::Deceased {
            self.status = LifeStatus::Deceased;
            self.death_chapter = Some(chapter_title.into());
            self.updated_at = Utc::now();
        }
    }

    /// Record an appearance, deduplicated by chapter title.
    pub fn record_appearance(&mut self, chapter_title: &str) {
        if !self.appearances.iter().any(|t| t == chapter_title) {
            self.appearances.push(chapter_title.to_string());
            self.updated_at = Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_death_wins() {
        let mut hero = Character::new(Uuid::new_v4(), "林风", CharacterRole::Protagonist);
        hero.mark_deceased("第十章");
        hero.mark_deceased("第十二章");
        assert!(hero.is_deceased());
        assert_eq!(hero.death_chapter.as_deref(), Some("第十章"));
    }

    #[test]
    fn test_appearance_dedup() {
        let mut npc = Character::new(Uuid::new_v4(), "王掌柜", CharacterRole::Supporting);
        npc.record_appearance("第三章");
        npc.record_appearance("第三章");
        npc.record_appearance("第五章");
        assert_eq!(npc.appearances, vec!["第三章", "第五章"]);
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(CharacterRole::Protagonist.label(), "主角");
        assert_eq!(CharacterRole::Antagonist.label(), "反派");
    }
}
