use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Target length of the finished work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    /// Short-form serial, tens of chapters.
    #[default]
    Micro,
    /// Million-character web serial.
    Million,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Micro => "micro",
            Self::Million => "million",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "micro" => Some(Self::Micro),
            "million" => Some(Self::Million),
            _ => None,
        }
    }
}

/// A novel project: premise, constraints, and world setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    /// The seed idea the author started from.
    pub inspiration: String,
    /// Hard constraints the author imposed (tone, taboos, required beats).
    pub constraints: String,
    pub scale: Scale,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub world_setting: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            inspiration: String::new(),
            constraints: String::new(),
            scale: Scale::default(),
            genres: Vec::new(),
            styles: Vec::new(),
            world_setting: String::new(),
            summary: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_world_setting(mut self, world_setting: impl Into<String>) -> Self {
        self.world_setting = world_setting.into();
        self
    }
}

/// A volume (arc) of a project. `order` is the zero-based position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub summary: String,
    pub order: i64,
    /// Author-curated highlights, one short line each.
    #[serde(default)]
    pub key_points: Vec<String>,
    /// The central storyline of the volume, used for boundary derivation.
    #[serde(default)]
    pub main_plot: Option<String>,
    /// Events that must be completed inside this volume.
    #[serde(default)]
    pub key_events: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Volume {
    pub fn new(project_id: Uuid, title: impl Into<String>, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.into(),
            summary: String::new(),
            order,
            key_points: Vec::new(),
            main_plot: None,
            key_events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_key_points(mut self, key_points: Vec<String>) -> Self {
        self.key_points = key_points;
        self
    }

    pub fn with_key_events(mut self, key_events: Vec<String>) -> Self {
        self.key_events = key_events;
        self
    }

    pub fn with_main_plot(mut self, main_plot: impl Into<String>) -> Self {
        self.main_plot = Some(main_plot.into());
        self
    }
}

/// A chapter inside a volume. `outline` is the per-chapter plan, `content`
/// the prose. `word_count` counts chars, not whitespace-separated words,
/// since the primary script is CJK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: Uuid,
    pub volume_id: Uuid,
    pub title: String,
    pub outline: String,
    pub content: String,
    pub word_count: i64,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    pub fn new(volume_id: Uuid, title: impl Into<String>, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            volume_id,
            title: title.into(),
            outline: String::new(),
            content: String::new(),
            word_count: 0,
            order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_outline(mut self, outline: impl Into<String>) -> Self {
        self.outline = outline.into();
        self
    }

    /// Replace the prose and recompute the char count.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.word_count = self.content.chars().count() as i64;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_round_trip() {
        assert_eq!(Scale::from_str("micro"), Some(Scale::Micro));
        assert_eq!(Scale::from_str("million"), Some(Scale::Million));
        assert_eq!(Scale::from_str("epic"), None);
        assert_eq!(Scale::Million.as_str(), "million");
    }

    #[test]
    fn test_chapter_word_count_uses_chars() {
        let mut chapter = Chapter::new(Uuid::new_v4(), "第一章", 0);
        chapter.set_content("林风走进了山门。");
        assert_eq!(chapter.word_count, 8);
    }

    #[test]
    fn test_volume_builder() {
        let volume = Volume::new(Uuid::new_v4(), "初入宗门", 0)
            .with_summary("少年入门，初露锋芒")
            .with_key_points(vec!["拜师".to_string(), "夺魁".to_string()]);
        assert_eq!(volume.key_points.len(), 2);
        assert!(volume.key_events.is_empty());
    }
}
