//! Layered memory for long-running drafting sessions.
//!
//! Three tiers with different update cadences: core memory (set once, rarely
//! touched), world state (updated as chapters land), and recent memory (a
//! sliding window over the last few chapters).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facts about the world that almost never change mid-story.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreMemory {
    pub world_rules: Vec<String>,
    pub power_system: String,
    pub main_conflict: String,
    pub key_locations: Vec<String>,
    pub factions: Vec<String>,
}

/// Where a character currently stands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterState {
    pub character_id: String,
    pub name: String,
    pub is_alive: bool,
    pub death_chapter: Option<usize>,
    pub death_cause: Option<String>,
    pub current_power: String,
    pub current_location: String,
    pub current_mood: String,
    #[serde(default)]
    pub recent_events: Vec<String>,
}

/// Stance between two factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionStance {
    Ally,
    Neutral,
    Hostile,
    War,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionRelation {
    pub faction_a: String,
    pub faction_b: String,
    pub stance: FactionStance,
    pub description: String,
    /// Chapter index where the stance last changed.
    pub changed_at: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPhase {
    Ongoing,
    Escalating,
    Resolving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveConflict {
    pub id: String,
    pub description: String,
    pub participants: Vec<String>,
    pub start_chapter: usize,
    pub phase: ConflictPhase,
    pub urgency: Urgency,
}

/// Mutable world snapshot, refreshed as chapters are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldState {
    #[serde(default)]
    pub character_states: Vec<CharacterState>,
    #[serde(default)]
    pub faction_relations: Vec<FactionRelation>,
    #[serde(default)]
    pub active_conflicts: Vec<ActiveConflict>,
    #[serde(default)]
    pub unresolved_plots: Vec<String>,
    pub last_updated_chapter: usize,
}

/// Digest of a single finished chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterDigest {
    pub chapter_index: usize,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub key_events: Vec<String>,
    #[serde(default)]
    pub characters_appeared: Vec<String>,
    pub emotional_tone: String,
    pub has_major_turn: bool,
}

/// One sample of the emotional curve. `intensity` and `tension` run 0..=10,
/// `hope` runs -10..=10.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmotionPoint {
    pub chapter: usize,
    pub intensity: i8,
    pub tension: i8,
    pub hope: i8,
}

/// Sliding window over the latest chapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentMemory {
    #[serde(default)]
    pub last_chapters: Vec<ChapterDigest>,
    #[serde(default)]
    pub recent_events: Vec<String>,
    #[serde(default)]
    pub emotional_arc: Vec<EmotionPoint>,
}

/// The full layered memory for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeredMemory {
    pub core: CoreMemory,
    pub world_state: WorldState,
    pub recent: RecentMemory,
    pub version: u64,
    pub last_updated: DateTime<Utc>,
}

impl LayeredMemory {
    pub fn new() -> Self {
        Self {
            core: CoreMemory::default(),
            world_state: WorldState::default(),
            recent: RecentMemory::default(),
            version: 1,
            last_updated: Utc::now(),
        }
    }
}

impl Default for LayeredMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction of the emotional curve over the last few chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTrend {
    Rising,
    Falling,
    Fluctuating,
    Stable,
}

/// Classify the intensity trend over the last five samples. Fewer than three
/// samples reads as stable.
pub fn emotional_trend(arc: &[EmotionPoint]) -> EmotionalTrend {
    if arc.len() < 3 {
        return EmotionalTrend::Stable;
    }
    let window = &arc[arc.len().saturating_sub(5)..];
    let mut rises = 0usize;
    let mut falls = 0usize;
    for pair in window.windows(2) {
        let diff = i32::from(pair[1].intensity) - i32::from(pair[0].intensity);
        if diff > 1 {
            rises += 1;
        } else if diff < -1 {
            falls += 1;
        }
    }
    if rises > falls + 1 {
        EmotionalTrend::Rising
    } else if falls > rises + 1 {
        EmotionalTrend::Falling
    } else if rises > 0 && falls > 0 {
        EmotionalTrend::Fluctuating
    } else {
        EmotionalTrend::Stable
    }
}

/// Pacing advice derived from the recent emotional curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionAdvice {
    pub target_intensity: i8,
    pub target_tension: i8,
    pub reason: String,
}

/// Suggest where the next chapter's emotion should land, or None when the
/// curve needs no correction. Looks at the last three samples.
pub fn suggest_next_emotion(arc: &[EmotionPoint]) -> Option<EmotionAdvice> {
    if arc.len() < 3 {
        return None;
    }
    let recent = &arc[arc.len() - 3..];

    if recent.iter().all(|p| p.intensity > 7) {
        return Some(EmotionAdvice {
            target_intensity: 4,
            target_tension: 3,
            reason: "连续高强度章节，读者需要喘息，建议安排过渡或日常章节".to_string(),
        });
    }
    if recent.iter().all(|p| p.intensity < 4) {
        return Some(EmotionAdvice {
            target_intensity: 7,
            target_tension: 6,
            reason: "情绪过于平缓，建议引入冲突或转折提升张力".to_string(),
        });
    }
    if recent.iter().all(|p| p.tension > 7) {
        return Some(EmotionAdvice {
            target_intensity: 5,
            target_tension: 3,
            reason: "紧张感持续过久，建议适度释放，给出阶段性结果".to_string(),
        });
    }
    if recent.iter().all(|p| p.hope < -3) {
        return Some(EmotionAdvice {
            target_intensity: 6,
            target_tension: 5,
            reason: "绝望情绪持续过久，建议给出一线希望".to_string(),
        });
    }
    None
}
