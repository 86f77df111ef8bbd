use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much the story depends on the thread paying off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Minor,
    #[default]
    Major,
    Critical,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "minor" => Some(Self::Minor),
            "major" => Some(Self::Major),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Minor => "次要",
            Self::Major => "重要",
            Self::Critical => "关键",
        }
    }
}

/// Lifecycle of a plot thread. `Resolved` and `Abandoned` are terminal;
/// mutators on [`PlotThread`] refuse to move a thread out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    #[default]
    Active,
    /// At least one hint has been dropped since planting.
    Hinted,
    Resolved,
    Abandoned,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Hinted => "hinted",
            Self::Resolved => "resolved",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "hinted" => Some(Self::Hinted),
            "resolved" => Some(Self::Resolved),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Abandoned)
    }

    /// Threads still owed to the reader.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Active | Self::Hinted)
    }
}

/// Chapter window inside which the thread is expected to pay off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRange {
    pub min: usize,
    pub max: usize,
}

impl ResolutionRange {
    pub fn contains(&self, chapter: usize) -> bool {
        chapter >= self.min && chapter <= self.max
    }
}

/// A reinforcement of a planted thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotHint {
    pub chapter: usize,
    pub content: String,
}

/// Offset from the planting chapter to the earliest expected resolution.
pub const RESOLUTION_MIN_OFFSET: usize = 5;
/// Default horizon for threads detected from chapter analysis.
pub const DETECTED_RESOLUTION_HORIZON: usize = 30;
/// Default horizon for threads the author creates by hand.
pub const MANUAL_RESOLUTION_HORIZON: usize = 50;

/// A planted setup the story owes a payoff for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotThread {
    pub id: Uuid,
    pub description: String,
    /// Zero-based chapter index where the thread was planted.
    pub planted_chapter: usize,
    pub expected_resolution: ResolutionRange,
    pub status: ThreadStatus,
    pub resolved_chapter: Option<usize>,
    #[serde(default)]
    pub related_characters: Vec<String>,
    #[serde(default)]
    pub hints: Vec<PlotHint>,
    pub importance: Importance,
}

impl PlotThread {
    /// Create a thread with the manual-authoring horizon.
    pub fn new(description: impl Into<String>, planted_chapter: usize) -> Self {
        Self::with_horizon(description, planted_chapter, MANUAL_RESOLUTION_HORIZON)
    }

    /// Create a thread resolving within `horizon` chapters of planting.
    pub fn with_horizon(
        description: impl Into<String>,
        planted_chapter: usize,
        horizon: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            planted_chapter,
            expected_resolution: ResolutionRange {
                min: planted_chapter + RESOLUTION_MIN_OFFSET,
                max: planted_chapter + horizon,
            },
            status: ThreadStatus::Active,
            resolved_chapter: None,
            related_characters: Vec::new(),
            hints: Vec::new(),
            importance: Importance::default(),
        }
    }

    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_related_characters(mut self, characters: Vec<String>) -> Self {
        self.related_characters = characters;
        self
    }

    /// Append a hint and promote Active to Hinted. Returns false without
    /// mutating when the thread is already resolved or abandoned.
    pub fn add_hint(&mut self, chapter: usize, content: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.hints.push(PlotHint {
            chapter,
            content: content.into(),
        });
        self.status = ThreadStatus::Hinted;
        true
    }

    /// Mark the thread resolved at `chapter`. Returns false without
    /// mutating when the thread is already terminal.
    pub fn resolve(&mut self, chapter: usize) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = ThreadStatus::Resolved;
        self.resolved_chapter = Some(chapter);
        true
    }

    /// Abandon the thread. Returns false when already terminal.
    pub fn abandon(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = ThreadStatus::Abandoned;
        true
    }

    /// True if a hint landed within the last `window` chapters before
    /// `chapter` (exclusive of older hints).
    pub fn hinted_within(&self, chapter: usize, window: usize) -> bool {
        let floor = chapter.saturating_sub(window);
        self.hints.iter().any(|h| h.chapter > floor)
    }
}
