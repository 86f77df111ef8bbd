//! Pure domain data types.

pub mod character;
pub mod codex;
pub mod config;
pub mod extraction;
pub mod memory;
pub mod plot;
pub mod project;

pub use character::{Character, CharacterRole, LifeStatus, Relationship};
pub use codex::{AttributeRecord, Codex, CodexEntity, EntityRelation, EntityType};
pub use config::{
    Config, DatabaseConfig, GeneratorConfig, HeuristicsConfig, LoggingConfig, RateLimitConfig,
    RetryConfig,
};
pub use extraction::{
    decode_lenient, AttributeChange, ChapterCharacterAnalysis, DetectedHint, DetectedThread,
    EntityExtraction, EntityUpdate, ExtractedEntity, ExtractedRelation, KeyPointsPayload,
    ObservedDeath, PlotDetection, TitleSuggestions,
};
pub use memory::{
    emotional_trend, suggest_next_emotion, ActiveConflict, ChapterDigest, CharacterState,
    ConflictPhase, CoreMemory, EmotionAdvice, EmotionPoint, EmotionalTrend, FactionRelation,
    FactionStance, LayeredMemory, RecentMemory, Urgency, WorldState,
};
pub use plot::{
    Importance, PlotHint, PlotThread, ResolutionRange, ThreadStatus, DETECTED_RESOLUTION_HORIZON,
    MANUAL_RESOLUTION_HORIZON, RESOLUTION_MIN_OFFSET,
};
pub use project::{Chapter, Project, Scale, Volume};
