//! Business logic. The heuristic services (matcher, mortality guard, plot
//! tracker, compressor, boundary validator, codex) are pure and synchronous;
//! [`analysis`] and [`drafting`] orchestrate calls through the text port.

pub mod analysis;
pub mod boundary;
pub mod codex_service;
pub mod compressor;
pub mod drafting;
pub mod lexicon;
pub mod matcher;
pub mod mortality;
pub mod plot_tracker;

pub use analysis::{AnalysisService, CharacterArchiveEntry};
pub use drafting::DraftingService;
pub use lexicon::Lexicon;
