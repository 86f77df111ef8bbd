//! Ports the infrastructure layer implements.

pub mod repositories;
pub mod text_generator;

pub use repositories::{
    ChapterRepository, CharacterRepository, ProjectRepository, VolumeRepository,
};
pub use text_generator::{GenerationRequest, QuotaStatus, TextGenerator, TextStream};
