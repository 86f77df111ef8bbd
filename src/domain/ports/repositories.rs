//! Keyed persistence ports for the four record types.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::{Chapter, Character, Project, Volume};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn insert(&self, project: &Project) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Project>>;
    async fn list(&self) -> Result<Vec<Project>>;
    async fn update(&self, project: &Project) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait VolumeRepository: Send + Sync {
    async fn insert(&self, volume: &Volume) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Volume>>;
    /// Volumes of a project ordered by `order`.
    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Volume>>;
    async fn update(&self, volume: &Volume) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ChapterRepository: Send + Sync {
    async fn insert(&self, chapter: &Chapter) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Chapter>>;
    /// Chapters of a volume ordered by `order`.
    async fn list_for_volume(&self, volume_id: Uuid) -> Result<Vec<Chapter>>;
    async fn update(&self, chapter: &Chapter) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait CharacterRepository: Send + Sync {
    async fn insert(&self, character: &Character) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Character>>;
    async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Character>>;
    async fn find_by_name(&self, project_id: Uuid, name: &str) -> Result<Option<Character>>;
    async fn update(&self, character: &Character) -> Result<()>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}
