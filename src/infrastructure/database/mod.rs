pub mod chapter_repo;
pub mod character_repo;
pub mod connection;
pub mod errors;
pub mod project_repo;
pub mod volume_repo;

pub use chapter_repo::ChapterRepositoryImpl;
pub use character_repo::CharacterRepositoryImpl;
pub use connection::DatabaseConnection;
pub use errors::DatabaseError;
pub use project_repo::ProjectRepositoryImpl;
pub use volume_repo::VolumeRepositoryImpl;
