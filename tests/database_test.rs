//! Round-trip tests for the SQLite repositories against an in-memory
//! database.

use uuid::Uuid;

use plotweave::domain::models::{
    Chapter, Character, CharacterRole, Project, Relationship, Scale, Volume,
};
use plotweave::domain::ports::{
    ChapterRepository, CharacterRepository, ProjectRepository, VolumeRepository,
};
use plotweave::infrastructure::database::{
    ChapterRepositoryImpl, CharacterRepositoryImpl, DatabaseConnection, DatabaseError,
    ProjectRepositoryImpl, VolumeRepositoryImpl,
};

async fn pool() -> sqlx::SqlitePool {
    DatabaseConnection::connect_in_memory().await.unwrap().pool()
}

async fn seed_project(repo: &ProjectRepositoryImpl) -> Project {
    let mut project = Project::new("测试小说").with_scale(Scale::Million);
    project.genres = vec!["玄幻".to_string(), "热血".to_string()];
    project.styles = vec!["快节奏".to_string()];
    project.world_setting = "九州大陆，灵气复苏".to_string();
    repo.insert(&project).await.unwrap();
    project
}

#[tokio::test]
async fn test_project_round_trip() {
    let pool = pool().await;
    let repo = ProjectRepositoryImpl::new(pool);
    let project = seed_project(&repo).await;

    let loaded = repo.get(project.id).await.unwrap().unwrap();
    assert_eq!(loaded.title, "测试小说");
    assert_eq!(loaded.scale, Scale::Million);
    assert_eq!(loaded.genres, vec!["玄幻", "热血"]);
    assert_eq!(loaded.styles, vec!["快节奏"]);
    assert_eq!(loaded.world_setting, "九州大陆，灵气复苏");

    let mut updated = loaded.clone();
    updated.summary = "少年逆袭的故事".to_string();
    repo.update(&updated).await.unwrap();
    let reloaded = repo.get(project.id).await.unwrap().unwrap();
    assert_eq!(reloaded.summary, "少年逆袭的故事");

    repo.delete(project.id).await.unwrap();
    assert!(repo.get(project.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_volumes_listed_in_order() {
    let pool = pool().await;
    let projects = ProjectRepositoryImpl::new(pool.clone());
    let volumes = VolumeRepositoryImpl::new(pool);
    let project = seed_project(&projects).await;

    // Inserted out of order on purpose.
    let second = Volume::new(project.id, "第二卷", 1).with_summary("风云再起");
    let first = Volume::new(project.id, "第一卷", 0)
        .with_key_points(vec!["拜师".to_string()])
        .with_main_plot("林风拜入青云宗");
    volumes.insert(&second).await.unwrap();
    volumes.insert(&first).await.unwrap();

    let listed = volumes.list_for_project(project.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].title, "第一卷");
    assert_eq!(listed[0].key_points, vec!["拜师"]);
    assert_eq!(listed[0].main_plot.as_deref(), Some("林风拜入青云宗"));
    assert_eq!(listed[1].title, "第二卷");
}

#[tokio::test]
async fn test_chapter_round_trip_preserves_word_count() {
    let pool = pool().await;
    let projects = ProjectRepositoryImpl::new(pool.clone());
    let volumes = VolumeRepositoryImpl::new(pool.clone());
    let chapters = ChapterRepositoryImpl::new(pool);
    let project = seed_project(&projects).await;
    let volume = Volume::new(project.id, "第一卷", 0);
    volumes.insert(&volume).await.unwrap();

    let mut chapter = Chapter::new(volume.id, "第一章 山门", 0).with_outline("少年上山拜师");
    chapter.set_content("林风背着行囊，站在青云山脚下。");
    chapters.insert(&chapter).await.unwrap();

    let loaded = chapters.get(chapter.id).await.unwrap().unwrap();
    assert_eq!(loaded.outline, "少年上山拜师");
    assert_eq!(loaded.word_count, chapter.word_count);
    assert_eq!(loaded.content, chapter.content);

    let listed = chapters.list_for_volume(volume.id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_character_round_trip_with_mortality_and_relationships() {
    let pool = pool().await;
    let projects = ProjectRepositoryImpl::new(pool.clone());
    let characters = CharacterRepositoryImpl::new(pool);
    let project = seed_project(&projects).await;

    let mut villain = Character::new(project.id, "黑袍老者", CharacterRole::Antagonist)
        .with_identity("魔教长老")
        .with_relationships(vec![Relationship {
            target_name: "林风".to_string(),
            relation: "仇敌".to_string(),
        }]);
    villain.record_appearance("第三章");
    villain.record_appearance("第十章");
    villain.mark_deceased("第十章");
    characters.insert(&villain).await.unwrap();

    let loaded = characters
        .find_by_name(project.id, "黑袍老者")
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.is_deceased());
    assert_eq!(loaded.death_chapter.as_deref(), Some("第十章"));
    assert_eq!(loaded.appearances, vec!["第三章", "第十章"]);
    assert_eq!(loaded.relationships.len(), 1);
    assert_eq!(loaded.relationships[0].target_name, "林风");

    // Name lookup is scoped to the project.
    let other_project = Uuid::new_v4();
    assert!(characters
        .find_by_name(other_project, "黑袍老者")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_update_of_missing_row_is_not_found() {
    let pool = pool().await;
    let projects = ProjectRepositoryImpl::new(pool);
    let ghost = Project::new("不存在的项目");

    let err = projects.update(&ghost).await.unwrap_err();
    match err.downcast_ref::<DatabaseError>() {
        Some(DatabaseError::NotFound(id)) => assert_eq!(*id, ghost.id),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_project_delete_cascades() {
    let pool = pool().await;
    let projects = ProjectRepositoryImpl::new(pool.clone());
    let volumes = VolumeRepositoryImpl::new(pool.clone());
    let characters = CharacterRepositoryImpl::new(pool);
    let project = seed_project(&projects).await;

    let volume = Volume::new(project.id, "第一卷", 0);
    volumes.insert(&volume).await.unwrap();
    let hero = Character::new(project.id, "林风", CharacterRole::Protagonist);
    characters.insert(&hero).await.unwrap();

    projects.delete(project.id).await.unwrap();
    assert!(volumes.get(volume.id).await.unwrap().is_none());
    assert!(characters.get(hero.id).await.unwrap().is_none());
}
