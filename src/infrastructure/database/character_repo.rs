use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::models::{Character, CharacterRole, LifeStatus};
use crate::domain::ports::CharacterRepository;
use crate::infrastructure::database::DatabaseError;

/// `SQLite` implementation of `CharacterRepository`. Appearances and
/// relationships are JSON text columns.
pub struct CharacterRepositoryImpl {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct CharacterRow {
    id: String,
    project_id: String,
    name: String,
    role: String,
    gender: String,
    age: String,
    identity: String,
    description: String,
    arc: String,
    status: String,
    death_chapter: Option<String>,
    appearances: String,
    relationships: String,
    created_at: String,
    updated_at: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

impl CharacterRepositoryImpl {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: CharacterRow) -> Result<Character, DatabaseError> {
        Ok(Character {
            id: Uuid::parse_str(&row.id)?,
            project_id: Uuid::parse_str(&row.project_id)?,
            name: row.name,
            role: CharacterRole::from_str(&row.role)
                .ok_or_else(|| DatabaseError::ParseError(format!("invalid role: {}", row.role)))?,
            gender: row.gender,
            age: row.age,
            identity: row.identity,
            description: row.description,
            arc: row.arc,
            status: LifeStatus::from_str(&row.status).ok_or_else(|| {
                DatabaseError::ParseError(format!("invalid status: {}", row.status))
            })?,
            death_chapter: row.death_chapter,
            appearances: serde_json::from_str(&row.appearances)?,
            relationships: serde_json::from_str(&row.relationships)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl CharacterRepository for CharacterRepositoryImpl {
    async fn insert(&self, character: &Character) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO characters (
                id, project_id, name, role, gender, age, identity,
                description, arc, status, death_chapter, appearances,
                relationships, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(character.id.to_string())
        .bind(character.project_id.to_string())
        .bind(&character.name)
        .bind(character.role.as_str())
        .bind(&character.gender)
        .bind(&character.age)
        .bind(&character.identity)
        .bind(&character.description)
        .bind(&character.arc)
        .bind(character.status.as_str())
        .bind(&character.death_chapter)
        .bind(serde_json::to_string(&character.appearances)?)
        .bind(serde_json::to_string(&character.relationships)?)
        .bind(character.created_at.to_rfc3339())
        .bind(character.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Character>> {
        let row: Option<CharacterRow> = sqlx::query_as("SELECT * FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        row.map(Self::parse_row).transpose().map_err(Into::into)
    }

    async fn list_for_project(&self, project_id: Uuid) -> anyhow::Result<Vec<Character>> {
        let rows: Vec<CharacterRow> =
            sqlx::query_as("SELECT * FROM characters WHERE project_id = ? ORDER BY created_at")
                .bind(project_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(DatabaseError::from)?;
        rows.into_iter()
            .map(Self::parse_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    async fn find_by_name(
        &self,
        project_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Option<Character>> {
        let row: Option<CharacterRow> =
            sqlx::query_as("SELECT * FROM characters WHERE project_id = ? AND name = ?")
                .bind(project_id.to_string())
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(DatabaseError::from)?;
        row.map(Self::parse_row).transpose().map_err(Into::into)
    }

    async fn update(&self, character: &Character) -> anyhow::Result<()> {
        let result = sqlx::query(
            r"
            UPDATE characters SET
                name = ?, role = ?, gender = ?, age = ?, identity = ?,
                description = ?, arc = ?, status = ?, death_chapter = ?,
                appearances = ?, relationships = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&character.name)
        .bind(character.role.as_str())
        .bind(&character.gender)
        .bind(&character.age)
        .bind(&character.identity)
        .bind(&character.description)
        .bind(&character.arc)
        .bind(character.status.as_str())
        .bind(&character.death_chapter)
        .bind(serde_json::to_string(&character.appearances)?)
        .bind(serde_json::to_string(&character.relationships)?)
        .bind(character.updated_at.to_rfc3339())
        .bind(character.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(character.id).into());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM characters WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}
