use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::models::{Project, Scale};
use crate::domain::ports::ProjectRepository;
use crate::infrastructure::database::DatabaseError;

/// `SQLite` implementation of `ProjectRepository`.
///
/// List-valued fields (genres, styles) are stored as JSON text columns;
/// timestamps as RFC3339 strings.
pub struct ProjectRepositoryImpl {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: String,
    title: String,
    inspiration: String,
    constraints: String,
    scale: String,
    genres: String,
    styles: String,
    world_setting: String,
    summary: String,
    created_at: String,
    updated_at: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

impl ProjectRepositoryImpl {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: ProjectRow) -> Result<Project, DatabaseError> {
        Ok(Project {
            id: Uuid::parse_str(&row.id)?,
            title: row.title,
            inspiration: row.inspiration,
            constraints: row.constraints,
            scale: Scale::from_str(&row.scale)
                .ok_or_else(|| DatabaseError::ParseError(format!("invalid scale: {}", row.scale)))?,
            genres: serde_json::from_str(&row.genres)?,
            styles: serde_json::from_str(&row.styles)?,
            world_setting: row.world_setting,
            summary: row.summary,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl ProjectRepository for ProjectRepositoryImpl {
    async fn insert(&self, project: &Project) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO projects (
                id, title, inspiration, constraints, scale, genres, styles,
                world_setting, summary, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(project.id.to_string())
        .bind(&project.title)
        .bind(&project.inspiration)
        .bind(&project.constraints)
        .bind(project.scale.as_str())
        .bind(serde_json::to_string(&project.genres)?)
        .bind(serde_json::to_string(&project.styles)?)
        .bind(&project.world_setting)
        .bind(&project.summary)
        .bind(project.created_at.to_rfc3339())
        .bind(project.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        let row: Option<ProjectRow> =
            sqlx::query_as("SELECT * FROM projects WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(DatabaseError::from)?;
        row.map(Self::parse_row).transpose().map_err(Into::into)
    }

    async fn list(&self) -> anyhow::Result<Vec<Project>> {
        let rows: Vec<ProjectRow> =
            sqlx::query_as("SELECT * FROM projects ORDER BY created_at")
                .fetch_all(&self.pool)
                .await
                .map_err(DatabaseError::from)?;
        rows.into_iter()
            .map(Self::parse_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    async fn update(&self, project: &Project) -> anyhow::Result<()> {
        let result = sqlx::query(
            r"
            UPDATE projects SET
                title = ?, inspiration = ?, constraints = ?, scale = ?,
                genres = ?, styles = ?, world_setting = ?, summary = ?,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&project.title)
        .bind(&project.inspiration)
        .bind(&project.constraints)
        .bind(project.scale.as_str())
        .bind(serde_json::to_string(&project.genres)?)
        .bind(serde_json::to_string(&project.styles)?)
        .bind(&project.world_setting)
        .bind(&project.summary)
        .bind(project.updated_at.to_rfc3339())
        .bind(project.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(project.id).into());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}
