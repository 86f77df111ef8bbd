use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::models::Volume;
use crate::domain::ports::VolumeRepository;
use crate::infrastructure::database::DatabaseError;

/// `SQLite` implementation of `VolumeRepository`. The model's `order` field
/// maps to the `sort_order` column.
pub struct VolumeRepositoryImpl {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct VolumeRow {
    id: String,
    project_id: String,
    title: String,
    summary: String,
    sort_order: i64,
    key_points: String,
    main_plot: Option<String>,
    key_events: String,
    created_at: String,
    updated_at: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

impl VolumeRepositoryImpl {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: VolumeRow) -> Result<Volume, DatabaseError> {
        Ok(Volume {
            id: Uuid::parse_str(&row.id)?,
            project_id: Uuid::parse_str(&row.project_id)?,
            title: row.title,
            summary: row.summary,
            order: row.sort_order,
            key_points: serde_json::from_str(&row.key_points)?,
            main_plot: row.main_plot,
            key_events: serde_json::from_str(&row.key_events)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl VolumeRepository for VolumeRepositoryImpl {
    async fn insert(&self, volume: &Volume) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO volumes (
                id, project_id, title, summary, sort_order, key_points,
                main_plot, key_events, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(volume.id.to_string())
        .bind(volume.project_id.to_string())
        .bind(&volume.title)
        .bind(&volume.summary)
        .bind(volume.order)
        .bind(serde_json::to_string(&volume.key_points)?)
        .bind(&volume.main_plot)
        .bind(serde_json::to_string(&volume.key_events)?)
        .bind(volume.created_at.to_rfc3339())
        .bind(volume.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Volume>> {
        let row: Option<VolumeRow> = sqlx::query_as("SELECT * FROM volumes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        row.map(Self::parse_row).transpose().map_err(Into::into)
    }

    async fn list_for_project(&self, project_id: Uuid) -> anyhow::Result<Vec<Volume>> {
        let rows: Vec<VolumeRow> =
            sqlx::query_as("SELECT * FROM volumes WHERE project_id = ? ORDER BY sort_order")
                .bind(project_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(DatabaseError::from)?;
        rows.into_iter()
            .map(Self::parse_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    async fn update(&self, volume: &Volume) -> anyhow::Result<()> {
        let result = sqlx::query(
            r"
            UPDATE volumes SET
                title = ?, summary = ?, sort_order = ?, key_points = ?,
                main_plot = ?, key_events = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&volume.title)
        .bind(&volume.summary)
        .bind(volume.order)
        .bind(serde_json::to_string(&volume.key_points)?)
        .bind(&volume.main_plot)
        .bind(serde_json::to_string(&volume.key_events)?)
        .bind(volume.updated_at.to_rfc3339())
        .bind(volume.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(volume.id).into());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM volumes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}
