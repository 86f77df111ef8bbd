use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::models::Chapter;
use crate::domain::ports::ChapterRepository;
use crate::infrastructure::database::DatabaseError;

/// `SQLite` implementation of `ChapterRepository`.
pub struct ChapterRepositoryImpl {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ChapterRow {
    id: String,
    volume_id: String,
    title: String,
    outline: String,
    content: String,
    word_count: i64,
    sort_order: i64,
    created_at: String,
    updated_at: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

impl ChapterRepositoryImpl {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_row(row: ChapterRow) -> Result<Chapter, DatabaseError> {
        Ok(Chapter {
            id: Uuid::parse_str(&row.id)?,
            volume_id: Uuid::parse_str(&row.volume_id)?,
            title: row.title,
            outline: row.outline,
            content: row.content,
            word_count: row.word_count,
            order: row.sort_order,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl ChapterRepository for ChapterRepositoryImpl {
    async fn insert(&self, chapter: &Chapter) -> anyhow::Result<()> {
        sqlx::query(
            r"
            INSERT INTO chapters (
                id, volume_id, title, outline, content, word_count,
                sort_order, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(chapter.id.to_string())
        .bind(chapter.volume_id.to_string())
        .bind(&chapter.title)
        .bind(&chapter.outline)
        .bind(&chapter.content)
        .bind(chapter.word_count)
        .bind(chapter.order)
        .bind(chapter.created_at.to_rfc3339())
        .bind(chapter.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Chapter>> {
        let row: Option<ChapterRow> = sqlx::query_as("SELECT * FROM chapters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        row.map(Self::parse_row).transpose().map_err(Into::into)
    }

    async fn list_for_volume(&self, volume_id: Uuid) -> anyhow::Result<Vec<Chapter>> {
        let rows: Vec<ChapterRow> =
            sqlx::query_as("SELECT * FROM chapters WHERE volume_id = ? ORDER BY sort_order")
                .bind(volume_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(DatabaseError::from)?;
        rows.into_iter()
            .map(Self::parse_row)
            .collect::<Result<_, _>>()
            .map_err(Into::into)
    }

    async fn update(&self, chapter: &Chapter) -> anyhow::Result<()> {
        let result = sqlx::query(
            r"
            UPDATE chapters SET
                title = ?, outline = ?, content = ?, word_count = ?,
                sort_order = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(&chapter.title)
        .bind(&chapter.outline)
        .bind(&chapter.content)
        .bind(chapter.word_count)
        .bind(chapter.order)
        .bind(chapter.updated_at.to_rfc3339())
        .bind(chapter.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(chapter.id).into());
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM chapters WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}
