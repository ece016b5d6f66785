//! PostgreSQL story repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::StoryRow;
use crate::repo::{CreateStory, StoryRepository};

/// PostgreSQL story repository
#[derive(Clone)]
pub struct PgStoryRepository {
    pool: PgPool,
}

impl PgStoryRepository {
    /// Create a new story repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoryRepository for PgStoryRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<StoryRow>> {
        let story = sqlx::query_as::<_, StoryRow>(
            r#"
            SELECT id, title, content, user_id, settings, is_public, audio_url,
                   image_url, credits_cost, likes, plays, category,
                   created_at, updated_at
            FROM stories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(story)
    }

    async fn create(&self, story: CreateStory) -> DbResult<StoryRow> {
        let row = sqlx::query_as::<_, StoryRow>(
            r#"
            INSERT INTO stories (id, title, content, user_id, settings,
                                 is_public, credits_cost, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, content, user_id, settings, is_public,
                      audio_url, image_url, credits_cost, likes, plays,
                      category, created_at, updated_at
            "#,
        )
        .bind(story.id)
        .bind(&story.title)
        .bind(&story.content)
        .bind(story.user_id)
        .bind(&story.settings)
        .bind(story.is_public)
        .bind(story.credits_cost)
        .bind(&story.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn append_content(&self, id: Uuid, text: &str) -> DbResult<StoryRow> {
        // Concatenation happens in the database so existing content can
        // never be shrunk or reordered by a concurrent append.
        let row = sqlx::query_as::<_, StoryRow>(
            r#"
            UPDATE stories
            SET content = content || $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, content, user_id, settings, is_public,
                      audio_url, image_url, credits_cost, likes, plays,
                      category, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DbError::NotFound)
    }

    async fn update_content(&self, id: Uuid, content: &str) -> DbResult<StoryRow> {
        let row = sqlx::query_as::<_, StoryRow>(
            r#"
            UPDATE stories
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, content, user_id, settings, is_public,
                      audio_url, image_url, credits_cost, likes, plays,
                      category, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(DbError::NotFound)
    }

    async fn set_visibility(&self, id: Uuid, is_public: bool) -> DbResult<()> {
        sqlx::query("UPDATE stories SET is_public = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(is_public)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_audio_url(&self, id: Uuid, audio_url: &str) -> DbResult<()> {
        sqlx::query("UPDATE stories SET audio_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(audio_url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn increment_plays(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE stories SET plays = plays + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: Uuid) -> DbResult<Vec<StoryRow>> {
        let stories = sqlx::query_as::<_, StoryRow>(
            r#"
            SELECT id, title, content, user_id, settings, is_public, audio_url,
                   image_url, credits_cost, likes, plays, category,
                   created_at, updated_at
            FROM stories
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stories)
    }

    async fn list_public(&self, limit: i64) -> DbResult<Vec<StoryRow>> {
        let stories = sqlx::query_as::<_, StoryRow>(
            r#"
            SELECT id, title, content, user_id, settings, is_public, audio_url,
                   image_url, credits_cost, likes, plays, category,
                   created_at, updated_at
            FROM stories
            WHERE is_public = TRUE
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(stories)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
