//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::UserRow;
use crate::repo::{CreateUser, UserRepository};

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, credits, is_premium, story_ids,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, credits, is_premium, story_ids,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, name, credits)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, credits, is_premium, story_ids,
                      created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.credits)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn debit_credits(&self, id: Uuid, amount: i64) -> DbResult<Option<i64>> {
        // Conditional decrement: the WHERE clause is what keeps the balance
        // non-negative under concurrent charges.
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET credits = credits - $2, updated_at = NOW()
            WHERE id = $1 AND credits >= $2
            RETURNING credits
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(credits,)| credits))
    }

    async fn credit_credits(&self, id: Uuid, amount: i64) -> DbResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE users
            SET credits = credits + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING credits
            "#,
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(credits,)| credits).ok_or(DbError::NotFound)
    }

    async fn set_premium(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("UPDATE users SET is_premium = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn attach_story(&self, id: Uuid, story_id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET story_ids = array_append(story_ids, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(story_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn detach_story(&self, id: Uuid, story_id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET story_ids = array_remove(story_ids, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(story_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
