use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::users::{
    repo_types::{User, UserDraft, UserRow},
    store::UserStore,
};

/// `users` table access. Every operation is one autocommit statement.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Ids are BIGSERIAL; only their exact decimal rendering names a row, so "01" or "+1" cannot exist.
fn parse_id(id: &str) -> Option<i64> {
    id.parse().ok().filter(|key: &i64| key.to_string() == id)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, draft: UserDraft) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM users
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(&self, id: &str, draft: UserDraft) -> Result<Option<User>, StoreError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET name = $1,
                   email = $2,
                   updated_at = GREATEST($3, updated_at)
             WHERE id = $4
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let id = parse_id(id).ok_or(StoreError::NotFound)?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
