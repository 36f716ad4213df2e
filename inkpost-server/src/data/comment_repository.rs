use crate::domain::{Comment, DomainError};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(
        &self,
        post_id: i64,
        commented_by: i64,
        body: String,
    ) -> Result<Comment, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError>;
}

fn map_comment(row: &PgRow) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: row.try_get("id")?,
        body: row.try_get("body")?,
        post_id: row.try_get("post_id")?,
        commented_by: row.try_get("commented_by")?,
        created_at: row.try_get("created_at")?,
    })
}

pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(
        &self,
        post_id: i64,
        commented_by: i64,
        body: String,
    ) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO comments (body, post_id, commented_by, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, body, post_id, commented_by, created_at
            "#,
        )
        .bind(&body)
        .bind(post_id)
        .bind(commented_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        map_comment(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            "SELECT id, body, post_id, commented_by, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_comment(&row),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::CommentNotFound)
        } else {
            Ok(())
        }
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, body, post_id, commented_by, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_comment).collect()
    }
}
