use crate::domain::post::AuthorSnapshot;
use crate::domain::{DomainError, Post};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Fields for a new post; the author snapshot is taken from the creating
/// user before this reaches the repository.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub author: AuthorSnapshot,
    pub image: Option<String>,
}

/// Partial update applied to a post; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, new_post: NewPost) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    /// Fetch a post and bump its view counter in the same statement, so
    /// concurrent reads each count exactly once.
    async fn fetch_and_bump_views(&self, id: i64) -> Result<Post, DomainError>;
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn list_page(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64), DomainError>;
    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Post>, DomainError>;
    /// Re-propagates the denormalized author fields onto every post by that
    /// author. Returns the number of posts touched.
    async fn sync_author_snapshot(&self, author: &AuthorSnapshot) -> Result<u64, DomainError>;
}

const POST_COLUMNS: &str = "id, title, short_description, content, author_id, author_username, author_full_name, author_email, author_profile_pic, image, views, created_at, updated_at";

fn map_post(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        short_description: row.try_get("short_description")?,
        content: row.try_get("content")?,
        author: AuthorSnapshot {
            id: row.try_get("author_id")?,
            username: row.try_get("author_username")?,
            full_name: row.try_get("author_full_name")?,
            email: row.try_get("author_email")?,
            profile_pic: row.try_get("author_profile_pic")?,
        },
        image: row.try_get("image")?,
        views: row.try_get("views")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO posts (
                title, short_description, content,
                author_id, author_username, author_full_name, author_email, author_profile_pic,
                image, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(&new_post.title)
        .bind(&new_post.short_description)
        .bind(&new_post.content)
        .bind(new_post.author.id)
        .bind(&new_post.author.username)
        .bind(&new_post.author.full_name)
        .bind(&new_post.author.email)
        .bind(&new_post.author.profile_pic)
        .bind(&new_post.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        map_post(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_post(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn fetch_and_bump_views(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE posts
            SET views = views + 1
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_post(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE posts
            SET
                title = COALESCE($1, title),
                short_description = COALESCE($2, short_description),
                content = COALESCE($3, content),
                image = COALESCE($4, image),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {POST_COLUMNS}
            "#,
        ))
        .bind(changes.title)
        .bind(changes.short_description)
        .bind(changes.content)
        .bind(changes.image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => map_post(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn list_page(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64), DomainError> {
        let count_row = sqlx::query("SELECT COUNT(*) as count FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let total: i64 = count_row.try_get("count")?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let posts = rows.iter().map(map_post).collect::<Result<Vec<_>, _>>()?;

        Ok((posts, total))
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(map_post).collect()
    }

    async fn sync_author_snapshot(&self, author: &AuthorSnapshot) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET
                author_username = $2,
                author_full_name = $3,
                author_email = $4,
                author_profile_pic = $5
            WHERE author_id = $1
            "#,
        )
        .bind(author.id)
        .bind(&author.username)
        .bind(&author.full_name)
        .bind(&author.email)
        .bind(&author.profile_pic)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
