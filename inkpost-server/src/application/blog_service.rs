use crate::data::post_repository::{NewPost, PostChanges, PostRepository};
use crate::domain::post::{AuthorSnapshot, CreatePostRequest, PostResponse, UpdatePostRequest};
use crate::domain::{DomainError, User};
use crate::infrastructure::media::{public_id_from_url, ImageUpload, MediaRelay};
use std::sync::Arc;

/// Fixed page size for the public listing.
pub const POSTS_PER_PAGE: i64 = 6;

pub struct BlogService {
    post_repo: Arc<dyn PostRepository>,
    media: Arc<dyn MediaRelay>,
}

impl BlogService {
    pub fn new(post_repo: Arc<dyn PostRepository>, media: Arc<dyn MediaRelay>) -> Self {
        Self { post_repo, media }
    }

    pub async fn create_post(
        &self,
        author: &User,
        req: CreatePostRequest,
        image: Option<ImageUpload>,
    ) -> Result<PostResponse, DomainError> {
        validate_title(&req.title)?;
        validate_short_description(&req.short_description)?;
        validate_content(&req.content)?;

        let image_url = match image {
            Some(image) => Some(self.media.upload(image).await?.url),
            None => None,
        };

        let post = self
            .post_repo
            .create(NewPost {
                title: req.title,
                short_description: req.short_description,
                content: req.content,
                author: AuthorSnapshot::from(author),
                image: image_url,
            })
            .await?;

        tracing::info!("Post created: id={}, author_id={}", post.id, author.id);

        Ok(PostResponse::from(post))
    }

    /// Single-post fetch. Bumping the view counter is part of the read.
    pub async fn get_post(&self, id: i64) -> Result<PostResponse, DomainError> {
        let post = self.post_repo.fetch_and_bump_views(id).await?;
        Ok(PostResponse::from(post))
    }

    pub async fn list_posts(&self, page: i64) -> Result<(Vec<PostResponse>, i64), DomainError> {
        let page = page.max(1);
        let offset = (page - 1) * POSTS_PER_PAGE;

        let (posts, total) = self.post_repo.list_page(POSTS_PER_PAGE, offset).await?;

        Ok((posts.into_iter().map(PostResponse::from).collect(), total))
    }

    pub async fn update_post(
        &self,
        id: i64,
        user_id: i64,
        req: UpdatePostRequest,
        image: Option<ImageUpload>,
    ) -> Result<PostResponse, DomainError> {
        if req.is_empty() && image.is_none() {
            return Err(DomainError::ValidationError("No changes made.".to_string()));
        }

        let post = self.post_repo.find_by_id(id).await?;

        if post.author.id != user_id {
            tracing::warn!(
                "User {} attempted to update post {} owned by {}",
                user_id,
                id,
                post.author.id
            );
            return Err(DomainError::Forbidden);
        }

        if let Some(title) = &req.title {
            validate_title(title)?;
        }
        if let Some(short_description) = &req.short_description {
            validate_short_description(short_description)?;
        }
        if let Some(content) = &req.content {
            validate_content(content)?;
        }

        let mut replaced_image = None;
        let image_url = match image {
            Some(image) => {
                let stored = self.media.upload(image).await?;
                replaced_image = post.image.clone();
                Some(stored.url)
            }
            None => None,
        };

        let updated_post = self
            .post_repo
            .update(
                id,
                PostChanges {
                    title: req.title,
                    short_description: req.short_description,
                    content: req.content,
                    image: image_url,
                },
            )
            .await?;

        if let Some(old_url) = replaced_image {
            self.discard_image(&old_url).await;
        }

        tracing::info!("Post updated: id={}, author_id={}", id, user_id);

        Ok(PostResponse::from(updated_post))
    }

    pub async fn delete_post(&self, id: i64, user_id: i64) -> Result<(), DomainError> {
        let post = self.post_repo.find_by_id(id).await?;

        if post.author.id != user_id {
            tracing::warn!(
                "User {} attempted to delete post {} owned by {}",
                user_id,
                id,
                post.author.id
            );
            return Err(DomainError::Forbidden);
        }

        self.post_repo.delete(id).await?;

        if let Some(image_url) = post.image {
            self.discard_image(&image_url).await;
        }

        tracing::info!("Post deleted: id={}, author_id={}", id, user_id);

        Ok(())
    }

    /// Best-effort removal of an image the record no longer points at.
    /// Failures are logged, never propagated.
    async fn discard_image(&self, url: &str) {
        let Some(public_id) = public_id_from_url(url) else {
            return;
        };
        if let Err(e) = self.media.delete(&public_id).await {
            tracing::warn!("Failed to delete image '{}' from media host: {}", public_id, e);
        }
    }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    let len = title.trim().chars().count();
    if !(5..=100).contains(&len) {
        return Err(DomainError::ValidationError(
            "Title must be between 5 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_short_description(short_description: &str) -> Result<(), DomainError> {
    if short_description.trim().chars().count() < 20 {
        return Err(DomainError::ValidationError(
            "Short description must be at least 20 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), DomainError> {
    let len = content.trim().chars().count();
    if !(50..=5000).contains(&len) {
        return Err(DomainError::ValidationError(
            "Content must be between 50 and 5000 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mock::{InMemoryPostRepository, RecordingMediaRelay};
    use chrono::Utc;

    struct Fixture {
        posts: Arc<InMemoryPostRepository>,
        media: Arc<RecordingMediaRelay>,
        service: BlogService,
    }

    fn fixture() -> Fixture {
        let posts = Arc::new(InMemoryPostRepository::new());
        let media = Arc::new(RecordingMediaRelay::new());
        let service = BlogService::new(posts.clone(), media.clone());
        Fixture {
            posts,
            media,
            service,
        }
    }

    fn author(id: i64, username: &str) -> User {
        let now = Utc::now();
        User {
            id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            full_name: "Anna Schmidt".to_string(),
            password_hash: "x".to_string(),
            profile_pic: None,
            cover_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn create_request(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            short_description: "A short description long enough".to_string(),
            content: "c".repeat(120),
        }
    }

    fn image(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            bytes: vec![0xff, 0xd8],
        }
    }

    #[tokio::test]
    async fn create_validates_field_bounds() {
        let fx = fixture();
        let anna = author(1, "anna");

        let short_title = fx.service.create_post(&anna, create_request("Hey"), None);
        assert!(matches!(
            short_title.await,
            Err(DomainError::ValidationError(_))
        ));

        let mut req = create_request("A valid title");
        req.short_description = "too short".to_string();
        assert!(matches!(
            fx.service.create_post(&anna, req, None).await,
            Err(DomainError::ValidationError(_))
        ));

        let mut req = create_request("A valid title");
        req.content = "short".to_string();
        assert!(matches!(
            fx.service.create_post(&anna, req, None).await,
            Err(DomainError::ValidationError(_))
        ));

        let mut req = create_request("A valid title");
        req.content = "c".repeat(5001);
        assert!(matches!(
            fx.service.create_post(&anna, req, None).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn create_snapshots_author_and_stores_image_url() {
        let fx = fixture();
        let mut anna = author(1, "anna");
        anna.profile_pic = Some("https://media.test/uploads/me.png".to_string());

        let post = fx
            .service
            .create_post(&anna, create_request("A valid title"), Some(image("pic.png")))
            .await
            .unwrap();

        assert_eq!(post.author.id, 1);
        assert_eq!(post.author.username, "anna");
        assert_eq!(post.author.full_name, "Anna Schmidt");
        assert_eq!(
            post.author.profile_pic.as_deref(),
            Some("https://media.test/uploads/me.png")
        );
        assert_eq!(
            post.image.as_deref(),
            Some("https://media.test/uploads/pic.png")
        );
        assert_eq!(post.views, 0);
    }

    #[tokio::test]
    async fn get_post_bumps_views_once_per_fetch() {
        let fx = fixture();
        let anna = author(1, "anna");
        let created = fx
            .service
            .create_post(&anna, create_request("A valid title"), None)
            .await
            .unwrap();

        let first = fx.service.get_post(created.id).await.unwrap();
        assert_eq!(first.views, 1);
        let second = fx.service.get_post(created.id).await.unwrap();
        assert_eq!(second.views, 2);
    }

    #[tokio::test]
    async fn get_post_missing_is_not_found() {
        let fx = fixture();
        assert!(matches!(
            fx.service.get_post(99).await,
            Err(DomainError::PostNotFound)
        ));
    }

    #[tokio::test]
    async fn list_returns_at_most_page_size_newest_first() {
        let fx = fixture();
        let anna = author(1, "anna");
        for i in 0..8 {
            fx.service
                .create_post(&anna, create_request(&format!("Post number {}", i)), None)
                .await
                .unwrap();
        }

        let (first_page, total) = fx.service.list_posts(1).await.unwrap();
        assert_eq!(total, 8);
        assert_eq!(first_page.len(), POSTS_PER_PAGE as usize);
        assert_eq!(first_page[0].title, "Post number 7");

        let (second_page, _) = fx.service.list_posts(2).await.unwrap();
        assert_eq!(second_page.len(), 2);
        assert_eq!(second_page[1].title, "Post number 0");

        // Page below 1 falls back to the first page.
        let (fallback, _) = fx.service.list_posts(0).await.unwrap();
        assert_eq!(fallback[0].title, "Post number 7");
    }

    #[tokio::test]
    async fn update_is_owner_only() {
        let fx = fixture();
        let anna = author(1, "anna");
        let created = fx
            .service
            .create_post(&anna, create_request("A valid title"), None)
            .await
            .unwrap();

        let req = UpdatePostRequest {
            title: Some("A new valid title".to_string()),
            ..UpdatePostRequest::default()
        };
        let denied = fx.service.update_post(created.id, 2, req.clone(), None).await;
        assert!(matches!(denied, Err(DomainError::Forbidden)));

        let updated = fx
            .service
            .update_post(created.id, 1, req, None)
            .await
            .unwrap();
        assert_eq!(updated.title, "A new valid title");
        // Untouched fields keep their values.
        assert_eq!(updated.content, "c".repeat(120));
    }

    #[tokio::test]
    async fn update_with_no_changes_is_rejected() {
        let fx = fixture();
        let anna = author(1, "anna");
        let created = fx
            .service
            .create_post(&anna, create_request("A valid title"), None)
            .await
            .unwrap();

        let result = fx
            .service
            .update_post(created.id, 1, UpdatePostRequest::default(), None)
            .await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn update_replaces_image_and_discards_old_one() {
        let fx = fixture();
        let anna = author(1, "anna");
        let created = fx
            .service
            .create_post(&anna, create_request("A valid title"), Some(image("old.png")))
            .await
            .unwrap();

        let updated = fx
            .service
            .update_post(
                created.id,
                1,
                UpdatePostRequest::default(),
                Some(image("new.png")),
            )
            .await
            .unwrap();

        assert_eq!(
            updated.image.as_deref(),
            Some("https://media.test/uploads/new.png")
        );
        assert_eq!(fx.media.deleted_ids(), vec!["old".to_string()]);
    }

    #[tokio::test]
    async fn delete_is_owner_only_and_discards_media() {
        let fx = fixture();
        let anna = author(1, "anna");
        let created = fx
            .service
            .create_post(&anna, create_request("A valid title"), Some(image("pic.png")))
            .await
            .unwrap();

        let denied = fx.service.delete_post(created.id, 2).await;
        assert!(matches!(denied, Err(DomainError::Forbidden)));

        fx.service.delete_post(created.id, 1).await.unwrap();
        assert!(fx.posts.all().is_empty());
        assert_eq!(fx.media.deleted_ids(), vec!["pic".to_string()]);
    }

    #[tokio::test]
    async fn delete_swallows_media_failure() {
        let posts = Arc::new(InMemoryPostRepository::new());
        let media = Arc::new(RecordingMediaRelay::failing_deletes());
        let service = BlogService::new(posts.clone(), media);

        let anna = author(1, "anna");
        let created = service
            .create_post(&anna, create_request("A valid title"), Some(image("pic.png")))
            .await
            .unwrap();

        // The record is gone even though the media host refused the delete.
        service.delete_post(created.id, 1).await.unwrap();
        assert!(posts.all().is_empty());
    }
}
