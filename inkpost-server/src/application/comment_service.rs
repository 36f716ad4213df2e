use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{CommentResponse, CreateCommentRequest};
use crate::domain::DomainError;
use std::sync::Arc;

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    post_repo: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        post_repo: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
        }
    }

    pub async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        req: CreateCommentRequest,
    ) -> Result<CommentResponse, DomainError> {
        if req.comment.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Comment cannot be empty".to_string(),
            ));
        }

        // The target post must exist at creation time.
        self.post_repo.find_by_id(post_id).await?;

        let comment = self
            .comment_repo
            .create(post_id, user_id, req.comment)
            .await?;

        tracing::info!(
            "Comment created: id={}, post_id={}, user_id={}",
            comment.id,
            post_id,
            user_id
        );

        Ok(CommentResponse::from(comment))
    }

    pub async fn delete_comment(&self, comment_id: i64, user_id: i64) -> Result<(), DomainError> {
        let comment = self.comment_repo.find_by_id(comment_id).await?;

        if comment.commented_by != user_id {
            tracing::warn!(
                "User {} attempted to delete comment {} owned by {}",
                user_id,
                comment_id,
                comment.commented_by
            );
            return Err(DomainError::Forbidden);
        }

        self.comment_repo.delete(comment_id).await?;

        tracing::info!("Comment deleted: id={}, user_id={}", comment_id, user_id);

        Ok(())
    }

    pub async fn comments_for_post(
        &self,
        post_id: i64,
    ) -> Result<Vec<CommentResponse>, DomainError> {
        self.post_repo.find_by_id(post_id).await?;

        let comments = self.comment_repo.list_for_post(post_id).await?;
        Ok(comments.into_iter().map(CommentResponse::from).collect())
    }
}
