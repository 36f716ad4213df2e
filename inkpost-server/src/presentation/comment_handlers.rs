use crate::application::CommentService;
use crate::domain::comment::CreateCommentRequest;
use crate::presentation::middleware::CurrentUser;
use crate::presentation::response::{created, error_to_response, ok, ok_message};
use actix_web::{web, Responder};
use std::sync::Arc;

// ============== Comment Handlers ==============

pub async fn add_comment(
    user: CurrentUser,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<i64>,
    req: web::Json<CreateCommentRequest>,
) -> impl Responder {
    let post_id = path.into_inner();

    match comment_service
        .add_comment(post_id, user.0.id, req.into_inner())
        .await
    {
        Ok(comment) => created("Comment successfully added.", comment),
        Err(err) => error_to_response(err),
    }
}

pub async fn list_comments(
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match comment_service.comments_for_post(path.into_inner()).await {
        Ok(comments) => ok("All comments", comments),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_comment(
    user: CurrentUser,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match comment_service
        .delete_comment(path.into_inner(), user.0.id)
        .await
    {
        Ok(()) => ok_message("Comment deleted successfully..."),
        Err(err) => error_to_response(err),
    }
}
