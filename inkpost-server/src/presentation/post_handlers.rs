use crate::application::BlogService;
use crate::domain::post::{CreatePostRequest, PostResponse, UpdatePostRequest};
use crate::presentation::middleware::CurrentUser;
use crate::presentation::multipart::read_form;
use crate::presentation::response::{created, error_to_response, ok, ok_message};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(serde::Serialize)]
struct PostListResponse {
    status: u16,
    message: String,
    data: Vec<PostResponse>,
    total: i64,
    page: i64,
}

// ============== Post Handlers ==============

pub async fn list_posts(
    blog_service: web::Data<Arc<BlogService>>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1).max(1);

    match blog_service.list_posts(page).await {
        Ok((posts, total)) => HttpResponse::Ok().json(PostListResponse {
            status: 200,
            message: "All posts".to_string(),
            data: posts,
            total,
            page,
        }),
        Err(err) => error_to_response(err),
    }
}

pub async fn get_post(
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match blog_service.get_post(path.into_inner()).await {
        Ok(post) => ok("Post fetched successfully", post),
        Err(err) => error_to_response(err),
    }
}

pub async fn create_post(
    user: CurrentUser,
    blog_service: web::Data<Arc<BlogService>>,
    payload: Multipart,
) -> impl Responder {
    let mut form = match read_form(payload).await {
        Ok(form) => form,
        Err(err) => return error_to_response(err),
    };

    let req = CreatePostRequest {
        title: form.text("title").unwrap_or_default(),
        short_description: form.text("shortDescription").unwrap_or_default(),
        content: form.text("content").unwrap_or_default(),
    };
    let image = form.file("image");

    match blog_service.create_post(&user.0, req, image).await {
        Ok(post) => created("Post successfully created.", post),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_post(
    user: CurrentUser,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
    payload: Multipart,
) -> impl Responder {
    let post_id = path.into_inner();

    let mut form = match read_form(payload).await {
        Ok(form) => form,
        Err(err) => return error_to_response(err),
    };

    let req = UpdatePostRequest {
        title: form.text("title"),
        short_description: form.text("shortDescription"),
        content: form.text("content"),
    };
    let image = form.file("image");

    match blog_service.update_post(post_id, user.0.id, req, image).await {
        Ok(post) => ok("Post updated successfully", post),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_post(
    user: CurrentUser,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match blog_service.delete_post(path.into_inner(), user.0.id).await {
        Ok(()) => ok_message("Post deleted successfully..."),
        Err(err) => error_to_response(err),
    }
}
