use crate::application::AuthService;
use crate::domain::post::PostResponse;
use crate::domain::user::{LoginUserRequest, ProfileUpdate, RegisterUserRequest, UserResponse};
use crate::presentation::middleware::{CurrentUser, ACCESS_TOKEN_COOKIE};
use crate::presentation::multipart::read_form;
use crate::presentation::response::{created, error_to_response, ok};
use actix_multipart::Multipart;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

// Тело ответа на логин: конверт плюс токен
#[derive(serde::Serialize)]
struct LoginResponse {
    status: u16,
    message: String,
    data: UserResponse,
    token: String,
}

#[derive(serde::Serialize)]
struct UserWithPosts {
    #[serde(flatten)]
    user: UserResponse,
    posts: Vec<PostResponse>,
}

fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build(ACCESS_TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .finish()
}

// ============== Auth Handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<RegisterUserRequest>,
) -> impl Responder {
    match auth_service.register(req.into_inner()).await {
        Ok(user) => created("User successfully registered.", user),
        Err(err) => error_to_response(err),
    }
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<LoginUserRequest>,
) -> impl Responder {
    match auth_service.login(req.into_inner()).await {
        Ok((token, user)) => HttpResponse::Ok()
            .cookie(auth_cookie(token.clone()))
            .json(LoginResponse {
                status: 200,
                message: "User successfully logged in.".to_string(),
                data: user,
                token,
            }),
        Err(err) => error_to_response(err),
    }
}

pub async fn logout(_user: CurrentUser) -> impl Responder {
    let mut cookie = auth_cookie(String::new());
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({ "status": 200, "message": "User logout successfully." }))
}

/// The middleware has already checked the token and resolved the user;
/// all that is left is to echo the record back.
pub async fn verify(user: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": 200,
        "message": "Token is valid",
        "user": UserResponse::from(user.0),
    }))
}

pub async fn update_profile(
    user: CurrentUser,
    auth_service: web::Data<Arc<AuthService>>,
    path: web::Path<i64>,
    payload: Multipart,
) -> impl Responder {
    let target_id = path.into_inner();

    let mut form = match read_form(payload).await {
        Ok(form) => form,
        Err(err) => return error_to_response(err),
    };

    let update = ProfileUpdate {
        username: form.text("username"),
        full_name: form.text("fullName"),
        email: form.text("email"),
        password: form.text("password"),
        profile_image: form.file("profileImage"),
        cover_image: form.file("coverImage"),
    };

    match auth_service.update_profile(&user.0, target_id, update).await {
        Ok(updated) => HttpResponse::Ok().json(serde_json::json!({
            "status": 200,
            "message": "User updated successfully",
            "user": updated,
        })),
        Err(err) => error_to_response(err),
    }
}

pub async fn get_user_info(
    auth_service: web::Data<Arc<AuthService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match auth_service.get_user_info(path.into_inner()).await {
        Ok((user, posts)) => ok("User found", UserWithPosts { user, posts }),
        Err(err) => error_to_response(err),
    }
}

pub async fn list_users(
    _user: CurrentUser,
    auth_service: web::Data<Arc<AuthService>>,
) -> impl Responder {
    match auth_service.list_users().await {
        Ok(users) => ok("All User Data", users),
        Err(err) => error_to_response(err),
    }
}
