//! Wire types for the inkpost HTTP API. Field names follow the JSON the
//! server emits, hence the camelCase renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard response envelope: `status` mirrors the HTTP status line.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: u16,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub profile_pic: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSnapshot {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub profile_pic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub author: AuthorSnapshot,
    pub image: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub comment: String,
    pub post_id: i64,
    pub commented_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub status: u16,
    pub message: String,
    pub data: UserResponse,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub status: u16,
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub status: u16,
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostListResponse {
    pub status: u16,
    pub message: String,
    pub data: Vec<PostResponse>,
    pub total: i64,
    pub page: i64,
}

/// User record plus their posts, as returned by `GET /api/auth/user/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserWithPosts {
    #[serde(flatten)]
    pub user: UserResponse,
    pub posts: Vec<PostResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_or_username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentRequest {
    pub comment: String,
}
