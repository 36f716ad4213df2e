use crate::error::ClientError;
use crate::models::{
    ApiEnvelope, CommentResponse, CreateCommentRequest, LoginRequest, LoginResponse,
    PostListResponse, PostResponse, ProfileResponse, RegisterRequest, UserResponse, UserWithPosts,
    VerifyResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Form for creating a post; the image is read from disk at send time.
#[derive(Debug, Clone, Default)]
pub struct NewPostForm {
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub image: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePostForm {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub content: Option<String>,
    pub image: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateForm {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_image: Option<PathBuf>,
    pub cover_image: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn add_auth_header(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    // ============== Auth ==============

    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, ClientError> {
        tracing::debug!("Registering user: {}", req.username);

        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&req)
            .send()
            .await?;

        let envelope: ApiEnvelope<UserResponse> = check(response).await?.json().await?;
        unwrap_data(envelope)
    }

    /// Logs in and keeps the returned token for subsequent requests.
    pub async fn login(&mut self, req: LoginRequest) -> Result<LoginResponse, ClientError> {
        tracing::debug!("Logging in as: {}", req.email_or_username);

        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&req)
            .send()
            .await?;

        let login: LoginResponse = check(response).await?.json().await?;
        self.set_token(login.token.clone());
        Ok(login)
    }

    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let response = self
            .add_auth_header(self.client.post(self.url("/api/auth/logout")))
            .send()
            .await?;
        check(response).await?;
        self.clear_token();
        Ok(())
    }

    pub async fn verify(&self) -> Result<UserResponse, ClientError> {
        let response = self
            .add_auth_header(self.client.get(self.url("/api/auth/verify")))
            .send()
            .await?;

        let verify: VerifyResponse = check(response).await?.json().await?;
        Ok(verify.user)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        update: ProfileUpdateForm,
    ) -> Result<UserResponse, ClientError> {
        let mut form = Form::new();
        if let Some(username) = update.username {
            form = form.text("username", username);
        }
        if let Some(full_name) = update.full_name {
            form = form.text("fullName", full_name);
        }
        if let Some(email) = update.email {
            form = form.text("email", email);
        }
        if let Some(password) = update.password {
            form = form.text("password", password);
        }
        if let Some(path) = update.profile_image {
            form = form.part("profileImage", file_part(&path).await?);
        }
        if let Some(path) = update.cover_image {
            form = form.part("coverImage", file_part(&path).await?);
        }

        let response = self
            .add_auth_header(
                self.client
                    .put(self.url(&format!("/api/auth/update/{}", user_id))),
            )
            .multipart(form)
            .send()
            .await?;

        let profile: ProfileResponse = check(response).await?.json().await?;
        Ok(profile.user)
    }

    pub async fn get_user_info(&self, user_id: i64) -> Result<UserWithPosts, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/auth/user/{}", user_id)))
            .send()
            .await?;

        let envelope: ApiEnvelope<UserWithPosts> = check(response).await?.json().await?;
        unwrap_data(envelope)
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ClientError> {
        let response = self
            .add_auth_header(self.client.get(self.url("/api/auth")))
            .send()
            .await?;

        let envelope: ApiEnvelope<Vec<UserResponse>> = check(response).await?.json().await?;
        unwrap_data(envelope)
    }

    // ============== Posts ==============

    pub async fn list_posts(&self, page: Option<i64>) -> Result<PostListResponse, ClientError> {
        let url = match page {
            Some(page) => self.url(&format!("/api/posts?page={}", page)),
            None => self.url("/api/posts"),
        };

        let response = self.client.get(url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn get_post(&self, id: i64) -> Result<PostResponse, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/posts/{}", id)))
            .send()
            .await?;

        let envelope: ApiEnvelope<PostResponse> = check(response).await?.json().await?;
        unwrap_data(envelope)
    }

    pub async fn create_post(&self, post: NewPostForm) -> Result<PostResponse, ClientError> {
        let mut form = Form::new()
            .text("title", post.title)
            .text("shortDescription", post.short_description)
            .text("content", post.content);
        if let Some(path) = post.image {
            form = form.part("image", file_part(&path).await?);
        }

        let response = self
            .add_auth_header(self.client.post(self.url("/api/posts")))
            .multipart(form)
            .send()
            .await?;

        let envelope: ApiEnvelope<PostResponse> = check(response).await?.json().await?;
        unwrap_data(envelope)
    }

    pub async fn update_post(
        &self,
        id: i64,
        update: UpdatePostForm,
    ) -> Result<PostResponse, ClientError> {
        let mut form = Form::new();
        if let Some(title) = update.title {
            form = form.text("title", title);
        }
        if let Some(short_description) = update.short_description {
            form = form.text("shortDescription", short_description);
        }
        if let Some(content) = update.content {
            form = form.text("content", content);
        }
        if let Some(path) = update.image {
            form = form.part("image", file_part(&path).await?);
        }

        let response = self
            .add_auth_header(self.client.put(self.url(&format!("/api/posts/{}", id))))
            .multipart(form)
            .send()
            .await?;

        let envelope: ApiEnvelope<PostResponse> = check(response).await?.json().await?;
        unwrap_data(envelope)
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .add_auth_header(self.client.delete(self.url(&format!("/api/posts/{}", id))))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    // ============== Comments ==============

    pub async fn add_comment(
        &self,
        post_id: i64,
        comment: impl Into<String>,
    ) -> Result<CommentResponse, ClientError> {
        let response = self
            .add_auth_header(
                self.client
                    .post(self.url(&format!("/api/comment/{}", post_id))),
            )
            .json(&CreateCommentRequest {
                comment: comment.into(),
            })
            .send()
            .await?;

        let envelope: ApiEnvelope<CommentResponse> = check(response).await?.json().await?;
        unwrap_data(envelope)
    }

    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentResponse>, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/comment/{}", post_id)))
            .send()
            .await?;

        let envelope: ApiEnvelope<Vec<CommentResponse>> = check(response).await?.json().await?;
        unwrap_data(envelope)
    }

    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), ClientError> {
        let response = self
            .add_auth_header(
                self.client
                    .delete(self.url(&format!("/api/comment/{}", comment_id))),
            )
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

async fn file_part(path: &Path) -> Result<Part, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}

/// Maps non-success statuses onto typed errors, pulling the message out of
/// the response envelope when there is one.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = error_message(response).await;
    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::CONFLICT => ClientError::Conflict(message),
        StatusCode::BAD_REQUEST => ClientError::InvalidRequest(message),
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

async fn error_message(response: reqwest::Response) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    let raw = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&raw)
        .map(|body| body.message)
        .unwrap_or(raw)
}

fn unwrap_data<T>(envelope: ApiEnvelope<T>) -> Result<T, ClientError> {
    envelope.data.ok_or(ClientError::Api {
        status: envelope.status,
        message: envelope.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining_handles_slashes() {
        let client = HttpClient::new("http://localhost:3000/");
        assert_eq!(
            client.url("/api/posts"),
            "http://localhost:3000/api/posts"
        );
        assert_eq!(client.url("api/posts"), "http://localhost:3000/api/posts");
    }

    #[test]
    fn envelope_decodes_server_json() {
        let raw = r#"{
            "status": 200,
            "message": "Post fetched successfully",
            "data": {
                "id": 7,
                "title": "A valid title",
                "shortDescription": "Twenty characters of description",
                "content": "body",
                "author": {
                    "id": 1,
                    "username": "anna",
                    "fullName": "Anna Schmidt",
                    "email": "anna@example.com",
                    "profilePic": null
                },
                "image": null,
                "views": 3,
                "createdAt": "2026-01-01T00:00:00Z",
                "updatedAt": "2026-01-01T00:00:00Z"
            }
        }"#;

        let envelope: ApiEnvelope<PostResponse> = serde_json::from_str(raw).unwrap();
        let post = unwrap_data(envelope).unwrap();
        assert_eq!(post.id, 7);
        assert_eq!(post.author.username, "anna");
        assert_eq!(post.views, 3);
    }

    #[test]
    fn envelope_without_data_is_an_api_error() {
        let raw = r#"{ "status": 500, "message": "Server Error" }"#;
        let envelope: ApiEnvelope<PostResponse> = serde_json::from_str(raw).unwrap();
        let err = unwrap_data(envelope).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 500, .. }));
    }
}
