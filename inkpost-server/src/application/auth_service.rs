use crate::data::post_repository::PostRepository;
use crate::data::user_repository::{UserChanges, UserRepository};
use crate::domain::post::{AuthorSnapshot, PostResponse};
use crate::domain::user::{LoginUserRequest, ProfileUpdate, RegisterUserRequest, UserResponse};
use crate::domain::{DomainError, User};
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::media::{public_id_from_url, MediaRelay};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    post_repo: Arc<dyn PostRepository>,
    jwt_service: Arc<JwtService>,
    media: Arc<dyn MediaRelay>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        post_repo: Arc<dyn PostRepository>,
        jwt_service: Arc<JwtService>,
        media: Arc<dyn MediaRelay>,
    ) -> Self {
        Self {
            user_repo,
            post_repo,
            jwt_service,
            media,
        }
    }

    pub async fn register(&self, req: RegisterUserRequest) -> Result<UserResponse, DomainError> {
        if [&req.full_name, &req.username, &req.email, &req.password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(DomainError::ValidationError(
                "All fields are required.".to_string(),
            ));
        }

        let req = RegisterUserRequest {
            username: req.username.trim().to_lowercase(),
            email: req.email.trim().to_string(),
            ..req
        };

        // Check both identities up front so the caller gets a 409 rather
        // than a unique-constraint error from the store.
        if self.user_repo.find_by_username(&req.username).await.is_ok() {
            tracing::warn!("Registration failed: username '{}' taken", req.username);
            return Err(DomainError::UserAlreadyExists);
        }
        if self.user_repo.find_by_email(&req.email).await.is_ok() {
            tracing::warn!("Registration failed: email already registered");
            return Err(DomainError::UserAlreadyExists);
        }

        let password_hash = hash_password(&req.password)?;

        let user = self.user_repo.create(req, password_hash).await?;

        tracing::info!(
            "User registered successfully: id={}, username={}",
            user.id,
            user.username
        );

        Ok(UserResponse::from(user))
    }

    pub async fn login(
        &self,
        req: LoginUserRequest,
    ) -> Result<(String, UserResponse), DomainError> {
        if req.email_or_username.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Email or Username must required".to_string(),
            ));
        }

        // Unknown identifier and wrong password produce the same error, so
        // a caller cannot probe which accounts exist.
        let user = match self
            .user_repo
            .find_by_identifier(req.email_or_username.trim())
            .await
        {
            Ok(user) => user,
            Err(DomainError::UserNotFound) => return Err(DomainError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        verify_password(&req.password, &user.password_hash)?;

        let token = self
            .jwt_service
            .generate_token(user.id, user.username.clone())?;

        tracing::info!(
            "User logged in successfully: id={}, username={}",
            user.id,
            user.username
        );

        Ok((token, UserResponse::from(user)))
    }

    pub async fn update_profile(
        &self,
        current: &User,
        target_id: i64,
        update: ProfileUpdate,
    ) -> Result<UserResponse, DomainError> {
        if current.id != target_id {
            tracing::warn!(
                "User {} attempted to update profile of user {}",
                current.id,
                target_id
            );
            return Err(DomainError::Forbidden);
        }

        let mut changes = UserChanges {
            username: update
                .username
                .map(|u| u.trim().to_lowercase())
                .filter(|u| !u.is_empty()),
            full_name: update.full_name.filter(|f| !f.trim().is_empty()),
            email: update.email.filter(|e| !e.trim().is_empty()),
            password_hash: None,
            profile_pic: None,
            cover_image: None,
        };

        if let Some(password) = update.password.filter(|p| !p.trim().is_empty()) {
            changes.password_hash = Some(hash_password(&password)?);
        }

        if let Some(image) = update.profile_image {
            self.discard_prior_image(current.profile_pic.as_deref()).await;
            let stored = self.media.upload(image).await?;
            changes.profile_pic = Some(stored.url);
        }

        if let Some(image) = update.cover_image {
            self.discard_prior_image(current.cover_image.as_deref()).await;
            let stored = self.media.upload(image).await?;
            changes.cover_image = Some(stored.url);
        }

        let user = self.user_repo.update(target_id, changes).await?;

        // Posts carry a denormalized copy of the author fields; push the
        // fresh values out so listings don't go stale.
        let touched = self
            .post_repo
            .sync_author_snapshot(&AuthorSnapshot::from(&user))
            .await?;
        if touched > 0 {
            tracing::info!("Re-synced author snapshot on {} post(s)", touched);
        }

        tracing::info!("User updated successfully: id={}", user.id);

        Ok(UserResponse::from(user))
    }

    pub async fn get_user_info(
        &self,
        id: i64,
    ) -> Result<(UserResponse, Vec<PostResponse>), DomainError> {
        let user = self.user_repo.find_by_id(id).await?;
        let posts = self.post_repo.find_by_author(id).await?;

        Ok((
            UserResponse::from(user),
            posts.into_iter().map(PostResponse::from).collect(),
        ))
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, DomainError> {
        let users = self.user_repo.list_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Deletes a replaced image from the media host. Failures are logged
    /// and swallowed: the record update must not hinge on remote cleanup.
    async fn discard_prior_image(&self, url: Option<&str>) {
        let Some(public_id) = url.and_then(public_id_from_url) else {
            return;
        };
        if let Err(e) = self.media.delete(&public_id).await {
            tracing::warn!("Failed to delete prior image '{}': {}", public_id, e);
        }
    }
}

fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            DomainError::InternalError(format!("Password hashing failed: {}", e))
        })
}

fn verify_password(password: &str, stored_hash: &str) -> Result<(), DomainError> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
        tracing::error!("Invalid password hash format: {}", e);
        DomainError::InternalError(format!("Invalid password hash: {}", e))
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| DomainError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mock::{InMemoryPostRepository, InMemoryUserRepository, RecordingMediaRelay};
    use crate::data::post_repository::NewPost;
    use crate::infrastructure::media::ImageUpload;

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        posts: Arc<InMemoryPostRepository>,
        media: Arc<RecordingMediaRelay>,
        service: AuthService,
    }

    fn fixture() -> Fixture {
        fixture_with_media(RecordingMediaRelay::new())
    }

    fn fixture_with_media(media: RecordingMediaRelay) -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new());
        let media = Arc::new(media);
        let jwt = Arc::new(JwtService::new("secret-key-for-tests-0123456789abcd", 24).unwrap());
        let service = AuthService::new(users.clone(), posts.clone(), jwt, media.clone());
        Fixture {
            users,
            posts,
            media,
            service,
        }
    }

    fn register_request(username: &str, email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            full_name: "Anna Schmidt".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: "hunter2hunter2".to_string(),
        }
    }

    fn image(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn register_rejects_blank_fields() {
        let fx = fixture();
        let mut req = register_request("anna", "anna@example.com");
        req.password = "   ".to_string();
        assert!(matches!(
            fx.service.register(req).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username_and_email() {
        let fx = fixture();
        fx.service
            .register(register_request("anna", "anna@example.com"))
            .await
            .unwrap();

        let dup_username = fx
            .service
            .register(register_request("anna", "other@example.com"))
            .await;
        assert!(matches!(dup_username, Err(DomainError::UserAlreadyExists)));

        let dup_email = fx
            .service
            .register(register_request("other", "anna@example.com"))
            .await;
        assert!(matches!(dup_email, Err(DomainError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn register_lowercases_username_and_hashes_password() {
        let fx = fixture();
        let created = fx
            .service
            .register(register_request("AnNa", "anna@example.com"))
            .await
            .unwrap();
        assert_eq!(created.username, "anna");

        let stored = fx.users.find_by_username("anna").await.unwrap();
        assert_ne!(stored.password_hash, "hunter2hunter2");
        assert!(verify_password("hunter2hunter2", &stored.password_hash).is_ok());
    }

    #[tokio::test]
    async fn login_resolves_username_or_email() {
        let fx = fixture();
        fx.service
            .register(register_request("anna", "anna@example.com"))
            .await
            .unwrap();

        let by_username = fx
            .service
            .login(LoginUserRequest {
                email_or_username: "anna".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap();
        assert!(!by_username.0.is_empty());

        let by_email = fx
            .service
            .login(LoginUserRequest {
                email_or_username: "anna@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(by_email.1.id, by_username.1.id);
    }

    #[tokio::test]
    async fn login_failure_is_uniform_for_identifier_and_password() {
        let fx = fixture();
        fx.service
            .register(register_request("anna", "anna@example.com"))
            .await
            .unwrap();

        let unknown = fx
            .service
            .login(LoginUserRequest {
                email_or_username: "nobody".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await;
        let wrong_password = fx
            .service
            .login(LoginUserRequest {
                email_or_username: "anna".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;

        assert!(matches!(unknown, Err(DomainError::InvalidCredentials)));
        assert!(matches!(
            wrong_password,
            Err(DomainError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn update_profile_is_owner_only() {
        let fx = fixture();
        fx.service
            .register(register_request("anna", "anna@example.com"))
            .await
            .unwrap();
        let anna = fx.users.find_by_username("anna").await.unwrap();

        let result = fx
            .service
            .update_profile(&anna, anna.id + 1, ProfileUpdate::default())
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden)));
    }

    #[tokio::test]
    async fn update_profile_replaces_image_and_deletes_prior() {
        let fx = fixture();
        fx.service
            .register(register_request("anna", "anna@example.com"))
            .await
            .unwrap();
        let anna = fx.users.find_by_username("anna").await.unwrap();

        let first = ProfileUpdate {
            profile_image: Some(image("first.png")),
            ..ProfileUpdate::default()
        };
        let updated = fx
            .service
            .update_profile(&anna, anna.id, first)
            .await
            .unwrap();
        assert_eq!(
            updated.profile_pic.as_deref(),
            Some("https://media.test/uploads/first.png")
        );
        assert!(fx.media.deleted_ids().is_empty());

        let anna = fx.users.find_by_username("anna").await.unwrap();
        let second = ProfileUpdate {
            profile_image: Some(image("second.png")),
            ..ProfileUpdate::default()
        };
        let updated = fx
            .service
            .update_profile(&anna, anna.id, second)
            .await
            .unwrap();
        assert_eq!(
            updated.profile_pic.as_deref(),
            Some("https://media.test/uploads/second.png")
        );
        assert_eq!(fx.media.deleted_ids(), vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn update_profile_survives_media_delete_failure() {
        let fx = fixture_with_media(RecordingMediaRelay::failing_deletes());
        fx.service
            .register(register_request("anna", "anna@example.com"))
            .await
            .unwrap();
        let anna = fx.users.find_by_username("anna").await.unwrap();

        fx.service
            .update_profile(
                &anna,
                anna.id,
                ProfileUpdate {
                    profile_image: Some(image("first.png")),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();

        let anna = fx.users.find_by_username("anna").await.unwrap();
        let updated = fx
            .service
            .update_profile(
                &anna,
                anna.id,
                ProfileUpdate {
                    profile_image: Some(image("second.png")),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            updated.profile_pic.as_deref(),
            Some("https://media.test/uploads/second.png")
        );
    }

    #[tokio::test]
    async fn update_profile_resyncs_author_snapshot_on_posts() {
        let fx = fixture();
        fx.service
            .register(register_request("anna", "anna@example.com"))
            .await
            .unwrap();
        let anna = fx.users.find_by_username("anna").await.unwrap();

        fx.posts
            .create(NewPost {
                title: "A post about nothing".to_string(),
                short_description: "Twenty characters of description".to_string(),
                content: "c".repeat(60),
                author: AuthorSnapshot::from(&anna),
                image: None,
            })
            .await
            .unwrap();

        fx.service
            .update_profile(
                &anna,
                anna.id,
                ProfileUpdate {
                    full_name: Some("Anna K. Schmidt".to_string()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();

        let posts = fx.posts.find_by_author(anna.id).await.unwrap();
        assert_eq!(posts[0].author.full_name, "Anna K. Schmidt");
    }
}
