pub mod auth_handlers;
pub mod comment_handlers;
pub mod middleware;
pub mod multipart;
pub mod post_handlers;
pub mod response;


use actix_web::web;
use std::sync::Arc;

use crate::application::{AuthService, BlogService, CommentService};
use crate::data::user_repository::UserRepository;
use crate::infrastructure::jwt::JwtService;
use middleware::JwtAuth;

/// Handles wired into the actix `App`. `main` and the handler tests build
/// the same routing table through [`AppContext::configure`].
#[derive(Clone)]
pub struct AppContext {
    pub auth_service: Arc<AuthService>,
    pub blog_service: Arc<BlogService>,
    pub comment_service: Arc<CommentService>,
    pub jwt_service: Arc<JwtService>,
    pub user_repo: Arc<dyn UserRepository>,
}

impl AppContext {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        let auth = || JwtAuth::new(self.jwt_service.clone(), self.user_repo.clone());

        cfg.app_data(web::JsonConfig::default().limit(16 * 1024))
            .app_data(web::Data::new(self.auth_service.clone()))
            .app_data(web::Data::new(self.blog_service.clone()))
            .app_data(web::Data::new(self.comment_service.clone()))
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(auth_handlers::register))
                    .route("/login", web::post().to(auth_handlers::login))
                    .route("/user/{id}", web::get().to(auth_handlers::get_user_info))
                    // Secured routes
                    .service(
                        web::scope("")
                            .wrap(auth())
                            .route("/verify", web::get().to(auth_handlers::verify))
                            .route("/logout", web::post().to(auth_handlers::logout))
                            .route(
                                "/update/{user_id}",
                                web::put().to(auth_handlers::update_profile),
                            )
                            .route("", web::get().to(auth_handlers::list_users)),
                    ),
            )
            .service(
                web::scope("/api/posts")
                    .route("", web::get().to(post_handlers::list_posts))
                    .route("/{id}", web::get().to(post_handlers::get_post))
                    // Secured routes
                    .service(
                        web::scope("")
                            .wrap(auth())
                            .route("", web::post().to(post_handlers::create_post))
                            .route("/{id}", web::put().to(post_handlers::update_post))
                            .route("/{id}", web::delete().to(post_handlers::delete_post)),
                    ),
            )
            .service(
                web::scope("/api/comment")
                    .route("/{post_id}", web::get().to(comment_handlers::list_comments))
                    // Secured routes
                    .service(
                        web::scope("")
                            .wrap(auth())
                            .route("/{post_id}", web::post().to(comment_handlers::add_comment))
                            .route(
                                "/{comment_id}",
                                web::delete().to(comment_handlers::delete_comment),
                            ),
                    ),
            );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::AppContext;
    use crate::application::{AuthService, BlogService, CommentService};
    use crate::data::mock::{
        InMemoryCommentRepository, InMemoryPostRepository, InMemoryUserRepository,
        RecordingMediaRelay,
    };
    use crate::data::user_repository::UserRepository;
    use crate::domain::user::RegisterUserRequest;
    use crate::domain::User;
    use crate::infrastructure::jwt::JwtService;
    use std::sync::Arc;

    pub struct TestHarness {
        pub ctx: AppContext,
        pub users: Arc<InMemoryUserRepository>,
        pub posts: Arc<InMemoryPostRepository>,
        pub comments: Arc<InMemoryCommentRepository>,
        pub media: Arc<RecordingMediaRelay>,
    }

    pub fn harness() -> TestHarness {
        let users = Arc::new(InMemoryUserRepository::new());
        let posts = Arc::new(InMemoryPostRepository::new());
        let comments = Arc::new(InMemoryCommentRepository::new());
        let media = Arc::new(RecordingMediaRelay::new());
        let jwt = Arc::new(JwtService::new("handler-test-secret-0123456789abcdef", 24).unwrap());

        let ctx = AppContext {
            auth_service: Arc::new(AuthService::new(
                users.clone(),
                posts.clone(),
                jwt.clone(),
                media.clone(),
            )),
            blog_service: Arc::new(BlogService::new(posts.clone(), media.clone())),
            comment_service: Arc::new(CommentService::new(comments.clone(), posts.clone())),
            jwt_service: jwt,
            user_repo: users.clone(),
        };

        TestHarness {
            ctx,
            users,
            posts,
            comments,
            media,
        }
    }

    impl TestHarness {
        /// Registers through the service layer and returns the stored record.
        pub async fn register(&self, username: &str) -> User {
            self.ctx
                .auth_service
                .register(RegisterUserRequest {
                    full_name: "Anna Schmidt".to_string(),
                    username: username.to_string(),
                    email: format!("{}@example.com", username),
                    password: "hunter2hunter2".to_string(),
                })
                .await
                .unwrap();
            self.users.find_by_username(username).await.unwrap()
        }

        pub fn token_for(&self, user: &User) -> String {
            self.ctx
                .jwt_service
                .generate_token(user.id, user.username.clone())
                .unwrap()
        }
    }

    /// Builds a multipart/form-data body; returns (content-type, body).
    pub fn multipart_body(
        boundary: &str,
        texts: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> (String, Vec<u8>) {
        let mut body = Vec::new();
        for (name, value) in texts {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, file_name, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        (format!("multipart/form-data; boundary={boundary}"), body)
    }
}
