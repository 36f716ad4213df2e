use dotenvy::dotenv;
use std::sync::Arc;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use application::{AuthService, BlogService, CommentService};
use data::{
    comment_repository::PostgresCommentRepository, post_repository::PostgresPostRepository,
    user_repository::PostgresUserRepository,
};
use infrastructure::{
    config::Config,
    database::{create_pool, run_migrations},
    jwt::JwtService,
    logging::init_logging,
    media::CloudinaryClient,
};
use presentation::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    init_logging();

    let config = Config::from_env()?;

    let http_addr = format!("0.0.0.0:{}", config.http_port);

    tracing::info!("Starting inkpost server...");
    tracing::info!("HTTP server will listen on {}", http_addr);
    tracing::info!("CORS allowed origins: {}", config.cors_allowed_origins);

    // Initialize database connection pool. A connection failure here is
    // fatal: the process exits through the error return.
    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await?;
    tracing::info!("Migrations completed successfully");

    // Initialize services
    tracing::info!("Initializing services...");

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt_secret,
        config.token_expiry_hours,
    )?);

    let media = Arc::new(CloudinaryClient::new(&config.cloudinary));

    // Repositories
    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));
    let comment_repo = Arc::new(PostgresCommentRepository::new(pool.clone()));

    // Application services
    let ctx = AppContext {
        auth_service: Arc::new(AuthService::new(
            user_repo.clone(),
            post_repo.clone(),
            jwt_service.clone(),
            media.clone(),
        )),
        blog_service: Arc::new(BlogService::new(post_repo.clone(), media.clone())),
        comment_service: Arc::new(CommentService::new(comment_repo, post_repo)),
        jwt_service,
        user_repo,
    };

    tracing::info!("Services initialized successfully");

    run_http_server(http_addr, ctx, config.cors_allowed_origins).await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Configure CORS for the HTTP server with allowed origins from .env
fn configure_cors(allowed_origins: &str) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let origins: Vec<&str> = allowed_origins.split(',').map(|s| s.trim()).collect();

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        // Cookie-based sessions need credentialed requests
        .supports_credentials()
        .max_age(3600);

    // Добавляем каждый разрешенный домен
    for origin in origins {
        if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
            tracing::debug!("Added allowed CORS origin: {}", origin);
        }
    }

    cors
}

async fn run_http_server(
    addr: String,
    ctx: AppContext,
    cors_allowed_origins: String,
) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, App, HttpServer};

    tracing::info!("Configuring HTTP server...");

    let server = HttpServer::new(move || {
        let ctx = ctx.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&cors_allowed_origins))
            .configure(move |cfg| ctx.configure(cfg))
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}
