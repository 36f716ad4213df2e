use anyhow::{Context, Result};

/// Runtime configuration, collected from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
    pub cors_allowed_origins: String,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_port: env_or("HTTP_PORT", "3000")
                .parse()
                .context("HTTP_PORT must be a number")?,
            database_url: required("DATABASE_URL")?,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", "5")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            jwt_secret: required("JWT_SECRET")?,
            token_expiry_hours: env_or("TOKEN_EXPIRY_HOURS", "24")
                .parse()
                .context("TOKEN_EXPIRY_HOURS must be a number")?,
            // Разрешенные CORS домены, через запятую
            cors_allowed_origins: env_or(
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:8000,http://127.0.0.1:8000",
            ),
            cloudinary: CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
            },
        })
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{} must be set", name))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
