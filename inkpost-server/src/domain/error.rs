use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("Duplicate not allowed")]
    UserAlreadyExists,

    #[error("Wrong credentials")]
    InvalidCredentials,

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Forbidden: you don't have permission to perform this action")]
    Forbidden,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Media host error: {0}")]
    MediaError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn to_status_code(&self) -> u16 {
        match self {
            Self::UserNotFound | Self::PostNotFound | Self::CommentNotFound => 404,
            Self::UserAlreadyExists => 409,
            Self::InvalidCredentials | Self::Unauthorized(_) => 401,
            Self::Forbidden => 403,
            Self::ValidationError(_) => 400,
            Self::DatabaseError(_) | Self::MediaError(_) | Self::InternalError(_) => 500,
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_classes() {
        assert_eq!(DomainError::UserAlreadyExists.to_status_code(), 409);
        assert_eq!(DomainError::InvalidCredentials.to_status_code(), 401);
        assert_eq!(DomainError::Forbidden.to_status_code(), 403);
        assert_eq!(DomainError::PostNotFound.to_status_code(), 404);
        assert_eq!(DomainError::CommentNotFound.to_status_code(), 404);
        assert_eq!(
            DomainError::ValidationError("bad".into()).to_status_code(),
            400
        );
        assert_eq!(DomainError::MediaError("down".into()).to_status_code(), 500);
    }
}
