//! Typed HTTP client for the inkpost blog API.

pub mod error;
pub mod http_client;
pub mod models;

pub use error::ClientError;
pub use http_client::{HttpClient, NewPostForm, ProfileUpdateForm, UpdatePostForm};
