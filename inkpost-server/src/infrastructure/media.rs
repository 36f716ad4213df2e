use async_trait::async_trait;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::time::Duration;

use crate::domain::DomainError;
use crate::infrastructure::config::CloudinaryConfig;

/// An image received from a client, ready to be pushed to the media host.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful upload: the public URL stored on records and the
/// host-side identifier needed to delete the image later.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait MediaRelay: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, DomainError>;
    async fn delete(&self, public_id: &str) -> Result<(), DomainError>;
}

/// Derives the host-side identifier from a stored public URL: the last path
/// segment minus its extension.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let last = url.rsplit('/').next()?;
    let stem = last.split('.').next().unwrap_or(last);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct UploadApiResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyApiResponse {
    result: String,
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.cloud_name, action
        )
    }

    /// Cloudinary request signature: parameters sorted by name, joined with
    /// `&`, the API secret appended, SHA-1 over the whole string, hex-encoded.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut pairs: Vec<String> = params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        pairs.sort();

        let mut hasher = Sha1::new();
        hasher.update(pairs.join("&").as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaRelay for CloudinaryClient {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, DomainError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("timestamp", timestamp.as_str())]);

        let part = reqwest::multipart::Part::bytes(image.bytes).file_name(image.file_name.clone());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DomainError::MediaError(format!("upload request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Media upload failed with HTTP {}: {}", status, body);
            return Err(DomainError::MediaError(format!(
                "upload rejected with HTTP {}",
                status
            )));
        }

        let body: UploadApiResponse = response
            .json()
            .await
            .map_err(|e| DomainError::MediaError(format!("unexpected upload response: {}", e)))?;

        tracing::info!(
            "Uploaded image '{}' as {}",
            image.file_name,
            body.public_id
        );

        Ok(StoredImage {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), DomainError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", timestamp.as_str())]);

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DomainError::MediaError(format!("destroy request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::MediaError(format!(
                "destroy rejected with HTTP {}",
                status
            )));
        }

        let body: DestroyApiResponse = response
            .json()
            .await
            .map_err(|e| DomainError::MediaError(format!("unexpected destroy response: {}", e)))?;

        // "not found" is fine here: the record no longer points at the image
        // either way.
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(DomainError::MediaError(format!(
                "destroy returned '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(&CloudinaryConfig {
            cloud_name: "testcloud".to_string(),
            api_key: "key".to_string(),
            api_secret: "testsecret".to_string(),
        })
    }

    #[test]
    fn signature_matches_known_vector() {
        let c = client();
        assert_eq!(
            c.sign(&[("timestamp", "1700000000")]),
            "1e22a40ce74a5004041873f5fbd750e3639ecd9f"
        );
    }

    #[test]
    fn signature_sorts_parameters_by_name() {
        let c = client();
        let expected = "c7e835b81e4b7d2e9ea7202b71f9504d69462978";
        // Same signature regardless of argument order.
        assert_eq!(
            c.sign(&[("timestamp", "1700000000"), ("public_id", "covers/a1b2c3")]),
            expected
        );
        assert_eq!(
            c.sign(&[("public_id", "covers/a1b2c3"), ("timestamp", "1700000000")]),
            expected
        );
    }

    #[test]
    fn public_id_derived_from_url_path() {
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/v17/abc123.png"),
            Some("abc123".to_string())
        );
        assert_eq!(
            public_id_from_url("https://res.cloudinary.com/demo/image/upload/v17/abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(public_id_from_url("https://host/"), None);
    }
}
