use actix_multipart::Multipart;
use futures_util::StreamExt;
use std::collections::HashMap;

use crate::domain::DomainError;
use crate::infrastructure::media::ImageUpload;

/// Per-file cap; matches what the media host accepts on the free tier.
const MAX_FILE_BYTES: usize = 8 * 1024 * 1024;
/// Text fields share the limit of the JSON body.
const MAX_TEXT_BYTES: usize = 16 * 1024;

/// A fully-read multipart form: text fields by name plus uploaded files.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, ImageUpload>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Takes a file out of the form, leaving nothing to re-read.
    pub fn file(&mut self, name: &str) -> Option<ImageUpload> {
        self.files.remove(name)
    }
}

/// Drains a multipart payload into memory, enforcing per-field size limits.
/// Parts without a filename are decoded as UTF-8 text fields.
pub async fn read_form(mut payload: Multipart) -> Result<UploadForm, DomainError> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            DomainError::ValidationError(format!("Malformed multipart payload: {}", e))
        })?;

        let (name, file_name) = {
            let Some(cd) = field.content_disposition() else {
                continue;
            };
            let Some(name) = cd.get_name().map(ToOwned::to_owned) else {
                continue;
            };
            (name, cd.get_filename().map(ToOwned::to_owned))
        };

        let limit = if file_name.is_some() {
            MAX_FILE_BYTES
        } else {
            MAX_TEXT_BYTES
        };

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                DomainError::ValidationError(format!(
                    "Failed to read multipart field '{}': {}",
                    name, e
                ))
            })?;
            if bytes.len() + chunk.len() > limit {
                return Err(DomainError::ValidationError(format!(
                    "Field '{}' exceeds the size limit",
                    name
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match file_name {
            Some(file_name) if !file_name.is_empty() => {
                form.files.insert(name, ImageUpload { file_name, bytes });
            }
            _ => {
                let value = String::from_utf8(bytes).map_err(|_| {
                    DomainError::ValidationError(format!("Field '{}' is not valid UTF-8", name))
                })?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::testing::multipart_body;
    use actix_web::http::header::{self, HeaderMap};
    use actix_web::web::Bytes;

    fn parse(content_type: &str, body: Vec<u8>) -> Multipart {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_str(content_type).unwrap(),
        );
        let stream = futures_util::stream::once(async move {
            Ok::<_, actix_web::error::PayloadError>(Bytes::from(body))
        });
        Multipart::new(&headers, stream)
    }

    #[actix_web::test]
    async fn reads_text_fields_and_files() {
        let png: &[u8] = b"\x89PNG fake bytes";
        let (content_type, body) = multipart_body(
            "XBOUNDARYX",
            &[("title", "A valid title"), ("content", "some content")],
            &[("image", "pic.png", png)],
        );

        let mut form = read_form(parse(&content_type, body)).await.unwrap();

        assert_eq!(form.text("title").as_deref(), Some("A valid title"));
        assert_eq!(form.text("content").as_deref(), Some("some content"));
        assert!(form.text("missing").is_none());

        let image = form.file("image").unwrap();
        assert_eq!(image.file_name, "pic.png");
        assert_eq!(image.bytes, b"\x89PNG fake bytes");
        assert!(form.file("image").is_none());
    }

    #[actix_web::test]
    async fn oversized_file_is_rejected() {
        let big = vec![0u8; MAX_FILE_BYTES + 1];
        let (content_type, body) =
            multipart_body("XBOUNDARYX", &[], &[("image", "big.png", big.as_slice())]);

        let result = read_form(parse(&content_type, body)).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }
}
