// Restaurant document uploads to Firebase Storage
//
// Uploads go through the Cloud Storage JSON API with a service-account OAuth
// token: media upload first, then a metadata patch attaching a
// firebaseStorageDownloadTokens value so the object is reachable through the
// standard Firebase download URL. Bucket candidates are tried in order until
// one accepts the object, because projects created at different times expose
// either the .appspot.com or the .firebasestorage.app bucket name.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::firebase::{FirebaseError, GoogleTokenMinter};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Storage bucket not found")]
    BucketNotFound,

    #[error("Storage permission denied")]
    PermissionDenied,

    #[error("Storage upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Auth(#[from] FirebaseError),

    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Uploaded object location handed back to the client
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub object_path: String,
    pub download_url: String,
}

pub struct DocumentService {
    http: reqwest::Client,
    minter: Arc<GoogleTokenMinter>,
    bucket_candidates: Vec<String>,
}

impl DocumentService {
    pub fn new(
        http: reqwest::Client,
        minter: Arc<GoogleTokenMinter>,
        bucket_candidates: Vec<String>,
    ) -> Self {
        Self {
            http,
            minter,
            bucket_candidates,
        }
    }

    /// Upload a restaurant document and return its tokenized download URL.
    #[instrument(skip(self, bytes), fields(restaurant_id = %restaurant_id, size = bytes.len()))]
    pub async fn upload(
        &self,
        restaurant_id: &Uuid,
        bytes: &[u8],
        content_type: &str,
        original_name: &str,
    ) -> Result<UploadedDocument, DocumentError> {
        let extension = normalize_extension(content_type, original_name);
        let mut last_error: Option<DocumentError> = None;

        for bucket in &self.bucket_candidates {
            let object_name = format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), extension);
            let object_path = format!("restaurant-documents/{}/{}", restaurant_id, object_name);
            let download_token = Uuid::new_v4().to_string();

            match self
                .upload_to_bucket(bucket, &object_path, bytes, content_type, &download_token)
                .await
            {
                Ok(()) => {
                    return Ok(UploadedDocument {
                        download_url: format!(
                            "https://firebasestorage.googleapis.com/v0/b/{}/o/{}?alt=media&token={}",
                            bucket,
                            encode_object_path(&object_path),
                            download_token
                        ),
                        object_path,
                    });
                },
                Err(e) => {
                    warn!(bucket = %bucket, "document upload attempt failed: {}", e);
                    last_error = Some(e);
                },
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DocumentError::Upload("no storage bucket configured".to_string())
        }))
    }

    async fn upload_to_bucket(
        &self,
        bucket: &str,
        object_path: &str,
        bytes: &[u8],
        content_type: &str,
        download_token: &str,
    ) -> Result<(), DocumentError> {
        let access_token = self.minter.access_token().await?;

        let upload_url = format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o",
            bucket
        );
        let response = self
            .http
            .post(&upload_url)
            .query(&[("uploadType", "media"), ("name", object_path)])
            .bearer_auth(&access_token)
            .header("Content-Type", content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_failure(response).await);
        }

        let patch_url = format!(
            "https://storage.googleapis.com/storage/v1/b/{}/o/{}",
            bucket,
            encode_object_path(object_path)
        );
        let response = self
            .http
            .patch(&patch_url)
            .bearer_auth(&access_token)
            .json(&serde_json::json!({
                "metadata": { "firebaseStorageDownloadTokens": download_token }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_failure(response).await);
        }

        Ok(())
    }
}

async fn classify_failure(response: reqwest::Response) -> DocumentError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let normalized = body.to_lowercase();

    if status == reqwest::StatusCode::NOT_FOUND
        || normalized.contains("no such bucket")
        || normalized.contains("bucket does not exist")
    {
        return DocumentError::BucketNotFound;
    }

    if status == reqwest::StatusCode::FORBIDDEN
        || normalized.contains("permission")
        || normalized.contains("storage.objects.create")
    {
        return DocumentError::PermissionDenied;
    }

    DocumentError::Upload(format!("{}: {}", status, body))
}

/// Object paths contain only uuid characters, digits, dots and slashes, so
/// percent-encoding reduces to escaping the separators.
fn encode_object_path(path: &str) -> String {
    path.replace('/', "%2F")
}

fn normalize_extension(content_type: &str, original_name: &str) -> String {
    match content_type {
        "image/jpeg" => return "jpg".to_string(),
        "image/png" => return "png".to_string(),
        "image/webp" => return "webp".to_string(),
        "application/pdf" => return "pdf".to_string(),
        _ => {},
    }

    let from_name = original_name
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && *ext != original_name)
        .map(|ext| ext.to_lowercase());

    from_name.unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_prefers_content_type() {
        assert_eq!(normalize_extension("image/jpeg", "photo.png"), "jpg");
        assert_eq!(normalize_extension("application/pdf", "license"), "pdf");
    }

    #[test]
    fn test_extension_falls_back_to_file_name() {
        assert_eq!(normalize_extension("application/octet-stream", "scan.TIFF"), "tiff");
        assert_eq!(normalize_extension("application/octet-stream", "noext"), "bin");
        assert_eq!(normalize_extension("application/octet-stream", ""), "bin");
    }

    #[test]
    fn test_object_path_encoding() {
        assert_eq!(
            encode_object_path("restaurant-documents/abc/1-2.jpg"),
            "restaurant-documents%2Fabc%2F1-2.jpg"
        );
    }
}
