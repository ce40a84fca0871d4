use crate::services::storage::{Bucket, PutOptions, Storage};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

/// Options for a single upload. Immutable per call.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub bucket: Bucket,
    pub folder: Option<String>,
    pub max_size_mb: u64,
    /// Empty means any declared content type is accepted.
    pub allowed_types: Vec<String>,
}

impl UploadOptions {
    pub fn new(bucket: Bucket) -> Self {
        Self {
            bucket,
            folder: None,
            max_size_mb: 10,
            allowed_types: Vec::new(),
        }
    }
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A successfully stored object: public URL plus the key it lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("File size exceeds {0}MB limit")]
    SizeExceeded(u64),

    #[error("File type {0} not allowed")]
    TypeNotAllowed(String),

    #[error("{0}")]
    Backend(String),
}

/// Check a candidate file against the configured limits.
///
/// Size first, then type. Only the declared content type is inspected; the
/// storage backend remains the authority on actual content.
pub fn validate(
    size_bytes: usize,
    content_type: &str,
    options: &UploadOptions,
) -> Result<(), UploadError> {
    let max_size_bytes = options.max_size_mb * 1024 * 1024;
    if size_bytes as u64 > max_size_bytes {
        return Err(UploadError::SizeExceeded(options.max_size_mb));
    }

    if !options.allowed_types.is_empty()
        && !options.allowed_types.iter().any(|t| t == content_type)
    {
        return Err(UploadError::TypeNotAllowed(content_type.to_string()));
    }

    Ok(())
}

/// Build the per-owner object key: `{owner}/{folder?}/{timestamp}_{token}.{ext}`.
///
/// The timestamp/token pair makes collisions unlikely but not impossible;
/// there is no retry loop, a collision surfaces as the backend's conflict.
fn object_key(
    owner_id: &str,
    folder: Option<&str>,
    file_name: &str,
    timestamp_ms: i64,
    token: &str,
) -> String {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("bin");
    let name = format!("{}_{}.{}", timestamp_ms, token, extension);

    match folder {
        Some(folder) if !folder.is_empty() => format!("{}/{}/{}", owner_id, folder, name),
        _ => format!("{}/{}", owner_id, name),
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Validates, keys and stores files on an injected storage backend.
pub struct UploadClient {
    storage: Arc<dyn Storage>,
}

impl UploadClient {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Validate and store a file under a fresh per-owner key.
    ///
    /// Nothing is written when validation fails.
    pub async fn upload(
        &self,
        file: UploadFile,
        owner_id: &str,
        options: &UploadOptions,
    ) -> Result<StoredObject, UploadError> {
        validate(file.data.len(), &file.content_type, options)?;

        let key = object_key(
            owner_id,
            options.folder.as_deref(),
            &file.name,
            Utc::now().timestamp_millis(),
            &random_token(),
        );

        let put_options = PutOptions {
            cache_control: Some("max-age=3600".to_string()),
            overwrite: false,
        };

        let size = file.data.len();
        if let Err(e) = self
            .storage
            .put_object(options.bucket, &key, file.data, &put_options)
            .await
        {
            tracing::error!(
                bucket = %options.bucket,
                key = %key,
                error = %e,
                "Upload to storage failed"
            );
            metrics::counter!("file_upload_failed", "bucket" => options.bucket.as_str())
                .increment(1);
            return Err(UploadError::Backend(e.to_string()));
        }

        let url = self.storage.public_url(options.bucket, &key);

        metrics::counter!("file_upload_total", "bucket" => options.bucket.as_str()).increment(1);
        metrics::histogram!("file_upload_size_bytes", "bucket" => options.bucket.as_str())
            .record(size as f64);

        tracing::info!(
            bucket = %options.bucket,
            key = %key,
            size = size,
            "File stored"
        );

        Ok(StoredObject { url, path: key })
    }

    /// Remove a previously stored object.
    pub async fn delete(&self, bucket: Bucket, path: &str) -> Result<(), AppError> {
        self.storage.delete_object(bucket, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::fake::InMemoryStorage;

    fn pdf_file(size: usize) -> UploadFile {
        UploadFile {
            name: "license.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: vec![0u8; size],
        }
    }

    fn pdf_options() -> UploadOptions {
        UploadOptions {
            bucket: Bucket::VerificationDocuments,
            folder: None,
            max_size_mb: 10,
            allowed_types: vec!["application/pdf".to_string()],
        }
    }

    #[tokio::test]
    async fn stores_valid_file_under_owner_scoped_key() {
        let storage = Arc::new(InMemoryStorage::new());
        let client = UploadClient::new(storage.clone());

        let stored = client
            .upload(pdf_file(500_000), "u1", &pdf_options())
            .await
            .expect("upload should succeed");

        assert_eq!(storage.put_calls(), 1);
        assert!(!stored.url.is_empty());
        assert_eq!(stored.url, format!("memory://verification-documents/{}", stored.path));

        // key shape: u1/{digits}_{token}.pdf
        let rest = stored
            .path
            .strip_prefix("u1/")
            .expect("key should be namespaced under the owner");
        let rest = rest.strip_suffix(".pdf").expect("extension kept verbatim");
        let (timestamp, token) = rest.split_once('_').expect("timestamp_token form");
        assert!(!timestamp.is_empty() && timestamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(token.len(), 6);
    }

    #[tokio::test]
    async fn folder_is_inserted_between_owner_and_file_name() {
        let storage = Arc::new(InMemoryStorage::new());
        let client = UploadClient::new(storage.clone());

        let options = UploadOptions {
            folder: Some("onboarding".to_string()),
            ..pdf_options()
        };
        let stored = client
            .upload(pdf_file(100), "u1", &options)
            .await
            .expect("upload should succeed");

        assert!(stored.path.starts_with("u1/onboarding/"));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_without_a_storage_call() {
        let storage = Arc::new(InMemoryStorage::new());
        let client = UploadClient::new(storage.clone());

        let err = client
            .upload(pdf_file(11_000_000), "u1", &pdf_options())
            .await
            .expect_err("oversized upload should fail");

        assert_eq!(err, UploadError::SizeExceeded(10));
        assert_eq!(err.to_string(), "File size exceeds 10MB limit");
        assert_eq!(storage.put_calls(), 0);
    }

    #[tokio::test]
    async fn disallowed_type_is_rejected_without_a_storage_call() {
        let storage = Arc::new(InMemoryStorage::new());
        let client = UploadClient::new(storage.clone());

        let file = UploadFile {
            name: "malware.exe".to_string(),
            content_type: "application/octet-stream".to_string(),
            data: vec![0u8; 100],
        };
        let err = client
            .upload(file, "u1", &pdf_options())
            .await
            .expect_err("disallowed type should fail");

        assert_eq!(
            err,
            UploadError::TypeNotAllowed("application/octet-stream".to_string())
        );
        assert_eq!(
            err.to_string(),
            "File type application/octet-stream not allowed"
        );
        assert_eq!(storage.put_calls(), 0);
    }

    #[tokio::test]
    async fn size_is_checked_before_type() {
        let options = pdf_options();
        let err = validate(11 * 1024 * 1024, "application/octet-stream", &options)
            .expect_err("validation should fail");
        assert_eq!(err, UploadError::SizeExceeded(10));
    }

    #[tokio::test]
    async fn empty_allowed_types_accepts_any_content_type() {
        let options = UploadOptions {
            allowed_types: Vec::new(),
            ..pdf_options()
        };
        assert!(validate(100, "application/zip", &options).is_ok());
    }

    #[tokio::test]
    async fn repeat_upload_of_same_file_gets_a_distinct_key() {
        let storage = Arc::new(InMemoryStorage::new());
        let client = UploadClient::new(storage.clone());

        let first = client
            .upload(pdf_file(100), "u1", &pdf_options())
            .await
            .expect("first upload should succeed");
        let second = client
            .upload(pdf_file(100), "u1", &pdf_options())
            .await
            .expect("second upload should succeed");

        assert_ne!(first.path, second.path);
        assert_eq!(storage.keys().len(), 2);
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced_verbatim() {
        let storage = Arc::new(InMemoryStorage::rejecting(b"REJECT".to_vec()));
        let client = UploadClient::new(storage.clone());

        let file = UploadFile {
            name: "cert.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: b"REJECT".to_vec(),
        };
        let err = client
            .upload(file, "u1", &pdf_options())
            .await
            .expect_err("backend rejection should fail the upload");

        match err {
            UploadError::Backend(message) => {
                assert!(message.contains("simulated backend rejection"))
            }
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[test]
    fn distinct_timestamp_token_pairs_give_distinct_keys() {
        let a = object_key("u1", None, "license.pdf", 1_700_000_000_000, "abc123");
        let b = object_key("u1", None, "license.pdf", 1_700_000_000_001, "abc123");
        let c = object_key("u1", None, "license.pdf", 1_700_000_000_000, "xyz789");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, "u1/1700000000000_abc123.pdf");
    }

    #[test]
    fn missing_extension_falls_back_to_bin() {
        let key = object_key("u1", Some("onboarding"), "README", 1, "token1");
        assert_eq!(key, "u1/onboarding/1_token1.bin");
    }
}
