use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::path::PathBuf;
use tokio::fs;

/// Storage buckets owned by the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "verification-documents")]
    VerificationDocuments,
    #[serde(rename = "studio-photos")]
    StudioPhotos,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerificationDocuments => "verification-documents",
            Self::StudioPhotos => "studio-photos",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PutOptions {
    pub cache_control: Option<String>,
    pub overwrite: bool,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            cache_control: None,
            overwrite: false,
        }
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Store an object. With `overwrite` disabled the call fails when the
    /// key already exists.
    async fn put_object(
        &self,
        bucket: Bucket,
        key: &str,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<(), AppError>;

    /// Public retrieval URL for a stored key.
    fn public_url(&self, bucket: Bucket, key: &str) -> String;

    async fn delete_object(&self, bucket: Bucket, key: &str) -> Result<(), AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, bucket: Bucket, key: &str) -> PathBuf {
        self.base_path.join(bucket.as_str()).join(key)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_object(
        &self,
        bucket: Bucket,
        key: &str,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<(), AppError> {
        let path = self.object_path(bucket, key);
        if !options.overwrite && path.exists() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "The resource already exists: {}/{}",
                bucket,
                key
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, key)
    }

    async fn delete_object(&self, bucket: Bucket, key: &str) -> Result<(), AppError> {
        let path = self.object_path(bucket, key);
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

pub struct S3Storage {
    client: S3Client,
    region: String,
    bucket_prefix: String,
    public_base_url: Option<String>,
}

impl S3Storage {
    pub fn new(
        client: S3Client,
        region: String,
        bucket_prefix: String,
        public_base_url: Option<String>,
    ) -> Self {
        Self {
            client,
            region,
            bucket_prefix,
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    fn bucket_name(&self, bucket: Bucket) -> String {
        format!("{}{}", self.bucket_prefix, bucket)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(
        &self,
        bucket: Bucket,
        key: &str,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<(), AppError> {
        let mut req = self
            .client
            .put_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .body(ByteStream::from(data));

        if let Some(cache_control) = &options.cache_control {
            req = req.cache_control(cache_control);
        }
        if !options.overwrite {
            // Conditional write: a key collision surfaces as a precondition
            // failure instead of silently replacing the object.
            req = req.if_none_match("*");
        }

        req.send()
            .await
            .map_err(|e| AppError::StorageError(anyhow::anyhow!("S3 upload failed: {}", e)))?;
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}/{}", base, bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket_name(bucket),
                self.region,
                key
            ),
        }
    }

    async fn delete_object(&self, bucket: Bucket, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(self.bucket_name(bucket))
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::StorageError(anyhow::anyhow!("S3 delete failed: {}", e)))?;
        Ok(())
    }
}
