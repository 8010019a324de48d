use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use crate::config::StorageConfig;
use crate::error::AppError;

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Durable public URL.
    pub url: String,
    /// Opaque handle required to delete the file later.
    pub handle: String,
}

/// Trait for the media host.
///
/// Abstracted as a trait so tests can use a mock without a real bucket.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `content` and return its public URL and deletion handle.
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<StoredMedia, AppError>;

    /// Delete a previously uploaded file.
    async fn release(&self, handle: &str) -> Result<(), AppError>;
}

/// S3-compatible implementation of MediaStore.
///
/// The storage handle is the object key; the URL is `public_base_url/key`.
pub struct S3MediaStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
    key_prefix: String,
}

impl S3MediaStore {
    /// Build the client from the `storage` config section. Credentials come
    /// from the standard AWS provider chain.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, AppError> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        // Support custom S3 endpoint (for MinIO, LocalStack, etc.)
        if let Some(endpoint) = &config.endpoint {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let sdk_config = config_loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Ok(Self::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            config.bucket.clone(),
            config.public_base_url.clone(),
            config.key_prefix.clone(),
        ))
    }

    /// Create with explicit values (useful for testing / DI).
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: String,
        public_base_url: String,
        key_prefix: String,
    ) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            key_prefix: key_prefix.trim_matches('/').to_string(),
        }
    }

    fn object_key(&self, file_name: &str) -> String {
        let key = format!("{}_{}", uuid::Uuid::new_v4().simple(), sanitize_file_name(file_name));
        if self.key_prefix.is_empty() {
            key
        } else {
            format!("{}/{}", self.key_prefix, key)
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<StoredMedia, AppError> {
        let key = self.object_key(file_name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to put object '{}': {}", key, e)))?;

        tracing::debug!(key = %key, "Uploaded media object");

        Ok(StoredMedia {
            url: self.public_url(&key),
            handle: key,
        })
    }

    async fn release(&self, handle: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(handle)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!("Failed to delete object '{}': {}", handle, e))
            })?;

        Ok(())
    }
}

/// Keep file names URL- and key-safe.
fn sanitize_file_name(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        "upload.bin".to_string()
    } else {
        sanitized
    }
}
