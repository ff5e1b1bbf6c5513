/// S3-backed object storage
///
/// Works against AWS S3 and S3-compatible stores (MinIO, LocalStack) when an
/// explicit endpoint is configured; those usually need path-style addressing.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream};
use bytes::Bytes;

use super::{ObjectStorage, StorageError};

/// Settings for [`S3Storage::connect`]
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub region: String,
    pub bucket: String,

    /// Custom endpoint for S3-compatible stores; enables path-style requests
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(inner: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { inner, bucket }
    }

    /// Builds a client from the default AWS credential chain
    pub async fn connect(settings: S3Settings) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(aws_sdk_s3::Client::from_conf(builder.build()), settings.bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    #[tracing::instrument(skip(self, body), fields(bucket = %self.bucket, size = body.len()))]
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: aws_sdk_s3::error::DisplayErrorContext(e).to_string(),
            })?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(bucket = %self.bucket))]
    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presign_err = |message: String| StorageError::Presign {
            key: key.to_string(),
            message,
        };

        let config = PresigningConfig::expires_in(expires_in).map_err(|e| presign_err(e.to_string()))?;

        let request = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| presign_err(aws_sdk_s3::error::DisplayErrorContext(e).to_string()))?;

        Ok(request.uri().to_string())
    }

    #[tracing::instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.inner
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                message: aws_sdk_s3::error::DisplayErrorContext(e).to_string(),
            })?;

        Ok(())
    }
}
