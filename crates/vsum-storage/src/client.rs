//! S3 client implementation.

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Default bucket for raw caption files.
pub const DEFAULT_BUCKET: &str = "sumtube";

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name
    pub bucket_name: String,
    /// AWS region
    pub region: String,
    /// Custom endpoint (MinIO, LocalStack); unset for AWS itself
    pub endpoint_url: Option<String>,
    /// Static credentials for custom endpoints: (access key id, secret)
    pub static_credentials: Option<(String, String)>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket_name: DEFAULT_BUCKET.to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            static_credentials: None,
        }
    }
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let static_credentials = match (
            std::env::var("S3_ACCESS_KEY_ID"),
            std::env::var("S3_SECRET_ACCESS_KEY"),
        ) {
            (Ok(id), Ok(secret)) if !id.is_empty() => Some((id, secret)),
            _ => None,
        };

        Self {
            bucket_name: std::env::var("CAPTION_BUCKET")
                .ok()
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok().filter(|u| !u.is_empty()),
            static_credentials,
        }
    }
}

/// S3 storage client.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        if config.bucket_name.is_empty() {
            return Err(StorageError::config_error("CAPTION_BUCKET is empty"));
        }

        let client = match (&config.endpoint_url, &config.static_credentials) {
            (Some(endpoint), Some((key_id, secret))) => {
                let credentials = Credentials::new(key_id, secret, None, None, "s3-static");
                let sdk_config = Builder::new()
                    .behavior_version(BehaviorVersion::latest())
                    .endpoint_url(endpoint)
                    .region(Region::new(config.region.clone()))
                    .credentials_provider(credentials)
                    .force_path_style(true)
                    .build();
                Client::from_conf(sdk_config)
            }
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                let mut builder = Builder::from(&shared);
                if let Some(endpoint) = &config.endpoint_url {
                    builder = builder.endpoint_url(endpoint).force_path_style(true);
                }
                Client::from_conf(builder.build())
            }
        };

        info!(bucket = %config.bucket_name, "S3 client initialized");

        Ok(Self {
            client,
            bucket: config.bucket_name,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(S3Config::from_env()).await
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload a text object with a private ACL.
    pub async fn upload_text(
        &self,
        body: &str,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        debug!("Uploading {} bytes to {}", body.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body.as_bytes().to_vec()))
            .content_type(content_type)
            .acl(ObjectCannedAcl::Private)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    /// Check connectivity to S3 by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StorageError::AwsSdk(format!(
                    "S3 connectivity check failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = S3Config::default();
        assert_eq!(config.bucket_name, "sumtube");
        assert!(config.endpoint_url.is_none());
    }

    #[tokio::test]
    async fn test_empty_bucket_rejected() {
        let config = S3Config {
            bucket_name: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            S3Client::new(config).await,
            Err(StorageError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_endpoint_client_builds() {
        let config = S3Config {
            endpoint_url: Some("http://localhost:9000".into()),
            static_credentials: Some(("minio".into(), "minio123".into())),
            ..Default::default()
        };
        let client = S3Client::new(config).await.unwrap();
        assert_eq!(client.bucket(), "sumtube");
    }
}
