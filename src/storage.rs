use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client as S3Client,
};

use crate::config::AppConfig;

/// The console never writes objects; the ingestion pipeline owns uploads.
/// All this service needs from storage is a time-boxed playable link.
#[async_trait]
pub trait ObjectStorage: Send + Sync + 'static {
    async fn presign_get_object(&self, key: &str, expires_in: Duration) -> Result<String>;
}

pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Returns None when no bucket is configured (presigning disabled).
    pub async fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let Some(bucket) = config.s3_bucket.clone() else {
            return Ok(None);
        };

        let region_provider =
            RegionProviderChain::first_try(Some(Region::new(config.aws_region.clone())))
                .or_default_provider()
                .or_else("us-east-1");

        #[allow(deprecated)]
        let mut loader = aws_config::from_env().region(region_provider);

        if let Some(endpoint) = &config.aws_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (
            config.aws_access_key_id.clone(),
            config.aws_secret_access_key.clone(),
        ) {
            loader = loader
                .credentials_provider(Credentials::new(access_key, secret_key, None, None, "static"));
        }

        let base_config = loader.load().await;
        let s3_config = S3ConfigBuilder::from(&base_config)
            .force_path_style(true)
            .build();

        Ok(Some(Self::new(S3Client::from_conf(s3_config), bucket)))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn presign_get_object(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presign_config = PresigningConfig::builder()
            .expires_in(expires_in)
            .build()
            .context("failed to build S3 presigning config")?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .context("failed to generate presigned audio URL")?;

        Ok(presigned.uri().to_string())
    }
}
