//! Object storage access.
//!
//! Pipelines only ever need two things from storage: pull an uploaded
//! instrument file down to scratch disk, and push a generated PDF up. Both go
//! through [`ObjectStore`] so tests can substitute an in-memory store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

pub mod config;

/// Path segment between the lab name and the file name of every report.
pub const REPORT_PREFIX: &str = "cumulative_report";

/// Narrow interface over the object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stream `s3://{bucket}/{key}` into the local file `dest`, returning the byte count.
    async fn download_to(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64>;

    /// Store `data` at `s3://{bucket}/{key}`.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadResult>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub key: String,
    pub size: u64,
}

/// S3-backed [`ObjectStore`]
#[derive(Clone)]
pub struct Storage {
    client: Client,
}

impl Storage {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!("Initializing storage with config: {:?}", config);

        let mut s3_config_builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "medlab-storage");
                aws_sdk_s3::Config::builder()
                    .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                    .credentials_provider(credentials)
                    .region(Region::new(config.region.clone()))
            },
            _ => {
                let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        };

        s3_config_builder = s3_config_builder.force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(region = %config.region, "Storage client initialized");

        Ok(Self { client })
    }
}

#[async_trait]
impl ObjectStore for Storage {
    #[instrument(skip(self, dest))]
    async fn download_to(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        debug!("Downloading s3://{}/{} to {}", bucket, key, dest.display());

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to download from S3: s3://{}/{}", bucket, key))?;

        let mut body = response.body;
        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut written: u64 = 0;
        while let Some(chunk) = body
            .try_next()
            .await
            .context("Failed to read S3 response body")?
        {
            file.write_all(&chunk)
                .await
                .context("Failed to write downloaded object")?;
            written += chunk.len() as u64;
        }
        file.flush().await.context("Failed to flush downloaded object")?;

        info!("Downloaded {} bytes from s3://{}/{}", written, bucket, key);

        Ok(written)
    }

    #[instrument(skip(self, data))]
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadResult> {
        let size = data.len() as u64;

        debug!("Uploading {} bytes to s3://{}/{}", size, bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.context("Failed to upload to S3")?;

        info!("Successfully uploaded to s3://{}/{}", bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            size,
        })
    }
}

/// Object key of a cumulative report: `{lab}/cumulative_report/{file_name}`
pub fn report_key(lab_name: &str, file_name: &str) -> String {
    format!("{}/{}/{}", lab_name, REPORT_PREFIX, file_name)
}
