use medlab_common::env;
use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("static_credentials", &self.has_static_credentials())
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl StorageConfig {
    pub fn from_env() -> PipelineResult<Self> {
        Ok(Self {
            endpoint: env::optional("S3_ENDPOINT"),
            region: env::optional("S3_REGION")
                .or_else(|| env::optional("AWS_REGION"))
                .unwrap_or_else(|| "us-east-1".to_string()),
            access_key: env::optional("S3_ACCESS_KEY"),
            secret_key: env::optional("S3_SECRET_KEY"),
            path_style: env::parsed_or("S3_PATH_STYLE", false)?,
        })
    }

    pub fn has_static_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }
}
