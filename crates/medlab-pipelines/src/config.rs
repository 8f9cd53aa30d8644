//! Configuration management
//!
//! Each Lambda builds one [`AppConfig`] at start-up and passes it down by
//! reference. Nothing reads the environment after that point.

use medlab_common::{env, MedlabError};
use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;
use crate::storage::config::StorageConfig;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default MySQL port.
pub const DEFAULT_DATABASE_PORT: u16 = 3306;

/// Connection-establishment timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Character set requested for every connection.
pub const DATABASE_CHARSET: &str = "utf8mb4";

/// Settings shared by every pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub name: String,
    pub connect_timeout_secs: u64,
}

// Keeps the password out of logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("name", &self.name)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Settings only the cumulative report needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Bucket the generated PDF is uploaded to
    pub bucket: String,
    /// Lab name, used as the first segment of the object key
    pub lab_name: String,
    /// Default patient when the invocation payload names none
    pub patient_id: Option<String>,
}

impl AppConfig {
    /// Load configuration from the environment (and a `.env` file, if present)
    pub fn load() -> PipelineResult<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> PipelineResult<()> {
        self.database.validate()
    }
}

impl DatabaseConfig {
    /// Load from `DB_HOST`, `DB_USERNAME`, `DB_PASSWORD`, `DB_NAME`, plus
    /// optional `DB_PORT` and `DB_CONNECT_TIMEOUT`.
    pub fn from_env() -> PipelineResult<Self> {
        Ok(Self {
            host: env::required("DB_HOST")?,
            port: env::parsed_or("DB_PORT", DEFAULT_DATABASE_PORT)?,
            username: env::required("DB_USERNAME")?,
            password: std::env::var("DB_PASSWORD")
                .map_err(|_| MedlabError::MissingEnv("DB_PASSWORD".to_string()))?,
            name: env::required("DB_NAME")?,
            connect_timeout_secs: env::parsed_or(
                "DB_CONNECT_TIMEOUT",
                DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            )?,
        })
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.host.trim().is_empty() {
            return Err(MedlabError::config("Database host cannot be empty").into());
        }

        if self.name.trim().is_empty() {
            return Err(MedlabError::config("Database name cannot be empty").into());
        }

        if self.port == 0 {
            return Err(MedlabError::config("Database port must be greater than 0").into());
        }

        Ok(())
    }
}

impl ReportConfig {
    /// Load from `BUCKET_NAME`, `LAB_NAME` and optional `PATIENT_ID`
    pub fn from_env() -> PipelineResult<Self> {
        let config = Self {
            bucket: env::required("BUCKET_NAME")?,
            lab_name: env::required("LAB_NAME")?,
            patient_id: env::optional("PATIENT_ID"),
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.lab_name.contains('/') {
            return Err(MedlabError::config(format!(
                "LAB_NAME must not contain '/': {}",
                self.lab_name
            ))
            .into());
        }

        Ok(())
    }

    /// Pick the patient for one invocation: the payload wins over `PATIENT_ID`.
    pub fn resolve_patient_id(&self, requested: Option<&str>) -> PipelineResult<String> {
        requested
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| self.patient_id.clone())
            .ok_or_else(|| MedlabError::MissingEnv("PATIENT_ID".to_string()).into())
    }
}
