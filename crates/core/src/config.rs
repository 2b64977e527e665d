//! Process environment configuration.
//!
//! Values come from the environment (optionally seeded from `.env`). Setting
//! `SLUICE_PROFILE=PROD` makes every key resolve as `PROD_{KEY}` before
//! falling back to `{KEY}`, so several lakes can share one `.env`.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const PROFILE_VAR: &str = "SLUICE_PROFILE";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Environment lookups under one profile. Empty values count as unset.
#[derive(Debug, Clone, Copy)]
struct ProfiledEnv<'a> {
    profile: &'a str,
}

impl ProfiledEnv<'_> {
    fn get(&self, key: &str) -> Option<String> {
        let read = |k: &str| env::var(k).ok().filter(|v| !v.is_empty());
        if self.profile.is_empty() {
            return read(key);
        }
        read(&format!("{}_{key}", self.profile)).or_else(|| read(key))
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name, upper-cased (empty = default).
    pub profile: String,
    pub storage: StorageConfig,
    pub aws: AwsConfig,
}

impl Config {
    /// Build config for the profile named by `SLUICE_PROFILE`
    /// (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        let profile = env::var(PROFILE_VAR).unwrap_or_default();
        Self::for_profile(&profile)
    }

    pub fn for_profile(profile: &str) -> Self {
        let profile = profile.trim().to_uppercase();
        let vars = ProfiledEnv { profile: &profile };
        Self {
            storage: StorageConfig::from_env(vars),
            aws: AwsConfig::from_env(vars),
            profile,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Log a summary with secrets left out.
    pub fn log_summary(&self) {
        tracing::info!(
            profile = self.profile_label(),
            data_dir = %self.storage.data_dir.display(),
            "config loaded"
        );
        tracing::info!(
            region = %self.aws.region,
            bucket = self.aws.s3_bucket.as_deref().unwrap_or("(none)"),
            prefix = self.aws.s3_prefix.as_deref().unwrap_or(""),
            s3 = self.aws.is_configured(),
            "aws settings"
        );
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the local lake when no S3 bucket is configured.
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env(vars: ProfiledEnv<'_>) -> Self {
        Self {
            data_dir: PathBuf::from(vars.get_or("DATA_DIR", "data")),
        }
    }
}

/// S3 settings. Secrets never serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    pub s3_bucket: Option<String>,
    /// Key prefix every lake path is placed under.
    pub s3_prefix: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env(vars: ProfiledEnv<'_>) -> Self {
        Self {
            region: vars.get_or("AWS_REGION", "ap-southeast-1"),
            access_key_id: vars.get("AWS_ACCESS_KEY_ID"),
            secret_access_key: vars.get("AWS_SECRET_ACCESS_KEY"),
            session_token: vars.get("AWS_SESSION_TOKEN"),
            s3_bucket: vars.get("S3_BUCKET"),
            s3_prefix: vars.get("S3_PREFIX"),
            endpoint_url: vars.get("AWS_ENDPOINT_URL"),
        }
    }

    /// S3 is used only with both an access key and a bucket.
    pub fn is_configured(&self) -> bool {
        self.access_key_id.is_some() && self.s3_bucket.is_some()
    }
}
