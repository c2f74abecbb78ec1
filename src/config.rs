//! Process configuration, read from the environment (and `.env`, if present).

use anyhow::{anyhow, Context, Result};
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_BUCKET, DEFAULT_LOCAL_STORAGE_DIR, DEFAULT_PREDICTOR_URL,
    DEFAULT_PUBLIC_URL_BASE, DEFAULT_TIMEOUT_SECS,
};

/// Where uploaded images end up.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StorageBackend {
    /// Google Cloud Storage. Credentials come from the usual `GOOGLE_*` env keys.
    Gcs,
    /// A directory on local disk
    Local(PathBuf),
    /// Kept in process memory, lost on exit
    Memory,
}

#[derive(Debug, Clone)]
pub(crate) struct StorageConfig {
    pub(crate) backend: StorageBackend,
    pub(crate) bucket: String,
    /// Blob URLs are `{public_url_base}/{bucket}/{name}`
    pub(crate) public_url_base: String,
    pub(crate) timeout: Duration,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) database_url: String,
    /// Whether to create the tables on startup
    pub(crate) init_schema: bool,
    pub(crate) predictor_url: String,
    pub(crate) predictor_timeout: Duration,
    pub(crate) storage: StorageConfig,
}

impl Config {
    /// Read the config from process env.
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the config through `lookup`, which maps an env key to its value.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let backend = match env.get("STORAGE_BACKEND").as_deref().unwrap_or("gcs") {
            "gcs" => StorageBackend::Gcs,
            "local" => StorageBackend::Local(PathBuf::from(
                env.get_or("LOCAL_STORAGE_DIR", DEFAULT_LOCAL_STORAGE_DIR),
            )),
            "memory" => StorageBackend::Memory,
            other => return Err(anyhow!("STORAGE_BACKEND has unknown value {:?}", other)),
        };
        let bucket = match (&backend, env.get("STORAGE_BUCKET")) {
            (_, Some(bucket)) => bucket,
            (StorageBackend::Gcs, None) => {
                return Err(anyhow!("STORAGE_BUCKET is required for the gcs backend"))
            }
            (_, None) => DEFAULT_BUCKET.to_owned(),
        };

        Ok(Config {
            bind_addr: env.parse_or("BIND_ADDR", DEFAULT_BIND_ADDR.parse::<SocketAddr>()?)?,
            database_url: env.require("DATABASE_URL")?,
            init_schema: env.parse_or("INIT_SCHEMA", false)?,
            predictor_url: env.get_or("PREDICTOR_URL", DEFAULT_PREDICTOR_URL),
            predictor_timeout: Duration::from_secs(
                env.parse_or("PREDICTOR_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            ),
            storage: StorageConfig {
                backend,
                bucket,
                public_url_base: env
                    .get_or("PUBLIC_URL_BASE", DEFAULT_PUBLIC_URL_BASE)
                    .trim_end_matches('/')
                    .to_owned(),
                timeout: Duration::from_secs(
                    env.parse_or("STORAGE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
                ),
            },
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Unset and empty values are treated alike.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key).with_context(|| format!("{} is not set in env", key))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("{} has an invalid value {:?}", key, value)),
            None => Ok(default),
        }
    }
}
