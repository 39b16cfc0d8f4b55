use anyhow::{bail, Context, Result};
use std::{env, path::PathBuf};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    Memory,
}

/**
 * runtime settings read from env (.env is loaded first in main)
 */
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub store: StoreKind,
    pub mongodb_uri: Option<String>,
    pub database_name: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0:3000".to_string(),
            store: StoreKind::Mongo,
            mongodb_uri: None,
            database_name: "portfolio".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /**
     * build the config from any key lookup
     * unset keys keep their defaults
     */
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(store) = lookup("PROJECT_STORE") {
            config.store = match store.trim().to_lowercase().as_str() {
                "mongo" | "mongodb" => StoreKind::Mongo,
                "memory" => StoreKind::Memory,
                other => bail!("Unsupported PROJECT_STORE: {other}"),
            };
        }

        config.mongodb_uri = lookup("MONGODB_URI").filter(|uri| !uri.trim().is_empty());

        if let Some(name) = lookup("MONGODB_DATABASE") {
            config.database_name = name;
        }

        if let Some(dir) = lookup("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }

        if let Some(limit) = lookup("MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit
                .trim()
                .parse()
                .with_context(|| format!("MAX_UPLOAD_BYTES must be a byte count, got {limit}"))?;
        }

        if let Some(dir) = lookup("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if config.store == StoreKind::Mongo && config.mongodb_uri.is_none() {
            bail!("You must set MONGODB_URI when PROJECT_STORE is mongo");
        }

        Ok(config)
    }
}
