use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{debug, warn};

use crate::error::{Result, TrackerError};

pub const DEFAULT_DATA_DIR: &str = ".tennis";
pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_AUTH_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the local notes blob.
    pub data_dir: PathBuf,
    /// SQLite file backing the remote notes table.
    pub database_path: PathBuf,
    pub port: u16,
    /// Header carrying the identity set by the auth provider.
    pub auth_header: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir: PathBuf = try_load("TENNIS_DATA_DIR", DEFAULT_DATA_DIR)?;
        let database_path = match var("TENNIS_DATABASE_PATH") {
            Some(path) => PathBuf::from(path),
            None => data_dir.join("notes.db"),
        };

        Ok(Self {
            data_dir,
            database_path,
            port: try_load("TENNIS_PORT", DEFAULT_PORT)?,
            auth_header: try_load::<String>("TENNIS_AUTH_HEADER", DEFAULT_AUTH_HEADER)?
                .to_lowercase(),
        })
    }

    /// Point both stores at `dir`, unless the database path was set explicitly.
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        if self.database_path == self.data_dir.join("notes.db") {
            self.database_path = dir.join("notes.db");
        }
        self.data_dir = dir;
        self
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        TrackerError::Config(format!("{key}={raw}: {e}"))
    })
}
