use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DATA_DIR: &str = "pingpong_league";
const DB_FILE: &str = "league.sqlite";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub db_path: PathBuf,
    pub log_filter: String,
}

impl LeagueConfig {
    /// Reads `.env.local` then `.env`, then `LEAGUE_DB_PATH` and `LEAGUE_LOG`.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let db_path = opt_env("LEAGUE_DB_PATH")
            .map(PathBuf::from)
            .or_else(default_db_path)
            .unwrap_or_else(|| PathBuf::from(DB_FILE));
        let log_filter = opt_env("LEAGUE_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Self {
            db_path,
            log_filter,
        }
    }

    pub fn with_db_path(mut self, db_path: Option<PathBuf>) -> Self {
        if let Some(path) = db_path {
            self.db_path = path;
        }
        self
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Some(base) = opt_env("XDG_DATA_HOME") {
        return Some(PathBuf::from(base).join(DATA_DIR));
    }
    let home = opt_env("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR),
    )
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}
