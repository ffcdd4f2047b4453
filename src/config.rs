use std::env;
use std::path::PathBuf;

use crate::errors::{CookbookError, Result};

pub const HOME_ENV: &str = "COOKBOOK_HOME";

pub struct AppPaths {
    pub base_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    /// Resolves the base directory from `COOKBOOK_HOME`, falling back to `~/.cookbook`.
    pub fn from_env() -> Result<Self> {
        if let Ok(base) = env::var(HOME_ENV)
            && !base.trim().is_empty()
        {
            return Ok(Self::from_base(PathBuf::from(base)));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| CookbookError::Io("Could not determine home directory".to_string()))?;
        Ok(Self::from_base(home.join(".cookbook")))
    }

    pub fn from_base(base: PathBuf) -> Self {
        Self {
            db_path: base.join("cookbook.db"),
            log_file: base.join("cookbook.log"),
            base_dir: base,
        }
    }

    pub fn with_db_path(mut self, db_path: PathBuf) -> Self {
        self.db_path = db_path;
        self
    }
}
