//! Rollcall configuration
//!
//! Loaded from `rollcall.toml` in the platform config directory, or from an
//! explicit path. Every key is optional; a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::identity::{SynonymConfig, SynonymTables};

const CONFIG_FILE: &str = "rollcall.toml";
const DATABASE_FILE: &str = "rollcall.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollcallConfig {
    /// SQLite database file; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    /// How long a connection waits on a locked database
    pub busy_timeout_ms: u64,
    /// Extra header spellings appended to the built-in tables
    pub synonyms: SynonymConfig,
}

impl Default for RollcallConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: 5000,
            synonyms: SynonymConfig::default(),
        }
    }
}

impl RollcallConfig {
    /// Parse configuration from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from an explicit file; a missing file yields defaults
    #[instrument(fields(path = %path.display()))]
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from the platform config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&project_dirs()?.config_dir().join(CONFIG_FILE))
    }

    /// Configured database path, else `rollcall.db` in the platform data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE)),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Synonym tables with the configured extras applied
    pub fn synonym_tables(&self) -> SynonymTables {
        SynonymTables::default().extended(&self.synonyms)
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "rollcall", "rollcall").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine configuration directory",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityRole;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = RollcallConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config, RollcallConfig::default());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
database_path = "/var/lib/rollcall/events.db"
busy_timeout_ms = 250

[synonyms]
email = ["Adresse électronique"]
full_name = ["Participant"]
"#;
        let config = RollcallConfig::from_toml(toml).unwrap();
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/var/lib/rollcall/events.db")
        );
        assert_eq!(config.busy_timeout(), Duration::from_millis(250));

        let tables = config.synonym_tables();
        assert!(tables.matches(IdentityRole::Email, "ADRESSE ÉLECTRONIQUE"));
        assert!(tables.full_name().contains(&"participant".to_string()));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "busy_timeout_ms = 10\n").unwrap();

        let config = RollcallConfig::load_from(&path).unwrap();
        assert_eq!(config.busy_timeout_ms, 10);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = RollcallConfig::from_toml("busy_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
