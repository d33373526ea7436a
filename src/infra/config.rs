// src/infra/config.rs - Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub migrate: MigrateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Set `PRAGMA foreign_keys` for the duration of a run; the connection's
    /// previous setting is put back afterwards. Unset leaves it alone.
    pub foreign_keys: Option<bool>,
    /// Register `CheckForeignKeys` ahead of any other wrapper.
    pub check_foreign_keys: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            foreign_keys: None,
            check_foreign_keys: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter for `logger::init_logging_from`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.migrate.foreign_keys, None);
        assert!(c.migrate.check_foreign_keys);
        assert_eq!(c.logging.level, "warn");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[migrate]
foreign_keys = true
check_foreign_keys = false

[logging]
level = "debug"
"#;
        let config = Config::from_toml_str(toml_str).unwrap();
        assert_eq!(
            config,
            Config {
                migrate: MigrateConfig {
                    foreign_keys: Some(true),
                    check_foreign_keys: false,
                },
                logging: LoggingConfig {
                    level: "debug".into(),
                },
            }
        );
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = Config::from_toml_str("[migrate]\nforeign_keys = \"yes\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[migrate]\nforeign_keys = true").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.migrate.foreign_keys, Some(true));
        assert!(config.migrate.check_foreign_keys);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/sqlite3m.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
