//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("switchback-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_valid_file() {
        let path = write_temp("[dispatch]\nyield_every = 7\n[store]\npath = \"/tmp/x.json\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.dispatch.yield_every, 7);
        assert_eq!(config.store.path, "/tmp/x.json");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            load_config(Path::new("/no/such/switchback.toml")),
            Err(ConfigError::Io(_))
        ));

        let path = write_temp("[dispatch\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        fs::remove_file(path).unwrap();

        let path = write_temp("[dispatch]\nyield_every = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("dispatch.yield_every must be greater than zero"));
        fs::remove_file(path).unwrap();
    }
}
