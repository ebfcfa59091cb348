//! Configuration loading and data directory resolution
//!
//! Resolution priority, highest first: command-line argument, environment
//! variable, TOML config file, OS-dependent compiled default.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Top-level TOML configuration (`config.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Root folder for the SQLite store
    pub data_dir: Option<PathBuf>,
}

/// Spreadsheet source credentials
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub api_key: Option<String>,
}

/// Dashboard listen address
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5741,
        }
    }
}

impl SheetsConfig {
    /// Spreadsheet id + API key, or a configuration error explaining
    /// where to put them
    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.spreadsheet_id.as_deref(), self.api_key.as_deref()) {
            (Some(id), Some(key)) if !id.trim().is_empty() && !key.trim().is_empty() => {
                Ok((id, key))
            }
            _ => Err(Error::Config(
                "Sheets source not configured. Provide credentials using one of:\n\
                 1. Environment: CTD_SPREADSHEET_ID / CTD_SHEETS_API_KEY\n\
                 2. TOML config: [sheets] spreadsheet_id / api_key\n\
                 (config file default location: ~/.config/ctd/config.toml)"
                    .to_string(),
            )),
        }
    }
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ctd").join("config.toml"))
}

/// Load configuration from a TOML file, then apply environment overrides.
///
/// An explicitly passed path must exist; the default path is optional.
pub fn load_config(cli_path: Option<&Path>) -> Result<Config> {
    let mut config = match cli_path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
            })?;
            parse_config(&content, path)?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                parse_config(&content, &path)?
            }
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn parse_config(content: &str, path: &Path) -> Result<Config> {
    toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Environment variables override the TOML values. Secrets are never logged.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(id) = std::env::var("CTD_SPREADSHEET_ID") {
        config.sheets.spreadsheet_id = Some(id);
        info!("Spreadsheet id loaded from environment");
    }
    if let Ok(key) = std::env::var("CTD_SHEETS_API_KEY") {
        config.sheets.api_key = Some(key);
        info!("Sheets API key loaded from environment");
    }
    if let Ok(dir) = std::env::var("CTD_DATA_DIR") {
        config.data_dir = Some(PathBuf::from(dir));
    }
    if let Ok(host) = std::env::var("CTD_HOST") {
        config.server.host = host;
    }
    if let Ok(port) = std::env::var("CTD_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!("Ignoring unparseable CTD_PORT value"),
        }
    }
}

/// Resolve the data directory: CLI argument, then config (env/TOML),
/// then OS default
pub fn resolve_data_dir(cli_arg: Option<&Path>, config: &Config) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Some(path) = &config.data_dir {
        return path.clone();
    }
    default_data_dir()
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ctd"))
        .unwrap_or_else(|| PathBuf::from("./ctd_data"))
}

/// Create the data directory if it does not exist
pub fn ensure_data_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Path of the SQLite store inside the data directory
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("ctd.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            data_dir = "/tmp/ctd"

            [sheets]
            spreadsheet_id = "sheet-123"
            api_key = "key-456"

            [server]
            host = "0.0.0.0"
            port = 8080
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sheets.spreadsheet_id.as_deref(), Some("sheet-123"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/ctd")));
        assert!(config.sheets.credentials().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5741);
        assert!(config.data_dir.is_none());
        assert!(config.sheets.credentials().is_err());
    }

    #[test]
    fn test_blank_credentials_rejected() {
        let toml = r#"
            [sheets]
            spreadsheet_id = ""
            api_key = "key"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.sheets.credentials().is_err());
    }

    #[test]
    fn test_database_path() {
        assert_eq!(
            database_path(Path::new("/var/lib/ctd")),
            PathBuf::from("/var/lib/ctd/ctd.db")
        );
    }
}
