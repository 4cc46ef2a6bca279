use crate::error::ConfigError;
use crate::models::{Filter, SortBy};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "taskboard";

// On-disk shape of config.toml; every key is optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    default_filter: Option<String>,
    default_sort: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub default_filter: Filter,
    pub default_sort: SortBy,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

impl Config {
    /// Reads `TASKBOARD_CONFIG` (or the platform config path) and applies
    /// `TASKBOARD_DATA_DIR`. A missing file is not an error.
    pub fn load() -> Result<Config, ConfigError> {
        let path = env::var_os("TASKBOARD_CONFIG")
            .map(PathBuf::from)
            .or_else(default_config_path);
        let data_dir_override = env::var_os("TASKBOARD_DATA_DIR").map(PathBuf::from);
        Config::load_from(path.as_deref(), data_dir_override)
    }

    pub fn load_from(
        path: Option<&Path>,
        data_dir_override: Option<PathBuf>,
    ) -> Result<Config, ConfigError> {
        let file = match path {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str::<FileConfig>(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            _ => FileConfig::default(),
        };

        let data_dir = match data_dir_override.or(file.data_dir) {
            Some(dir) => dir,
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(ConfigError::NoDataDir)?,
        };
        let log_file = file
            .log_file
            .unwrap_or_else(|| data_dir.join("taskboard.log"));

        let default_filter = match file.default_filter {
            Some(name) => name.parse::<Filter>().map_err(|value| ConfigError::UnknownValue {
                field: "default_filter",
                value,
            })?,
            None => Filter::default(),
        };
        let default_sort = match file.default_sort {
            Some(name) => name.parse::<SortBy>().map_err(|value| ConfigError::UnknownValue {
                field: "default_sort",
                value,
            })?,
            None => SortBy::default(),
        };

        Ok(Config {
            data_dir,
            log_file,
            default_filter,
            default_sort,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        let config = Config::load_from(Some(absent.as_path()), Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.log_file, dir.path().join("taskboard.log"));
        assert_eq!(config.default_filter, Filter::All);
        assert_eq!(config.default_sort, SortBy::DueDate);
    }

    #[test]
    fn test_file_values_and_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "data_dir = \"/srv/board\"\ndefault_filter = \"pending\"\ndefault_sort = \"priority\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.as_path()), None).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/board"));
        assert_eq!(config.default_filter, Filter::Pending);
        assert_eq!(config.default_sort, SortBy::Priority);

        let config = Config::load_from(Some(path.as_path()), Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.data_dir, dir.path());
    }

    #[test]
    fn test_unknown_sort_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_sort = \"newest\"\n").unwrap();
        let err = Config::load_from(Some(path.as_path()), Some(dir.path().to_path_buf())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownValue { field: "default_sort", .. }
        ));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "data_dir = [").unwrap();
        assert!(matches!(
            Config::load_from(Some(path.as_path()), None),
            Err(ConfigError::Parse { .. })
        ));
    }
}
