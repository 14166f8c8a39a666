//! Directory management.

use crate::{
    args::DataDirArgs,
    constants::{CONFIG_FILE_NAME, COUNTER_DB_FILE_NAME, DEFAULT_DATA_DIR_NAME},
};
use directories::ProjectDirs;
use eyre::{Result, WrapErr};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tessera_storage::INDEX_FILE;

/// Returns the default project directories.
pub fn default_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "tessera", "tessera")
}

/// Returns the default data directory path.
pub fn default_data_dir() -> Option<PathBuf> {
    default_project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Parse a path with environment variable expansion and tilde expansion.
pub fn parse_path(path: &Path) -> Result<PathBuf> {
    let raw = path
        .to_str()
        .ok_or_else(|| eyre::eyre!("path {} is not valid UTF-8", path.display()))?;
    let expanded = shellexpand::full(raw).wrap_err_with(|| format!("expanding {raw}"))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Resolved node data directory.
#[derive(Debug, Clone)]
pub struct DataDirs {
    /// Root data directory.
    pub root: PathBuf,
    config: Option<PathBuf>,
}

impl DataDirs {
    /// Resolve the data directory from command line args and make sure it exists.
    pub fn new(args: &DataDirArgs) -> Result<Self> {
        let root = match &args.datadir {
            Some(dir) => parse_path(dir)?,
            None => default_data_dir().unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR_NAME)),
        };

        fs::create_dir_all(&root)
            .wrap_err_with(|| format!("Failed to create directory {}", root.display()))?;

        let config = args.config.as_deref().map(parse_path).transpose()?;
        Ok(Self { root, config })
    }

    /// Returns the path to the config file.
    pub fn config_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.root.join(CONFIG_FILE_NAME))
    }

    /// Returns the path to the sector counter database.
    pub fn counter_db(&self) -> PathBuf {
        self.root.join(COUNTER_DB_FILE_NAME)
    }

    /// Returns the path to the local storage index.
    pub fn storage_index(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("node");
        let dirs = DataDirs::new(&DataDirArgs {
            datadir: Some(root.clone()),
            config: None,
        })
        .unwrap();

        assert!(root.is_dir());
        assert_eq!(dirs.config_file(), root.join("tessera.toml"));
        assert_eq!(dirs.counter_db(), root.join("sectors.redb"));
        assert_eq!(dirs.storage_index(), root.join("storage.json"));
    }

    #[test]
    fn test_explicit_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = DataDirs::new(&DataDirArgs {
            datadir: Some(tmp.path().to_path_buf()),
            config: Some(tmp.path().join("other.toml")),
        })
        .unwrap();
        assert_eq!(dirs.config_file(), tmp.path().join("other.toml"));
    }

    #[test]
    fn test_parse_path_tilde() {
        let parsed = parse_path(Path::new("~/x")).unwrap();
        assert!(!parsed.starts_with("~"));
        assert!(parsed.ends_with("x"));
    }
}
