//! Store configuration.
//!
//! Controls where table files live and how the backend engine is tuned.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Configuration shared by every table opened through a registry.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one store file per table
    pub data_dir: PathBuf,

    /// Page cache size in bytes handed to the engine
    ///
    /// `None` keeps the engine default.
    pub cache_size: Option<usize>,

    /// Extension appended to table names to form file names
    pub file_extension: String,
}

impl StoreConfig {
    /// Creates a configuration rooted at `data_dir`.
    ///
    /// # Returns
    /// Validated configuration or error
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        if data_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("data_dir is empty".to_string()));
        }

        Ok(Self {
            data_dir,
            cache_size: None,
            file_extension: "redb".to_string(),
        })
    }

    pub fn with_cache_size(mut self, bytes: usize) -> Result<Self> {
        if bytes == 0 {
            return Err(Error::InvalidConfig("cache_size must be non-zero".to_string()));
        }
        self.cache_size = Some(bytes);
        Ok(self)
    }

    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Result<Self> {
        let extension = extension.into();
        if extension.is_empty() || extension.contains(['/', '\\', '.']) {
            return Err(Error::InvalidConfig(format!(
                "invalid file extension: {extension:?}"
            )));
        }
        self.file_extension = extension;
        Ok(self)
    }

    /// Store file path for table `name`.
    ///
    /// Names must be non-empty, free of path separators and not `.` or `..`.
    pub fn table_path(&self, name: &str) -> Result<PathBuf> {
        validate_table_name(name)?;
        Ok(self
            .data_dir
            .join(format!("{name}.{}", self.file_extension)))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidConfig(format!("invalid table name: {name:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = StoreConfig::new("/tmp/data")
            .unwrap()
            .with_cache_size(1 << 20)
            .unwrap();

        assert_eq!(config.data_dir(), Path::new("/tmp/data"));
        assert_eq!(config.cache_size, Some(1 << 20));
        assert_eq!(config.file_extension, "redb");
    }

    #[test]
    fn test_invalid_config() {
        assert!(StoreConfig::new("").is_err());

        let config = StoreConfig::new("/tmp/data").unwrap();
        assert!(config.clone().with_cache_size(0).is_err());
        assert!(config.clone().with_file_extension("").is_err());
        assert!(config.with_file_extension("a/b").is_err());
    }

    #[test]
    fn test_table_path() {
        let config = StoreConfig::new("/tmp/data")
            .unwrap()
            .with_file_extension("db")
            .unwrap();

        assert_eq!(
            config.table_path("events").unwrap(),
            PathBuf::from("/tmp/data/events.db")
        );
        for name in ["", ".", "..", "a/b", "a\\b"] {
            assert!(config.table_path(name).is_err(), "{name:?}");
        }
    }
}
