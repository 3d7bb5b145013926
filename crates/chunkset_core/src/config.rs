//! Collection configuration.

use crate::error::{CoreError, CoreResult};
use std::path::PathBuf;

/// Default number of elements per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default maximum number of runs merged in one pass.
pub const DEFAULT_MERGE_FAN_IN: usize = 64;

/// Default prefix of chunk file names.
pub const DEFAULT_FILE_PREFIX: &str = "chunkset";

/// Configuration for a chunked collection.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of elements per chunk, and per in-memory sort run.
    pub chunk_size: usize,

    /// Directory that receives chunk files. `None` uses a fresh system
    /// temporary directory.
    pub temp_dir: Option<PathBuf>,

    /// Prefix of chunk file names.
    pub file_prefix: String,

    /// Maximum number of argument elements that set operations hold in
    /// memory. Larger arguments are re-scanned once per chunk instead.
    /// `None` means `chunk_size`.
    pub membership_budget: Option<usize>,

    /// Maximum number of sorted runs merged at once.
    pub merge_fan_in: usize,

    /// Whether to fsync every chunk when it is sealed.
    pub sync_on_seal: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            temp_dir: None,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            membership_budget: None,
            merge_fan_in: DEFAULT_MERGE_FAN_IN,
            sync_on_seal: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of elements per chunk.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the directory that receives chunk files.
    #[must_use]
    pub fn temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    /// Sets the chunk file name prefix.
    #[must_use]
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Sets the in-memory membership budget of set operations.
    #[must_use]
    pub const fn membership_budget(mut self, elements: usize) -> Self {
        self.membership_budget = Some(elements);
        self
    }

    /// Sets the maximum number of runs merged at once.
    #[must_use]
    pub const fn merge_fan_in(mut self, runs: usize) -> Self {
        self.merge_fan_in = runs;
        self
    }

    /// Sets whether sealed chunks are fsynced.
    #[must_use]
    pub const fn sync_on_seal(mut self, value: bool) -> Self {
        self.sync_on_seal = value;
        self
    }

    /// Returns the effective membership budget.
    #[must_use]
    pub fn effective_membership_budget(&self) -> usize {
        self.membership_budget.unwrap_or(self.chunk_size)
    }

    /// Checks that the configuration can be used.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.chunk_size == 0 {
            return Err(CoreError::invalid_config("chunk_size must be at least 1"));
        }
        if self.merge_fan_in < 2 {
            return Err(CoreError::invalid_config("merge_fan_in must be at least 2"));
        }
        if self.file_prefix.is_empty() {
            return Err(CoreError::invalid_config("file_prefix must not be empty"));
        }
        if self
            .file_prefix
            .chars()
            .any(|c| std::path::is_separator(c) || c == '\0')
        {
            return Err(CoreError::invalid_config(format!(
                "file_prefix {:?} contains a path separator",
                self.file_prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(config.temp_dir.is_none());
        assert!(!config.sync_on_seal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .chunk_size(2)
            .temp_dir("/tmp/spill")
            .membership_budget(16)
            .merge_fan_in(4)
            .sync_on_seal(true);

        assert_eq!(config.chunk_size, 2);
        assert_eq!(config.temp_dir, Some(PathBuf::from("/tmp/spill")));
        assert_eq!(config.effective_membership_budget(), 16);
        assert_eq!(config.merge_fan_in, 4);
        assert!(config.sync_on_seal);
    }

    #[test]
    fn membership_budget_defaults_to_chunk_size() {
        let config = Config::new().chunk_size(7);
        assert_eq!(config.effective_membership_budget(), 7);
    }

    #[test]
    fn zero_chunk_size_is_invalid() {
        let result = Config::new().chunk_size(0).validate();
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn fan_in_below_two_is_invalid() {
        let result = Config::new().merge_fan_in(1).validate();
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn prefix_with_separator_is_invalid() {
        let result = Config::new().file_prefix("a/b").validate();
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));

        let result = Config::new().file_prefix("").validate();
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }
}
