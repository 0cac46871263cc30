//! Layered configuration: built-in defaults < YAML file < environment.
//!
//! # Sources
//!
//! ```text
//! /data/adb/python/pyshim.yaml   (or $PYSHIM_CONFIG; optional)
//! $PYSHIM_PATH                   search directories, `:`-separated
//! $PYSHIM_WRAPPER_DIR            wrapper directory
//! $PYSHIM_SHELL                  interpreter written into each wrapper's shebang
//! ```
//!
//! # API pattern
//!
//! - [`Config::load_with`] takes an explicit environment lookup; used in tests.
//! - [`Config::load`] reads the process environment and delegates.
//!
//! Empty environment values are treated as unset.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{io_err, ConfigError};
use crate::types::{contains_control, SearchPath};

pub const ENV_CONFIG: &str = "PYSHIM_CONFIG";
pub const ENV_PATH: &str = "PYSHIM_PATH";
pub const ENV_WRAPPER_DIR: &str = "PYSHIM_WRAPPER_DIR";
pub const ENV_SHELL: &str = "PYSHIM_SHELL";
/// Log filter for the binary (EnvFilter syntax).
pub const ENV_LOG: &str = "PYSHIM_LOG";

pub const DEFAULT_CONFIG_FILE: &str = "/data/adb/python/pyshim.yaml";
pub const DEFAULT_SEARCH_DIR: &str = "/data/adb/python/bin";
pub const DEFAULT_WRAPPER_DIR: &str = "/data/adb/modules/python/system/bin";
pub const DEFAULT_SHELL: &str = "/system/bin/sh";

/// On-disk YAML shape. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub search_path: Option<Vec<PathBuf>>,
    pub wrapper_dir: Option<PathBuf>,
    pub shell: Option<PathBuf>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub search_path: SearchPath,
    pub wrapper_dir: PathBuf,
    pub shell: PathBuf,
    /// Executable names that never get a wrapper.
    pub exclude: BTreeSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_path: SearchPath::new([DEFAULT_SEARCH_DIR]),
            wrapper_dir: PathBuf::from(DEFAULT_WRAPPER_DIR),
            shell: PathBuf::from(DEFAULT_SHELL),
            exclude: BTreeSet::new(),
        }
    }
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var_os(key))
    }

    /// Resolve configuration using `env` to look up variables.
    pub fn load_with<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let file_path = lookup(ENV_CONFIG)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = Config::default();
        if let Some(file) = read_config_file(&file_path)? {
            config.apply_file(file);
        }

        if let Some(value) = lookup(ENV_PATH) {
            config.search_path = SearchPath::parse(&value);
        }
        if let Some(value) = lookup(ENV_WRAPPER_DIR) {
            config.wrapper_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_SHELL) {
            config.shell = PathBuf::from(value);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(dirs) = file.search_path {
            self.search_path = SearchPath::new(dirs);
        }
        if let Some(dir) = file.wrapper_dir {
            self.wrapper_dir = dir;
        }
        if let Some(shell) = file.shell {
            self.shell = shell;
        }
        self.exclude.extend(file.exclude);
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.wrapper_dir.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "wrapper directory must be absolute: {}",
                self.wrapper_dir.display()
            )));
        }
        if !self.shell.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "shell must be an absolute path: {}",
                self.shell.display()
            )));
        }
        if self.shell.to_str().map_or(true, contains_control) {
            return Err(ConfigError::Invalid(format!(
                "shell must be a UTF-8 path without control characters: {:?}",
                self.shell
            )));
        }
        Ok(())
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.contains(name)
    }
}

/// Read and parse the YAML config file. A missing file yields `None`.
pub fn read_config_file(path: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    if contents.trim().is_empty() {
        return Ok(Some(ConfigFile::default()));
    }
    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
