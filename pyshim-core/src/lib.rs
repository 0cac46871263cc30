//! pyshim core library: domain types, layered configuration, errors.
//!
//! - [`types`]: newtypes and domain structs
//! - [`config`]: defaults, YAML file and environment resolution
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::ConfigError;
pub use types::{
    contains_control, is_reserved_name, Executable, ExecutableName, SearchPath, RESERVED_PREFIX,
};
