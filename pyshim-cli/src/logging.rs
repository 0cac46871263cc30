//! Diagnostic tracing to stderr.
//!
//! Filter comes from `PYSHIM_LOG` (EnvFilter syntax), default `warn`, so scan
//! and store warnings show up without any setup.

use tracing_subscriber::{fmt, EnvFilter};

use pyshim_core::config::ENV_LOG;

pub fn init() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}
