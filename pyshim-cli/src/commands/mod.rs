pub mod diff;
pub mod status;
pub mod sync;

use anyhow::{Context, Result};
use pyshim_core::Config;

pub(crate) fn load_config() -> Result<Config> {
    let config = Config::load().context("failed to load configuration")?;
    tracing::debug!(
        "wrapper dir {}, shell {}, {} search dir(s)",
        config.wrapper_dir.display(),
        config.shell.display(),
        config.search_path.dirs().len()
    );
    Ok(config)
}
