//! `pyshim diff`: show unified diffs for what sync would write or delete.

use anyhow::{Context, Result};
use clap::Args;

use pyshim_sync::diff_wrappers;

use crate::exit_codes;

/// Arguments for `pyshim diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self) -> Result<u8> {
        let config = super::load_config()?;
        let diffs = diff_wrappers(&config).with_context(|| {
            format!("diff failed for {}", config.wrapper_dir.display())
        })?;

        if diffs.is_empty() {
            println!("No differences.");
            return Ok(exit_codes::OK);
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        Ok(exit_codes::OK)
    }
}
