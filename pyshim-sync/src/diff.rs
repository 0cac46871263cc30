//! Dry-run unified diff support for `pyshim diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use pyshim_core::{Config, ExecutableName};
use pyshim_renderer::Renderer;

use crate::error::{io_err, SyncError};
use crate::pipeline::plan;
use crate::reconcile::Action;

/// A single wrapper file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperDiff {
    pub name: ExecutableName,
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Render what `sync` would write and compare it to the wrapper directory.
///
/// No files are written. Foreign files are never diffed since sync never
/// touches them.
pub fn diff_wrappers(config: &Config) -> Result<Vec<WrapperDiff>, SyncError> {
    let renderer = Renderer::new(&config.shell)?;
    let report = plan(config)?;

    let mut diffs = Vec::new();
    for action in &report.plan.actions {
        let (name, rendered) = match action {
            Action::Create { name, target } | Action::Update { name, to: target, .. } => {
                (name, renderer.render(target)?)
            }
            Action::Remove { name, .. } => (name, String::new()),
            Action::Unchanged { .. } | Action::Conflict { .. } => continue,
        };

        let path = config.wrapper_dir.join(name.as_str());
        let existing = read_existing_or_empty(&path)?;
        if existing == rendered {
            continue;
        }

        let old_header = format!("a/{name}");
        let new_header = format!("b/{name}");
        let unified = TextDiff::from_lines(&existing, &rendered)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(WrapperDiff {
            name: name.clone(),
            path,
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}
