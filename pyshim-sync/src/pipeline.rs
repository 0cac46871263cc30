//! Sync pipeline entrypoint used by the CLI and the installer hook.
//!
//! ```text
//! ensure wrapper dir ─► lock ─► snapshot ─► drop stale temps
//!                                  │
//!            scan search path ─────┴─► reconcile ─► writer
//! ```
//!
//! Nothing is carried between runs; every run starts from the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use pyshim_core::Config;
use pyshim_renderer::Renderer;

use crate::error::{dir_err, SyncError};
use crate::lock::WrapperLock;
use crate::reconcile::{reconcile, Plan};
use crate::scanner::{scan, ScanReport, ScanWarning};
use crate::store::{self, ForeignEntry, StoreSnapshot};
use crate::writer::{EntryOutcome, Writer};

/// Everything a read-only pass knows about the next run.
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub scan: ScanReport,
    pub snapshot: StoreSnapshot,
    pub plan: Plan,
}

/// Per-kind totals of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Outcome of one sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub wrapper_dir: PathBuf,
    pub dry_run: bool,
    pub outcomes: Vec<EntryOutcome>,
    pub foreign: Vec<ForeignEntry>,
    pub warnings: Vec<ScanWarning>,
}

impl SyncReport {
    pub fn counts(&self) -> SyncCounts {
        let mut counts = SyncCounts::default();
        for outcome in &self.outcomes {
            match outcome {
                EntryOutcome::Created { .. } => counts.created += 1,
                EntryOutcome::Updated { .. } => counts.updated += 1,
                EntryOutcome::Removed { .. } => counts.removed += 1,
                EntryOutcome::Unchanged { .. } => counts.unchanged += 1,
                EntryOutcome::Skipped { .. } => counts.skipped += 1,
                EntryOutcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, EntryOutcome::Failed { .. }))
    }
}

/// Compute the plan without mutating anything (no lock, no directory creation).
pub fn plan(config: &Config) -> Result<PlanReport, SyncError> {
    let snapshot = store::snapshot(&config.wrapper_dir)?;
    let scan = scan(config);
    let plan = reconcile(&scan.executables, &snapshot, &config.shell);
    Ok(PlanReport {
        scan,
        snapshot,
        plan,
    })
}

/// Run the synchronizer once.
///
/// Fatal errors (wrapper directory unusable, lock unavailable) are returned
/// before anything is mutated. Per-entry failures are in the report.
pub fn run(config: &Config, dry_run: bool) -> Result<SyncReport, SyncError> {
    let renderer = Renderer::new(&config.shell)?;

    if dry_run {
        let report = plan(config)?;
        return Ok(SyncReport {
            wrapper_dir: config.wrapper_dir.clone(),
            dry_run,
            outcomes: report.plan.actions.iter().map(EntryOutcome::preview).collect(),
            foreign: report.snapshot.foreign,
            warnings: merge_warnings(report.scan.warnings, report.snapshot.warnings),
        });
    }

    ensure_wrapper_dir(&config.wrapper_dir)?;
    let _lock = WrapperLock::acquire(&config.wrapper_dir)?;

    let snapshot = store::snapshot(&config.wrapper_dir)?;
    store::remove_stale_temps(&snapshot);

    let scan = scan(config);
    let plan = reconcile(&scan.executables, &snapshot, &config.shell);
    tracing::debug!(
        "plan: {} to write, {} to remove",
        plan.to_create().count(),
        plan.to_remove().count()
    );

    let outcomes = Writer::new(&config.wrapper_dir, &renderer).apply(&plan);

    Ok(SyncReport {
        wrapper_dir: config.wrapper_dir.clone(),
        dry_run,
        outcomes,
        foreign: snapshot.foreign,
        warnings: merge_warnings(scan.warnings, snapshot.warnings),
    })
}

/// Create the wrapper directory (and parents) if missing.
fn ensure_wrapper_dir(dir: &Path) -> Result<(), SyncError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(dir_err(
                dir,
                std::io::Error::other("exists but is not a directory"),
            ))
        }
        Err(_) => {}
    }
    fs::create_dir_all(dir).map_err(|e| dir_err(dir, e))?;
    tracing::info!("created wrapper directory {}", dir.display());
    Ok(())
}

fn merge_warnings(mut scan: Vec<ScanWarning>, store: Vec<ScanWarning>) -> Vec<ScanWarning> {
    scan.extend(store);
    scan
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use std::collections::BTreeSet;
    use std::os::unix::fs::PermissionsExt;

    use pyshim_core::SearchPath;
    use tempfile::TempDir;

    use super::*;

    fn config(root: &Path) -> Config {
        Config {
            search_path: SearchPath::new([root.join("bin")]),
            wrapper_dir: root.join("exposed").join("bin"),
            shell: PathBuf::from("/bin/sh"),
            exclude: BTreeSet::new(),
        }
    }

    fn executable(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn missing_wrapper_dir_is_created() {
        let root = TempDir::new().unwrap();
        executable(&root.path().join("bin"), "pip");
        let cfg = config(root.path());

        let report = run(&cfg, false).unwrap();
        assert_eq!(report.counts().created, 1);
        assert!(cfg.wrapper_dir.join("pip").exists());
    }

    #[test]
    fn dry_run_mutates_nothing() {
        let root = TempDir::new().unwrap();
        executable(&root.path().join("bin"), "pip");
        let cfg = config(root.path());

        let report = run(&cfg, true).unwrap();
        assert!(report.dry_run);
        assert_eq!(report.counts().created, 1);
        assert!(!cfg.wrapper_dir.exists(), "dry-run must not create the directory");
    }

    #[test]
    fn wrapper_dir_that_is_a_file_is_fatal() {
        let root = TempDir::new().unwrap();
        executable(&root.path().join("bin"), "pip");
        let mut cfg = config(root.path());
        cfg.wrapper_dir = root.path().join("bin").join("pip");

        let err = run(&cfg, false).unwrap_err();
        assert!(matches!(err, SyncError::WrapperDir { .. }), "got: {err}");
    }

    #[test]
    fn wrapper_dir_under_a_file_is_fatal_before_any_mutation() {
        let root = TempDir::new().unwrap();
        executable(&root.path().join("bin"), "pip");
        let blocker = root.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut cfg = config(root.path());
        cfg.wrapper_dir = blocker.join("bin");

        let err = run(&cfg, false).unwrap_err();
        assert!(matches!(err, SyncError::WrapperDir { .. }), "got: {err}");
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "");
    }

    #[test]
    fn stale_temp_is_cleaned_and_not_reported() {
        let root = TempDir::new().unwrap();
        let cfg = config(root.path());
        fs::create_dir_all(&cfg.wrapper_dir).unwrap();
        let stale = cfg.wrapper_dir.join(".pyshim-pip.999.tmp");
        fs::write(&stale, "#!/bin/sh\n").unwrap();

        let report = run(&cfg, false).unwrap();
        assert!(!stale.exists());
        assert!(report.foreign.is_empty());
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn plan_reports_without_lock_file() {
        let root = TempDir::new().unwrap();
        executable(&root.path().join("bin"), "pip");
        let cfg = config(root.path());
        fs::create_dir_all(&cfg.wrapper_dir).unwrap();

        let report = plan(&cfg).unwrap();
        assert_eq!(report.plan.to_create().count(), 1);
        assert!(!cfg.wrapper_dir.join(crate::lock::LOCK_FILE).exists());
    }

    #[test]
    fn counts_and_failures_cover_every_outcome() {
        let report = SyncReport {
            wrapper_dir: PathBuf::from("/w"),
            dry_run: false,
            outcomes: vec![
                EntryOutcome::Created {
                    name: "a".into(),
                    target: "/a".into(),
                },
                EntryOutcome::Unchanged { name: "b".into() },
                EntryOutcome::Failed {
                    name: "c".into(),
                    error: "I/O error at /w/c: denied".into(),
                },
                EntryOutcome::Removed {
                    name: "d".into(),
                    target: "/d".into(),
                },
            ],
            foreign: Vec::new(),
            warnings: Vec::new(),
        };

        assert!(report.has_failures());
        assert_eq!(
            report.counts(),
            SyncCounts {
                created: 1,
                updated: 0,
                removed: 1,
                unchanged: 1,
                skipped: 0,
                failed: 1,
            }
        );
    }

    #[test]
    fn clean_run_has_no_failures() {
        let root = TempDir::new().unwrap();
        executable(&root.path().join("bin"), "pip");
        let report = run(&config(root.path()), false).unwrap();
        assert!(!report.has_failures());
        assert_eq!(report.counts().failed, 0);
    }
}
