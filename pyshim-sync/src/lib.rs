//! # pyshim-sync
//!
//! Scanner, wrapper store, reconciler and atomic writer.
//!
//! Call [`run`] to bring the wrapper directory in line with the search path,
//! [`status`] for a read-only per-name report, or [`diff_wrappers`] for the
//! unified diff the next run would apply.

pub mod diff;
pub mod error;
pub mod lock;
pub mod pipeline;
pub mod reconcile;
pub mod scanner;
pub mod status;
pub mod store;
pub mod writer;

pub use diff::{diff_wrappers, WrapperDiff};
pub use error::SyncError;
pub use lock::WrapperLock;
pub use pipeline::{plan, run, PlanReport, SyncCounts, SyncReport};
pub use reconcile::{reconcile, Action, Plan, UpdateReason};
pub use scanner::{scan, ScanReport, ScanWarning};
pub use status::{status, StatusEntry, WrapperState};
pub use store::{ForeignEntry, StoreSnapshot};
pub use writer::{EntryOutcome, SkipReason, Writer};
