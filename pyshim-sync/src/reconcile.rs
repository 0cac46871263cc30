//! Reconciler: pure diff of desired executables against owned wrappers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use pyshim_core::{Executable, ExecutableName};
use pyshim_renderer::{ForeignReason, MARKER_VERSION};

use crate::store::StoreSnapshot;

/// Why an owned wrapper has to be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    /// The name now resolves to a different target.
    TargetMoved,
    /// The configured shell changed.
    ShellChanged,
    /// Written by an older marker version.
    MarkerUpgrade,
}

impl fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpdateReason::TargetMoved => "target moved",
            UpdateReason::ShellChanged => "shell changed",
            UpdateReason::MarkerUpgrade => "older marker",
        })
    }
}

/// One step of a [`Plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create {
        name: ExecutableName,
        target: PathBuf,
    },
    Update {
        name: ExecutableName,
        from: PathBuf,
        to: PathBuf,
        reason: UpdateReason,
    },
    Remove {
        name: ExecutableName,
        target: PathBuf,
    },
    Unchanged {
        name: ExecutableName,
        target: PathBuf,
    },
    /// Desired, but a foreign file holds the name.
    Conflict {
        name: ExecutableName,
        target: PathBuf,
        reason: ForeignReason,
    },
}

impl Action {
    pub fn name(&self) -> &ExecutableName {
        match self {
            Action::Create { name, .. }
            | Action::Update { name, .. }
            | Action::Remove { name, .. }
            | Action::Unchanged { name, .. }
            | Action::Conflict { name, .. } => name,
        }
    }

    /// `true` for actions the writer has to carry out.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Action::Create { .. } | Action::Update { .. } | Action::Remove { .. }
        )
    }
}

/// Ordered (by name) list of actions for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    /// Create and Update actions.
    pub fn to_create(&self) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Create { .. } | Action::Update { .. }))
    }

    pub fn to_remove(&self) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Remove { .. }))
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Conflict { .. }))
    }

    /// No filesystem change needed.
    pub fn is_noop(&self) -> bool {
        !self.actions.iter().any(Action::is_mutation)
    }
}

/// Diff `desired` against `snapshot`; `shell` is the interpreter new
/// wrappers would be written with.
pub fn reconcile(
    desired: &BTreeMap<ExecutableName, Executable>,
    snapshot: &StoreSnapshot,
    shell: &Path,
) -> Plan {
    let names: BTreeSet<&ExecutableName> = desired.keys().chain(snapshot.owned.keys()).collect();
    let mut actions = Vec::with_capacity(names.len());

    for name in names {
        let action = match (desired.get(name), snapshot.owned.get(name)) {
            (Some(exe), Some(info)) => {
                let reason = if info.target != exe.target {
                    Some(UpdateReason::TargetMoved)
                } else if info.shell != shell {
                    Some(UpdateReason::ShellChanged)
                } else if info.version != MARKER_VERSION {
                    Some(UpdateReason::MarkerUpgrade)
                } else {
                    None
                };
                match reason {
                    Some(reason) => Action::Update {
                        name: name.clone(),
                        from: info.target.clone(),
                        to: exe.target.clone(),
                        reason,
                    },
                    None => Action::Unchanged {
                        name: name.clone(),
                        target: exe.target.clone(),
                    },
                }
            }
            (Some(exe), None) => match snapshot.foreign_reason(name.as_str()) {
                Some(reason) => Action::Conflict {
                    name: name.clone(),
                    target: exe.target.clone(),
                    reason,
                },
                None => Action::Create {
                    name: name.clone(),
                    target: exe.target.clone(),
                },
            },
            (None, Some(info)) => Action::Remove {
                name: name.clone(),
                target: info.target.clone(),
            },
            (None, None) => continue,
        };
        actions.push(action);
    }

    Plan { actions }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pyshim_renderer::WrapperInfo;

    use crate::store::ForeignEntry;

    use super::*;

    const SHELL: &str = "/system/bin/sh";

    fn desired(entries: &[(&str, &str)]) -> BTreeMap<ExecutableName, Executable> {
        entries
            .iter()
            .map(|(name, target)| (ExecutableName::from(*name), Executable::new(*name, *target)))
            .collect()
    }

    fn owned(entries: &[(&str, &str)]) -> StoreSnapshot {
        let mut snap = StoreSnapshot::default();
        for (name, target) in entries {
            snap.owned.insert(
                ExecutableName::from(*name),
                WrapperInfo {
                    version: MARKER_VERSION,
                    shell: PathBuf::from(SHELL),
                    target: PathBuf::from(target),
                },
            );
        }
        snap
    }

    fn plan(
        desired: &BTreeMap<ExecutableName, Executable>,
        snapshot: &StoreSnapshot,
    ) -> Plan {
        reconcile(desired, snapshot, Path::new(SHELL))
    }

    #[test]
    fn new_executable_is_created() {
        let p = plan(&desired(&[("pip", "/a/pip")]), &owned(&[]));
        assert_eq!(
            p.actions,
            vec![Action::Create {
                name: "pip".into(),
                target: "/a/pip".into()
            }]
        );
        assert!(!p.is_noop());
    }

    #[test]
    fn vanished_executable_is_removed() {
        let p = plan(&desired(&[]), &owned(&[("bar", "/a/bar")]));
        assert_eq!(
            p.actions,
            vec![Action::Remove {
                name: "bar".into(),
                target: "/a/bar".into()
            }]
        );
        assert_eq!(p.to_remove().count(), 1);
    }

    #[test]
    fn moved_target_is_an_update() {
        let p = plan(&desired(&[("foo", "/b/foo")]), &owned(&[("foo", "/a/foo")]));
        assert_eq!(
            p.actions,
            vec![Action::Update {
                name: "foo".into(),
                from: "/a/foo".into(),
                to: "/b/foo".into(),
                reason: UpdateReason::TargetMoved,
            }]
        );
        assert_eq!(p.to_create().count(), 1);
    }

    #[test]
    fn matching_state_is_a_noop() {
        let p = plan(
            &desired(&[("pip", "/a/pip"), ("python3", "/a/python3")]),
            &owned(&[("pip", "/a/pip"), ("python3", "/a/python3")]),
        );
        assert!(p.is_noop());
        assert!(p
            .actions
            .iter()
            .all(|a| matches!(a, Action::Unchanged { .. })));
    }

    #[test]
    fn foreign_file_blocks_create_and_is_never_removed() {
        let mut snap = owned(&[]);
        snap.foreign.push(ForeignEntry {
            name: "baz".into(),
            reason: ForeignReason::NoMarker,
        });
        snap.foreign.push(ForeignEntry {
            name: "qux".into(),
            reason: ForeignReason::Binary,
        });

        let p = plan(&desired(&[("baz", "/a/baz")]), &snap);
        assert_eq!(
            p.actions,
            vec![Action::Conflict {
                name: "baz".into(),
                target: "/a/baz".into(),
                reason: ForeignReason::NoMarker,
            }]
        );
        assert!(p.is_noop());
        assert_eq!(p.conflicts().count(), 1);
    }

    #[test]
    fn shell_change_rewrites_wrapper() {
        let p = reconcile(
            &desired(&[("pip", "/a/pip")]),
            &owned(&[("pip", "/a/pip")]),
            Path::new("/bin/sh"),
        );
        assert!(matches!(
            p.actions.as_slice(),
            [Action::Update {
                reason: UpdateReason::ShellChanged,
                ..
            }]
        ));
    }

    #[test]
    fn actions_are_sorted_by_name() {
        let p = plan(
            &desired(&[("zz", "/a/zz"), ("aa", "/a/aa")]),
            &owned(&[("mm", "/a/mm")]),
        );
        let names: Vec<&str> = p.actions.iter().map(|a| a.name().as_str()).collect();
        assert_eq!(names, vec!["aa", "mm", "zz"]);
    }
}
