#![cfg(unix)]

use std::collections::BTreeSet;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use filetime::FileTime;
use pyshim_core::{Config, SearchPath};
use pyshim_sync::{run, EntryOutcome, ScanWarning, SkipReason, UpdateReason};
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    first: PathBuf,
    second: PathBuf,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().expect("root");
        let first = root.path().join("python").join("bin");
        let second = root.path().join("extra").join("bin");
        fs::create_dir_all(&first).expect("mkdir first");
        fs::create_dir_all(&second).expect("mkdir second");
        let config = Config {
            search_path: SearchPath::new([first.clone(), second.clone()]),
            wrapper_dir: root.path().join("module").join("system").join("bin"),
            shell: PathBuf::from("/bin/sh"),
            exclude: BTreeSet::new(),
        };
        Self {
            _root: root,
            first,
            second,
            config,
        }
    }

    fn wrapper(&self, name: &str) -> PathBuf {
        self.config.wrapper_dir.join(name)
    }
}

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

fn names(outcomes: &[EntryOutcome]) -> Vec<String> {
    outcomes.iter().map(|o| o.name().to_string()).collect()
}

#[test]
fn first_match_in_search_order_wins() {
    let fx = Fixture::new();
    let winner = script(&fx.first, "pip", "echo first");
    script(&fx.second, "pip", "echo second");
    script(&fx.second, "wheel", "echo wheel");

    let report = run(&fx.config, false).expect("sync");
    assert_eq!(report.counts().created, 2);

    let content = fs::read_to_string(fx.wrapper("pip")).expect("read wrapper");
    assert!(
        content.contains(&format!("exec '{}' \"$@\"", winner.display())),
        "wrapper should forward to the first directory: {content}"
    );
}

#[test]
fn second_run_is_a_noop_and_leaves_files_untouched() {
    let fx = Fixture::new();
    script(&fx.first, "pip", "echo pip");
    script(&fx.first, "python3", "echo py");
    run(&fx.config, false).expect("first sync");

    let old = FileTime::from_unix_time(1_000_000, 0);
    for name in ["pip", "python3"] {
        filetime::set_file_mtime(fx.wrapper(name), old).expect("set mtime");
    }

    let report = run(&fx.config, false).expect("second sync");
    let counts = report.counts();
    assert_eq!(counts.unchanged, 2);
    assert_eq!(counts.created + counts.updated + counts.removed, 0);

    for name in ["pip", "python3"] {
        let meta = fs::metadata(fx.wrapper(name)).expect("stat");
        assert_eq!(
            FileTime::from_last_modification_time(&meta),
            old,
            "{name} must not be rewritten"
        );
    }
}

#[test]
fn vanished_executable_removes_its_wrapper() {
    let fx = Fixture::new();
    let tool = script(&fx.first, "tool", "true");
    script(&fx.first, "keep", "true");
    run(&fx.config, false).expect("first sync");

    fs::remove_file(tool).expect("rm");
    let report = run(&fx.config, false).expect("second sync");

    assert!(report
        .outcomes
        .iter()
        .any(|o| matches!(o, EntryOutcome::Removed { name, .. } if name.as_str() == "tool")));
    assert!(!fx.wrapper("tool").exists());
    assert!(fx.wrapper("keep").exists());
}

#[test]
fn moved_executable_rewrites_target() {
    let fx = Fixture::new();
    let old = script(&fx.second, "pip", "echo old");
    run(&fx.config, false).expect("first sync");
    assert!(fs::read_to_string(fx.wrapper("pip"))
        .expect("read")
        .contains(&old.display().to_string()));

    let new = script(&fx.first, "pip", "echo new");
    let report = run(&fx.config, false).expect("second sync");

    assert_eq!(
        report.outcomes,
        vec![EntryOutcome::Updated {
            name: "pip".into(),
            from: old,
            to: new.clone(),
            reason: UpdateReason::TargetMoved,
        }]
    );
    assert!(fs::read_to_string(fx.wrapper("pip"))
        .expect("read")
        .contains(&new.display().to_string()));
}

#[test]
fn foreign_files_are_never_touched() {
    let fx = Fixture::new();
    fs::create_dir_all(&fx.config.wrapper_dir).expect("mkdir");
    let handmade = "#!/bin/sh\necho hand-made\n";
    fs::write(fx.wrapper("pip"), handmade).expect("write foreign");
    fs::write(fx.wrapper("busybox"), handmade).expect("write foreign");
    script(&fx.first, "pip", "echo pip");
    script(&fx.first, "idle", "echo idle");

    let report = run(&fx.config, false).expect("sync");

    assert_eq!(fs::read_to_string(fx.wrapper("pip")).expect("read"), handmade);
    assert_eq!(fs::read_to_string(fx.wrapper("busybox")).expect("read"), handmade);
    assert!(fx.wrapper("idle").exists());
    assert!(report.outcomes.iter().any(|o| matches!(
        o,
        EntryOutcome::Skipped {
            reason: SkipReason::ForeignConflict(_),
            ..
        }
    )));
    assert_eq!(report.foreign.len(), 2);
    assert!(!report.has_failures());
    assert_eq!(names(&report.outcomes), vec!["idle", "pip"]);
}

#[test]
fn excluded_names_get_no_wrapper() {
    let mut fx = Fixture::new();
    script(&fx.first, "pip", "true");
    script(&fx.first, "python3-config", "true");
    fx.config.exclude.insert("python3-config".into());

    run(&fx.config, false).expect("sync");
    assert!(fx.wrapper("pip").exists());
    assert!(!fx.wrapper("python3-config").exists());
}

#[test]
fn wrapper_behaves_like_its_target() {
    let fx = Fixture::new();
    script(
        &fx.first,
        "tool",
        r#"printf '%s|' "$@"; echo "$PYSHIM_PROBE"; echo oops >&2; exit 7"#,
    );
    run(&fx.config, false).expect("sync");

    let direct = Command::new(fx.first.join("tool"))
        .args(["a b", "it's", ""])
        .env("PYSHIM_PROBE", "env-ok")
        .output()
        .expect("run target");
    let wrapped = Command::new(fx.wrapper("tool"))
        .args(["a b", "it's", ""])
        .env("PYSHIM_PROBE", "env-ok")
        .output()
        .expect("run wrapper");

    assert_eq!(wrapped.stdout, direct.stdout);
    assert_eq!(wrapped.stderr, direct.stderr);
    assert_eq!(wrapped.status.code(), Some(7));
    assert_eq!(String::from_utf8_lossy(&wrapped.stdout), "a b|it's||env-ok\n");
}

#[test]
fn target_path_with_quote_is_executed() {
    let fx = Fixture::new();
    let odd = fx.first.join("it's here");
    fs::create_dir_all(&odd).expect("mkdir");
    let mut config = fx.config.clone();
    config.search_path = SearchPath::new([odd.clone()]);
    script(&odd, "hello", "echo hi");

    run(&config, false).expect("sync");
    let out = Command::new(config.wrapper_dir.join("hello"))
        .output()
        .expect("run wrapper");
    assert_eq!(String::from_utf8_lossy(&out.stdout), "hi\n");
}

#[test]
fn line_break_in_name_never_reaches_the_wrapper_dir() {
    let fx = Fixture::new();
    script(&fx.first, "pip", "exit 0");
    script(&fx.first, "a\nb", "exit 0");
    script(&fx.first, "c\r\nd", "exit 0");

    let first = run(&fx.config, false).expect("first run");
    assert_eq!(names(&first.outcomes), ["pip"]);
    assert_eq!(
        first
            .warnings
            .iter()
            .filter(|w| matches!(w, ScanWarning::ControlCharacter { .. }))
            .count(),
        2
    );

    let second = run(&fx.config, false).expect("second run");
    assert!(second.foreign.is_empty(), "{:?}", second.foreign);
    assert!(second
        .outcomes
        .iter()
        .all(|o| matches!(o, EntryOutcome::Unchanged { .. })));
    assert!(!fx.wrapper("a\nb").exists());
    assert!(!fx.wrapper("c\r\nd").exists());
}
