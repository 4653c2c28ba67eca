use std::collections::BTreeSet;
use std::fs;

use modhistory_scan::{CollectConfig, CollectError, TreeCollector, WarningKind};
use tempfile::TempDir;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_excluded_directory_leaves_no_trace() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("skip_me/inner")).unwrap();
    fs::write(root.join("skip_me/inner/file.dat"), "data").unwrap();
    fs::write(root.join("kept.dat"), "data").unwrap();

    let config = CollectConfig::builder()
        .root(root)
        .exclude_dirs(set(&["skip_me"]))
        .build()
        .unwrap();
    let snapshot = TreeCollector::new().collect(&config).unwrap();

    for name in ["skip_me", "inner", "file.dat"] {
        assert!(!snapshot.root.contains_name(name), "{name} leaked into output");
    }
    assert!(snapshot.root.contains(&["kept.dat"]));
    assert_eq!(snapshot.stats.dirs_excluded, 1);
}

#[test]
fn test_directory_exclusion_applies_at_every_depth() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("a/b/folder1/deeper")).unwrap();
    fs::create_dir_all(root.join("folder1")).unwrap();
    fs::write(root.join("a/b/folder1/deeper/x.rs"), "").unwrap();
    fs::write(root.join("a/b/y.rs"), "").unwrap();

    let config = CollectConfig::builder()
        .root(root)
        .exclude_dirs(set(&["folder1"]))
        .threads(1usize)
        .build()
        .unwrap();
    let snapshot = TreeCollector::new().collect(&config).unwrap();

    assert_eq!(snapshot.root.paths(), ["a", "a/b", "a/b/y.rs"]);
}

#[test]
fn test_root_named_like_excluded_directory_is_scanned() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("folder1");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("inside.md"), "").unwrap();

    let config = CollectConfig::builder()
        .root(&root)
        .exclude_dirs(set(&["folder1"]))
        .build()
        .unwrap();
    let snapshot = TreeCollector::new().collect(&config).unwrap();

    assert!(snapshot.root.contains(&["inside.md"]));
}

#[test]
fn test_file_name_and_extension_exclusions() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("ignore_file_name.txt"), "").unwrap();
    fs::write(root.join("image.png"), "").unwrap();
    fs::write(root.join("notes.txt"), "").unwrap();
    fs::write(root.join("Makefile"), "").unwrap();
    fs::write(root.join("IMAGE.PNG"), "").unwrap();

    let config = CollectConfig::builder()
        .root(root)
        .exclude_files(set(&["ignore_file_name.txt"]))
        .exclude_extensions(set(&[".txt", "png"]))
        .build()
        .unwrap();
    let snapshot = TreeCollector::new().collect(&config).unwrap();

    assert_eq!(snapshot.root.paths(), ["IMAGE.PNG", "Makefile"]);
    assert_eq!(snapshot.stats.files_excluded, 3);
}

#[test]
fn test_empty_root_yields_empty_directory() {
    let temp = TempDir::new().unwrap();
    let snapshot = TreeCollector::new()
        .collect(&CollectConfig::new(temp.path()))
        .unwrap();

    assert!(snapshot.root.is_dir());
    assert_eq!(snapshot.root.file_count(), 0);
    assert_eq!(snapshot.root.dir_count(), 0);
}

#[test]
fn test_non_ascii_names_are_kept() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir(root.join("문서")).unwrap();
    fs::write(root.join("문서/보고서.hwp"), "").unwrap();

    let snapshot = TreeCollector::new()
        .collect(&CollectConfig::new(root))
        .unwrap();

    assert!(snapshot.root.get(&["문서", "보고서.hwp"]).unwrap().is_file());
}

#[cfg(unix)]
mod symlinks {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn test_broken_symlink_is_skipped_with_warning() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("real.txt"), "").unwrap();
        symlink(root.join("missing"), root.join("dangling")).unwrap();

        let snapshot = TreeCollector::new()
            .collect(&CollectConfig::new(root))
            .unwrap();

        assert!(snapshot.root.contains(&["real.txt"]));
        assert!(!snapshot.root.contains(&["dangling"]));
        assert_eq!(snapshot.warnings.len(), 1);
        assert_eq!(snapshot.warnings[0].kind, WarningKind::BrokenSymlink);
        assert_eq!(snapshot.stats.files_failed, 1);
    }

    #[test]
    fn test_strict_mode_aborts_on_unreadable_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        symlink(root.join("missing"), root.join("dangling")).unwrap();

        let config = CollectConfig::builder()
            .root(root)
            .strict(true)
            .build()
            .unwrap();
        let err = TreeCollector::new().collect(&config).unwrap_err();

        match err {
            CollectError::FileAccess { path, .. } => assert!(path.ends_with("dangling")),
            other => panic!("expected FileAccess, got {other:?}"),
        }
    }

    #[test]
    fn test_symlinked_directory_is_listed_but_not_descended() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        let outside = temp.path().join("outside");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("secret.rs"), "").unwrap();
        symlink(&outside, root.join("linked")).unwrap();

        let snapshot = TreeCollector::new()
            .collect(&CollectConfig::new(&root))
            .unwrap();

        let linked = snapshot.root.get(&["linked"]).unwrap();
        assert!(linked.is_dir());
        assert!(linked.children().unwrap().is_empty());
    }

    #[test]
    fn test_symlinked_file_gets_record() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("target.rs"), "").unwrap();
        symlink(root.join("target.rs"), root.join("alias.rs")).unwrap();

        let snapshot = TreeCollector::new()
            .collect(&CollectConfig::new(root))
            .unwrap();

        assert!(snapshot.root.get(&["alias.rs"]).unwrap().is_file());
        assert_eq!(snapshot.stats.files_recorded, 2);
    }
}

#[cfg(target_os = "linux")]
mod non_utf8_names {
    use super::*;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    #[test]
    fn test_colliding_file_names_are_not_merged() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join(OsStr::from_bytes(b"x\xff.dat")), "").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"x\xfe.dat")), "").unwrap();

        let snapshot = TreeCollector::new()
            .collect(&CollectConfig::new(root))
            .unwrap();

        assert_eq!(snapshot.root.paths(), ["x\u{FFFD}.dat"]);
        let record = snapshot.root.get(&["x\u{FFFD}.dat"]).unwrap().as_record().unwrap();
        assert_eq!(record.modification_history().len(), 1);

        assert_eq!(snapshot.stats.files_recorded, 1);
        assert_eq!(snapshot.root.file_count(), snapshot.stats.files_recorded);
        assert_eq!(snapshot.warnings.len(), 1);
        assert_eq!(snapshot.warnings[0].kind, WarningKind::NameCollision);
    }

    #[test]
    fn test_colliding_directory_is_not_descended() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for raw in [&b"d\xfe"[..], &b"d\xff"[..]] {
            let dir = root.join(OsStr::from_bytes(raw));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("inner.txt"), "").unwrap();
        }

        let snapshot = TreeCollector::new()
            .collect(&CollectConfig::new(root))
            .unwrap();

        assert_eq!(snapshot.root.paths(), ["d\u{FFFD}", "d\u{FFFD}/inner.txt"]);
        let record = snapshot
            .root
            .get(&["d\u{FFFD}", "inner.txt"])
            .unwrap()
            .as_record()
            .unwrap();
        assert_eq!(record.modification_history().len(), 1);
        assert_eq!(snapshot.stats.dirs_recorded, 1);
        assert_eq!(snapshot.warnings[0].kind, WarningKind::NameCollision);
    }

    #[test]
    fn test_distinct_non_utf8_names_are_kept() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join(OsStr::from_bytes(b"a\xff.dat")), "").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"b\xff.dat")), "").unwrap();

        let snapshot = TreeCollector::new()
            .collect(&CollectConfig::new(root))
            .unwrap();

        assert_eq!(snapshot.stats.files_recorded, 2);
        assert!(!snapshot.has_warnings());
    }
}
