/*!
 * Walk and fast walk through a confined filesystem
 */

use confinefs::vfs::{
    ConfinedFS, FileSystem, LocalFS, MemFS, Permissions, VfsError, WalkControl, Walker,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 5 files and 3 directories below the root
fn populated() -> (TempDir, ConfinedFS<LocalFS>) {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    std::fs::create_dir_all(root.join("src/nested")).unwrap();
    std::fs::create_dir(root.join("docs")).unwrap();
    for file in ["README", "src/lib.rs", "src/nested/mod.rs", "docs/a.md", "docs/b.md"] {
        std::fs::write(root.join(file), file).unwrap();
    }
    let fs = ConfinedFS::new(LocalFS::new(), root).unwrap();
    (temp, fs)
}

fn expected() -> BTreeSet<PathBuf> {
    [
        "/",
        "/README",
        "/docs",
        "/docs/a.md",
        "/docs/b.md",
        "/src",
        "/src/lib.rs",
        "/src/nested",
        "/src/nested/mod.rs",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

#[test]
fn test_walk_visits_every_virtual_path() {
    let (_temp, fs) = populated();
    let mut order = Vec::new();
    fs.walk(Path::new("/"), &mut |path, info| {
        let md = info?;
        if path == Path::new("/") {
            assert_eq!(md.name, "/");
        }
        order.push(path.to_path_buf());
        Ok(WalkControl::Continue)
    })
    .unwrap();

    assert_eq!(order.len(), 9);
    assert_eq!(order[0], PathBuf::from("/"));
    assert_eq!(order.iter().cloned().collect::<BTreeSet<_>>(), expected());

    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted, "walk should be lexical depth-first");
}

#[test]
fn test_walk_subtree_and_skip() {
    let (_temp, fs) = populated();
    let mut seen = Vec::new();
    fs.walk(Path::new("/src"), &mut |path, info| {
        seen.push(path.to_path_buf());
        if info?.is_dir() && path.ends_with("nested") {
            return Ok(WalkControl::SkipDir);
        }
        Ok(WalkControl::Continue)
    })
    .unwrap();

    let seen: Vec<_> = seen.iter().map(|p| p.display().to_string()).collect();
    assert_eq!(seen, ["/src", "/src/lib.rs", "/src/nested"]);
}

#[test]
fn test_walk_callback_error_aborts() {
    let (_temp, fs) = populated();
    let mut calls = 0;
    let err = fs
        .walk(Path::new("/"), &mut |path, _| {
            calls += 1;
            if path == Path::new("/docs") {
                return Err(VfsError::InvalidArgument("stop".into()));
            }
            Ok(WalkControl::Continue)
        })
        .unwrap_err();
    assert_eq!(err, VfsError::InvalidArgument("stop".into()));
    assert_eq!(calls, 3);
}

#[test]
fn test_walk_missing_root_reports_virtual_path() {
    let (temp, fs) = populated();
    let base = temp.path().display().to_string();
    let mut errors = Vec::new();
    fs.walk(Path::new("/nope"), &mut |path, info| {
        assert_eq!(path, Path::new("/nope"));
        if let Err(e) = info {
            errors.push(e.to_string());
        }
        Ok(WalkControl::Continue)
    })
    .unwrap();

    assert_eq!(errors.len(), 1);
    assert!(!errors[0].contains(&base), "{}", errors[0]);
}

#[test]
fn test_fast_walk_matches_walk() {
    let (_temp, fs) = populated();
    let seen = Mutex::new(BTreeSet::new());
    fs.fast_walk(Path::new("/"), &|path, _| {
        seen.lock().insert(path.to_path_buf());
        Ok(WalkControl::Continue)
    })
    .unwrap();
    assert_eq!(seen.into_inner(), expected());
}

#[test]
fn test_walk_escape_is_rejected() {
    let (_temp, fs) = populated();
    let err = fs
        .walk(Path::new("/../.."), &mut |_, _| Ok(WalkControl::Continue))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_walk_unsupported_backend() {
    let mem = MemFS::new();
    mem.mkdir(Path::new("/jail"), Permissions::directory()).unwrap();
    let fs = ConfinedFS::new(mem, "/jail").unwrap();

    assert!(fs.walker().is_none());
    let err = fs
        .walk(Path::new("/"), &mut |_, _| Ok(WalkControl::Continue))
        .unwrap_err();
    assert_eq!(err, VfsError::WalkUnsupported);
}
