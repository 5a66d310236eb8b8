/*!
 * Confined filesystem tests over the host filesystem
 */

#![cfg(unix)]

use confinefs::vfs::{confined, paths};
use confinefs::vfs::{ConfinedFS, FileSystem, LocalFS, Permissions, SymlinkFileSystem, VfsError};
use pretty_assertions::assert_eq;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn setup() -> (TempDir, ConfinedFS<LocalFS>) {
    let temp = TempDir::new().unwrap();
    let fs = ConfinedFS::with_symlinks(LocalFS::new(), temp.path()).unwrap();
    (temp, fs)
}

#[test]
fn test_open_reads_file_under_base() {
    let (temp, fs) = setup();
    std::fs::write(temp.path().join("x.txt"), "hi").unwrap();

    let mut file = fs.open(Path::new("/x.txt")).unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "hi");
    assert_eq!(file.name(), Path::new("/x.txt"));
    assert_eq!(file.stat().unwrap().name, "x.txt");
}

#[test]
fn test_create_writes_under_base() {
    let (temp, fs) = setup();
    fs.mkdir(Path::new("/docs"), Permissions::directory()).unwrap();
    let mut file = fs.create(Path::new("/docs/../docs/./new.txt")).unwrap();
    file.write_all(b"payload").unwrap();
    file.close().unwrap();

    let host = std::fs::read(temp.path().join("docs/new.txt")).unwrap();
    assert_eq!(host, b"payload");
    assert_eq!(fs.read_file(Path::new("docs/new.txt")).unwrap(), b"payload");
}

#[test]
fn test_construction_failures() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain");
    std::fs::write(&file, "x").unwrap();

    assert!(matches!(
        ConfinedFS::new(LocalFS::new(), ""),
        Err(VfsError::InvalidArgument(_))
    ));
    assert!(matches!(
        ConfinedFS::new(LocalFS::new(), "relative/dir"),
        Err(VfsError::InvalidPath(_))
    ));
    assert!(matches!(
        ConfinedFS::new(LocalFS::new(), temp.path().join("missing")),
        Err(VfsError::NotFound(_))
    ));
    assert!(matches!(
        ConfinedFS::new(LocalFS::new(), &file),
        Err(VfsError::NotADirectory(_))
    ));
}

#[test]
fn test_errors_never_mention_base() {
    let (temp, fs) = setup();
    let base = temp.path().display().to_string();

    let failures = [
        fs.stat(Path::new("/missing")).unwrap_err(),
        fs.read_dir(Path::new("/missing")).unwrap_err(),
        fs.remove(Path::new("/missing")).unwrap_err(),
        fs.mkdir(Path::new("/a/b/c"), Permissions::directory()).unwrap_err(),
        fs.rename(Path::new("/missing"), Path::new("/other")).unwrap_err(),
        fs.readlink(Path::new("/missing")).unwrap_err(),
    ];
    for err in failures {
        let message = err.to_string();
        assert!(!message.contains(&base), "leaked base in {message}");
    }
}

#[test]
fn test_symlink_targets_are_translated() {
    let (temp, fs) = setup();
    fs.mkdir(Path::new("/testdir"), Permissions::directory()).unwrap();

    fs.symlink(Path::new("/testdir"), Path::new("/abs_link")).unwrap();
    let host_target = std::fs::read_link(temp.path().join("abs_link")).unwrap();
    assert_eq!(host_target, temp.path().join("testdir"));
    assert_eq!(
        fs.readlink(Path::new("/abs_link")).unwrap(),
        PathBuf::from("/testdir")
    );
    assert!(fs.stat(Path::new("/abs_link")).unwrap().is_dir());
    let link_md = fs.lstat(Path::new("/abs_link")).unwrap();
    assert!(link_md.is_symlink());
    assert_eq!(link_md.name, "abs_link");

    fs.symlink(Path::new("testdir"), Path::new("/rel_link")).unwrap();
    assert_eq!(
        std::fs::read_link(temp.path().join("rel_link")).unwrap(),
        PathBuf::from("testdir")
    );
    assert_eq!(
        fs.readlink(Path::new("/rel_link")).unwrap(),
        PathBuf::from("testdir")
    );
}

#[test]
fn test_readlink_outside_base_passes_through() {
    let (temp, fs) = setup();
    std::os::unix::fs::symlink("/etc/hostname", temp.path().join("out")).unwrap();
    assert_eq!(
        fs.readlink(Path::new("/out")).unwrap(),
        PathBuf::from("/etc/hostname")
    );

    std::os::unix::fs::symlink(temp.path(), temp.path().join("self")).unwrap();
    assert_eq!(fs.readlink(Path::new("/self")).unwrap(), PathBuf::from("/"));
}

#[test]
fn test_readlink_dotdot_past_base_passes_through() {
    let temp = TempDir::new().unwrap();
    let base = temp.path().join("base");
    std::fs::create_dir(&base).unwrap();
    std::fs::write(temp.path().join("secret"), "s").unwrap();
    let fs = ConfinedFS::with_symlinks(LocalFS::new(), &base).unwrap();

    let target = base.join("../secret");
    std::os::unix::fs::symlink(&target, base.join("tricky")).unwrap();
    assert_eq!(fs.readlink(Path::new("/tricky")).unwrap(), target);

    std::os::unix::fs::symlink(base.join("a/../b"), base.join("inside")).unwrap();
    assert_eq!(fs.readlink(Path::new("/inside")).unwrap(), PathBuf::from("/b"));
}

#[test]
fn test_sub_confines_to_subtree() {
    let (temp, fs) = setup();
    fs.mkdir_all(Path::new("/outer/inner"), Permissions::directory()).unwrap();
    std::fs::write(temp.path().join("outer/top.txt"), "top").unwrap();

    let sub = fs.sub("/outer/inner").unwrap();
    assert_eq!(sub.base_dir(), temp.path().join("outer/inner"));
    assert!(sub.read_file(Path::new("/../top.txt")).unwrap_err().is_not_found());
    assert!(sub.read_file(Path::new("../../outer/top.txt")).is_err());

    sub.create(Path::new("/n.txt")).unwrap();
    assert!(temp.path().join("outer/inner/n.txt").exists());
    let message = sub.readlink(Path::new("/missing")).unwrap_err().to_string();
    assert!(!message.contains("outer"), "{message}");
}

#[test]
fn test_symlink_cannot_point_outside() {
    let (_temp, fs) = setup();
    let err = fs
        .symlink(Path::new("/../../etc/passwd"), Path::new("/bad"))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(fs.lstat(Path::new("/bad")).is_err());
}

#[test]
fn test_rename_within_base() {
    let (temp, fs) = setup();
    fs.create(Path::new("/a.txt")).unwrap();
    fs.rename(Path::new("/a.txt"), Path::new("/b.txt")).unwrap();
    assert!(temp.path().join("b.txt").exists());

    let err = fs
        .rename(Path::new("/../escape"), Path::new("/b.txt"))
        .unwrap_err();
    match err {
        VfsError::Link { op, old, new, .. } => {
            assert_eq!(op, "rename");
            assert_eq!(old, "/../escape");
            assert_eq!(new, "/b.txt");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_temp_dir_is_virtual() {
    let (_temp, fs) = setup();
    // Base lives inside the host temp dir, so the backend's is unusable
    assert_eq!(fs.temp_dir(), PathBuf::from("/tmp"));

    let host = ConfinedFS::new(LocalFS::new(), "/").unwrap();
    assert_eq!(host.temp_dir(), paths::clean(&std::env::temp_dir()));
}

#[test]
fn test_metadata_operations() {
    let (_temp, fs) = setup();
    fs.create(Path::new("/m.txt")).unwrap();
    fs.truncate(Path::new("/m.txt"), 16).unwrap();
    assert_eq!(fs.stat(Path::new("/m.txt")).unwrap().size, 16);

    fs.chmod(Path::new("/m.txt"), Permissions::new(0o600)).unwrap();
    assert_eq!(
        fs.stat(Path::new("/m.txt")).unwrap().permissions.mode & 0o777,
        0o600
    );

    let then = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(86_400);
    fs.chtimes(Path::new("/m.txt"), then, then).unwrap();
    assert_eq!(fs.stat(Path::new("/m.txt")).unwrap().modified, then);
}

#[test]
fn test_cwd_feeds_empty_path() {
    let (_temp, fs) = setup();
    fs.mkdir_all(Path::new("/a/b"), Permissions::directory()).unwrap();
    fs.chdir(Path::new("/a")).unwrap();
    fs.chdir(Path::new("b")).unwrap();
    assert_eq!(fs.getwd().unwrap(), PathBuf::from("/a/b"));
    assert_eq!(fs.stat(Path::new("")).unwrap().name, "b");
}

#[test]
fn test_introspection() {
    let (temp, fs) = setup();
    let dyn_fs: &dyn FileSystem = &fs;
    assert_eq!(confined::base_dir(dyn_fs), Some(temp.path()));
    assert_eq!(confined::unwrap(dyn_fs).name(), "local");

    let local = LocalFS::new();
    assert_eq!(confined::base_dir(&local), None);
    assert_eq!(confined::unwrap(&local).name(), "local");
}
