/*!
 * Traversal resistance properties
 */

use confinefs::vfs::confined::PathTranslator;
use confinefs::vfs::{
    paths, ConfinedFS, FileSystem, LocalFS, MemFS, OpenFlags, Permissions, SymlinkFileSystem,
    WalkControl, Walker,
};
use proptest::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const BASE: &str = "/srv/base";

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("..".to_string()),
        Just(".".to_string()),
        Just(String::new()),
        Just("basefoo".to_string()),
        Just("..\\..".to_string()),
        Just("a\0b".to_string()),
        "[a-z]{1,6}",
    ]
}

fn hostile_path() -> impl Strategy<Value = String> {
    (any::<bool>(), prop::collection::vec(segment(), 0..8)).prop_map(|(rooted, segs)| {
        let joined = segs.join("/");
        if rooted {
            format!("/{joined}")
        } else {
            joined
        }
    })
}

fn normal_path() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec("[a-zA-Z0-9_.-]{1,8}", 0..6).prop_map(|segs| {
        let mut path = PathBuf::from("/");
        for seg in segs.into_iter().filter(|s| s != "." && s != "..") {
            path.push(seg);
        }
        path
    })
}

proptest! {
    #[test]
    fn resolved_paths_stay_under_base(input in hostile_path()) {
        let translator = PathTranslator::new(Path::new(BASE), Path::new("/"));
        match translator.resolve(Path::new(&input)) {
            Ok(real) => prop_assert!(real.starts_with(BASE), "{input:?} -> {real:?}"),
            Err(err) => prop_assert!(err.is_not_found()),
        }
    }

    #[test]
    fn reverse_map_inverts_resolve(virt in normal_path()) {
        let translator = PathTranslator::new(Path::new(BASE), Path::new("/"));
        let real = translator.resolve(&virt).unwrap();
        prop_assert_eq!(translator.reverse_map(&real), paths::clean_rooted(&virt));
    }

    #[test]
    fn hostile_paths_never_reach_outside_files(input in hostile_path()) {
        let fs = MemFS::new();
        fs.mkdir_all(Path::new("/srv/base"), Permissions::directory()).unwrap();
        fs.mkdir_all(Path::new("/srv/basefoo"), Permissions::directory()).unwrap();
        fs.create(Path::new("/srv/secret")).unwrap().write_all(b"s").unwrap();
        fs.create(Path::new("/srv/basefoo/secret")).unwrap().write_all(b"s").unwrap();

        let jail = ConfinedFS::new(fs, BASE).unwrap();
        // No file named `secret` exists below the base
        let target = format!("{input}/secret");
        prop_assert!(jail.read_file(Path::new(&target)).is_err(), "{target:?} was readable");
    }
}

/// Host layout: `base/` is confined, `secret` and `basefoo/secret` sit beside it
struct HostFixture {
    temp: TempDir,
    jail: ConfinedFS<LocalFS>,
}

impl HostFixture {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("base/docs")).unwrap();
        std::fs::create_dir(temp.path().join("basefoo")).unwrap();
        std::fs::write(temp.path().join("secret"), "s").unwrap();
        std::fs::write(temp.path().join("basefoo/secret"), "s").unwrap();
        std::fs::write(temp.path().join("base/docs/a.txt"), "a").unwrap();
        let jail = ConfinedFS::with_symlinks(LocalFS::new(), temp.path().join("base")).unwrap();
        Self { temp, jail }
    }

    fn outside(&self) -> [PathBuf; 2] {
        [
            self.temp.path().join("secret"),
            self.temp.path().join("basefoo/secret"),
        ]
    }

    fn snapshot(&self) -> Vec<(Vec<u8>, std::fs::Permissions, SystemTime)> {
        self.outside()
            .iter()
            .map(|path| {
                let md = std::fs::metadata(path).unwrap();
                (std::fs::read(path).unwrap(), md.permissions(), md.modified().unwrap())
            })
            .collect()
    }
}

/// Run every path-taking operation with `a` and `b`; results are ignored
fn exercise_every_operation(jail: &ConfinedFS<LocalFS>, a: &Path, b: &Path) {
    let then = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400);
    let (uid, gid) = jail
        .stat(Path::new("/"))
        .map(|md| (md.uid, md.gid))
        .unwrap_or_default();

    let _ = jail.stat(a);
    let _ = jail.read_file(a);
    let _ = jail.read_dir(a);
    let _ = jail.open(a);
    let _ = jail.open_file(a, OpenFlags::read_write(), Permissions::readwrite());
    let _ = jail.open_file(b, OpenFlags::create_truncate(), Permissions::readwrite());
    if let Ok(mut file) = jail.create(a) {
        let _ = file.write_all(b"x");
    }
    let _ = jail.mkdir(a, Permissions::directory());
    let _ = jail.mkdir_all(b, Permissions::directory());
    let _ = jail.truncate(a, 0);
    let _ = jail.chmod(a, Permissions::new(0o755));
    let _ = jail.chown(a, uid, gid);
    let _ = jail.chtimes(a, then, then);
    let _ = jail.rename(a, b);
    let _ = jail.rename(b, a);
    let _ = jail.lstat(a);
    let _ = jail.lchown(b, uid, gid);
    // Relative targets are stored verbatim and later operations would follow them
    let _ = jail.symlink(Path::new(&format!("/{}", a.display())), b);
    let _ = jail.readlink(b);
    let _ = Walker::walk(jail, a, &mut |_, _| Ok(WalkControl::Continue));
    let _ = Walker::fast_walk(jail, b, &|_, _| Ok(WalkControl::Continue));
    let _ = jail.chdir(a);
    let _ = jail.stat(Path::new(""));
    let _ = jail.remove(a);
    let _ = jail.remove_all(b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn hostile_paths_leave_siblings_untouched(a in hostile_path(), b in hostile_path()) {
        let host = HostFixture::new();
        let before = host.snapshot();

        exercise_every_operation(&host.jail, Path::new(&a), Path::new(&b));
        exercise_every_operation(&host.jail, Path::new(&format!("{a}/secret")), Path::new(&b));

        prop_assert_eq!(host.snapshot(), before);
    }
}

#[test]
fn test_every_operation_with_known_escapes() {
    let host = HostFixture::new();
    let before = host.snapshot();
    let escapes = [
        "../secret",
        "/../secret",
        "docs/../../secret",
        "../basefoo/secret",
        "/../../../../etc/passwd",
        "..\\secret",
        "secret\0",
        "",
        "/",
    ];

    for a in escapes {
        for b in escapes {
            exercise_every_operation(&host.jail, Path::new(a), Path::new(b));
        }
    }
    assert_eq!(host.snapshot(), before);
    for path in host.outside() {
        assert_eq!(std::fs::read(path).unwrap(), b"s");
    }
}

#[test]
fn test_known_escape_attempts() {
    let translator = PathTranslator::new(Path::new(BASE), Path::new("/"));
    for input in [
        "..",
        "../",
        "/..",
        "/../etc/passwd",
        "../../../../etc/passwd",
        "a/../../etc",
        "./../basefoo",
        "/../basefoo/secret",
    ] {
        assert!(
            translator.resolve(Path::new(input)).is_err(),
            "{input} should be rejected"
        );
    }
}

#[test]
fn test_odd_bytes_stay_inside() {
    let translator = PathTranslator::new(Path::new(BASE), Path::new("/"));
    for input in ["\0", "a\0/../..", "..\\..\\etc", "\\", "//..//..//x"] {
        if let Ok(real) = translator.resolve(Path::new(input)) {
            assert!(real.starts_with(BASE), "{input:?} -> {real:?}");
        }
    }
}
