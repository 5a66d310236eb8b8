/*!
 * Local Filesystem Backend
 * Host filesystem access through std::fs
 */

use parking_lot::RwLock;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::paths::{self, ROOT};
use super::traits::{FastWalkFn, FileSystem, OpenFile, SymlinkFileSystem, WalkControl, WalkFn, Walker};
use super::types::*;

/// Host filesystem
///
/// Absolute paths are used as given. Relative paths resolve against the
/// filesystem's own working directory, which starts at the process working
/// directory and is never written back to the process.
#[derive(Debug, Clone)]
pub struct LocalFS {
    cwd: Arc<RwLock<PathBuf>>,
    readonly: bool,
}

impl LocalFS {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from(ROOT));
        Self {
            cwd: Arc::new(RwLock::new(cwd)),
            readonly: false,
        }
    }

    /// Host filesystem rejecting every mutation with `ReadOnly`
    pub fn readonly() -> Self {
        Self {
            readonly: true,
            ..Self::new()
        }
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            paths::clean(&self.cwd.read().join(path))
        }
    }

    fn check_write(&self) -> VfsResult<()> {
        if self.readonly {
            return Err(VfsError::ReadOnly);
        }
        Ok(())
    }

    fn io_error(e: io::Error, op: &str, path: &Path) -> VfsError {
        VfsError::from_io(e, format!("{} {}", op, path.display()))
    }

    fn lstat_path(path: &Path) -> VfsResult<Metadata> {
        fs::symlink_metadata(path)
            .map(|md| Metadata::from_std(paths::base_name(path), &md))
            .map_err(|e| Self::io_error(e, "lstat", path))
    }

    /// Sorted child names of `dir`
    fn sorted_names(dir: &Path) -> VfsResult<Vec<std::ffi::OsString>> {
        let mut names = fs::read_dir(dir)
            .map_err(|e| Self::io_error(e, "readdir", dir))?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| Self::io_error(e, "readdir", dir))?;
        names.sort();
        Ok(names)
    }

    fn walk_dir(&self, dir: &Path, f: &mut WalkFn<'_>) -> VfsResult<()> {
        let names = match Self::sorted_names(dir) {
            Ok(names) => names,
            Err(e) => {
                f(dir, Err(e))?;
                return Ok(());
            }
        };

        for name in names {
            let path = dir.join(name);
            match Self::lstat_path(&path) {
                Ok(md) => {
                    let control = f(&path, Ok(&md))?;
                    if md.is_dir() && control == WalkControl::Continue {
                        self.walk_dir(&path, f)?;
                    }
                }
                Err(e) => {
                    f(&path, Err(e))?;
                }
            }
        }
        Ok(())
    }

    fn fast_walk_dir(&self, dir: &Path, f: &FastWalkFn<'_>) -> VfsResult<()> {
        let mut entries = fs::read_dir(dir)
            .map_err(|e| Self::io_error(e, "readdir", dir))?
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| Self::io_error(e, "readdir", dir))?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map(FileType::from_std)
                .map_err(|e| Self::io_error(e, "readdir", &path))?;
            let control = f(&path, file_type)?;
            if file_type == FileType::Directory && control == WalkControl::Continue {
                self.fast_walk_dir(&path, f)?;
            }
        }
        Ok(())
    }
}

impl Default for LocalFS {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for LocalFS {
    fn open_file(
        &self,
        path: &Path,
        flags: OpenFlags,
        perm: Permissions,
    ) -> VfsResult<Box<dyn OpenFile>> {
        flags.validate()?;
        if flags.is_writable() || flags.will_create() {
            self.check_write()?;
        }

        let full_path = self.resolve(path);
        let mut options = fs::OpenOptions::new();
        options
            .read(flags.read)
            .write(flags.write)
            .append(flags.append)
            .truncate(flags.truncate)
            .create(flags.create)
            .create_new(flags.create_new);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(perm.mode);
        }
        #[cfg(not(unix))]
        let _ = perm;

        let file = options
            .open(&full_path)
            .map_err(|e| Self::io_error(e, "open", &full_path))?;

        Ok(Box::new(LocalFile {
            file,
            name: full_path,
        }))
    }

    fn mkdir(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);
        dir_builder(perm, false)
            .create(&full_path)
            .map_err(|e| Self::io_error(e, "mkdir", &full_path))
    }

    fn mkdir_all(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);
        dir_builder(perm, true)
            .create(&full_path)
            .map_err(|e| Self::io_error(e, "mkdir", &full_path))
    }

    /// Removes a file, a symlink or an empty directory
    fn remove(&self, path: &Path) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);
        let md = fs::symlink_metadata(&full_path)
            .map_err(|e| Self::io_error(e, "remove", &full_path))?;
        let result = if md.is_dir() {
            fs::remove_dir(&full_path)
        } else {
            fs::remove_file(&full_path)
        };
        result.map_err(|e| Self::io_error(e, "remove", &full_path))
    }

    /// Missing paths are not an error
    fn remove_all(&self, path: &Path) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);
        let md = match fs::symlink_metadata(&full_path) {
            Ok(md) => md,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Self::io_error(e, "removeall", &full_path)),
        };
        let result = if md.is_dir() {
            fs::remove_dir_all(&full_path)
        } else {
            fs::remove_file(&full_path)
        };
        result.map_err(|e| Self::io_error(e, "removeall", &full_path))
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.check_write()?;
        let from_full = self.resolve(from);
        let to_full = self.resolve(to);
        fs::rename(&from_full, &to_full).map_err(|e| VfsError::Link {
            op: "rename".into(),
            old: from_full.display().to_string(),
            new: to_full.display().to_string(),
            source: Box::new(VfsError::from_io(e, "rename")),
        })
    }

    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);
        fs::OpenOptions::new()
            .write(true)
            .open(&full_path)
            .and_then(|file| file.set_len(size))
            .map_err(|e| Self::io_error(e, "truncate", &full_path))
    }

    fn stat(&self, path: &Path) -> VfsResult<Metadata> {
        let full_path = self.resolve(path);
        fs::metadata(&full_path)
            .map(|md| Metadata::from_std(paths::base_name(&full_path), &md))
            .map_err(|e| Self::io_error(e, "stat", &full_path))
    }

    fn chmod(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);

        #[cfg(unix)]
        let std_perms = {
            use std::os::unix::fs::PermissionsExt;
            fs::Permissions::from_mode(perm.mode)
        };
        #[cfg(not(unix))]
        let std_perms = {
            let mut std_perms = fs::metadata(&full_path)
                .map_err(|e| Self::io_error(e, "chmod", &full_path))?
                .permissions();
            std_perms.set_readonly(perm.is_readonly());
            std_perms
        };

        fs::set_permissions(&full_path, std_perms)
            .map_err(|e| Self::io_error(e, "chmod", &full_path))
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);

        #[cfg(unix)]
        {
            std::os::unix::fs::chown(&full_path, Some(uid), Some(gid))
                .map_err(|e| Self::io_error(e, "chown", &full_path))
        }
        #[cfg(not(unix))]
        {
            let _ = (uid, gid);
            Err(VfsError::NotSupported(format!("chown {}", full_path.display())))
        }
    }

    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);
        let times = fs::FileTimes::new().set_accessed(atime).set_modified(mtime);
        fs::File::open(&full_path)
            .and_then(|file| file.set_times(times))
            .map_err(|e| Self::io_error(e, "chtimes", &full_path))
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        read_entries(&self.resolve(path))
    }

    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let full_path = self.resolve(path);
        fs::read(&full_path).map_err(|e| Self::io_error(e, "read", &full_path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn getwd(&self) -> VfsResult<PathBuf> {
        Ok(self.cwd.read().clone())
    }

    /// Target must be an existing directory
    fn chdir(&self, path: &Path) -> VfsResult<()> {
        let full_path = self.resolve(path);
        let md = fs::metadata(&full_path).map_err(|e| Self::io_error(e, "chdir", &full_path))?;
        if !md.is_dir() {
            return Err(VfsError::NotADirectory(format!(
                "chdir {}",
                full_path.display()
            )));
        }
        *self.cwd.write() = paths::clean(&full_path);
        Ok(())
    }

    fn name(&self) -> &str {
        "local"
    }

    fn walker(&self) -> Option<&dyn Walker> {
        Some(self)
    }
}

impl SymlinkFileSystem for LocalFS {
    fn lstat(&self, path: &Path) -> VfsResult<Metadata> {
        Self::lstat_path(&self.resolve(path))
    }

    fn lchown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()> {
        self.check_write()?;
        let full_path = self.resolve(path);

        #[cfg(unix)]
        {
            std::os::unix::fs::lchown(&full_path, Some(uid), Some(gid))
                .map_err(|e| Self::io_error(e, "lchown", &full_path))
        }
        #[cfg(not(unix))]
        {
            let _ = (uid, gid);
            Err(VfsError::NotSupported(format!("lchown {}", full_path.display())))
        }
    }

    fn readlink(&self, path: &Path) -> VfsResult<PathBuf> {
        let full_path = self.resolve(path);
        fs::read_link(&full_path).map_err(|e| Self::io_error(e, "readlink", &full_path))
    }

    /// `target` is stored verbatim
    fn symlink(&self, target: &Path, link: &Path) -> VfsResult<()> {
        self.check_write()?;
        let full_link = self.resolve(link);

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, &full_link).map_err(|e| VfsError::Link {
                op: "symlink".into(),
                old: target.display().to_string(),
                new: full_link.display().to_string(),
                source: Box::new(VfsError::from_io(e, "symlink")),
            })
        }
        #[cfg(not(unix))]
        {
            let _ = target;
            Err(VfsError::NotSupported(format!("symlink {}", full_link.display())))
        }
    }
}

impl Walker for LocalFS {
    /// Symlinks are reported, never followed
    fn walk(&self, root: &Path, f: &mut WalkFn<'_>) -> VfsResult<()> {
        let root = self.resolve(root);
        match Self::lstat_path(&root) {
            Ok(md) => {
                let control = f(&root, Ok(&md))?;
                if md.is_dir() && control == WalkControl::Continue {
                    self.walk_dir(&root, f)?;
                }
                Ok(())
            }
            Err(e) => f(&root, Err(e)).map(|_| ()),
        }
    }

    fn fast_walk(&self, root: &Path, f: &FastWalkFn<'_>) -> VfsResult<()> {
        let root = self.resolve(root);
        let file_type = fs::symlink_metadata(&root)
            .map(|md| FileType::from_std(md.file_type()))
            .map_err(|e| Self::io_error(e, "lstat", &root))?;
        let control = f(&root, file_type)?;
        if file_type == FileType::Directory && control == WalkControl::Continue {
            self.fast_walk_dir(&root, f)?;
        }
        Ok(())
    }
}

fn dir_builder(perm: Permissions, recursive: bool) -> fs::DirBuilder {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(recursive);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(perm.mode);
    }
    #[cfg(not(unix))]
    let _ = perm;
    builder
}

fn read_entries(dir: &Path) -> VfsResult<Vec<Entry>> {
    let mut result = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| LocalFS::io_error(e, "readdir", dir))? {
        let entry = entry.map_err(|e| LocalFS::io_error(e, "readdir", dir))?;
        let name = entry.file_name().into_string().map_err(|raw| {
            VfsError::InvalidPath(format!("non UTF-8 name in {}: {:?}", dir.display(), raw))
        })?;
        let file_type = entry
            .file_type()
            .map_err(|e| LocalFS::io_error(e, "readdir", dir))?;
        result.push(Entry::new_unchecked(name, FileType::from_std(file_type)));
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

/// Local file handle
struct LocalFile {
    file: fs::File,
    name: PathBuf,
}

impl Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for LocalFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for LocalFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl OpenFile for LocalFile {
    fn name(&self) -> &Path {
        &self.name
    }

    #[cfg(unix)]
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(&self.file, buf, offset)
    }

    #[cfg(unix)]
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::write_at(&self.file, buf, offset)
    }

    fn stat(&self) -> VfsResult<Metadata> {
        self.file
            .metadata()
            .map(|md| Metadata::from_std(paths::base_name(&self.name), &md))
            .map_err(|e| LocalFS::io_error(e, "stat", &self.name))
    }

    fn sync(&mut self) -> VfsResult<()> {
        self.file
            .sync_all()
            .map_err(|e| LocalFS::io_error(e, "sync", &self.name))
    }

    fn truncate(&mut self, size: u64) -> VfsResult<()> {
        self.file
            .set_len(size)
            .map_err(|e| LocalFS::io_error(e, "truncate", &self.name))
    }

    fn read_dir(&mut self) -> VfsResult<Vec<Entry>> {
        read_entries(&self.name)
    }

    fn close(&mut self) -> VfsResult<()> {
        self.file
            .flush()
            .map_err(|e| LocalFS::io_error(e, "close", &self.name))
    }
}
