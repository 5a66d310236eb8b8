/*!
 * VFS Traits
 * Core filesystem abstraction traits and optional capabilities
 */

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::paths;
use super::types::*;

/// Virtual filesystem trait
///
/// Every backend and every wrapper implements this surface. Paths are
/// slash-separated; how relative paths resolve is up to the implementation.
pub trait FileSystem: Send + Sync {
    /// Open a file with explicit flags and creation permissions
    fn open_file(
        &self,
        path: &Path,
        flags: OpenFlags,
        perm: Permissions,
    ) -> VfsResult<Box<dyn OpenFile>>;

    /// Open a file for reading
    fn open(&self, path: &Path) -> VfsResult<Box<dyn OpenFile>> {
        self.open_file(path, OpenFlags::read_only(), Permissions::default())
    }

    /// Create or truncate a file, opened read-write
    fn create(&self, path: &Path) -> VfsResult<Box<dyn OpenFile>> {
        self.open_file(path, OpenFlags::create_truncate(), Permissions::new(0o666))
    }

    /// Create a single directory
    fn mkdir(&self, path: &Path, perm: Permissions) -> VfsResult<()>;

    /// Create a directory and any missing parents
    fn mkdir_all(&self, path: &Path, perm: Permissions) -> VfsResult<()>;

    /// Remove a file or an empty directory
    fn remove(&self, path: &Path) -> VfsResult<()>;

    /// Remove a path and everything below it; a missing path is not an error
    fn remove_all(&self, path: &Path) -> VfsResult<()>;

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()>;

    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()>;

    /// Metadata, following symlinks
    fn stat(&self, path: &Path) -> VfsResult<Metadata>;

    fn chmod(&self, path: &Path, perm: Permissions) -> VfsResult<()>;

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()>;

    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> VfsResult<()>;

    /// Directory entries sorted by name
    fn read_dir(&self, path: &Path) -> VfsResult<Vec<Entry>>;

    /// Read entire file contents
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let mut file = self.open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| VfsError::from_io(e, format!("read {}", path.display())))?;
        Ok(data)
    }

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }

    /// Directory for temporary files
    fn temp_dir(&self) -> PathBuf;

    /// Current working directory
    fn getwd(&self) -> VfsResult<PathBuf>;

    /// Change the working directory
    fn chdir(&self, path: &Path) -> VfsResult<()>;

    fn separator(&self) -> char {
        paths::SEPARATOR
    }

    fn list_separator(&self) -> char {
        paths::LIST_SEPARATOR
    }

    /// Get filesystem name/type
    fn name(&self) -> &str;

    /// Walking capability, if the backend has one
    fn walker(&self) -> Option<&dyn Walker> {
        None
    }

    /// Confinement details, if this filesystem is a confining wrapper
    fn confinement(&self) -> Option<Confinement<'_>> {
        None
    }
}

/// Symlink capability on top of the basic surface
pub trait SymlinkFileSystem: FileSystem {
    /// Metadata of the path itself, not its target
    fn lstat(&self, path: &Path) -> VfsResult<Metadata>;

    fn lchown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()>;

    /// Target stored in the link, as written
    fn readlink(&self, path: &Path) -> VfsResult<PathBuf>;

    /// Create `link` pointing at `target`
    fn symlink(&self, target: &Path, link: &Path) -> VfsResult<()>;
}

/// What a walk callback wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not descend into the directory just visited
    SkipDir,
}

/// Walk callback: receives each path with its metadata, or the error hit
/// while reading it. Returning `Err` aborts the walk with that error.
pub type WalkFn<'a> = dyn FnMut(&Path, VfsResult<&Metadata>) -> VfsResult<WalkControl> + 'a;

/// Fast walk callback: file type only, may be invoked from several threads
pub type FastWalkFn<'a> = dyn Fn(&Path, FileType) -> VfsResult<WalkControl> + Sync + 'a;

/// Tree traversal capability
pub trait Walker {
    /// Depth-first walk in lexical order, root first
    fn walk(&self, root: &Path, f: &mut WalkFn<'_>) -> VfsResult<()>;

    /// Traversal without per-entry stat calls
    fn fast_walk(&self, root: &Path, f: &FastWalkFn<'_>) -> VfsResult<()>;
}

/// Introspection data exposed by confining wrappers
#[derive(Clone, Copy)]
pub struct Confinement<'a> {
    pub inner: &'a dyn FileSystem,
    pub base_dir: &'a Path,
}

/// Open file handle trait
///
/// Represents an open file with read/write/seek capabilities.
/// Dropping the handle releases it; `close` reports errors explicitly.
pub trait OpenFile: Read + Write + Seek + Send + Sync {
    /// Name the file was opened under
    fn name(&self) -> &Path;

    /// Read at `offset` without moving the cursor
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let pos = self.stream_position()?;
        self.seek(SeekFrom::Start(offset))?;
        let result = self.read(buf);
        self.seek(SeekFrom::Start(pos))?;
        result
    }

    /// Write at `offset` without moving the cursor
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        let pos = self.stream_position()?;
        self.seek(SeekFrom::Start(offset))?;
        let result = self.write(buf);
        self.seek(SeekFrom::Start(pos))?;
        result
    }

    fn stat(&self) -> VfsResult<Metadata>;

    /// Sync file data to storage
    fn sync(&mut self) -> VfsResult<()>;

    /// Set file length
    fn truncate(&mut self, size: u64) -> VfsResult<()>;

    /// Entries of the directory this handle refers to
    fn read_dir(&mut self) -> VfsResult<Vec<Entry>>;

    fn close(&mut self) -> VfsResult<()> {
        self.flush()
            .map_err(|e| VfsError::from_io(e, format!("close {}", self.name().display())))
    }
}

/// Filesystem builder trait for configuration
pub trait FileSystemBuilder {
    type Output: FileSystem;

    /// Build the filesystem instance
    fn build(self) -> VfsResult<Self::Output>;
}
