/*!
 * Metadata Operations Implementation
 * FileSystem trait methods and attribute updates
 */

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::super::paths::{self, DEFAULT_TEMP_DIR};
use super::super::traits::{FileSystem, OpenFile};
use super::super::types::*;
use super::node::Attrs;
use super::MemFS;

impl MemFS {
    fn update_attrs(&self, op: &str, path: &Path, f: impl FnOnce(&mut Attrs)) -> VfsResult<()> {
        let path = self.normalize(path);
        match self.nodes.get_mut(&path) {
            Some(mut node) => {
                f(node.attrs_mut());
                Ok(())
            }
            None => Err(VfsError::NotFound(format!("{} {}", op, path.display()))),
        }
    }
}

impl FileSystem for MemFS {
    fn open_file(
        &self,
        path: &Path,
        flags: OpenFlags,
        perm: Permissions,
    ) -> VfsResult<Box<dyn OpenFile>> {
        self.open_file_impl(path, flags, perm)
    }

    fn mkdir(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        self.mkdir_impl(path, perm)
    }

    fn mkdir_all(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        self.mkdir_all_impl(path, perm)
    }

    fn remove(&self, path: &Path) -> VfsResult<()> {
        self.remove_impl(path)
    }

    fn remove_all(&self, path: &Path) -> VfsResult<()> {
        self.remove_all_impl(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        self.rename_impl(from, to)
    }

    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()> {
        self.truncate_impl(path, size)
    }

    fn stat(&self, path: &Path) -> VfsResult<Metadata> {
        let path = self.normalize(path);
        match self.nodes.get(&path) {
            Some(node) => Ok(node.metadata(paths::base_name(&path))),
            None => Err(VfsError::NotFound(format!("stat {}", path.display()))),
        }
    }

    fn chmod(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        self.update_attrs("chmod", path, |attrs| attrs.permissions = perm)
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()> {
        self.update_attrs("chown", path, |attrs| {
            attrs.uid = uid;
            attrs.gid = gid;
        })
    }

    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> VfsResult<()> {
        self.update_attrs("chtimes", path, |attrs| {
            attrs.accessed = atime;
            attrs.modified = mtime;
        })
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        self.read_dir_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.nodes.contains_key(&self.normalize(path))
    }

    fn temp_dir(&self) -> PathBuf {
        PathBuf::from(DEFAULT_TEMP_DIR)
    }

    fn getwd(&self) -> VfsResult<PathBuf> {
        Ok(self.cwd.read().clone())
    }

    /// Target must be an existing directory
    fn chdir(&self, path: &Path) -> VfsResult<()> {
        let path = self.normalize(path);
        match self.nodes.get(&path).map(|n| n.is_dir()) {
            Some(true) => {
                *self.cwd.write() = path;
                Ok(())
            }
            Some(false) => Err(VfsError::NotADirectory(format!("chdir {}", path.display()))),
            None => Err(VfsError::NotFound(format!("chdir {}", path.display()))),
        }
    }

    fn name(&self) -> &str {
        "memfs"
    }
}
