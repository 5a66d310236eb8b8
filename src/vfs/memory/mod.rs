/*!
 * In-Memory Filesystem Backend
 * Volatile filesystem for tests and scratch storage
 */

mod dir_ops;
mod file_handle;
mod file_ops;
mod metadata_ops;
mod node;

use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::paths::{self, DEFAULT_TEMP_DIR, ROOT};
use super::types::*;
use node::Node;

/// In-memory filesystem implementation
///
/// Paths are absolute, or relative to the filesystem's own working
/// directory. Starts with `/` and `/tmp`. Has no symlinks and no walker.
/// Clones share the same tree.
#[derive(Debug, Clone)]
pub struct MemFS {
    pub(super) nodes: Arc<DashMap<PathBuf, Node, RandomState>>,
    pub(super) cwd: Arc<RwLock<PathBuf>>,
}

impl MemFS {
    pub fn new() -> Self {
        let nodes = DashMap::with_hasher(RandomState::new());
        let mut root = Node::directory(Permissions::directory());
        if let Node::Directory { children, .. } = &mut root {
            children.insert("tmp".to_string());
        }
        nodes.insert(PathBuf::from(ROOT), root);
        nodes.insert(
            PathBuf::from(DEFAULT_TEMP_DIR),
            Node::directory(Permissions::new(0o1777)),
        );

        Self {
            nodes: Arc::new(nodes),
            cwd: Arc::new(RwLock::new(PathBuf::from(ROOT))),
        }
    }

    /// Absolute, cleaned key for `path`
    pub(super) fn normalize(&self, path: &Path) -> PathBuf {
        if path.has_root() {
            paths::clean_rooted(path)
        } else {
            paths::clean_rooted(&self.cwd.read().join(path))
        }
    }

    pub(super) fn file_name(path: &Path) -> VfsResult<String> {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| VfsError::InvalidPath(format!("invalid path: {}", path.display())))
    }

    /// Parent must exist and be a directory
    pub(super) fn ensure_parent(&self, op: &str, path: &Path) -> VfsResult<PathBuf> {
        let parent = path
            .parent()
            .ok_or_else(|| VfsError::InvalidPath(format!("{} {}", op, path.display())))?;
        match self.nodes.get(parent) {
            Some(node) if node.is_dir() => Ok(parent.to_path_buf()),
            Some(_) => Err(VfsError::NotADirectory(format!("{} {}", op, path.display()))),
            None => Err(VfsError::NotFound(format!("{} {}", op, path.display()))),
        }
    }

    /// Insert `node` at `path` and link it into its parent
    pub(super) fn attach(&self, op: &str, path: &Path, node: Node) -> VfsResult<()> {
        let parent = self.ensure_parent(op, path)?;
        let name = Self::file_name(path)?;
        self.nodes.insert(path.to_path_buf(), node);
        if let Some(mut entry) = self.nodes.get_mut(&parent) {
            if let Node::Directory { children, .. } = entry.value_mut() {
                children.insert(name);
            }
        }
        Ok(())
    }

    /// Unlink `path` from its parent's child set
    pub(super) fn detach(&self, path: &Path) {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        if let Some(mut entry) = self.nodes.get_mut(parent) {
            if let Node::Directory { children, .. } = entry.value_mut() {
                children.remove(name.to_string_lossy().as_ref());
            }
        }
    }
}

impl Default for MemFS {
    fn default() -> Self {
        Self::new()
    }
}
