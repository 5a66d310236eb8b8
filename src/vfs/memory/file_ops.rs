/*!
 * File Operations Implementation
 * Opening, creating and resizing files
 */

use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use super::super::traits::OpenFile;
use super::super::types::*;
use super::file_handle::MemFile;
use super::node::{Attrs, Node};
use super::MemFS;

impl MemFS {
    pub(super) fn open_file_impl(
        &self,
        path: &Path,
        flags: OpenFlags,
        perm: Permissions,
    ) -> VfsResult<Box<dyn OpenFile>> {
        flags.validate()?;
        let path = self.normalize(path);
        let existing = self.nodes.get(&path).map(|n| n.value().clone());

        let data = match existing {
            Some(Node::Directory { .. }) => {
                if flags.is_writable() {
                    return Err(VfsError::IsADirectory(format!("open {}", path.display())));
                }
                None
            }
            Some(Node::File { data, attrs }) => {
                if flags.create_new {
                    return Err(VfsError::AlreadyExists(format!("open {}", path.display())));
                }
                if flags.is_writable() && attrs.permissions.is_readonly() {
                    return Err(VfsError::PermissionDenied(format!(
                        "open {}",
                        path.display()
                    )));
                }
                if flags.truncate {
                    data.write().clear();
                    self.touch(&path);
                }
                Some(data)
            }
            None => {
                if !flags.will_create() {
                    return Err(VfsError::NotFound(format!("open {}", path.display())));
                }
                let data = Arc::new(RwLock::new(Vec::new()));
                let node = Node::File {
                    data: Arc::clone(&data),
                    attrs: Attrs::new(perm),
                };
                self.attach("open", &path, node)?;
                Some(data)
            }
        };

        Ok(Box::new(MemFile::new(self.clone(), path, data, flags)))
    }

    pub(super) fn truncate_impl(&self, path: &Path, size: u64) -> VfsResult<()> {
        let path = self.normalize(path);
        let data = match self.nodes.get(&path).map(|n| n.value().clone()) {
            Some(Node::File { data, .. }) => data,
            Some(Node::Directory { .. }) => {
                return Err(VfsError::IsADirectory(format!("truncate {}", path.display())))
            }
            None => return Err(VfsError::NotFound(format!("truncate {}", path.display()))),
        };
        data.write().resize(size as usize, 0);
        self.touch(&path);
        Ok(())
    }

    /// Bump the modification time after a content change
    pub(super) fn touch(&self, path: &Path) {
        if let Some(mut node) = self.nodes.get_mut(path) {
            node.attrs_mut().modified = SystemTime::now();
        }
    }
}
