/*!
 * Directory Operations Implementation
 * Creating, listing, removing and moving tree nodes
 */

use std::path::{Path, PathBuf};

use super::super::paths::ROOT;
use super::super::types::*;
use super::node::Node;
use super::MemFS;

impl MemFS {
    pub(super) fn read_dir_impl(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        let path = self.normalize(path);
        let children = match self.nodes.get(&path).map(|n| n.value().clone()) {
            Some(Node::Directory { children, .. }) => children,
            Some(Node::File { .. }) => {
                return Err(VfsError::NotADirectory(format!("readdir {}", path.display())))
            }
            None => return Err(VfsError::NotFound(format!("readdir {}", path.display()))),
        };

        // BTreeSet iteration keeps the listing sorted
        Ok(children
            .into_iter()
            .filter_map(|name| {
                let file_type = self.nodes.get(&path.join(&name))?.file_type();
                Some(Entry::new_unchecked(name, file_type))
            })
            .collect())
    }

    pub(super) fn mkdir_impl(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        let path = self.normalize(path);
        if self.nodes.contains_key(&path) {
            return Err(VfsError::AlreadyExists(format!("mkdir {}", path.display())));
        }
        self.attach("mkdir", &path, Node::directory(perm))
    }

    pub(super) fn mkdir_all_impl(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        let path = self.normalize(path);
        let mut current = PathBuf::from(ROOT);
        for component in path.components().skip(1) {
            current.push(component);
            let is_dir = self.nodes.get(&current).map(|n| n.is_dir());
            match is_dir {
                Some(true) => {}
                Some(false) => {
                    return Err(VfsError::NotADirectory(format!(
                        "mkdir {}",
                        current.display()
                    )))
                }
                None => self.attach("mkdir", &current, Node::directory(perm))?,
            }
        }
        Ok(())
    }

    pub(super) fn remove_impl(&self, path: &Path) -> VfsResult<()> {
        let path = self.normalize(path);
        if path == Path::new(ROOT) {
            return Err(VfsError::PermissionDenied(format!("remove {}", path.display())));
        }
        match self.nodes.get(&path).map(|n| n.value().clone()) {
            Some(Node::Directory { children, .. }) if !children.is_empty() => {
                return Err(VfsError::NotEmpty(format!("remove {}", path.display())))
            }
            Some(_) => {}
            None => return Err(VfsError::NotFound(format!("remove {}", path.display()))),
        }
        self.nodes.remove(&path);
        self.detach(&path);
        Ok(())
    }

    /// Missing paths are not an error
    pub(super) fn remove_all_impl(&self, path: &Path) -> VfsResult<()> {
        let path = self.normalize(path);
        if path == Path::new(ROOT) {
            return Err(VfsError::PermissionDenied(format!(
                "removeall {}",
                path.display()
            )));
        }
        if !self.nodes.contains_key(&path) {
            return Ok(());
        }
        self.nodes.retain(|key, _| !key.starts_with(&path));
        self.detach(&path);
        Ok(())
    }

    pub(super) fn rename_impl(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let from = self.normalize(from);
        let to = self.normalize(to);
        let link_error = |source: VfsError| VfsError::Link {
            op: "rename".into(),
            old: from.display().to_string(),
            new: to.display().to_string(),
            source: Box::new(source),
        };

        let source = match self.nodes.get(&from).map(|n| n.value().clone()) {
            Some(node) => node,
            None => return Err(link_error(VfsError::NotFound(from.display().to_string()))),
        };
        if from == to {
            return Ok(());
        }
        if from == Path::new(ROOT) || to.starts_with(&from) {
            return Err(link_error(VfsError::InvalidArgument(format!(
                "cannot move {} into itself",
                from.display()
            ))));
        }

        match self.nodes.get(&to).map(|n| n.value().clone()) {
            Some(Node::Directory { children, .. }) => {
                if !source.is_dir() {
                    return Err(link_error(VfsError::IsADirectory(to.display().to_string())));
                }
                if !children.is_empty() {
                    return Err(link_error(VfsError::NotEmpty(to.display().to_string())));
                }
            }
            Some(Node::File { .. }) if source.is_dir() => {
                return Err(link_error(VfsError::NotADirectory(to.display().to_string())));
            }
            _ => {}
        }
        self.ensure_parent("rename", &to).map_err(link_error)?;

        let moved: Vec<(PathBuf, Node)> = self
            .nodes
            .iter()
            .filter(|entry| entry.key().starts_with(&from))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        self.detach(&from);
        for (key, _) in &moved {
            self.nodes.remove(key);
        }
        if self.nodes.contains_key(&to) {
            self.nodes.remove(&to);
            self.detach(&to);
        }

        for (key, node) in moved {
            let Ok(rest) = key.strip_prefix(&from) else {
                continue;
            };
            let target = if rest.as_os_str().is_empty() {
                to.clone()
            } else {
                to.join(rest)
            };
            if target == to {
                self.attach("rename", &to, node).map_err(link_error)?;
            } else {
                self.nodes.insert(target, node);
            }
        }
        Ok(())
    }
}
