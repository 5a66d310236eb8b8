/*!
 * Filesystem Node Types
 * Internal representation of files and directories
 */

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::SystemTime;

use super::super::types::{FileType, Metadata, Permissions};

/// Attributes shared by every node kind
#[derive(Debug, Clone, Copy)]
pub(super) struct Attrs {
    pub permissions: Permissions,
    pub modified: SystemTime,
    pub accessed: SystemTime,
    pub created: SystemTime,
    pub uid: u32,
    pub gid: u32,
}

impl Attrs {
    pub fn new(permissions: Permissions) -> Self {
        let now = SystemTime::now();
        Self {
            permissions,
            modified: now,
            accessed: now,
            created: now,
            uid: 0,
            gid: 0,
        }
    }
}

/// In-memory filesystem node
///
/// File contents sit behind their own lock so open handles write through
/// without holding a map entry.
#[derive(Debug, Clone)]
pub(super) enum Node {
    File {
        data: Arc<RwLock<Vec<u8>>>,
        attrs: Attrs,
    },
    Directory {
        children: BTreeSet<String>,
        attrs: Attrs,
    },
}

impl Node {
    pub fn directory(permissions: Permissions) -> Self {
        Node::Directory {
            children: BTreeSet::new(),
            attrs: Attrs::new(permissions),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Node::File { .. } => FileType::File,
            Node::Directory { .. } => FileType::Directory,
        }
    }

    pub fn attrs(&self) -> &Attrs {
        match self {
            Node::File { attrs, .. } | Node::Directory { attrs, .. } => attrs,
        }
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        match self {
            Node::File { attrs, .. } | Node::Directory { attrs, .. } => attrs,
        }
    }

    pub fn metadata(&self, name: String) -> Metadata {
        let attrs = self.attrs();
        let size = match self {
            Node::File { data, .. } => data.read().len() as u64,
            Node::Directory { .. } => 0,
        };
        Metadata {
            name,
            file_type: self.file_type(),
            size,
            permissions: attrs.permissions,
            modified: attrs.modified,
            accessed: attrs.accessed,
            created: attrs.created,
            uid: attrs.uid,
            gid: attrs.gid,
        }
    }
}
