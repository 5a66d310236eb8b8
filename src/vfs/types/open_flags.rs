/*!
 * VFS Open Flags
 * Access and creation flags for open_file
 */

use super::errors::VfsError;
use super::serde_helpers::is_false;
use serde::{Deserialize, Serialize};

/// POSIX (Linux) flag bits understood by [`OpenFlags::from_posix`]
pub mod posix {
    pub const O_RDONLY: u32 = 0o0;
    pub const O_WRONLY: u32 = 0o1;
    pub const O_RDWR: u32 = 0o2;
    pub const O_ACCMODE: u32 = 0o3;
    pub const O_CREAT: u32 = 0o100;
    pub const O_EXCL: u32 = 0o200;
    pub const O_TRUNC: u32 = 0o1000;
    pub const O_APPEND: u32 = 0o2000;
}

/// File open flags
///
/// Only true flags are serialized.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct OpenFlags {
    #[serde(skip_serializing_if = "is_false")]
    pub read: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub write: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub append: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub truncate: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub create: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub create_new: bool,
}

impl OpenFlags {
    #[inline]
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn write_only() -> Self {
        Self {
            write: true,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }

    /// Flags used by `create`: read-write, create, truncate
    #[inline]
    #[must_use]
    pub fn create_truncate() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            truncate: true,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.write || self.append
    }

    #[inline]
    #[must_use]
    pub const fn will_create(&self) -> bool {
        self.create || self.create_new
    }

    /// Decode POSIX open(2) flags
    pub fn from_posix(flags: u32) -> Self {
        let access = flags & posix::O_ACCMODE;
        let create = flags & posix::O_CREAT != 0;
        let exclusive = flags & posix::O_EXCL != 0;

        Self {
            read: access == posix::O_RDONLY || access == posix::O_RDWR,
            write: access == posix::O_WRONLY || access == posix::O_RDWR,
            append: flags & posix::O_APPEND != 0,
            truncate: flags & posix::O_TRUNC != 0,
            create: create && !exclusive,
            create_new: create && exclusive,
        }
    }

    /// Encode as POSIX open(2) flags
    pub fn to_posix(&self) -> u32 {
        let mut flags = match (self.read, self.is_writable()) {
            (true, true) => posix::O_RDWR,
            (false, true) => posix::O_WRONLY,
            _ => posix::O_RDONLY,
        };

        if self.append {
            flags |= posix::O_APPEND;
        }
        if self.truncate {
            flags |= posix::O_TRUNC;
        }
        if self.create {
            flags |= posix::O_CREAT;
        }
        if self.create_new {
            flags |= posix::O_CREAT | posix::O_EXCL;
        }

        flags
    }

    /// Reject combinations the host would refuse anyway
    #[must_use = "validation result must be checked"]
    pub fn validate(&self) -> Result<(), VfsError> {
        if self.create_new && !self.is_writable() {
            return Err(VfsError::InvalidArgument(
                "create_new requires write access".into(),
            ));
        }
        if self.truncate && !self.write {
            return Err(VfsError::InvalidArgument(
                "truncate requires write access".into(),
            ));
        }
        if self.append && self.truncate {
            return Err(VfsError::InvalidArgument(
                "cannot use both append and truncate".into(),
            ));
        }
        Ok(())
    }
}
