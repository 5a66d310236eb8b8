/*!
 * VFS Metadata
 * Stat results, including the name the entry is reported under
 */

use super::file_type::FileType;
use super::permissions::Permissions;
use super::serde_helpers::{is_default, is_zero_u64, system_time_micros};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File metadata
///
/// `name` is the final path component the entry was looked up by. Wrapping
/// filesystems overwrite it so it never exposes a path they translated.
/// Timestamps are serialized as microseconds since UNIX epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Metadata {
    pub name: String,
    pub file_type: FileType,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub size: u64,
    #[serde(skip_serializing_if = "is_default", default)]
    pub permissions: Permissions,
    #[serde(with = "system_time_micros")]
    pub modified: SystemTime,
    #[serde(with = "system_time_micros")]
    pub accessed: SystemTime,
    #[serde(with = "system_time_micros")]
    pub created: SystemTime,
    #[serde(skip_serializing_if = "is_default", default)]
    pub uid: u32,
    #[serde(skip_serializing_if = "is_default", default)]
    pub gid: u32,
}

impl Metadata {
    /// Build from host metadata
    pub fn from_std(name: impl Into<String>, md: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        let (mode, uid, gid) = {
            use std::os::unix::fs::MetadataExt;
            (md.mode(), md.uid(), md.gid())
        };
        #[cfg(not(unix))]
        let (mode, uid, gid) = {
            let mode = if md.permissions().readonly() {
                0o444
            } else {
                0o644
            };
            (mode, 0, 0)
        };

        Self {
            name: name.into(),
            file_type: FileType::from_std(md.file_type()),
            size: md.len(),
            permissions: Permissions::new(mode),
            modified: md.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            accessed: md.accessed().unwrap_or(SystemTime::UNIX_EPOCH),
            created: md.created().unwrap_or(SystemTime::UNIX_EPOCH),
            uid,
            gid,
        }
    }

    /// Same metadata reported under another name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// # Performance
    /// Hot path - called on every walk step
    #[inline(always)]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        matches!(self.file_type, FileType::Symlink)
    }
}
