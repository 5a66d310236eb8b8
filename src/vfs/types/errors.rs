/*!
 * VFS Error Types
 * Structured error handling for filesystem and confinement operations
 */

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// VFS operation result
///
/// # Must Use
/// VFS operations can fail and must be handled to prevent data loss
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// VFS errors
///
/// Payload strings carry the operation context and the path involved.
/// A path escaping a confinement boundary is reported as `NotFound`, the
/// same variant a missing file produces.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Not found: {0}")]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already exists: {0}")]
    AlreadyExists(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Permission denied: {0}")]
    PermissionDenied(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not a directory: {0}")]
    NotADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Is a directory: {0}")]
    IsADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Directory not empty: {0}")]
    NotEmpty(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid path: {0}")]
    InvalidPath(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("I/O error: {0}")]
    IoError(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not supported: {0}")]
    NotSupported(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    /// Two-path operation failure, always reported with the caller's names
    #[error("{op} {old} {new}: {source}")]
    Link {
        op: String,
        old: String,
        new: String,
        source: Box<VfsError>,
    },

    #[error("Walk not supported by the underlying filesystem")]
    WalkUnsupported,

    #[error("Read-only filesystem")]
    ReadOnly,
}

impl VfsError {
    /// Rewrite every path-bearing payload through `f`
    ///
    /// Used to scrub host paths out of errors before they cross a
    /// confinement boundary. The variant is never changed.
    pub fn map_paths<F>(self, f: &F) -> Self
    where
        F: Fn(&str) -> String,
    {
        match self {
            Self::NotFound(s) => Self::NotFound(f(&s)),
            Self::AlreadyExists(s) => Self::AlreadyExists(f(&s)),
            Self::PermissionDenied(s) => Self::PermissionDenied(f(&s)),
            Self::NotADirectory(s) => Self::NotADirectory(f(&s)),
            Self::IsADirectory(s) => Self::IsADirectory(f(&s)),
            Self::NotEmpty(s) => Self::NotEmpty(f(&s)),
            Self::InvalidPath(s) => Self::InvalidPath(f(&s)),
            Self::InvalidArgument(s) => Self::InvalidArgument(f(&s)),
            Self::IoError(s) => Self::IoError(f(&s)),
            Self::NotSupported(s) => Self::NotSupported(f(&s)),
            Self::Link {
                op,
                old,
                new,
                source,
            } => Self::Link {
                op,
                old: f(&old),
                new: f(&new),
                source: Box::new(source.map_paths(f)),
            },
            other @ (Self::WalkUnsupported | Self::ReadOnly) => other,
        }
    }

    /// Check whether this error means "no such file or directory"
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Link { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Convert a host I/O error, tagging it with `context`
    pub fn from_io(err: std::io::Error, context: impl Into<String>) -> Self {
        use std::io::ErrorKind;
        let context = context.into();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(context),
            ErrorKind::PermissionDenied => Self::PermissionDenied(context),
            ErrorKind::AlreadyExists => Self::AlreadyExists(context),
            ErrorKind::NotADirectory => Self::NotADirectory(context),
            ErrorKind::IsADirectory => Self::IsADirectory(context),
            ErrorKind::DirectoryNotEmpty => Self::NotEmpty(context),
            ErrorKind::InvalidInput => Self::InvalidArgument(format!("{}: {}", context, err)),
            ErrorKind::ReadOnlyFilesystem => Self::ReadOnly,
            ErrorKind::Unsupported => Self::NotSupported(format!("{}: {}", context, err)),
            _ => Self::IoError(format!("{}: {}", context, err)),
        }
    }
}

impl From<VfsError> for std::io::Error {
    fn from(err: VfsError) -> Self {
        use std::io::ErrorKind;
        let kind = match &err {
            VfsError::NotFound(_) => ErrorKind::NotFound,
            VfsError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            VfsError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            VfsError::InvalidPath(_) | VfsError::InvalidArgument(_) => ErrorKind::InvalidInput,
            VfsError::NotSupported(_) | VfsError::WalkUnsupported => ErrorKind::Unsupported,
            _ => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

/// Deserialize and validate non-empty string for error messages
pub(super) fn deserialize_nonempty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("error message must not be empty"));
    }
    Ok(s)
}
