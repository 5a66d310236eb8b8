/*!
 * VFS Directory Entry
 */

use super::errors::VfsError;
use super::file_type::FileType;
use super::serde_helpers::is_default;
use serde::{Deserialize, Deserializer, Serialize};

/// One item of a directory listing
///
/// Only the final component is stored, so entries carry no host path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    #[serde(deserialize_with = "deserialize_valid_filename")]
    pub name: String,
    #[serde(skip_serializing_if = "is_default", default)]
    pub file_type: FileType,
}

impl Entry {
    /// Create a new directory entry with validation
    #[must_use = "validation result must be checked"]
    pub fn new(name: String, file_type: FileType) -> Result<Self, VfsError> {
        Self::validate_name(&name)?;
        Ok(Self { name, file_type })
    }

    /// Create an entry from a name the backend already produced
    pub(crate) fn new_unchecked(name: String, file_type: FileType) -> Self {
        Self { name, file_type }
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }

    /// Entry names are non-empty single components without NUL bytes
    #[must_use = "validation result must be checked"]
    pub fn validate_name(name: &str) -> Result<(), VfsError> {
        match name_problem(name) {
            Some(problem) => Err(VfsError::InvalidPath(problem.into())),
            None => Ok(()),
        }
    }
}

fn name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("entry name cannot be empty")
    } else if name.contains('\0') {
        Some("entry name cannot contain null bytes")
    } else if name.contains('/') || name.contains('\\') {
        Some("entry name cannot contain path separators")
    } else {
        None
    }
}

fn deserialize_valid_filename<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    if let Some(problem) = name_problem(&name) {
        return Err(serde::de::Error::custom(problem));
    }
    Ok(name)
}
