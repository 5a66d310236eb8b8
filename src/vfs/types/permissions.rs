/*!
 * VFS Permissions
 * Unix-style permission bits passed through chmod, mkdir and open
 */

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Unix-style permission bits (masked to 0o7777)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(deserialize_with = "deserialize_permission_mode")]
    pub mode: u32,
}

impl Permissions {
    #[inline]
    #[must_use]
    pub const fn new(mode: u32) -> Self {
        Self {
            mode: mode & 0o7777,
        }
    }

    /// 0o444
    #[inline]
    #[must_use]
    pub const fn readonly() -> Self {
        Self { mode: 0o444 }
    }

    /// 0o644
    #[inline]
    #[must_use]
    pub const fn readwrite() -> Self {
        Self { mode: 0o644 }
    }

    /// 0o755, the usual directory mode
    #[inline]
    #[must_use]
    pub const fn directory() -> Self {
        Self { mode: 0o755 }
    }

    /// True when the owner write bit is clear
    #[inline(always)]
    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        self.mode & 0o200 == 0
    }

    #[inline(always)]
    #[must_use]
    pub const fn is_executable(&self) -> bool {
        self.mode & 0o111 != 0
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::readwrite()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04o}", self.mode)
    }
}

fn deserialize_permission_mode<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let mode = u32::deserialize(deserializer)?;
    if mode > 0o7777 {
        return Err(serde::de::Error::custom(format!(
            "invalid permission mode: 0o{:o} exceeds maximum 0o7777",
            mode
        )));
    }
    Ok(mode)
}
