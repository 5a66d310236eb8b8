/*!
 * Serde Helpers
 * Compact encodings shared by the VFS types
 */

use serde::{Deserialize, Deserializer, Serializer};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Serialize SystemTime as microseconds since UNIX epoch
pub mod system_time_micros {
    use super::*;

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        serializer.serialize_u64(micros)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_micros(micros))
    }
}

/// Skip serializing if value is default
pub fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    value == &T::default()
}

/// Skip serializing if value is zero
pub fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

/// Skip serializing if value is false
pub fn is_false(value: &bool) -> bool {
    !value
}
