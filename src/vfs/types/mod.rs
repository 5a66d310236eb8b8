/*!
 * VFS Types
 * Shared types for filesystem operations
 */

mod entry;
mod errors;
mod file_type;
mod metadata;
mod open_flags;
mod permissions;
mod serde_helpers;

pub use entry::Entry;
pub use errors::{VfsError, VfsResult};
pub use file_type::FileType;
pub use metadata::Metadata;
pub use open_flags::{posix, OpenFlags};
pub use permissions::Permissions;
