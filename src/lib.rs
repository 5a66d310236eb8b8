/*!
 * confinefs
 * Confine any filesystem to a single base directory
 */

pub mod monitoring;
pub mod vfs;

// Re-exports
pub use monitoring::init_tracing;
pub use vfs::{
    ConfineConfig, ConfinedFS, Entry, FileSystem, FileType, LocalFS, MemFS, Metadata, OpenFile,
    OpenFlags, Permissions, SymlinkFileSystem, VfsError, VfsResult, WalkControl, Walker,
};
