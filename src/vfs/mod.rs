/*!
 * Virtual File System Module
 * Filesystem abstraction with a path-confining wrapper
 */

pub mod confined;
pub mod local;
pub mod memory;
pub mod paths;
pub mod traits;
pub mod types;

// Re-exports
pub use confined::{ConfineConfig, ConfinedFS, ConfinedFSBuilder, ConfinedFile};
pub use local::LocalFS;
pub use memory::MemFS;
pub use traits::{
    Confinement, FastWalkFn, FileSystem, FileSystemBuilder, OpenFile, SymlinkFileSystem,
    WalkControl, WalkFn, Walker,
};
pub use types::{
    Entry, FileType, Metadata, OpenFlags, Permissions, VfsError, VfsResult,
};
