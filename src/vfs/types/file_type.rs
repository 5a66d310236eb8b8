/*!
 * VFS File Type Enum
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of filesystem object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    File,
    Directory,
    Symlink,
    #[serde(rename = "block_device")]
    BlockDevice,
    #[serde(rename = "char_device")]
    CharDevice,
    Fifo,
    Socket,
    #[default]
    Unknown,
}

impl FileType {
    /// Map a host file type
    pub fn from_std(ft: std::fs::FileType) -> Self {
        if ft.is_symlink() {
            return FileType::Symlink;
        }
        if ft.is_dir() {
            return FileType::Directory;
        }
        if ft.is_file() {
            return FileType::File;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return FileType::BlockDevice;
            }
            if ft.is_char_device() {
                return FileType::CharDevice;
            }
            if ft.is_fifo() {
                return FileType::Fifo;
            }
            if ft.is_socket() {
                return FileType::Socket;
            }
        }

        FileType::Unknown
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            FileType::File => "file",
            FileType::Directory => "directory",
            FileType::Symlink => "symlink",
            FileType::BlockDevice => "block device",
            FileType::CharDevice => "char device",
            FileType::Fifo => "fifo",
            FileType::Socket => "socket",
            FileType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
