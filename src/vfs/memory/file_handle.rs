/*!
 * File Handle Implementation
 * In-memory file handle for read/write operations
 */

use parking_lot::RwLock;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::super::paths;
use super::super::traits::{FileSystem, OpenFile};
use super::super::types::*;
use super::MemFS;

/// In-memory file handle
///
/// Writes go straight to the shared node contents. Directory handles carry
/// no data and only support `stat` and `read_dir`.
pub(super) struct MemFile {
    fs: MemFS,
    path: PathBuf,
    data: Option<Arc<RwLock<Vec<u8>>>>,
    pos: u64,
    flags: OpenFlags,
}

impl MemFile {
    pub fn new(
        fs: MemFS,
        path: PathBuf,
        data: Option<Arc<RwLock<Vec<u8>>>>,
        flags: OpenFlags,
    ) -> Self {
        Self {
            fs,
            path,
            data,
            pos: 0,
            flags,
        }
    }

    fn contents(&self) -> io::Result<&Arc<RwLock<Vec<u8>>>> {
        self.data.as_ref().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("read {}", self.path.display()),
            )
        })
    }

    fn read_from(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if !self.flags.read {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("read {}: file not opened for reading", self.path.display()),
            ));
        }
        let data = self.contents()?.read();
        let start = (offset as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write_to(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        if !self.flags.is_writable() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("write {}: file not opened for writing", self.path.display()),
            ));
        }
        {
            let mut data = self.contents()?.write();
            let start = offset as usize;
            let end = start + buf.len();
            if data.len() < end {
                data.resize(end, 0);
            }
            data[start..end].copy_from_slice(buf);
        }
        self.fs.touch(&self.path);
        Ok(buf.len())
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.contents()?.read().len() as u64)
    }
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.read_from(buf, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.flags.append {
            self.pos = self.len()?;
        }
        let n = self.write_to(buf, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let next = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.len()?.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        match next {
            Some(pos) => {
                self.pos = pos;
                Ok(pos)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek {}: invalid offset", self.path.display()),
            )),
        }
    }
}

impl OpenFile for MemFile {
    fn name(&self) -> &Path {
        &self.path
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.read_from(buf, offset)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.write_to(buf, offset)
    }

    fn stat(&self) -> VfsResult<Metadata> {
        self.fs
            .stat(&self.path)
            .map(|md| md.with_name(paths::base_name(&self.path)))
    }

    fn sync(&mut self) -> VfsResult<()> {
        Ok(())
    }

    fn truncate(&mut self, size: u64) -> VfsResult<()> {
        if !self.flags.is_writable() {
            return Err(VfsError::PermissionDenied(format!(
                "truncate {}",
                self.path.display()
            )));
        }
        self.fs.truncate(&self.path, size)
    }

    fn read_dir(&mut self) -> VfsResult<Vec<Entry>> {
        self.fs.read_dir(&self.path)
    }
}
