/*!
 * Confined File Handle
 * Wraps a backend handle so nothing it reports leaks a host path
 */

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::translator::PathTranslator;
use crate::vfs::paths;
use crate::vfs::traits::OpenFile;
use crate::vfs::types::*;

/// Handle returned by the confined filesystem's open operations
///
/// Owns exactly one backend handle. Every operation delegates; errors are
/// scrubbed and `stat` reports the base name of the virtual path.
pub struct ConfinedFile {
    inner: Box<dyn OpenFile>,
    translator: Arc<PathTranslator>,
    name: PathBuf,
}

impl ConfinedFile {
    pub(super) fn new(inner: Box<dyn OpenFile>, translator: Arc<PathTranslator>, name: &Path) -> Self {
        Self {
            inner,
            translator,
            name: name.to_path_buf(),
        }
    }
}

impl Read for ConfinedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| self.translator.scrub_io(e))
    }
}

impl Write for ConfinedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|e| self.translator.scrub_io(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| self.translator.scrub_io(e))
    }
}

impl Seek for ConfinedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos).map_err(|e| self.translator.scrub_io(e))
    }
}

impl OpenFile for ConfinedFile {
    fn name(&self) -> &Path {
        &self.name
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.inner
            .read_at(buf, offset)
            .map_err(|e| self.translator.scrub_io(e))
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.inner
            .write_at(buf, offset)
            .map_err(|e| self.translator.scrub_io(e))
    }

    fn stat(&self) -> VfsResult<Metadata> {
        self.inner
            .stat()
            .map(|md| md.with_name(paths::base_name(&self.name)))
            .map_err(|e| self.translator.scrub(e))
    }

    fn sync(&mut self) -> VfsResult<()> {
        self.inner.sync().map_err(|e| self.translator.scrub(e))
    }

    fn truncate(&mut self, size: u64) -> VfsResult<()> {
        self.inner.truncate(size).map_err(|e| self.translator.scrub(e))
    }

    fn read_dir(&mut self) -> VfsResult<Vec<Entry>> {
        self.inner.read_dir().map_err(|e| self.translator.scrub(e))
    }

    fn close(&mut self) -> VfsResult<()> {
        self.inner.close().map_err(|e| self.translator.scrub(e))
    }
}
