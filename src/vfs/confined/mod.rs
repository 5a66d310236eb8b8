/*!
 * Confined Filesystem
 * Presents a subdirectory of another filesystem as a complete filesystem
 */

mod config;
mod file;
mod translator;

pub use config::{ConfineConfig, ENV_BASE_DIR, ENV_TEMP_DIR};
pub use file::ConfinedFile;
pub use translator::PathTranslator;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use super::paths::{self, ROOT};
use crate::monitoring::span_operation;
use super::traits::*;
use super::types::*;

/// Filesystem confined to one directory of the filesystem it wraps
///
/// Every path argument is a virtual path: `/` is the base directory and no
/// spelling of a path (`..` runs, doubled separators, relative names)
/// reaches anything outside it. Host paths never appear in results or in
/// errors.
///
/// Symlink operations are available when `F` supports them; see
/// [`ConfinedFS::with_symlinks`].
pub struct ConfinedFS<F: FileSystem> {
    fs: F,
    translator: Arc<PathTranslator>,
    temp_fallback: PathBuf,
    name: String,
}

impl<F: FileSystem> ConfinedFS<F> {
    /// Confine `fs` to `base_dir`, which must be an existing absolute directory
    pub fn new<P: AsRef<Path>>(fs: F, base_dir: P) -> VfsResult<Self> {
        Self::from_config(fs, ConfineConfig::new(base_dir))
    }

    /// Start a builder for `fs`
    pub fn builder(fs: F) -> ConfinedFSBuilder<F> {
        ConfinedFSBuilder::new(fs)
    }

    /// Confine `fs` as described by `config`
    pub fn from_config(fs: F, config: ConfineConfig) -> VfsResult<Self> {
        let base = config.base_dir;
        if base.as_os_str().is_empty() {
            return Err(VfsError::InvalidArgument(
                "base directory must not be empty".into(),
            ));
        }
        if !base.is_absolute() {
            return Err(VfsError::InvalidPath(format!(
                "base directory is not absolute: {}",
                base.display()
            )));
        }

        let info = fs.stat(&base)?;
        if !info.is_dir() {
            return Err(VfsError::NotADirectory(base.display().to_string()));
        }

        let translator = PathTranslator::new(&base, &config.initial_cwd);
        info!(
            base_dir = %translator.base_dir().display(),
            backend = fs.name(),
            "confined filesystem ready"
        );

        let name = format!("confined({})", fs.name());
        Ok(Self {
            fs,
            translator: Arc::new(translator),
            temp_fallback: paths::clean_rooted(&config.temp_fallback),
            name,
        })
    }

    /// Host directory serving as the virtual root
    pub fn base_dir(&self) -> &Path {
        self.translator.base_dir()
    }

    pub fn inner(&self) -> &F {
        &self.fs
    }

    pub fn into_inner(self) -> F {
        self.fs
    }

    /// Map a virtual path to the host path it would touch
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> VfsResult<PathBuf> {
        self.translator.resolve(path.as_ref())
    }

    #[inline]
    fn real(&self, path: &Path) -> VfsResult<PathBuf> {
        self.translator.resolve(path)
    }

    #[inline]
    fn scrub(&self, err: VfsError) -> VfsError {
        self.translator.scrub(err)
    }

    /// Name a handle is reported under: the caller's path, or the cwd for ""
    fn handle_name(&self, path: &Path) -> PathBuf {
        if path.as_os_str().is_empty() {
            self.translator.getwd()
        } else {
            path.to_path_buf()
        }
    }

    fn wrap(&self, file: Box<dyn OpenFile>, path: &Path) -> Box<dyn OpenFile> {
        Box::new(ConfinedFile::new(
            file,
            Arc::clone(&self.translator),
            &self.handle_name(path),
        ))
    }

    fn virtual_name(&self, path: &Path) -> String {
        paths::base_name(&self.handle_name(path))
    }

    fn require_walker(&self) -> VfsResult<&dyn Walker> {
        self.fs.walker().ok_or_else(|| {
            debug!(backend = self.fs.name(), "walk requested on backend without walker");
            VfsError::WalkUnsupported
        })
    }
}

impl<F: FileSystem + Clone> ConfinedFS<F> {
    /// Filesystem rooted at the virtual directory `dir`
    ///
    /// The result wraps a clone of the backend with `dir`'s host path as its
    /// base, so nothing in it reaches above `dir`. It starts at `/` and keeps
    /// this filesystem's temp fallback.
    pub fn sub<P: AsRef<Path>>(&self, dir: P) -> VfsResult<Self> {
        let dir = dir.as_ref();
        let _span = span_operation("sub", dir).entered();
        let real = self.real(dir)?;
        let config = ConfineConfig::new(real).with_temp_fallback(&self.temp_fallback);
        Self::from_config(self.fs.clone(), config).map_err(|e| self.scrub(e))
    }
}

impl<F: SymlinkFileSystem> ConfinedFS<F> {
    /// Confine a symlink-capable filesystem
    ///
    /// Same as [`ConfinedFS::new`]; exists so call sites that need
    /// `lstat`/`symlink`/`readlink`/`lchown` fail to compile when `fs`
    /// lacks them.
    pub fn with_symlinks<P: AsRef<Path>>(fs: F, base_dir: P) -> VfsResult<Self> {
        Self::new(fs, base_dir)
    }
}

impl<F: FileSystem> fmt::Debug for ConfinedFS<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfinedFS")
            .field("backend", &self.fs.name())
            .field("base_dir", &self.translator.base_dir())
            .field("cwd", &self.translator.getwd())
            .finish()
    }
}

impl<F: FileSystem> FileSystem for ConfinedFS<F> {
    fn open_file(
        &self,
        path: &Path,
        flags: OpenFlags,
        perm: Permissions,
    ) -> VfsResult<Box<dyn OpenFile>> {
        let _span = span_operation("open", path).entered();
        let real = self.real(path)?;
        let file = self
            .fs
            .open_file(&real, flags, perm)
            .map_err(|e| self.scrub(e))?;
        Ok(self.wrap(file, path))
    }

    fn open(&self, path: &Path) -> VfsResult<Box<dyn OpenFile>> {
        let real = self.real(path)?;
        let file = self.fs.open(&real).map_err(|e| self.scrub(e))?;
        Ok(self.wrap(file, path))
    }

    fn create(&self, path: &Path) -> VfsResult<Box<dyn OpenFile>> {
        let real = self.real(path)?;
        let file = self.fs.create(&real).map_err(|e| self.scrub(e))?;
        Ok(self.wrap(file, path))
    }

    fn mkdir(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        let real = self.real(path)?;
        self.fs.mkdir(&real, perm).map_err(|e| self.scrub(e))
    }

    fn mkdir_all(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        let real = self.real(path)?;
        self.fs.mkdir_all(&real, perm).map_err(|e| self.scrub(e))
    }

    fn remove(&self, path: &Path) -> VfsResult<()> {
        let real = self.real(path)?;
        self.fs.remove(&real).map_err(|e| self.scrub(e))
    }

    fn remove_all(&self, path: &Path) -> VfsResult<()> {
        let _span = span_operation("removeall", path).entered();
        let real = self.real(path)?;
        self.fs.remove_all(&real).map_err(|e| self.scrub(e))
    }

    fn rename(&self, from: &Path, to: &Path) -> VfsResult<()> {
        let _span = span_operation("rename", from).entered();
        let link_error = |source: VfsError| VfsError::Link {
            op: "rename".into(),
            old: from.display().to_string(),
            new: to.display().to_string(),
            source: Box::new(source),
        };

        let real_from = self.real(from).map_err(link_error)?;
        let real_to = self.real(to).map_err(link_error)?;
        self.fs
            .rename(&real_from, &real_to)
            .map_err(|e| self.scrub(e))
    }

    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()> {
        let real = self.real(path)?;
        self.fs.truncate(&real, size).map_err(|e| self.scrub(e))
    }

    fn stat(&self, path: &Path) -> VfsResult<Metadata> {
        let real = self.real(path)?;
        self.fs
            .stat(&real)
            .map(|md| md.with_name(self.virtual_name(path)))
            .map_err(|e| self.scrub(e))
    }

    fn chmod(&self, path: &Path, perm: Permissions) -> VfsResult<()> {
        let real = self.real(path)?;
        self.fs.chmod(&real, perm).map_err(|e| self.scrub(e))
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()> {
        let real = self.real(path)?;
        self.fs.chown(&real, uid, gid).map_err(|e| self.scrub(e))
    }

    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> VfsResult<()> {
        let real = self.real(path)?;
        self.fs
            .chtimes(&real, atime, mtime)
            .map_err(|e| self.scrub(e))
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<Entry>> {
        let real = self.real(path)?;
        self.fs.read_dir(&real).map_err(|e| self.scrub(e))
    }

    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let real = self.real(path)?;
        self.fs.read_file(&real).map_err(|e| self.scrub(e))
    }

    fn temp_dir(&self) -> PathBuf {
        match self.translator.to_virtual(&self.fs.temp_dir()) {
            Some(dir) if dir != Path::new(ROOT) => dir,
            _ => self.temp_fallback.clone(),
        }
    }

    fn getwd(&self) -> VfsResult<PathBuf> {
        Ok(self.translator.getwd())
    }

    fn chdir(&self, path: &Path) -> VfsResult<()> {
        self.translator.chdir(path);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn walker(&self) -> Option<&dyn Walker> {
        self.fs.walker().map(|_| self as &dyn Walker)
    }

    fn confinement(&self) -> Option<Confinement<'_>> {
        Some(Confinement {
            inner: &self.fs,
            base_dir: self.translator.base_dir(),
        })
    }
}

impl<F: FileSystem> Walker for ConfinedFS<F> {
    fn walk(&self, root: &Path, f: &mut WalkFn<'_>) -> VfsResult<()> {
        let _span = span_operation("walk", root).entered();
        let walker = self.require_walker()?;
        let real_root = self.real(root)?;
        let translator = &self.translator;

        walker
            .walk(&real_root, &mut |real: &Path, info: VfsResult<&Metadata>| {
                let path = translator.reverse_map(real);
                match info {
                    Ok(md) => {
                        let md = md.clone().with_name(paths::base_name(&path));
                        f(&path, Ok(&md))
                    }
                    Err(e) => f(&path, Err(translator.scrub(e))),
                }
            })
            .map_err(|e| self.scrub(e))
    }

    fn fast_walk(&self, root: &Path, f: &FastWalkFn<'_>) -> VfsResult<()> {
        let _span = span_operation("fastwalk", root).entered();
        let walker = self.require_walker()?;
        let real_root = self.real(root)?;
        let translator = &self.translator;

        walker
            .fast_walk(&real_root, &|real: &Path, file_type: FileType| {
                f(&translator.reverse_map(real), file_type)
            })
            .map_err(|e| self.scrub(e))
    }
}

impl<F: SymlinkFileSystem> SymlinkFileSystem for ConfinedFS<F> {
    fn lstat(&self, path: &Path) -> VfsResult<Metadata> {
        let real = self.real(path)?;
        self.fs
            .lstat(&real)
            .map(|md| md.with_name(self.virtual_name(path)))
            .map_err(|e| self.scrub(e))
    }

    fn lchown(&self, path: &Path, uid: u32, gid: u32) -> VfsResult<()> {
        let real = self.real(path)?;
        self.fs.lchown(&real, uid, gid).map_err(|e| self.scrub(e))
    }

    /// Relative targets come back verbatim, absolute ones inside the base
    /// come back virtual, anything else unchanged
    fn readlink(&self, path: &Path) -> VfsResult<PathBuf> {
        let real = self.real(path)?;
        let target = self.fs.readlink(&real).map_err(|e| self.scrub(e))?;
        if !target.has_root() || !self.translator.contains(&target) {
            return Ok(target);
        }
        Ok(self.translator.reverse_map(&target))
    }

    fn symlink(&self, target: &Path, link: &Path) -> VfsResult<()> {
        let _span = span_operation("symlink", link).entered();
        let real_link = self.real(link)?;
        let real_target = if target.has_root() {
            self.real(target)?
        } else {
            target.to_path_buf()
        };
        self.fs
            .symlink(&real_target, &real_link)
            .map_err(|e| self.scrub(e))
    }
}

/// Builder for [`ConfinedFS`]
pub struct ConfinedFSBuilder<F: FileSystem> {
    fs: F,
    config: ConfineConfig,
}

impl<F: FileSystem> ConfinedFSBuilder<F> {
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            config: ConfineConfig::default(),
        }
    }

    pub fn base_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.base_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn temp_fallback<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.temp_fallback = dir.as_ref().to_path_buf();
        self
    }

    pub fn initial_cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.initial_cwd = dir.as_ref().to_path_buf();
        self
    }

    /// Replace every setting at once
    pub fn config(mut self, config: ConfineConfig) -> Self {
        self.config = config;
        self
    }
}

impl<F: FileSystem> FileSystemBuilder for ConfinedFSBuilder<F> {
    type Output = ConfinedFS<F>;

    fn build(self) -> VfsResult<ConfinedFS<F>> {
        ConfinedFS::from_config(self.fs, self.config)
    }
}

/// The filesystem a confined wrapper delegates to, or `fs` itself
pub fn unwrap(fs: &dyn FileSystem) -> &dyn FileSystem {
    fs.confinement().map_or(fs, |c| c.inner)
}

/// Base directory of a confined wrapper, `None` for any other filesystem
pub fn base_dir(fs: &dyn FileSystem) -> Option<&Path> {
    fs.confinement().map(|c| c.base_dir)
}
