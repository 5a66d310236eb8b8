/*!
 * Path Translator
 * Maps virtual paths onto a base directory and host paths back out
 */

use parking_lot::RwLock;
use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::vfs::paths::{self, ROOT};
use crate::vfs::types::{VfsError, VfsResult};

/// Confinement context shared by the facade and its file handles
///
/// Holds the base directory (fixed at construction) and the virtual
/// working directory. The working directory only substitutes for an empty
/// path; relative paths are otherwise taken from the virtual root.
#[derive(Debug)]
pub struct PathTranslator {
    base: PathBuf,
    cwd: RwLock<PathBuf>,
}

impl PathTranslator {
    /// `base` must be absolute; it is cleaned so prefix checks are exact
    pub fn new(base: &Path, cwd: &Path) -> Self {
        Self {
            base: paths::clean(base),
            cwd: RwLock::new(paths::clean_rooted(cwd)),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn getwd(&self) -> PathBuf {
        self.cwd.read().clone()
    }

    /// Absolute paths replace the working directory, relative ones extend it
    pub fn chdir(&self, dir: &Path) {
        let mut cwd = self.cwd.write();
        let next = if dir.has_root() {
            paths::clean_rooted(dir)
        } else {
            paths::clean_rooted(&cwd.join(dir))
        };
        *cwd = next;
    }

    /// Virtual path to host path
    ///
    /// Never touches the filesystem. The only failure is a computed path that
    /// is not below the base directory, reported as `NotFound` carrying the
    /// computed path.
    pub fn resolve(&self, name: &Path) -> VfsResult<PathBuf> {
        let name: Cow<'_, Path> = if name.as_os_str().is_empty() {
            Cow::Owned(self.getwd())
        } else {
            Cow::Borrowed(name)
        };

        if name.as_ref() == Path::new(ROOT) {
            return Ok(self.base.clone());
        }

        // Absolute names are re-rooted as-is so `/..` still climbs out of the
        // base and gets rejected below.
        let relative = if name.has_root() {
            paths::strip_root(&name)
        } else {
            paths::clean(&name)
        };
        let real = paths::clean(&self.base.join(relative));

        if !real.starts_with(&self.base) {
            debug!(
                path = %name.display(),
                resolved = %real.display(),
                "rejected path outside confinement"
            );
            return Err(VfsError::NotFound(real.display().to_string()));
        }

        Ok(real)
    }

    /// True if `real` is the base directory or below it once cleaned
    pub fn contains(&self, real: &Path) -> bool {
        paths::clean(real).starts_with(&self.base)
    }

    /// Host path to virtual path, `None` when `real` is outside the base
    ///
    /// `real` is cleaned first: `<base>/../x` names a file outside the base.
    pub fn to_virtual(&self, real: &Path) -> Option<PathBuf> {
        let real = paths::clean(real);
        real.strip_prefix(&self.base).ok().map(paths::clean_rooted)
    }

    /// Host path to virtual path, passing outside paths through unchanged
    pub fn reverse_map(&self, real: &Path) -> PathBuf {
        self.to_virtual(real).unwrap_or_else(|| real.to_path_buf())
    }

    /// Rewrite host paths in an error back to virtual form
    pub fn scrub(&self, err: VfsError) -> VfsError {
        err.map_paths(&|s: &str| self.scrub_str(s))
    }

    /// Rebuild an I/O error whose message mentions the base directory
    pub fn scrub_io(&self, err: io::Error) -> io::Error {
        let message = err.to_string();
        let scrubbed = self.scrub_str(&message);
        if scrubbed == message {
            return err;
        }
        io::Error::new(err.kind(), scrubbed)
    }

    /// Strip every segment-aligned occurrence of the base directory
    ///
    /// `<base>/x` becomes `/x` and a bare `<base>` becomes `/`. Text where the
    /// base is only a string prefix of a longer component is left alone.
    pub fn scrub_str(&self, text: &str) -> String {
        let base = self.base.to_string_lossy();
        if base == ROOT || base.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(idx) = rest.find(base.as_ref()) {
            let (head, tail) = rest.split_at(idx);
            let after = &tail[base.len()..];
            let starts_clean = head.chars().next_back().map_or(true, |c| !is_path_char(c));
            let next = after.chars().next();

            out.push_str(head);
            match next {
                _ if !starts_clean => out.push_str(&base),
                Some('/') => {}
                Some(c) if is_path_char(c) => out.push_str(&base),
                _ => out.push_str(ROOT),
            }
            rest = after;
        }
        out.push_str(rest);
        out
    }
}

fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '~' | '+' | '@')
}
