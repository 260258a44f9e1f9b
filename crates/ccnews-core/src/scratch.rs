//! Scratch files for downloaded segments.
//!
//! Each in-flight segment is staged in a shared scratch directory. File
//! names are percent-encoded from the segment's remote path, so concurrent
//! workers never collide. The guard removes the file when dropped, which
//! covers success, filter-rejection and error exits alike.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// RAII guard for one segment's scratch file.
pub struct ScratchFile {
    path: PathBuf,
}

impl std::fmt::Debug for ScratchFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchFile").field("path", &self.path).finish()
    }
}

impl ScratchFile {
    /// Reserve a scratch path for `location` under `dir`.
    ///
    /// A stale file from an interrupted earlier run is removed first.
    pub fn create(dir: &Path, location: &str) -> io::Result<Self> {
        let name = urlencoding::encode(location).into_owned();
        let path = dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("removed stale scratch file {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("failed to remove scratch file {}: {e}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = {
            let scratch = ScratchFile::create(dir.path(), "crawl-data/a.warc.gz").unwrap();
            fs::write(scratch.path(), b"bytes").unwrap();
            assert!(scratch.path().exists());
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn drop_without_file_is_silent() {
        let dir = TempDir::new().unwrap();
        // Never written; drop must not panic
        let _scratch = ScratchFile::create(dir.path(), "never-downloaded.warc.gz").unwrap();
    }

    #[test]
    fn names_are_collision_free() {
        let dir = TempDir::new().unwrap();
        let a = ScratchFile::create(dir.path(), "crawl-data/CC-NEWS/2020/01/a.warc.gz").unwrap();
        let b = ScratchFile::create(dir.path(), "crawl-data/CC-NEWS/2020/02/a.warc.gz").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn name_contains_no_path_separator() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchFile::create(dir.path(), "crawl-data/CC-NEWS/a.warc.gz").unwrap();
        let name = scratch.path().file_name().unwrap().to_string_lossy();
        assert!(!name.contains('/'));
    }

    #[test]
    fn stale_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let first = ScratchFile::create(dir.path(), "seg.warc.gz").unwrap();
        fs::write(first.path(), b"stale").unwrap();
        let path = first.path().to_path_buf();
        std::mem::forget(first); // simulate a crashed run leaving the file behind

        let second = ScratchFile::create(dir.path(), "seg.warc.gz").unwrap();
        assert_eq!(second.path(), path);
        assert!(!path.exists());
    }
}
