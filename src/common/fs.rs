use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use tempfile::NamedTempFile;

/// Create the directory if it doesn't exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("[common::fs] Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("[common::fs] Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Write-then-rename sink: the target only appears once `finalize` succeeds.
/// Dropping the sink without finalizing removes the temporary file.
pub(crate) struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

impl PendingWrite {
    /// Open a temporary file next to `target`, creating parent directories as needed.
    pub(crate) fn open(target: &Path) -> Result<Self> {
        let parent = target.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        ensure_dir_exists(parent)?;
        let tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("[common::fs] Failed to create temp file in {}", parent.display()))?;

        Ok(Self { target: target.to_path_buf(), tmp })
    }

    /// Flush and atomically move the temporary file onto the target.
    pub(crate) fn finalize(mut self) -> Result<()> {
        self.tmp.flush()
            .with_context(|| format!("[common::fs] Failed to flush {}", self.target.display()))?;
        self.tmp.as_file().sync_all().ok(); // best-effort fsync
        self.tmp.persist(&self.target)
            .map_err(|e| anyhow!(e.error))
            .with_context(|| format!("[common::fs] Failed to rename into {}", self.target.display()))?;
        if let Some(dir) = self.target.parent() {
            let _ = File::open(dir).and_then(|f| f.sync_all());
        }
        Ok(())
    }
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.tmp.write(buf) }

    fn flush(&mut self) -> std::io::Result<()> { self.tmp.flush() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_appears_only_after_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out.txt");

        let mut sink = PendingWrite::open(&target).unwrap();
        sink.write_all(b"hello").unwrap();
        assert!(!target.exists());
        sink.finalize().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");
    }

    #[test]
    fn abandoned_writes_leave_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        fs::write(&target, "old").unwrap();

        {
            let mut sink = PendingWrite::open(&target).unwrap();
            sink.write_all(b"partial").unwrap();
        }
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn ensure_dir_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "").unwrap();
        assert!(ensure_dir_exists(&file).is_err());
        ensure_dir_exists(&dir.path().join("a/b")).unwrap();
    }
}
