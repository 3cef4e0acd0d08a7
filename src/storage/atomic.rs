//! Crash-safe file replacement: write temp, fsync, rename, fsync directory.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{TipsError, TipsResult};

/// Replace `path` with `bytes` so readers see either the old or the new file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> TipsResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| TipsError::storage(dir, e))?;
    tmp.write_all(bytes)
        .map_err(|e| TipsError::storage(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| TipsError::storage(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| TipsError::storage(path, e.error))?;

    #[cfg(unix)]
    {
        let handle = std::fs::File::open(dir).map_err(|e| TipsError::storage(dir, e))?;
        handle.sync_all().map_err(|e| TipsError::storage(dir, e))?;
    }

    Ok(())
}
