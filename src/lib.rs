pub mod config;
pub mod core;
pub mod storage;

pub mod athletes_cmd;
pub mod backup_cmd;
pub mod result_cmd;
pub mod scoreboard_cmd;
pub mod tip_cmd;

use std::path::PathBuf;

use thiserror::Error;

pub use storage::{RecordStore, SnapshotFormat, StoreOptions};

#[derive(Debug, Error)]
pub enum TipsError {
    /// The state directory or one of its files cannot be created, read or written.
    #[error("storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A stored file exists but cannot be decoded.
    #[error("stored state at {} is unreadable: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("state directory is locked by another writer (waited {waited_ms} ms)")]
    ConcurrentWriteConflict { waited_ms: u128 },
    #[error("invalid athlete data: {0}")]
    InvalidReference(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl TipsError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TipsError::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller may reasonably offer the user a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TipsError::StorageUnavailable { .. } | TipsError::ConcurrentWriteConflict { .. }
        )
    }
}

pub type TipsResult<T> = Result<T, TipsError>;

// Shared helpers

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Write rows as a left-aligned plain-text table.
pub fn write_table<W: std::io::Write>(
    out: &mut W,
    headers: &[&str],
    rows: &[Vec<String>],
) -> TipsResult<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let io = |e: std::io::Error| TipsError::Message(format!("failed to write output: {e}"));
    writeln!(out, "{}", line(headers.to_vec())).map_err(io)?;
    for row in rows {
        writeln!(out, "{}", line(row.iter().map(String::as_str).collect())).map_err(io)?;
    }
    Ok(())
}
