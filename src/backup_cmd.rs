//! CLI command handlers for `export`, `import` and `reset`.
//!
//! Tips travel as a JSON or CSV snapshot; the results table always travels as
//! CSV.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::AppConfig;
use crate::storage::SnapshotFormat;
use crate::{TipsError, TipsResult};

fn resolve_format(
    explicit: Option<SnapshotFormat>,
    path: &Path,
    results: bool,
) -> TipsResult<SnapshotFormat> {
    if results {
        return match explicit {
            None | Some(SnapshotFormat::Csv) => Ok(SnapshotFormat::Csv),
            Some(other) => Err(TipsError::Message(format!(
                "results are exported as csv, not {other}"
            ))),
        };
    }
    Ok(explicit
        .or_else(|| SnapshotFormat::from_path(path))
        .unwrap_or_default())
}

/// Write a backup artifact to `output`.
pub fn export(
    cfg: &AppConfig,
    output: PathBuf,
    format: Option<SnapshotFormat>,
    results: bool,
) -> TipsResult<()> {
    let format = resolve_format(format, &output, results)?;
    let store = cfg.open_store()?;
    let bytes = if results {
        store.export_results()?
    } else {
        store.export_snapshot(format)?
    };

    write_artifact(&output, &bytes)?;

    let what = if results { "results" } else { "tips" };
    eprintln!(
        "Wrote {what} ({format}, {} bytes) to: {}",
        bytes.len(),
        output.display()
    );
    Ok(())
}

fn write_artifact(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

/// Restore from a backup artifact, replacing current state.
pub fn import(
    cfg: &AppConfig,
    input: PathBuf,
    format: Option<SnapshotFormat>,
    results: bool,
) -> TipsResult<()> {
    let format = resolve_format(format, &input, results)?;
    let bytes = std::fs::read(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let store = cfg.open_store()?;
    let count = if results {
        store.import_results(&bytes)?
    } else {
        store.import_snapshot(&bytes, format)?
    };

    let what = if results { "result(s)" } else { "tip(s)" };
    eprintln!("Restored {count} {what} from: {}", input.display());
    Ok(())
}

/// Clear every tip. Refuses unless `confirmed`.
pub fn reset<W: Write>(cfg: &AppConfig, confirmed: bool, out: &mut W) -> TipsResult<()> {
    if !confirmed {
        return Err(TipsError::Message(
            "reset deletes every saved tip; pass --yes to confirm (export first to keep a backup)"
                .to_string(),
        ));
    }
    let removed = cfg.open_store()?.reset()?;
    writeln!(out, "Removed {removed} tip(s)").map_err(|e| TipsError::Message(e.to_string()))
}
