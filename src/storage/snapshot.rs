//! Whole-collection snapshots: the stored state document and the
//! export/import artifact.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::schema::{SCHEMA_VERSION, TipEntry};
use crate::storage::csv::CsvCodec;
use crate::{TipsError, TipsResult};

/// Artifact encoding for export and import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotFormat {
    #[default]
    Json,
    Csv,
}

impl SnapshotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SnapshotFormat::Json => "application/json",
            SnapshotFormat::Csv => "text/csv",
        }
    }

    /// Guess from a file extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SnapshotFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SnapshotFormat::Json),
            "csv" => Ok(SnapshotFormat::Csv),
            other => Err(format!("unknown snapshot format '{other}' (expected json or csv)")),
        }
    }
}

/// Full TipEntry collection at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// ISO 8601 creation timestamp
    pub created_at: String,

    pub entry_count: usize,

    /// sha256 of the JSON-encoded `entries` array
    pub entries_sha256: String,

    pub entries: Vec<TipEntry>,
}

impl Snapshot {
    /// Build a snapshot; entries are sorted by key.
    pub fn new(mut entries: Vec<TipEntry>) -> TipsResult<Self> {
        entries.sort_by_key(|e| e.key());
        let entries_sha256 = checksum(&entries)?;
        Ok(Snapshot {
            schema_version: SCHEMA_VERSION,
            created_at: crate::now_rfc3339(),
            entry_count: entries.len(),
            entries_sha256,
            entries,
        })
    }

    pub fn into_entries(self) -> Vec<TipEntry> {
        self.entries
    }

    pub fn to_bytes(&self, format: SnapshotFormat) -> TipsResult<Vec<u8>> {
        match format {
            SnapshotFormat::Json => serde_json::to_vec_pretty(self)
                .map_err(|e| TipsError::Message(format!("failed to serialize snapshot: {e}"))),
            SnapshotFormat::Csv => {
                let mut buffer = Vec::new();
                CsvCodec::new().export_to_writer(&self.entries, &mut buffer)?;
                Ok(buffer)
            }
        }
    }

    /// Decode and fully validate an artifact.
    pub fn from_bytes(bytes: &[u8], format: SnapshotFormat) -> TipsResult<Self> {
        let snapshot = match format {
            SnapshotFormat::Json => Self::from_json(bytes)?,
            SnapshotFormat::Csv => {
                let entries = CsvCodec::new().import_from_reader(bytes)?;
                Self::new(entries)?
            }
        };
        let entries: Vec<TipEntry> = snapshot.entries.into_iter().map(TipEntry::normalized).collect();
        ensure_unique_keys(&entries)?;
        Ok(Snapshot {
            entries,
            ..snapshot
        })
    }

    fn from_json(bytes: &[u8]) -> TipsResult<Self> {
        // Check the version before the shape so a newer layout reports as such.
        let raw: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| TipsError::InvalidSnapshot(format!("not valid JSON: {e}")))?;
        let version = raw
            .get("schema_version")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| TipsError::InvalidSnapshot("missing schema_version".to_string()))?;
        if version != u64::from(SCHEMA_VERSION) {
            return Err(TipsError::InvalidSnapshot(format!(
                "unsupported schema version v{version}, expected v{SCHEMA_VERSION}"
            )));
        }

        let snapshot: Snapshot = serde_json::from_value(raw)
            .map_err(|e| TipsError::InvalidSnapshot(format!("malformed snapshot: {e}")))?;

        if snapshot.entry_count != snapshot.entries.len() {
            return Err(TipsError::InvalidSnapshot(format!(
                "entry_count is {} but {} entries are present",
                snapshot.entry_count,
                snapshot.entries.len()
            )));
        }
        let actual = checksum(&snapshot.entries)?;
        if actual != snapshot.entries_sha256 {
            return Err(TipsError::InvalidSnapshot(
                "entries_sha256 does not match entries".to_string(),
            ));
        }
        Ok(snapshot)
    }
}

fn checksum(entries: &[TipEntry]) -> TipsResult<String> {
    let bytes = serde_json::to_vec(entries)
        .map_err(|e| TipsError::Message(format!("failed to serialize entries: {e}")))?;
    Ok(sha256::digest(bytes.as_slice()))
}

fn ensure_unique_keys(entries: &[TipEntry]) -> TipsResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        let key = entry.key();
        if !seen.insert(key.clone()) {
            return Err(TipsError::InvalidSnapshot(format!("duplicate entry for {key}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::Medal;
    use time::macros::datetime;

    fn entries() -> Vec<TipEntry> {
        vec![
            TipEntry::new("a2", Medal::Gold)
                .by("Magnus")
                .at(datetime!(2026-02-09 08:00 UTC)),
            TipEntry::new("a1", Medal::Bronze)
                .by("Magnus")
                .with_note("podium at worst")
                .at(datetime!(2026-02-09 08:01 UTC)),
        ]
    }

    #[test]
    fn test_new_sorts_and_counts() {
        let snap = Snapshot::new(entries()).unwrap();
        assert_eq!(snap.schema_version, SCHEMA_VERSION);
        assert_eq!(snap.entry_count, 2);
        assert_eq!(snap.entries[0].athlete_id, "a1");
        assert_eq!(snap.entries_sha256.len(), 64);
    }

    #[test]
    fn test_json_and_csv_decode_to_same_entries() {
        let snap = Snapshot::new(entries()).unwrap();
        for format in [SnapshotFormat::Json, SnapshotFormat::Csv] {
            let bytes = snap.to_bytes(format).unwrap();
            let back = Snapshot::from_bytes(&bytes, format).unwrap();
            assert_eq!(back.entries, snap.entries, "format {format}");
        }
    }

    #[test]
    fn test_json_rejects_tampered_entries() {
        let snap = Snapshot::new(entries()).unwrap();
        let text = String::from_utf8(snap.to_bytes(SnapshotFormat::Json).unwrap()).unwrap();
        let tampered = text.replace("\"Gold\"", "\"Silver\"");
        let err = Snapshot::from_bytes(tampered.as_bytes(), SnapshotFormat::Json).unwrap_err();
        assert!(err.to_string().contains("entries_sha256"));
    }

    #[test]
    fn test_json_rejects_unknown_version() {
        let doc = r#"{"schema_version": 7, "entries": "whatever"}"#;
        let err = Snapshot::from_bytes(doc.as_bytes(), SnapshotFormat::Json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version v7"));

        let err = Snapshot::from_bytes(b"[]", SnapshotFormat::Json).unwrap_err();
        assert!(err.to_string().contains("missing schema_version"));

        let err = Snapshot::from_bytes(b"{not json", SnapshotFormat::Json).unwrap_err();
        assert!(matches!(err, TipsError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_json_rejects_count_mismatch() {
        let mut snap = Snapshot::new(entries()).unwrap();
        snap.entry_count = 5;
        let bytes = serde_json::to_vec(&snap).unwrap();
        let err = Snapshot::from_bytes(&bytes, SnapshotFormat::Json).unwrap_err();
        assert!(err.to_string().contains("entry_count"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let mut dup = entries();
        dup.push(TipEntry::new("a1", Medal::Gold).by("Magnus"));
        let bytes = Snapshot::new(dup).unwrap().to_bytes(SnapshotFormat::Csv).unwrap();
        let err = Snapshot::from_bytes(&bytes, SnapshotFormat::Csv).unwrap_err();
        assert!(err.to_string().contains("duplicate entry for a1@Magnus"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<SnapshotFormat>().unwrap(), SnapshotFormat::Json);
        assert_eq!(
            SnapshotFormat::from_path(std::path::Path::new("backup.csv")),
            Some(SnapshotFormat::Csv)
        );
        assert_eq!(SnapshotFormat::from_path(std::path::Path::new("backup")), None);
        assert!("xml".parse::<SnapshotFormat>().is_err());
    }
}
