//! CSV encoding for tip snapshots and the results table.

use std::io::{Read, Write};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::schema::{Medal, ResultEntry, SCHEMA_VERSION, TipEntry, TipValue};
use crate::{TipsError, TipsResult};

/// Tip snapshot column headers in deterministic order.
pub const CSV_HEADERS: &[&str] = &[
    "schema_version",
    "athlete_id",
    "submitted_by",
    "medal",
    "note",
    "submitted_at",
];

/// Results table column headers.
pub const RESULTS_HEADERS: &[&str] = &["athlete_id", "medal"];

/// CSV codec for tip entries and results.
///
/// Tip rows each carry the schema version so that a single row is enough to
/// tell which layout the file uses.
#[derive(Debug, Clone, Default)]
pub struct CsvCodec;

impl CsvCodec {
    pub fn new() -> Self {
        CsvCodec
    }

    /// Write tip entries, header first.
    pub fn export_to_writer<W: Write>(&self, entries: &[TipEntry], writer: W) -> TipsResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| TipsError::Message(format!("failed to write CSV headers: {e}")))?;

        for entry in entries {
            let row = self.record_to_row(entry)?;
            csv_writer
                .write_record(&row)
                .map_err(|e| TipsError::Message(format!("failed to write CSV row: {e}")))?;
        }

        csv_writer
            .flush()
            .map_err(|e| TipsError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }

    /// Parse tip entries.
    ///
    /// Columns are matched by name; any missing column, unknown schema
    /// version, medal spelling or timestamp fails the whole read.
    pub fn import_from_reader<R: Read>(&self, reader: R) -> TipsResult<Vec<TipEntry>> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| TipsError::InvalidSnapshot(format!("failed to read CSV header: {e}")))?
            .clone();
        let columns = column_indices(&headers, CSV_HEADERS)?;

        let mut entries = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let line = i + 2;
            let row = row.map_err(|e| {
                TipsError::InvalidSnapshot(format!("failed to read CSV line {line}: {e}"))
            })?;
            let field = |col: usize| row.get(columns[col]).unwrap_or("");

            let version: u32 = field(0).trim().parse().map_err(|_| {
                TipsError::InvalidSnapshot(format!(
                    "line {line}: invalid schema_version '{}'",
                    field(0)
                ))
            })?;
            if version != SCHEMA_VERSION {
                return Err(TipsError::InvalidSnapshot(format!(
                    "line {line}: unsupported schema version v{version}, expected v{SCHEMA_VERSION}"
                )));
            }

            let medal: Medal = field(3)
                .parse()
                .map_err(|e| TipsError::InvalidSnapshot(format!("line {line}: {e}")))?;
            let submitted_at = OffsetDateTime::parse(field(5), &Rfc3339).map_err(|e| {
                TipsError::InvalidSnapshot(format!("line {line}: invalid submitted_at: {e}"))
            })?;

            entries.push(TipEntry {
                athlete_id: field(1).to_string(),
                value: TipValue {
                    medal,
                    note: optional(field(4)),
                },
                submitted_at,
                submitted_by: optional(field(2)),
            });
        }

        Ok(entries)
    }

    /// Convert a TipEntry to a row of CSV values.
    fn record_to_row(&self, entry: &TipEntry) -> TipsResult<Vec<String>> {
        let submitted_at = entry
            .submitted_at
            .format(&Rfc3339)
            .map_err(|e| TipsError::Message(format!("failed to format timestamp: {e}")))?;
        Ok(vec![
            SCHEMA_VERSION.to_string(),
            entry.athlete_id.clone(),
            entry.submitted_by.clone().unwrap_or_default(),
            entry.value.medal.to_string(),
            entry.value.note.clone().unwrap_or_default(),
            submitted_at,
        ])
    }

    pub fn export_results_to_writer<W: Write>(
        &self,
        results: &[ResultEntry],
        writer: W,
    ) -> TipsResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(RESULTS_HEADERS)
            .map_err(|e| TipsError::Message(format!("failed to write CSV headers: {e}")))?;
        for r in results {
            csv_writer
                .write_record([r.athlete_id.as_str(), r.medal.as_str()])
                .map_err(|e| TipsError::Message(format!("failed to write CSV row: {e}")))?;
        }
        csv_writer
            .flush()
            .map_err(|e| TipsError::Message(format!("failed to flush CSV writer: {e}")))?;
        Ok(())
    }

    /// Parse a results table.
    ///
    /// Both columns are required; unknown medal strings read as `None`.
    /// A repeated athlete keeps its first position and its last medal.
    pub fn import_results_from_reader<R: Read>(&self, reader: R) -> TipsResult<Vec<ResultEntry>> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| TipsError::InvalidSnapshot(format!("failed to read CSV header: {e}")))?
            .clone();
        let columns = column_indices(&headers, RESULTS_HEADERS)?;

        let mut results: Vec<ResultEntry> = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let row = row.map_err(|e| {
                TipsError::InvalidSnapshot(format!("failed to read CSV line {}: {e}", i + 2))
            })?;
            let athlete_id = row.get(columns[0]).unwrap_or("").to_string();
            if athlete_id.is_empty() {
                continue;
            }
            let medal = Medal::parse_lenient(row.get(columns[1]).unwrap_or(""));
            match results.iter_mut().find(|r| r.athlete_id == athlete_id) {
                Some(existing) => existing.medal = medal,
                None => results.push(ResultEntry { athlete_id, medal }),
            }
        }
        Ok(results)
    }
}

fn column_indices(headers: &csv::StringRecord, wanted: &[&str]) -> TipsResult<Vec<usize>> {
    wanted
        .iter()
        .map(|name| {
            headers.iter().position(|h| h.trim() == *name).ok_or_else(|| {
                TipsError::InvalidSnapshot(format!(
                    "CSV must have columns {:?}, missing '{name}'",
                    wanted
                ))
            })
        })
        .collect()
}

fn optional(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn make_entry(id: &str, by: Option<&str>, medal: Medal) -> TipEntry {
        let mut entry = TipEntry::new(id, medal).at(datetime!(2026-02-07 18:30:15.25 UTC));
        if let Some(by) = by {
            entry = entry.by(by);
        }
        entry
    }

    #[test]
    fn test_csv_headers_count() {
        assert_eq!(CSV_HEADERS.len(), 6);
    }

    #[test]
    fn test_record_to_row_length() {
        let codec = CsvCodec::new();
        let row = codec.record_to_row(&make_entry("a1", None, Medal::Gold)).unwrap();
        assert_eq!(row.len(), CSV_HEADERS.len());
        assert_eq!(row[2], "");
        assert_eq!(row[4], "");
    }

    #[test]
    fn test_export_to_writer() {
        let codec = CsvCodec::new();
        let entry = make_entry("a1", Some("Göran"), Medal::Silver).with_note("strong, in form");

        let mut buffer = Vec::new();
        codec.export_to_writer(&[entry], &mut buffer).unwrap();

        let csv_str = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = csv_str.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("schema_version,athlete_id,submitted_by"));
        assert!(lines[1].starts_with("1,a1,Göran,Silver,\"strong, in form\","));
        assert!(lines[1].ends_with("2026-02-07T18:30:15.25Z"));
    }

    #[test]
    fn test_import_preserves_fields() {
        let codec = CsvCodec::new();
        let entries = vec![
            make_entry("a1", Some("Johan"), Medal::Gold).with_note("quoted \"note\""),
            make_entry("a2", None, Medal::None),
        ];
        let mut buffer = Vec::new();
        codec.export_to_writer(&entries, &mut buffer).unwrap();

        let back = codec.import_from_reader(buffer.as_slice()).unwrap();
        assert_eq!(back, entries);
    }

    #[test]
    fn test_import_header_only_is_empty() {
        let codec = CsvCodec::new();
        let back = codec
            .import_from_reader(CSV_HEADERS.join(",").as_bytes())
            .unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn test_import_columns_in_any_order() {
        let codec = CsvCodec::new();
        let input = "medal,athlete_id,submitted_at,schema_version,note,submitted_by\n\
                     Bronze,a9,2026-02-08T10:00:00Z,1,,Tony\n";
        let back = codec.import_from_reader(input.as_bytes()).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].athlete_id, "a9");
        assert_eq!(back[0].submitted_by.as_deref(), Some("Tony"));
        assert_eq!(back[0].value.medal, Medal::Bronze);
    }

    #[test]
    fn test_import_rejects_bad_rows() {
        let codec = CsvCodec::new();
        let header = CSV_HEADERS.join(",");

        let wrong_version = format!("{header}\n2,a1,,Gold,,2026-02-08T10:00:00Z\n");
        let err = codec.import_from_reader(wrong_version.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));

        let bad_medal = format!("{header}\n1,a1,,Platinum,,2026-02-08T10:00:00Z\n");
        let err = codec.import_from_reader(bad_medal.as_bytes()).unwrap_err();
        assert!(matches!(err, TipsError::InvalidSnapshot(_)));

        let bad_time = format!("{header}\n1,a1,,Gold,,yesterday\n");
        let err = codec.import_from_reader(bad_time.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("submitted_at"));

        let missing = "athlete_id,medal\na1,Gold\n";
        let err = codec.import_from_reader(missing.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("missing 'schema_version'"));
    }

    #[test]
    fn test_results_round_trip_and_normalization() {
        let codec = CsvCodec::new();
        let input = "athlete_id,medal,extra\na1,Gold,x\na2,Wooden,y\na3,,z\na1,Silver,w\n";
        let results = codec.import_results_from_reader(input.as_bytes()).unwrap();
        assert_eq!(
            results,
            vec![
                ResultEntry { athlete_id: "a1".into(), medal: Medal::Silver },
                ResultEntry { athlete_id: "a2".into(), medal: Medal::None },
                ResultEntry { athlete_id: "a3".into(), medal: Medal::None },
            ]
        );

        let mut buffer = Vec::new();
        codec.export_results_to_writer(&results, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "athlete_id,medal\na1,Silver\na2,None\na3,None\n"
        );
    }

    #[test]
    fn test_results_require_columns() {
        let codec = CsvCodec::new();
        let err = codec
            .import_results_from_reader("athlete_id,place\na1,1\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, TipsError::InvalidSnapshot(_)));
    }
}
