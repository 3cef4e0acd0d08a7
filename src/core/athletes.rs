//! Read-only athlete reference data loaded from CSV.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::{TipsError, TipsResult};

/// Columns every athletes file must carry.
pub const REQUIRED_COLUMNS: &[&str] = &["athlete_id", "name", "sport"];

/// One row of the athletes file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AthleteRecord {
    pub athlete_id: String,
    pub name: String,
    pub sport: String,
    /// Any extra columns, in file order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

impl AthleteRecord {
    /// `"Name (id)"`, as shown in pickers.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.athlete_id)
    }
}

/// Immutable athlete list, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct AthleteRoster {
    athletes: Vec<AthleteRecord>,
}

impl AthleteRoster {
    pub fn load(path: &Path) -> TipsResult<Self> {
        if !path.exists() {
            return Err(TipsError::InvalidReference(format!(
                "athletes file not found: {}",
                path.display()
            )));
        }
        let file = std::fs::File::open(path).map_err(|e| TipsError::storage(path, e))?;
        let roster = Self::from_reader(file)?;
        tracing::debug!(path = %path.display(), athletes = roster.len(), "loaded athlete roster");
        Ok(roster)
    }

    /// Parse a comma-separated table with a header row.
    ///
    /// Rows missing any required field are skipped.
    pub fn from_reader<R: Read>(reader: R) -> TipsResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| TipsError::InvalidReference(format!("failed to read header: {e}")))?
            .clone();

        let index_of = |name: &str| headers.iter().position(|h| h == name);
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| index_of(*c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(TipsError::InvalidReference(format!(
                "athletes file must have columns {:?}, missing {:?}",
                REQUIRED_COLUMNS, missing
            )));
        }
        let (id_idx, name_idx, sport_idx) = (
            index_of("athlete_id").unwrap_or_default(),
            index_of("name").unwrap_or_default(),
            index_of("sport").unwrap_or_default(),
        );

        let mut athletes = Vec::new();
        for (row_num, row) in rdr.records().enumerate() {
            let row = row.map_err(|e| {
                TipsError::InvalidReference(format!("failed to read row {}: {e}", row_num + 2))
            })?;
            let field = |i: usize| row.get(i).unwrap_or("").to_string();
            let (athlete_id, name, sport) = (field(id_idx), field(name_idx), field(sport_idx));
            if athlete_id.is_empty() || name.is_empty() || sport.is_empty() {
                continue;
            }
            let attributes = headers
                .iter()
                .enumerate()
                .filter(|(i, _)| ![id_idx, name_idx, sport_idx].contains(i))
                .map(|(i, h)| (h.to_string(), field(i)))
                .collect();
            athletes.push(AthleteRecord {
                athlete_id,
                name,
                sport,
                attributes,
            });
        }

        Ok(AthleteRoster { athletes })
    }

    pub fn len(&self) -> usize {
        self.athletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.athletes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AthleteRecord> {
        self.athletes.iter()
    }

    pub fn get(&self, athlete_id: &str) -> Option<&AthleteRecord> {
        self.athletes.iter().find(|a| a.athlete_id == athlete_id)
    }

    pub fn contains(&self, athlete_id: &str) -> bool {
        self.get(athlete_id).is_some()
    }

    /// Distinct sports, sorted.
    pub fn sports(&self) -> Vec<&str> {
        self.athletes
            .iter()
            .map(|a| a.sport.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Athletes of one sport, sorted by name.
    pub fn in_sport(&self, sport: &str) -> Vec<&AthleteRecord> {
        let mut out: Vec<&AthleteRecord> =
            self.athletes.iter().filter(|a| a.sport == sport).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "athlete_id,name,sport,country\n\
        a1,Frida Karlsson,Cross-country,SWE\n\
        a2,Sara Hector,Alpine,SWE\n\
        a3,Ebba Andersson,Cross-country,SWE\n\
        ,No Id,Alpine,SWE\n";

    #[test]
    fn test_parse_roster() {
        let roster = AthleteRoster::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(roster.len(), 3);
        let a1 = roster.get("a1").unwrap();
        assert_eq!(a1.name, "Frida Karlsson");
        assert_eq!(a1.attributes, vec![("country".to_string(), "SWE".to_string())]);
        assert_eq!(a1.label(), "Frida Karlsson (a1)");
    }

    #[test]
    fn test_sports_sorted_and_unique() {
        let roster = AthleteRoster::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(roster.sports(), vec!["Alpine", "Cross-country"]);
    }

    #[test]
    fn test_in_sport_sorted_by_name() {
        let roster = AthleteRoster::from_reader(SAMPLE.as_bytes()).unwrap();
        let names: Vec<&str> = roster
            .in_sport("Cross-country")
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ebba Andersson", "Frida Karlsson"]);
    }

    #[test]
    fn test_missing_column_rejected() {
        let err = AthleteRoster::from_reader("athlete_id,name\na1,X\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TipsError::InvalidReference(_)));
        assert!(err.to_string().contains("sport"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AthleteRoster::load(&dir.path().join("athletes.csv")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
