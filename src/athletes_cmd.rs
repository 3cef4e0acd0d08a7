//! CLI command handler for `athletes`.

use std::io::Write;

use crate::config::AppConfig;
use crate::{TipsError, TipsResult, write_table};

/// List sports, or the athletes of one sport when `sport` is given.
pub fn run<W: Write>(cfg: &AppConfig, sport: Option<String>, out: &mut W) -> TipsResult<()> {
    let roster = cfg.load_roster()?;

    match sport {
        None => {
            let rows: Vec<Vec<String>> = roster
                .sports()
                .into_iter()
                .map(|s| vec![s.to_string(), roster.in_sport(s).len().to_string()])
                .collect();
            write_table(out, &["sport", "athletes"], &rows)
        }
        Some(sport) => {
            let athletes = roster.in_sport(&sport);
            if athletes.is_empty() {
                return Err(TipsError::Message(format!("no athletes in sport '{sport}'")));
            }
            let rows: Vec<Vec<String>> = athletes
                .into_iter()
                .map(|a| vec![a.athlete_id.clone(), a.name.clone()])
                .collect();
            write_table(out, &["athlete_id", "name"], &rows)
        }
    }
}
