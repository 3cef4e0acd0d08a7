//! CLI command handlers for `result set` and `result list`.

use std::io::Write;

use tracing::info;

use crate::config::AppConfig;
use crate::core::Medal;
use crate::{TipsError, TipsResult, write_table};

/// Record the actual medal for one athlete.
pub fn set<W: Write>(cfg: &AppConfig, athlete_id: String, medal: Medal, out: &mut W) -> TipsResult<()> {
    let roster = cfg.load_roster()?;
    if !roster.contains(&athlete_id) {
        return Err(TipsError::Message(format!("unknown athlete '{athlete_id}'")));
    }
    let previous = cfg.open_store()?.set_result(&athlete_id, medal)?;
    info!(%athlete_id, %medal, %previous, "saved result");
    writeln!(out, "Result for {athlete_id}: {previous} -> {medal}")
        .map_err(|e| TipsError::Message(e.to_string()))
}

/// Show the results table for every roster athlete, sorted by sport then name.
pub fn list<W: Write>(cfg: &AppConfig, out: &mut W) -> TipsResult<()> {
    let roster = cfg.load_roster()?;
    let results = cfg.open_store()?.load_results(&roster)?;

    let mut rows: Vec<Vec<String>> = results
        .iter()
        .filter_map(|r| {
            roster.get(&r.athlete_id).map(|a| {
                vec![
                    a.sport.clone(),
                    a.name.clone(),
                    r.athlete_id.clone(),
                    r.medal.to_string(),
                ]
            })
        })
        .collect();
    rows.sort_by(|a, b| (&a[0], &a[1]).cmp(&(&b[0], &b[1])));
    write_table(out, &["sport", "name", "athlete_id", "medal"], &rows)
}
