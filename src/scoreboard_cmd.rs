//! CLI command handler for `scoreboard`.

use std::io::Write;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::core::Scoreboard;
use crate::{TipsError, TipsResult, write_table};

pub fn run<W: Write>(cfg: &AppConfig, json: Option<PathBuf>, out: &mut W) -> TipsResult<()> {
    let roster = cfg.load_roster()?;
    let store = cfg.open_store()?;
    let results = store.load_results(&roster)?;
    let tips = store.load()?;

    let board = Scoreboard::build(&cfg.players, &roster, &results, &tips);

    if let Some(path) = json {
        let s = serde_json::to_string_pretty(&board)
            .map_err(|e| TipsError::Message(format!("failed to serialize scoreboard: {e}")))?;
        std::fs::write(&path, s).map_err(|e| TipsError::Message(e.to_string()))?;
        eprintln!("Wrote scoreboard to: {}", path.display());
    }

    let rows: Vec<Vec<String>> = board
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.player.clone(),
                r.points.to_string(),
                r.exact.to_string(),
                r.right_medalist.to_string(),
            ]
        })
        .collect();
    write_table(
        out,
        &["#", "player", "points", "exact (5p)", "right medalist (2p)"],
        &rows,
    )
}
