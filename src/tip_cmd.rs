//! CLI command handlers for `tip set`, `tip remove` and `tip list`.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::config::AppConfig;
use crate::core::{AthleteRoster, Medal, TipEntry, TipKey};
use crate::{TipsError, TipsResult, write_table};

fn check_player(cfg: &AppConfig, player: &str) -> TipsResult<()> {
    if cfg.is_player(player) {
        Ok(())
    } else {
        Err(TipsError::Message(format!(
            "unknown player '{player}' (configured: {})",
            cfg.players.join(", ")
        )))
    }
}

fn check_athlete(roster: &AthleteRoster, athlete_id: &str) -> TipsResult<()> {
    if roster.contains(athlete_id) {
        Ok(())
    } else {
        Err(TipsError::Message(format!("unknown athlete '{athlete_id}'")))
    }
}

/// Save or update one player's tip for one athlete.
pub fn set<W: Write>(
    cfg: &AppConfig,
    player: String,
    athlete_id: String,
    medal: Medal,
    note: Option<String>,
    out: &mut W,
) -> TipsResult<()> {
    check_player(cfg, &player)?;
    let roster = cfg.load_roster()?;
    check_athlete(&roster, &athlete_id)?;

    let store = cfg.open_store()?;
    let mut entry = TipEntry::new(athlete_id, medal).by(player);
    if let Some(note) = note {
        entry = entry.with_note(note);
    }
    let key = entry.key();
    let previous = store.upsert(entry)?;

    info!(%key, %medal, "saved tip");
    let msg = match previous {
        Some(prev) => format!("Updated {key}: {} -> {medal}", prev.value.medal),
        None => format!("Saved {key}: {medal}"),
    };
    writeln!(out, "{msg}").map_err(|e| TipsError::Message(e.to_string()))
}

/// Remove one player's tip for one athlete.
pub fn remove<W: Write>(
    cfg: &AppConfig,
    player: String,
    athlete_id: String,
    out: &mut W,
) -> TipsResult<()> {
    check_player(cfg, &player)?;
    let store = cfg.open_store()?;
    let key = TipKey::new(athlete_id, Some(player.as_str()));
    let msg = match store.remove(&key)? {
        Some(_) => format!("Removed {key}"),
        None => format!("No tip stored for {key}"),
    };
    writeln!(out, "{msg}").map_err(|e| TipsError::Message(e.to_string()))
}

/// Show one player's saved tips, sorted by sport then name.
///
/// Tips for athletes missing from the roster are still listed, with empty
/// sport and name.
pub fn list<W: Write>(
    cfg: &AppConfig,
    player: String,
    json: Option<PathBuf>,
    out: &mut W,
) -> TipsResult<()> {
    check_player(cfg, &player)?;
    let roster = cfg.load_roster()?;
    let tips = cfg.open_store()?.tips_by(&player)?;

    if let Some(path) = json {
        let s = serde_json::to_string_pretty(&tips)
            .map_err(|e| TipsError::Message(format!("failed to serialize tips: {e}")))?;
        std::fs::write(&path, s).map_err(|e| TipsError::Message(e.to_string()))?;
        eprintln!("Wrote {} tip(s) to: {}", tips.len(), path.display());
    }

    if tips.is_empty() {
        return writeln!(out, "No tips saved yet for {player}.")
            .map_err(|e| TipsError::Message(e.to_string()));
    }

    let lookup: HashMap<&str, (&str, &str)> = roster
        .iter()
        .map(|a| (a.athlete_id.as_str(), (a.sport.as_str(), a.name.as_str())))
        .collect();
    let mut rows: Vec<Vec<String>> = tips
        .iter()
        .map(|t| {
            let (sport, name) = lookup.get(t.athlete_id.as_str()).copied().unwrap_or(("", ""));
            vec![
                sport.to_string(),
                name.to_string(),
                t.athlete_id.clone(),
                t.value.medal.to_string(),
                t.value.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    rows.sort_by(|a, b| (&a[0], &a[1]).cmp(&(&b[0], &b[1])));
    write_table(out, &["sport", "name", "athlete_id", "pick", "note"], &rows)
}
