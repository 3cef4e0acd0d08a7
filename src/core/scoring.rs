//! Points per pick and the ranked scoreboard.

use std::collections::HashMap;

use serde::Serialize;

use super::athletes::AthleteRoster;
use super::schema::{Medal, ResultEntry, TipEntry};

/// Points for predicting the exact medal.
pub const EXACT_POINTS: u32 = 5;
/// Points for predicting a medal when the athlete won a different one.
pub const MEDALIST_POINTS: u32 = 2;

/// Score one pick against the actual outcome.
pub fn score_pick(pick: Medal, actual: Medal) -> u32 {
    if !actual.is_medal() {
        0
    } else if pick == actual {
        EXACT_POINTS
    } else if pick.is_medal() {
        MEDALIST_POINTS
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRow {
    pub player: String,
    pub points: u32,
    pub exact: u32,
    pub right_medalist: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Scoreboard {
    pub rows: Vec<ScoreRow>,
}

impl Scoreboard {
    /// Rank `players` over every athlete in the roster.
    ///
    /// A missing tip or result counts as `Medal::None`. Ties keep the order of
    /// `players`.
    pub fn build(
        players: &[String],
        roster: &AthleteRoster,
        results: &[ResultEntry],
        tips: &[TipEntry],
    ) -> Self {
        let actual: HashMap<&str, Medal> = results
            .iter()
            .map(|r| (r.athlete_id.as_str(), r.medal))
            .collect();

        let mut picks: HashMap<(&str, &str), Medal> = HashMap::new();
        for tip in tips {
            if let Some(by) = tip.submitted_by.as_deref() {
                picks.insert((by, tip.athlete_id.as_str()), tip.value.medal);
            }
        }

        let mut rows: Vec<ScoreRow> = players
            .iter()
            .map(|player| {
                let mut row = ScoreRow {
                    player: player.clone(),
                    points: 0,
                    exact: 0,
                    right_medalist: 0,
                };
                for athlete in roster.iter() {
                    let id = athlete.athlete_id.as_str();
                    let pick = picks.get(&(player.as_str(), id)).copied().unwrap_or_default();
                    let got = actual.get(id).copied().unwrap_or_default();
                    match score_pick(pick, got) {
                        EXACT_POINTS => row.exact += 1,
                        MEDALIST_POINTS => row.right_medalist += 1,
                        _ => {}
                    }
                    row.points += score_pick(pick, got);
                }
                row
            })
            .collect();

        rows.sort_by(|a, b| b.points.cmp(&a.points).then(b.exact.cmp(&a.exact)));
        Scoreboard { rows }
    }
}
