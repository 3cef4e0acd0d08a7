//! Tip and result record schema v1.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

/// Schema version for forward compatibility
pub const SCHEMA_VERSION: u32 = 1;

/// A medal outcome, used both for predictions and for actual results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Medal {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
}

impl Medal {
    /// All medals in display order.
    pub const ALL: [Medal; 4] = [Medal::None, Medal::Bronze, Medal::Silver, Medal::Gold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::None => "None",
            Medal::Bronze => "Bronze",
            Medal::Silver => "Silver",
            Medal::Gold => "Gold",
        }
    }

    /// Parse a medal, mapping anything unrecognised to `Medal::None`.
    pub fn parse_lenient(s: &str) -> Medal {
        s.parse().unwrap_or(Medal::None)
    }

    pub fn is_medal(&self) -> bool {
        *self != Medal::None
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Medal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Medal::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| format!("unknown medal '{s}' (expected one of None, Bronze, Silver, Gold)"))
    }
}

/// Payload of a tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipValue {
    pub medal: Medal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Identity of a tip within the collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TipKey {
    pub athlete_id: String,
    pub submitted_by: Option<String>,
}

impl TipKey {
    pub fn new(athlete_id: impl Into<String>, submitted_by: Option<&str>) -> Self {
        TipKey {
            athlete_id: athlete_id.into(),
            submitted_by: non_blank(submitted_by.map(str::to_string)),
        }
    }
}

impl fmt::Display for TipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.submitted_by {
            Some(by) => write!(f, "{}@{}", self.athlete_id, by),
            None => f.write_str(&self.athlete_id),
        }
    }
}

/// One user-submitted tip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipEntry {
    /// Athlete reference; not checked against the roster here
    pub athlete_id: String,

    pub value: TipValue,

    /// Time of creation or last update
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,

    /// Submitting player, if the front end tracks one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
}

impl TipEntry {
    /// Create a new tip stamped with the current time.
    pub fn new(athlete_id: impl Into<String>, medal: Medal) -> Self {
        TipEntry {
            athlete_id: athlete_id.into(),
            value: TipValue { medal, note: None },
            submitted_at: OffsetDateTime::now_utc(),
            submitted_by: None,
        }
    }

    pub fn by(mut self, player: impl Into<String>) -> Self {
        self.submitted_by = non_blank(Some(player.into()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.value.note = non_blank(Some(note.into()));
        self
    }

    pub fn at(mut self, submitted_at: OffsetDateTime) -> Self {
        self.submitted_at = submitted_at;
        self
    }

    pub fn key(&self) -> TipKey {
        TipKey {
            athlete_id: self.athlete_id.clone(),
            submitted_by: self.submitted_by.clone(),
        }
    }

    /// Blank optional fields collapse to `None` so that every stored entry
    /// survives a CSV round trip unchanged. Timestamps are kept in UTC, since
    /// RFC 3339 cannot carry offsets with a seconds part.
    pub fn normalized(mut self) -> Self {
        self.submitted_at = self.submitted_at.to_offset(UtcOffset::UTC);
        self.submitted_by = non_blank(self.submitted_by.take());
        self.value.note = non_blank(self.value.note.take());
        self
    }
}

/// Actual medal outcome for one athlete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub athlete_id: String,
    pub medal: Medal,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}
