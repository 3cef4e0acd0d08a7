use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::AthleteRoster;
use crate::storage::{RecordStore, StoreOptions};
use crate::{TipsError, TipsResult};

pub const STATE_DIR_ENV: &str = "OS_TIPS_STATE_DIR";
pub const ATHLETES_ENV: &str = "OS_TIPS_ATHLETES";

pub const DEFAULT_PLAYERS: &[&str] = &["Johan", "Göran", "Jesper", "Peter", "Magnus", "Tony"];
pub const DEFAULT_ATHLETES_CSV: &str = "data/athletes.csv";
const DEFAULT_STATE_DIR_NAME: &str = ".os_tips_state";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub state_dir: PathBuf,
    pub athletes_csv: PathBuf,
    pub players: Vec<String>,
    pub lock_timeout: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    state_dir: Option<PathBuf>,
    #[serde(default)]
    athletes_csv: Option<PathBuf>,
    #[serde(default)]
    players: Option<Vec<String>>,
    #[serde(default)]
    lock_timeout_ms: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            state_dir: default_state_dir(),
            athletes_csv: PathBuf::from(DEFAULT_ATHLETES_CSV),
            players: DEFAULT_PLAYERS.iter().map(|p| p.to_string()).collect(),
            lock_timeout: None,
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> TipsResult<Self> {
        let raw = match path {
            Some(p) => {
                let s = std::fs::read_to_string(p)
                    .map_err(|e| TipsError::Config(format!("{}: {e}", p.display())))?;
                Self::parse_raw(&s)?
            }
            None => RawConfig::default(),
        };
        let mut cfg = Self::from_raw(raw)?;
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> TipsResult<Self> {
        Self::from_raw(Self::parse_raw(s)?)
    }

    fn parse_raw(s: &str) -> TipsResult<RawConfig> {
        toml::from_str(s).map_err(|e| TipsError::Config(e.to_string()))
    }

    fn from_raw(raw: RawConfig) -> TipsResult<Self> {
        let defaults = AppConfig::default();
        let players = raw.players.unwrap_or(defaults.players);
        if players.iter().any(|p| p.trim().is_empty()) {
            return Err(TipsError::Config("player names must not be empty".to_string()));
        }
        Ok(AppConfig {
            state_dir: raw.state_dir.unwrap_or(defaults.state_dir),
            athletes_csv: raw.athletes_csv.unwrap_or(defaults.athletes_csv),
            players,
            lock_timeout: raw.lock_timeout_ms.map(Duration::from_millis),
        })
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var(STATE_DIR_ENV).filter(|v| !v.is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(csv) = var(ATHLETES_ENV).filter(|v| !v.is_empty()) {
            self.athletes_csv = PathBuf::from(csv);
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            lock_timeout: self.lock_timeout,
        }
    }

    pub fn open_store(&self) -> TipsResult<RecordStore> {
        RecordStore::open(&self.state_dir, self.store_options())
    }

    pub fn load_roster(&self) -> TipsResult<AthleteRoster> {
        AthleteRoster::load(&self.athletes_csv)
    }

    pub fn is_player(&self, name: &str) -> bool {
        self.players.iter().any(|p| p == name)
    }
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_STATE_DIR_NAME)
}
