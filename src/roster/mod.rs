pub mod parser;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TeamError};

pub use parser::{load_attendance, load_attendance_from_path, load_players, load_players_from_path};

pub type PlayerId = u32;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

/// Level given to players created by the default roster seed
pub const DEFAULT_SEED_LEVEL: u8 = 3;

/// Regulars registered by `serve --seed-defaults`
pub const DEFAULT_PLAYERS: [&str; 20] = [
    "Tati", "Sil", "Ronaldo", "Vini", "Julia", "Lorena", "Clair", "Felipe",
    "Davisson", "Sofia", "Rhyana", "Livia", "Letícia", "Chiquinho", "Camile",
    "Gio", "Leandro", "Campos", "Yuki", "Alexia",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub level: u8,
    pub active: bool,
}

/// One confirmation entry; at most one exists per (player, date)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub player_id: PlayerId,
    pub date: NaiveDate,
    pub confirmed: bool,
}

/// Validates the editable player fields
pub fn validate_player_fields(name: &str, level: u8) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TeamError::InvalidPlayer("name is required".to_string()));
    }
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(TeamError::InvalidPlayer(format!(
            "level {} is outside {}..={}",
            level, MIN_LEVEL, MAX_LEVEL
        )));
    }
    Ok(())
}

/// Parses an ISO `YYYY-MM-DD` date, treating a missing or blank value as invalid
pub fn parse_date(value: Option<&str>) -> Result<NaiveDate> {
    let value = value.map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Err(TeamError::InvalidDate("a date must be selected".to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| TeamError::InvalidDate(format!("{value:?}: {e}")))
}
