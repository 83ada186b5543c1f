use csv::{Reader, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, TeamError};
use super::{parse_date, validate_player_fields, AttendanceRecord, Player, PlayerId};

/// Parses a boolean value from various string representations
fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower == "yes" || lower == "true" || lower == "1"
}

/// Finds a column by header name, falling back to its conventional position
fn column(headers: &StringRecord, name: &str, fallback: usize) -> usize {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .unwrap_or(fallback)
}

fn parse_id(value: &str, row: usize) -> Result<PlayerId> {
    value.trim().parse().map_err(|_| TeamError::CsvRow {
        row,
        message: format!("invalid player id {:?}", value),
    })
}

/// Loads players from CSV with columns `id,name,level,active`
///
/// Rows without a name are skipped. An empty `active` cell counts as active.
pub fn load_players<R: Read>(reader: R) -> Result<Vec<Player>> {
    let mut reader = Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let id_col = column(&headers, "id", 0);
    let name_col = column(&headers, "name", 1);
    let level_col = column(&headers, "level", 2);
    let active_col = column(&headers, "active", 3);

    let mut players = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        // Header is row 1
        let row = index + 2;

        let name = record.get(name_col).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }

        let id = parse_id(record.get(id_col).unwrap_or(""), row)?;
        let level_str = record.get(level_col).unwrap_or("").trim();
        let level: u8 = level_str.parse().map_err(|_| TeamError::CsvRow {
            row,
            message: format!("invalid level {:?}", level_str),
        })?;
        validate_player_fields(&name, level).map_err(|e| TeamError::CsvRow {
            row,
            message: e.to_string(),
        })?;

        let active = match record.get(active_col).map(str::trim) {
            None | Some("") => true,
            Some(value) => parse_bool(value),
        };

        players.push(Player { id, name, level, active });
    }

    Ok(players)
}

/// Loads attendance from CSV with columns `player_id,date,confirmed`
///
/// A later row for the same player and date replaces the earlier one.
pub fn load_attendance<R: Read>(reader: R) -> Result<Vec<AttendanceRecord>> {
    let mut reader = Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let player_col = column(&headers, "player_id", 0);
    let date_col = column(&headers, "date", 1);
    let confirmed_col = column(&headers, "confirmed", 2);

    // Keyed by (player, date) so resubmissions collapse into one record
    let mut records: HashMap<(PlayerId, chrono::NaiveDate), AttendanceRecord> = HashMap::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let row = index + 2;

        let player_id = parse_id(record.get(player_col).unwrap_or(""), row)?;
        let date = parse_date(record.get(date_col)).map_err(|e| TeamError::CsvRow {
            row,
            message: e.to_string(),
        })?;
        let confirmed = parse_bool(record.get(confirmed_col).unwrap_or(""));

        records.insert((player_id, date), AttendanceRecord { player_id, date, confirmed });
    }

    let mut records: Vec<AttendanceRecord> = records.into_values().collect();
    records.sort_by(|a, b| b.date.cmp(&a.date).then(a.player_id.cmp(&b.player_id)));
    Ok(records)
}

pub fn load_players_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Player>> {
    load_players(File::open(path)?)
}

pub fn load_attendance_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<AttendanceRecord>> {
    load_attendance(File::open(path)?)
}
