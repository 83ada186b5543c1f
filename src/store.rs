use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allocate::{balance_confirmed, TEAM_CAPACITY};
use crate::error::{Result, TeamError};
use crate::roster::{validate_player_fields, AttendanceRecord, Player, PlayerId};

pub type TeamId = u32;

/// Stored team; players are referenced by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub date: NaiveDate,
    pub name: String,
    pub roster: Vec<PlayerId>,
    pub reserve: Option<PlayerId>,
}

/// Team with its players resolved, as shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamSummary {
    pub id: TeamId,
    pub date: NaiveDate,
    pub name: String,
    pub roster: Vec<Player>,
    pub reserve: Option<Player>,
    pub level_sum: u32,
}

/// Outcome of regenerating the teams of one date
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedTeams {
    pub date: NaiveDate,
    pub teams: Vec<TeamSummary>,
    pub unplaced: Vec<Player>,
}

/// Editable player fields
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerFields {
    pub name: String,
    pub level: u8,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEntry {
    pub player: Player,
    pub confirmed: bool,
}

/// Items sharing one date, newest dates listed first by the store
#[derive(Debug, Clone, Serialize)]
pub struct DatedGroup<T> {
    pub date: NaiveDate,
    pub entries: Vec<T>,
}

/// Counts from one `set_attendance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttendanceUpdate {
    pub recorded: usize,
    pub present: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

#[derive(Default)]
struct Inner {
    players: BTreeMap<PlayerId, Player>,
    attendance: HashMap<(PlayerId, NaiveDate), bool>,
    teams: BTreeMap<TeamId, Team>,
    last_player_id: PlayerId,
    last_team_id: TeamId,
}

impl Inner {
    fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(&id).ok_or(TeamError::PlayerNotFound(id))
    }

    fn confirmed_players(&self, date: NaiveDate) -> Vec<Player> {
        let mut players: Vec<Player> = self
            .attendance
            .iter()
            .filter(|((_, d), confirmed)| *d == date && **confirmed)
            .filter_map(|((id, _), _)| self.players.get(id).cloned())
            .collect();
        players.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        players
    }

    fn summarize(&self, team: &Team) -> TeamSummary {
        let roster: Vec<Player> = team
            .roster
            .iter()
            .filter_map(|id| self.players.get(id).cloned())
            .collect();
        let reserve = team.reserve.and_then(|id| self.players.get(&id).cloned());
        let level_sum = roster.iter().map(|p| u32::from(p.level)).sum();
        TeamSummary {
            id: team.id,
            date: team.date,
            name: team.name.clone(),
            roster,
            reserve,
            level_sum,
        }
    }

    fn teams_for_date(&self, date: NaiveDate) -> Vec<TeamSummary> {
        let mut teams: Vec<TeamSummary> = self
            .teams
            .values()
            .filter(|t| t.date == date)
            .map(|t| self.summarize(t))
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        teams
    }

    fn insert_player(&mut self, fields: PlayerFields) -> Result<Player> {
        let id = self
            .last_player_id
            .checked_add(1)
            .ok_or_else(|| TeamError::InvalidPlayer("player id space exhausted".to_string()))?;
        self.last_player_id = id;
        let player = Player {
            id,
            name: fields.name.trim().to_string(),
            level: fields.level,
            active: fields.active,
        };
        self.players.insert(player.id, player.clone());
        Ok(player)
    }
}

/// In-memory player, attendance and team records
///
/// Every operation holds one lock for its whole duration, so regenerating a
/// date's teams never exposes the date without teams to other readers.
#[derive(Default)]
pub struct Store {
    inner: Mutex<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_player(&self, fields: PlayerFields) -> Result<Player> {
        validate_player_fields(&fields.name, fields.level)?;
        let player = self.lock().insert_player(fields)?;
        info!(player_id = player.id, name = %player.name, "player added");
        Ok(player)
    }

    pub fn update_player(&self, id: PlayerId, fields: PlayerFields) -> Result<Player> {
        validate_player_fields(&fields.name, fields.level)?;
        let mut inner = self.lock();
        let player = inner.players.get_mut(&id).ok_or(TeamError::PlayerNotFound(id))?;
        player.name = fields.name.trim().to_string();
        player.level = fields.level;
        player.active = fields.active;
        Ok(player.clone())
    }

    /// Removes a player along with their attendance and team slots
    pub fn delete_player(&self, id: PlayerId) -> Result<Player> {
        let mut inner = self.lock();
        let player = inner.players.remove(&id).ok_or(TeamError::PlayerNotFound(id))?;
        inner.attendance.retain(|(player_id, _), _| *player_id != id);
        for team in inner.teams.values_mut() {
            team.roster.retain(|player_id| *player_id != id);
            if team.reserve == Some(id) {
                team.reserve = None;
            }
        }
        info!(player_id = id, name = %player.name, "player deleted");
        Ok(player)
    }

    pub fn player(&self, id: PlayerId) -> Result<Player> {
        self.lock().player(id).cloned()
    }

    /// All players, active ones first, then by name
    pub fn players(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.lock().players.values().cloned().collect();
        players.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then_with(|| a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        });
        players
    }

    /// Inserts or replaces players keyed by their own ids
    pub fn import_players(&self, players: Vec<Player>) -> usize {
        let mut inner = self.lock();
        let count = players.len();
        for player in players {
            inner.last_player_id = inner.last_player_id.max(player.id);
            inner.players.insert(player.id, player);
        }
        info!(count, "players imported");
        count
    }

    /// Creates each named player unless one with that name already exists
    pub fn seed_players(&self, names: &[&str], level: u8) -> Result<SeedReport> {
        let mut inner = self.lock();
        let mut report = SeedReport::default();
        for name in names {
            validate_player_fields(name, level)?;
            if inner.players.values().any(|p| p.name == *name) {
                report.existing.push(name.to_string());
                continue;
            }
            inner.insert_player(PlayerFields {
                name: name.to_string(),
                level,
                active: true,
            })?;
            report.created.push(name.to_string());
        }
        info!(created = report.created.len(), existing = report.existing.len(), "default players seeded");
        Ok(report)
    }

    /// Records attendance for every active player on `date`
    ///
    /// Players in `confirmed` are marked present, every other active player
    /// absent. Ids of unknown or inactive players are ignored.
    pub fn set_attendance(&self, date: NaiveDate, confirmed: &HashSet<PlayerId>) -> AttendanceUpdate {
        let mut inner = self.lock();
        let active: Vec<PlayerId> = inner
            .players
            .values()
            .filter(|p| p.active)
            .map(|p| p.id)
            .collect();
        let mut present = 0;
        for id in &active {
            let is_present = confirmed.contains(id);
            present += usize::from(is_present);
            inner.attendance.insert((*id, date), is_present);
        }
        info!(%date, present, recorded = active.len(), "attendance updated");
        AttendanceUpdate {
            recorded: active.len(),
            present,
        }
    }

    /// Loads attendance records, skipping those of unknown players
    pub fn import_attendance(&self, records: Vec<AttendanceRecord>) -> usize {
        let mut inner = self.lock();
        let mut imported = 0;
        for record in records {
            if !inner.players.contains_key(&record.player_id) {
                warn!(player_id = record.player_id, date = %record.date, "attendance for unknown player skipped");
                continue;
            }
            inner.attendance.insert((record.player_id, record.date), record.confirmed);
            imported += 1;
        }
        imported
    }

    pub fn confirmed_players(&self, date: NaiveDate) -> Vec<Player> {
        self.lock().confirmed_players(date)
    }

    /// Active players with their confirmation flag for `date`
    pub fn attendance_sheet(&self, date: NaiveDate) -> Vec<AttendanceEntry> {
        let inner = self.lock();
        let mut sheet: Vec<AttendanceEntry> = inner
            .players
            .values()
            .filter(|p| p.active)
            .map(|p| AttendanceEntry {
                player: p.clone(),
                confirmed: inner.attendance.get(&(p.id, date)).copied().unwrap_or(false),
            })
            .collect();
        sheet.sort_by(|a, b| {
            a.player
                .name
                .cmp(&b.player.name)
                .then(a.player.id.cmp(&b.player.id))
        });
        sheet
    }

    /// Distinct dates with at least one confirmation, newest first
    pub fn confirmed_dates(&self) -> Vec<NaiveDate> {
        let inner = self.lock();
        let dates: HashSet<NaiveDate> = inner
            .attendance
            .iter()
            .filter(|(_, confirmed)| **confirmed)
            .map(|((_, date), _)| *date)
            .collect();
        let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
        dates.sort_by(|a, b| b.cmp(a));
        dates
    }

    pub fn confirmed_by_date(&self) -> Vec<DatedGroup<Player>> {
        let dates = self.confirmed_dates();
        let inner = self.lock();
        dates
            .into_iter()
            .map(|date| DatedGroup {
                date,
                entries: inner.confirmed_players(date),
            })
            .collect()
    }

    /// Replaces the teams of `date` with a fresh balanced split of its confirmed players
    ///
    /// Existing teams are left untouched when too few players confirmed.
    pub fn generate_teams<R: Rng + ?Sized>(&self, date: NaiveDate, rng: &mut R) -> Result<GeneratedTeams> {
        let mut inner = self.lock();
        let confirmed = inner.confirmed_players(date);
        let allocation = match balance_confirmed(&confirmed, rng) {
            Ok(allocation) => allocation,
            Err(e) => {
                warn!(%date, confirmed = confirmed.len(), error = %e, "team generation rejected");
                return Err(e);
            }
        };

        let before = inner.teams.len();
        inner.teams.retain(|_, team| team.date != date);
        let replaced = before - inner.teams.len();

        for (index, slate) in allocation.teams.iter().enumerate() {
            inner.last_team_id += 1;
            let team = Team {
                id: inner.last_team_id,
                date,
                name: format!("Team {}", index + 1),
                roster: slate.roster.iter().map(|p| p.id).collect(),
                reserve: slate.reserve.as_ref().map(|p| p.id),
            };
            inner.teams.insert(team.id, team);
        }

        let teams = inner.teams_for_date(date);
        info!(%date, teams = teams.len(), replaced, unplaced = allocation.unplaced.len(), "teams generated");
        Ok(GeneratedTeams {
            date,
            teams,
            unplaced: allocation.unplaced,
        })
    }

    pub fn team(&self, id: TeamId) -> Result<TeamSummary> {
        let inner = self.lock();
        let team = inner.teams.get(&id).ok_or(TeamError::TeamNotFound(id))?;
        Ok(inner.summarize(team))
    }

    pub fn teams_for_date(&self, date: NaiveDate) -> Vec<TeamSummary> {
        self.lock().teams_for_date(date)
    }

    /// Teams grouped by date, newest date first
    pub fn teams_by_date(&self) -> Vec<DatedGroup<TeamSummary>> {
        let inner = self.lock();
        let mut dates: Vec<NaiveDate> = inner.teams.values().map(|t| t.date).collect();
        dates.sort_by(|a, b| b.cmp(a));
        dates.dedup();
        dates
            .into_iter()
            .map(|date| DatedGroup {
                date,
                entries: inner.teams_for_date(date),
            })
            .collect()
    }

    /// Players that may be placed on a team: those confirmed for its date
    pub fn available_players(&self, id: TeamId) -> Result<Vec<Player>> {
        let inner = self.lock();
        let team = inner.teams.get(&id).ok_or(TeamError::TeamNotFound(id))?;
        Ok(inner.confirmed_players(team.date))
    }

    /// Replaces a team's roster and reserve by hand
    pub fn edit_team(&self, id: TeamId, roster: Vec<PlayerId>, reserve: Option<PlayerId>) -> Result<TeamSummary> {
        let mut inner = self.lock();
        let date = inner.teams.get(&id).ok_or(TeamError::TeamNotFound(id))?.date;

        if roster.len() > TEAM_CAPACITY {
            return Err(TeamError::InvalidTeam(format!(
                "a roster holds at most {} players, got {}",
                TEAM_CAPACITY,
                roster.len()
            )));
        }
        let mut seen = HashSet::new();
        for player_id in roster.iter().chain(reserve.iter()) {
            if !seen.insert(*player_id) {
                return Err(TeamError::InvalidTeam(format!("player {} is listed twice", player_id)));
            }
        }

        let confirmed: HashSet<PlayerId> = inner.confirmed_players(date).iter().map(|p| p.id).collect();
        for player_id in &seen {
            inner.player(*player_id)?;
            if !confirmed.contains(player_id) {
                return Err(TeamError::InvalidTeam(format!(
                    "player {} is not confirmed for {}",
                    player_id, date
                )));
            }
            let elsewhere = inner.teams.values().find(|t| {
                t.id != id && t.date == date && (t.roster.contains(player_id) || t.reserve == Some(*player_id))
            });
            if let Some(other) = elsewhere {
                return Err(TeamError::InvalidTeam(format!(
                    "player {} already plays for {}",
                    player_id, other.name
                )));
            }
        }

        let team = inner.teams.get_mut(&id).ok_or(TeamError::TeamNotFound(id))?;
        team.roster = roster;
        team.reserve = reserve;
        let team = team.clone();
        info!(team_id = id, %date, "team edited");
        Ok(inner.summarize(&team))
    }

    pub fn delete_team(&self, id: TeamId) -> Result<Team> {
        let team = self.lock().teams.remove(&id).ok_or(TeamError::TeamNotFound(id))?;
        info!(team_id = id, date = %team.date, name = %team.name, "team deleted");
        Ok(team)
    }
}
