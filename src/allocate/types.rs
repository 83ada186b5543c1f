use serde::{Deserialize, Serialize};
use crate::roster::Player;

/// Maximum number of starting players per team
pub const TEAM_CAPACITY: usize = 4;

/// One generated team: its starters plus at most one substitute
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSlate {
    pub roster: Vec<Player>,
    pub reserve: Option<Player>,
}

impl TeamSlate {
    /// Sum of the roster's skill levels (the reserve does not count)
    pub fn load(&self) -> u32 {
        self.roster.iter().map(|p| u32::from(p.level)).sum()
    }

    pub fn has_room(&self) -> bool {
        self.roster.len() < TEAM_CAPACITY
    }
}

/// Result of one allocation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub teams: Vec<TeamSlate>,
    pub unplaced: Vec<Player>, // rosters and reserve slots were all full
}

impl Allocation {
    /// Number of players that ended up in a roster or reserve slot
    pub fn placed_count(&self) -> usize {
        self.teams
            .iter()
            .map(|t| t.roster.len() + usize::from(t.reserve.is_some()))
            .sum()
    }
}
