pub mod types;
pub mod balance;
pub mod sizing;

pub use types::{Allocation, TeamSlate, TEAM_CAPACITY};
pub use balance::{allocate, allocate_with_rng};
pub use sizing::{balance_confirmed, team_count_for, MAX_TEAMS, MIN_CONFIRMED_PLAYERS, PLAYERS_PER_TEAM};
