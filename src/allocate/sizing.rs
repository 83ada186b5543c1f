use rand::Rng;
use tracing::info;

use crate::error::{Result, TeamError};
use crate::roster::Player;
use super::balance::allocate_with_rng;
use super::types::Allocation;

/// Fewest confirmed players for which teams are generated
pub const MIN_CONFIRMED_PLAYERS: usize = 10;
pub const PLAYERS_PER_TEAM: usize = 5;
pub const MAX_TEAMS: usize = 4;

/// Number of teams to build for `confirmed` players
pub fn team_count_for(confirmed: usize) -> Result<usize> {
    if confirmed < MIN_CONFIRMED_PLAYERS {
        return Err(TeamError::InsufficientPlayers {
            confirmed,
            required: MIN_CONFIRMED_PLAYERS,
        });
    }
    Ok((confirmed / PLAYERS_PER_TEAM).min(MAX_TEAMS))
}

/// Sizes and balances teams for a set of confirmed players
pub fn balance_confirmed<R: Rng + ?Sized>(players: &[Player], rng: &mut R) -> Result<Allocation> {
    let team_count = team_count_for(players.len())?;
    let allocation = allocate_with_rng(players, team_count, rng);
    info!(
        confirmed = players.len(),
        team_count,
        unplaced = allocation.unplaced.len(),
        "balanced teams"
    );
    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fewer_than_ten_is_rejected() {
        match team_count_for(9) {
            Err(TeamError::InsufficientPlayers { confirmed, required }) => {
                assert_eq!(confirmed, 9);
                assert_eq!(required, 10);
            }
            other => panic!("expected InsufficientPlayers, got {:?}", other),
        }
    }

    #[test]
    fn one_team_per_five_players_capped_at_four() {
        assert_eq!(team_count_for(10).unwrap(), 2);
        assert_eq!(team_count_for(14).unwrap(), 2);
        assert_eq!(team_count_for(15).unwrap(), 3);
        assert_eq!(team_count_for(20).unwrap(), 4);
        assert_eq!(team_count_for(37).unwrap(), 4);
    }

    #[test]
    fn balances_a_full_evening() {
        let players: Vec<Player> = (0..20u32)
            .map(|i| Player {
                id: i,
                name: format!("P{}", i),
                level: (i % 5) as u8 + 1,
                active: true,
            })
            .collect();

        let allocation = balance_confirmed(&players, &mut StdRng::seed_from_u64(11)).unwrap();

        assert_eq!(allocation.teams.len(), 4);
        assert_eq!(allocation.placed_count(), 20);
        assert!(allocation.unplaced.is_empty());
    }

    #[test]
    fn beyond_twenty_players_some_are_unplaced() {
        let players: Vec<Player> = (0..23u32)
            .map(|i| Player { id: i, name: format!("P{}", i), level: 3, active: true })
            .collect();

        let allocation = balance_confirmed(&players, &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(allocation.placed_count(), 20);
        assert_eq!(allocation.unplaced.len(), 3);
    }
}
