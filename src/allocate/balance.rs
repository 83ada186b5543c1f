use std::collections::BTreeMap;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::roster::Player;
use super::types::{Allocation, TeamSlate};

/// Splits players into `team_count` teams with roughly equal skill totals
pub fn allocate(players: &[Player], team_count: usize) -> Allocation {
    allocate_with_rng(players, team_count, &mut rand::thread_rng())
}

/// Greedy level-descending balancing with an injectable random source
///
/// Players are bucketed by level and each bucket is shuffled, so players
/// sharing a level do not always land in the same order. Buckets are then
/// placed from the highest level down: each player joins the open team
/// (roster below capacity) with the lowest load, ties going to the lowest
/// team index. Once every roster is full, players fill the first empty
/// reserve slot. Anyone left after that is returned in `unplaced`.
pub fn allocate_with_rng<R: Rng + ?Sized>(
    players: &[Player],
    team_count: usize,
    rng: &mut R,
) -> Allocation {
    let mut buckets: BTreeMap<u8, Vec<&Player>> = BTreeMap::new();
    for player in players {
        buckets.entry(player.level).or_default().push(player);
    }

    let mut teams: Vec<TeamSlate> = vec![TeamSlate::default(); team_count];
    // Running loads, kept in step with each roster push
    let mut loads: Vec<u32> = vec![0; team_count];
    let mut unplaced = Vec::new();

    for (level, bucket) in buckets.iter_mut().rev() {
        bucket.shuffle(rng);

        for player in bucket.iter() {
            // min_by_key keeps the first of equal minima
            let open_team = teams
                .iter()
                .enumerate()
                .filter(|(_, team)| team.has_room())
                .min_by_key(|(index, _)| loads[*index])
                .map(|(index, _)| index);

            if let Some(index) = open_team {
                teams[index].roster.push((*player).clone());
                loads[index] += u32::from(*level);
                debug!(player = %player.name, skill = *level, team = index + 1, load = loads[index], "placed in roster");
                continue;
            }

            match teams.iter().position(|team| team.reserve.is_none()) {
                Some(index) => {
                    teams[index].reserve = Some((*player).clone());
                    debug!(player = %player.name, skill = *level, team = index + 1, "placed as reserve");
                }
                None => unplaced.push((*player).clone()),
            }
        }
    }

    if !unplaced.is_empty() {
        warn!(
            unplaced = unplaced.len(),
            team_count,
            "rosters and reserve slots are full, some players were not placed"
        );
    }

    Allocation { teams, unplaced }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocate::types::TEAM_CAPACITY;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn players_with_levels(levels: &[u8]) -> Vec<Player> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| Player {
                id: i as u32 + 1,
                name: format!("Player {}", i + 1),
                level,
                active: true,
            })
            .collect()
    }

    fn placed_ids(allocation: &Allocation) -> Vec<u32> {
        let mut ids: Vec<u32> = allocation
            .teams
            .iter()
            .flat_map(|t| t.roster.iter().chain(t.reserve.iter()))
            .map(|p| p.id)
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn twenty_players_fill_four_teams_with_reserves() {
        let levels: Vec<u8> = (1..=5).flat_map(|l| std::iter::repeat(l).take(4)).collect();
        let players = players_with_levels(&levels);
        let mut rng = StdRng::seed_from_u64(7);

        let allocation = allocate_with_rng(&players, 4, &mut rng);

        assert_eq!(allocation.teams.len(), 4);
        assert!(allocation.unplaced.is_empty());
        for team in &allocation.teams {
            assert_eq!(team.roster.len(), TEAM_CAPACITY);
            // Levels 5, 4, 3 and 2 fill the rosters, one of each per team
            assert_eq!(team.load(), 14);
            assert_eq!(team.reserve.as_ref().map(|p| p.level), Some(1));
        }
        assert_eq!(placed_ids(&allocation), (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn eleven_players_on_two_teams_leaves_one_unplaced() {
        let players = players_with_levels(&[5, 4, 4, 3, 3, 3, 2, 2, 1, 1, 1]);
        let mut rng = StdRng::seed_from_u64(42);

        let allocation = allocate_with_rng(&players, 2, &mut rng);

        assert_eq!(allocation.teams.len(), 2);
        assert!(allocation.teams.iter().all(|t| t.roster.len() == 4));
        assert!(allocation.teams.iter().all(|t| t.reserve.is_some()));
        assert_eq!(allocation.unplaced.len(), 1);
        assert_eq!(allocation.unplaced[0].level, 1);
        assert_eq!(allocation.placed_count(), 10);
    }

    #[test]
    fn empty_input_or_zero_teams_produce_no_teams_with_players() {
        let mut rng = StdRng::seed_from_u64(1);

        let empty = allocate_with_rng(&[], 3, &mut rng);
        assert_eq!(empty.teams.len(), 3);
        assert!(empty.teams.iter().all(|t| t.roster.is_empty() && t.reserve.is_none()));
        assert!(empty.unplaced.is_empty());

        let players = players_with_levels(&[3, 3, 3]);
        let no_teams = allocate_with_rng(&players, 0, &mut rng);
        assert!(no_teams.teams.is_empty());
        assert_eq!(no_teams.unplaced.len(), 3);
    }

    #[test]
    fn homogeneous_levels_give_equal_sums() {
        let players = players_with_levels(&[3; 12]);
        let allocation = allocate(&players, 3);

        let sums: HashSet<u32> = allocation.teams.iter().map(TeamSlate::load).collect();
        assert_eq!(sums, HashSet::from([12]));
        assert!(allocation.teams.iter().all(|t| t.reserve.is_none()));
    }

    #[test]
    fn ties_go_to_the_lowest_team_index() {
        let players = players_with_levels(&[5, 5, 5]);
        let mut rng = StdRng::seed_from_u64(3);

        let allocation = allocate_with_rng(&players, 4, &mut rng);

        let sizes: Vec<usize> = allocation.teams.iter().map(|t| t.roster.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1, 0]);
    }

    #[test]
    fn heaviest_players_are_spread_first() {
        let players = players_with_levels(&[5, 5, 1, 1, 1, 1]);
        let allocation = allocate(&players, 2);

        for team in &allocation.teams {
            assert_eq!(team.roster.iter().filter(|p| p.level == 5).count(), 1);
            assert_eq!(team.load(), 7);
        }
    }

    #[test]
    fn same_seed_gives_same_allocation() {
        let players = players_with_levels(&[1, 2, 2, 3, 3, 3, 4, 4, 5, 5, 5, 2, 1, 4]);

        let first = allocate_with_rng(&players, 3, &mut StdRng::seed_from_u64(2024));
        let second = allocate_with_rng(&players, 3, &mut StdRng::seed_from_u64(2024));

        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn allocation_respects_slot_limits(
            levels in prop::collection::vec(1u8..=5, 0..40),
            team_count in 0usize..6,
            seed in any::<u64>(),
        ) {
            let players = players_with_levels(&levels);
            let allocation = allocate_with_rng(&players, team_count, &mut StdRng::seed_from_u64(seed));

            prop_assert_eq!(allocation.teams.len(), team_count);
            for team in &allocation.teams {
                prop_assert!(team.roster.len() <= TEAM_CAPACITY);
            }

            // Everyone is placed or reported, exactly once
            let mut all: Vec<u32> = placed_ids(&allocation);
            all.extend(allocation.unplaced.iter().map(|p| p.id));
            all.sort();
            prop_assert_eq!(all, (1..=levels.len() as u32).collect::<Vec<_>>());

            if team_count * (TEAM_CAPACITY + 1) >= players.len() {
                prop_assert!(allocation.unplaced.is_empty());
            }
        }

        #[test]
        fn roster_levels_match_placed_players(
            levels in prop::collection::vec(1u8..=5, 1..30),
            team_count in 1usize..5,
            seed in any::<u64>(),
        ) {
            let players = players_with_levels(&levels);
            let allocation = allocate_with_rng(&players, team_count, &mut StdRng::seed_from_u64(seed));

            let mut in_rosters: Vec<u8> = allocation
                .teams
                .iter()
                .flat_map(|t| t.roster.iter().map(|p| p.level))
                .collect();
            let mut expected: Vec<u8> = levels.clone();
            for reserve in allocation.teams.iter().filter_map(|t| t.reserve.as_ref()) {
                let pos = expected.iter().position(|&l| l == reserve.level).unwrap();
                expected.remove(pos);
            }
            for dropped in &allocation.unplaced {
                let pos = expected.iter().position(|&l| l == dropped.level).unwrap();
                expected.remove(pos);
            }
            in_rosters.sort();
            expected.sort();
            prop_assert_eq!(in_rosters, expected);
        }
    }
}
