use std::path::Path;
use csv::Writer;

use crate::error::Result;
use crate::roster::Player;
use crate::store::GeneratedTeams;

/// Formats a player name with their skill level
pub fn format_player_name(player: &Player) -> String {
    format!("{} (level {})", player.name, player.level)
}

/// Writes generated teams as CSV rows: date,team,role,player_id,name,level
pub fn write_teams_csv<W: std::io::Write>(generated: &GeneratedTeams, writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["date", "team", "role", "player_id", "name", "level"])?;

    let date = generated.date.to_string();
    for team in &generated.teams {
        let rows = team
            .roster
            .iter()
            .map(|p| ("roster", p))
            .chain(team.reserve.iter().map(|p| ("reserve", p)));
        for (role, player) in rows {
            let id = player.id.to_string();
            let level = player.level.to_string();
            wtr.write_record([
                date.as_str(),
                team.name.as_str(),
                role,
                id.as_str(),
                player.name.as_str(),
                level.as_str(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_teams_to_file<P: AsRef<Path>>(generated: &GeneratedTeams, path: P) -> Result<()> {
    write_teams_csv(generated, std::fs::File::create(path)?)
}

/// Prints generated teams in a readable format
pub fn print_teams(generated: &GeneratedTeams) {
    println!("\n=== Teams for {} ===", generated.date.format("%d/%m/%Y"));

    for team in &generated.teams {
        println!("\n{} (level sum {})", team.name, team.level_sum);
        for player in &team.roster {
            println!("  - {}", format_player_name(player));
        }
        match &team.reserve {
            Some(reserve) => println!("  Reserve: {}", format_player_name(reserve)),
            None => println!("  Reserve: -"),
        }
    }

    if !generated.unplaced.is_empty() {
        println!("\n⚠️  Unplaced players ({}):", generated.unplaced.len());
        for player in &generated.unplaced {
            println!("  - {} (ID: {})", format_player_name(player), player.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TeamSummary;
    use chrono::NaiveDate;

    fn player(id: u32, name: &str, level: u8) -> Player {
        Player { id, name: name.to_string(), level, active: true }
    }

    #[test]
    fn csv_lists_roster_then_reserve() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let generated = GeneratedTeams {
            date,
            teams: vec![TeamSummary {
                id: 1,
                date,
                name: "Team 1".to_string(),
                roster: vec![player(1, "Tati", 5), player(2, "Gio", 2)],
                reserve: Some(player(3, "Yuki", 1)),
                level_sum: 7,
            }],
            unplaced: vec![],
        };

        let mut out = Vec::new();
        write_teams_csv(&generated, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "date,team,role,player_id,name,level\n\
             2026-10-19,Team 1,roster,1,Tati,5\n\
             2026-10-19,Team 1,roster,2,Gio,2\n\
             2026-10-19,Team 1,reserve,3,Yuki,1\n"
        );
    }

    #[test]
    fn player_names_carry_their_level() {
        assert_eq!(format_player_name(&player(9, "Felipe", 4)), "Felipe (level 4)");
    }
}
