use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "volley-teams", version, about = "Volleyball attendance and balanced team generation")]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "VOLLEY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Generate teams for one date from CSV files and print them
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = "VOLLEY_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    #[arg(long, env = "VOLLEY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Password required for CSV imports
    #[arg(long, env = "ADMIN_PASSWORD")]
    pub admin_password: String,

    /// Players CSV loaded at startup
    #[arg(long)]
    pub players: Option<PathBuf>,

    /// Register the default regulars at level 3
    #[arg(long)]
    pub seed_defaults: bool,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Players CSV (id,name,level,active)
    #[arg(long)]
    pub players: PathBuf,

    /// Attendance CSV (player_id,date,confirmed)
    #[arg(long)]
    pub attendance: PathBuf,

    /// Game date, YYYY-MM-DD
    #[arg(long)]
    pub date: String,

    /// Write the teams to this CSV file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Seed for a reproducible shuffle
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Server settings passed explicitly to `web::start_server`
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
    pub admin_password: String,
    pub players_csv: Option<PathBuf>,
    pub seed_defaults: bool,
}

impl From<ServeArgs> for ServeConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            bind: args.bind,
            port: args.port,
            admin_password: args.admin_password,
            players_csv: args.players,
            seed_defaults: args.seed_defaults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_arguments() {
        let cli = Cli::try_parse_from([
            "volley-teams",
            "generate",
            "--players",
            "players.csv",
            "--attendance",
            "attendance.csv",
            "--date",
            "2026-10-19",
            "--seed",
            "7",
        ])
        .unwrap();

        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.date, "2026-10-19");
                assert_eq!(args.seed, Some(7));
                assert!(args.output.is_none());
            }
            other => panic!("expected generate, got {:?}", other),
        }
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["volley-teams", "serve", "--admin-password", "secret"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = ServeConfig::from(args);
        assert_eq!(config.admin_password, "secret");
        assert!(!config.seed_defaults);
        assert!(config.players_csv.is_none());
    }
}
