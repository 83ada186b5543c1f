use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use volley_teams::config::{Cli, Command, GenerateArgs, ServeConfig};
use volley_teams::display::{print_teams, write_teams_to_file};
use volley_teams::roster::{load_attendance_from_path, load_players_from_path, parse_date};
use volley_teams::store::Store;
use volley_teams::web;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Prefer RUST_LOG, fall back to --log-level
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve(args) => {
            let config = ServeConfig::from(args);
            let store = web::prepare_store(&config)?;
            println!("Access the API at http://localhost:{}/api/players", config.port);
            web::start_server(config, store).await?;
        }
        Command::Generate(args) => generate(args)?,
    }

    Ok(())
}

/// CLI mode: one date's teams from CSV files
fn generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let date = parse_date(Some(&args.date))?;

    let store = Store::new();
    let players = load_players_from_path(&args.players)?;
    println!("Loaded {} players", players.len());
    store.import_players(players);

    let records = load_attendance_from_path(&args.attendance)?;
    let imported = store.import_attendance(records);
    println!("Loaded {} attendance records", imported);

    let generated = match args.seed {
        Some(seed) => store.generate_teams(date, &mut StdRng::seed_from_u64(seed))?,
        None => store.generate_teams(date, &mut rand::thread_rng())?,
    };
    print_teams(&generated);

    if let Some(path) = &args.output {
        write_teams_to_file(&generated, path)?;
        info!(path = %path.display(), "teams written");
        println!("\nTeams saved to {}", path.display());
    }

    Ok(())
}
