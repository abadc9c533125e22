use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use clue_app::cgi::CgiTransport;
use clue_app::config::AppConfig;
use clue_app::logging::init_logging;
use clue_app::shell::{Shell, ShellOptions};
use clue_core::AppInfo;

/// Terminal front end for the clue deduction backend.
#[derive(Debug, Parser)]
#[command(
    name = "cluesolver",
    author,
    version,
    about = "Track Clue suggestions and let the backend deduce who holds every card"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the backend script to run.
    #[arg(long, value_name = "PATH")]
    command: Option<String>,

    /// Override the number of players (2-6).
    #[arg(long, value_name = "COUNT")]
    players: Option<usize>,

    /// Exit after validating the configuration (the backend is not contacted).
    #[arg(long)]
    validate_only: bool,

    /// Answer yes to confirmation prompts.
    #[arg(short = 'y', long)]
    assume_yes: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };

    if let Some(command) = cli.command {
        config.backend.command = command;
    }

    if let Some(players) = cli.players {
        if players != config.players.count {
            config.players.names.truncate(players);
        }
        config.players.count = players;
    }

    config.validate()?;
    let roster = config
        .players
        .roster()
        .context("building the initial roster")?;

    println!(
        "{} {}: {} players, backend {} ({})",
        AppInfo::name(),
        AppInfo::version(),
        roster.player_count(),
        config.backend.command,
        config.backend.method.as_str()
    );

    if cli.validate_only {
        println!("Validation-only mode: backend not contacted.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging)?;
    if let Some(guard) = logging_guard.as_ref() {
        println!("Structured log: {}", guard.log_path.display());
    }

    let transport = CgiTransport::new(&config.backend);
    let mut shell = Shell::new(
        roster,
        transport,
        ShellOptions {
            assume_yes: cli.assume_yes,
        },
    );
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    shell
        .run(stdin.lock(), &mut stdout.lock())
        .context("terminal I/O failed")?;
    Ok(())
}
