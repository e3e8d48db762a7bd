use flexi_logger;
use log::{error, info};
use std::fs::{self, OpenOptions};
use std::io::BufWriter;
use std::process::ExitCode;
use std::sync::Arc;

mod book;
mod cli;
mod config;
mod engine;
mod leiserchess;
mod match_runner;
mod pgn;
mod roster;
mod runner;
mod sequencer;
mod tc;
mod tournament;

fn main() -> ExitCode {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .ok();

    let Some(command) = cli::parse() else {
        return ExitCode::SUCCESS;
    };

    match command {
        cli::Command::Perft { depth } => {
            let game = leiserchess::Game::new();
            for d in 1..=depth {
                println!("perft {d} = {}", game.perft(d));
            }
            ExitCode::SUCCESS
        }
        cli::Command::Display => {
            println!("{}", leiserchess::Position::startpos());
            ExitCode::SUCCESS
        }
        cli::Command::Run { config, log, clean } => match run(&config, &log, clean) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(
    config_path: &std::path::Path,
    log_path: &std::path::Path,
    clean: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // A sentinel left over from an earlier run would stop this one immediately.
    let _ = fs::remove_file(runner::SHUTDOWN_FILE);

    let config = config::TournamentConfig::load(config_path, engine::declared_options)?;

    if clean {
        let roster = &config.roster;
        let dropped = pgn::clean_file(log_path, |name| roster.find(name).is_some())?;
        println!("Removed {dropped} games from {}", log_path.display());
        return Ok(());
    }

    let opening_book = match &config.book {
        Some(path) => book::OpeningBook::load(path)?,
        None => {
            info!("No opening book specified, using starting position");
            book::OpeningBook::start_position_only()
        }
    };

    let roster = Arc::new(config.roster);
    let engine_names = roster.names();
    let mut league =
        tournament::LeastPlayed::new(Arc::clone(&roster), opening_book, config.game_rounds);
    if log_path.exists() {
        league.resume(&pgn::scan_file(log_path)?);
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .inspect_err(|e| error!("Could not open {}: {e}", log_path.display()))?;
    let first_game = league.next_game_number();
    let sequencer = sequencer::ResultSequencer::new(
        pgn::PgnWriter::new(BufWriter::new(log_file)),
        first_game,
    );

    let mut tournament: Box<dyn tournament::Tournament> = Box::new(league);
    tournament = Box::new(tournament::PgnOutWrapper::new(tournament, sequencer));
    tournament = Box::new(tournament::ReporterWrapper::new(
        tournament,
        engine_names,
        first_game,
    ));

    let settings = match_runner::MatchSettings {
        event: config.title,
        adjudicate: config.adjudicate,
    };
    let r = runner::Runner::new(roster, settings, config.cpus);
    r.run(tournament.as_mut());

    Ok(())
}
