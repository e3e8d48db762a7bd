use crate::leiserchess::Color;
use chrono::{DateTime, Utc};
use std::{fmt, time::Duration};

mod least_played;
mod openings;
mod pairing;
mod pgn_out_wrapper;
mod reporter_wrapper;

pub use least_played::LeastPlayed;
pub use openings::OpeningSchedule;
pub use pairing::PairingMatrix;
pub use pgn_out_wrapper::PgnOutWrapper;
pub use reporter_wrapper::ReporterWrapper;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTicket {
    pub id: u64,
    pub white: usize,
    pub black: usize,
    pub opening: Vec<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    pub fn win_for(color: Color) -> GameResult {
        match color {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::WhiteWins => write!(f, "1-0"),
            GameResult::BlackWins => write!(f, "0-1"),
            GameResult::Draw => write!(f, "1/2-1/2"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Termination {
    KingCaptured { winner: Color },
    Repetition,
    MoveLimit,
    NoProgress,
    Crash { loser: Color },
    IllegalMove { loser: Color, attempted: String },
    TimeForfeit { loser: Color },
}

impl Termination {
    pub fn result(&self) -> GameResult {
        match self {
            Termination::KingCaptured { winner } => GameResult::win_for(*winner),
            Termination::Repetition | Termination::MoveLimit | Termination::NoProgress => {
                GameResult::Draw
            }
            Termination::Crash { loser }
            | Termination::IllegalMove { loser, .. }
            | Termination::TimeForfeit { loser } => GameResult::win_for(loser.flip()),
        }
    }

    pub fn to_pgn_termination_string(&self) -> &'static str {
        match self {
            Termination::KingCaptured { .. } | Termination::Repetition => "normal",
            Termination::MoveLimit | Termination::NoProgress => "adjudication",
            Termination::Crash { .. } => "abandoned",
            Termination::IllegalMove { .. } => "rules infraction",
            Termination::TimeForfeit { .. } => "time forfeit",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::KingCaptured { winner } => {
                write!(f, "{winner} wins by zapping the {} king", loser_name(*winner))
            }
            Termination::Repetition => write!(f, "Draw by repetition"),
            Termination::MoveLimit => write!(f, "Draw by adjudication"),
            Termination::NoProgress => write!(f, "Draw, no capture in 200 plies"),
            Termination::Crash { loser } => write!(f, "{} wins due to program crash", loser.flip()),
            Termination::IllegalMove { attempted, .. } => {
                write!(f, "Illegal move |{attempted}| attempted.")
            }
            Termination::TimeForfeit { loser } => {
                write!(f, "{} wins due to time forfeit", loser.flip())
            }
        }
    }
}

fn loser_name(winner: Color) -> &'static str {
    match winner {
        Color::White => "black",
        Color::Black => "white",
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MoveTiming {
    Book,
    Engine {
        elapsed: Duration,
        depth: u32,
        nodes: u64,
    },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MoveRecord {
    pub notation: String,
    pub timing: MoveTiming,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MatchRecord {
    pub id: u64,
    pub event: String,
    pub white: String,
    pub black: String,
    pub game_start: DateTime<Utc>,
    pub moves: Vec<MoveRecord>,
    /// Think time used by white and black.
    pub time_used: [Duration; 2],
    pub termination: Termination,
}

impl MatchRecord {
    pub fn result(&self) -> GameResult {
        self.termination.result()
    }
}

pub trait Tournament {
    fn next(&mut self) -> Option<MatchTicket>;
    fn match_complete(&mut self, record: &MatchRecord);
    fn print_interval_report(&self);
    fn tournament_complete(&mut self);
    fn expected_maximum_match_count(&self) -> Option<u64>;
}
