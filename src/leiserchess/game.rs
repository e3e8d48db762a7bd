use super::perft::perft;
use super::piece::Color;
use super::position::Position;
use thiserror::Error;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Status {
    Ongoing,
    Draw,
    Won(Color),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("{0} is not a legal move here")]
    NotGenerated(String),
    #[error("{0} recreates one of the two previous positions")]
    RecentRepetition(String),
    #[error("the game is already decided")]
    GameOver,
}

/// A position plus the hash of every position reached so far, starting with the
/// initial one.
#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    history: Vec<u64>,
    winner: Option<Color>,
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl Game {
    pub fn new() -> Game {
        Game::from_position(Position::startpos())
    }

    pub fn from_position(position: Position) -> Game {
        Game {
            history: vec![position.hash()],
            position,
            winner: None,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    pub fn plies_played(&self) -> u32 {
        (self.history.len() - 1) as u32
    }

    /// Plays `notation` if it is one of the generated moves and does not undo either of
    /// the last two plies. Returns how many pieces the laser removed.
    pub fn make_move(&mut self, notation: &str) -> Result<usize, IllegalMove> {
        if self.winner.is_some() {
            return Err(IllegalMove::GameOver);
        }
        let mv = self
            .position
            .parse_move(notation)
            .filter(|mv| self.position.generate_moves().contains(mv))
            .ok_or_else(|| IllegalMove::NotGenerated(notation.to_string()))?;

        let mut next = self.position.clone();
        let effect = next.apply(mv);
        let key = next.hash();
        if self.history.iter().rev().take(2).any(|&k| k == key) {
            return Err(IllegalMove::RecentRepetition(notation.to_string()));
        }

        self.position = next;
        self.history.push(key);
        if let Some(victim) = effect.king_captured {
            self.winner = Some(victim.flip());
        }
        Ok(effect.captured)
    }

    /// The current position repeats at least twice among earlier positions with the
    /// same side to move, skipping the one two plies back.
    pub fn is_repetition(&self) -> bool {
        let Some(&current) = self.history.last() else {
            return false;
        };
        self.history
            .iter()
            .rev()
            .skip(4)
            .step_by(2)
            .filter(|&&k| k == current)
            .count()
            >= 2
    }

    pub fn status(&self) -> Status {
        if let Some(winner) = self.winner {
            Status::Won(winner)
        } else if self.is_repetition() {
            Status::Draw
        } else {
            Status::Ongoing
        }
    }

    pub fn perft(&self, depth: u32) -> u64 {
        perft(&self.position, depth)
    }
}
