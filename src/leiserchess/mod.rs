//! Rules of Leiserchess: an 8x8 board of mirrored pawns and two laser-firing kings.
//! After every move the mover's king fires; whatever piece the beam strikes on an
//! unmirrored face is removed, and losing your king loses the game.

mod game;
mod laser;
mod moves;
mod perft;
mod piece;
mod position;

pub use game::{Game, Status};
pub use piece::Color;
pub use position::Position;
