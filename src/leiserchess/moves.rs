use super::piece::PieceKind;
use super::position::Square;
use std::fmt;

/// A move is a step (possibly swapping with an occupied neighbour), a rotation by
/// one to three quarter turns, or a king's null move.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: PieceKind,
    pub rotation: u8,
}

impl Move {
    pub fn step(from: Square, to: Square, kind: PieceKind) -> Move {
        Move {
            from,
            to,
            kind,
            rotation: 0,
        }
    }

    pub fn rotation(square: Square, kind: PieceKind, quarter_turns: u8) -> Move {
        Move {
            from: square,
            to: square,
            kind,
            rotation: quarter_turns,
        }
    }

    pub fn null(square: Square, kind: PieceKind) -> Move {
        Move::step(square, square, kind)
    }

    pub fn is_rotation(&self) -> bool {
        self.from == self.to && self.rotation != 0
    }

    /// Splits `e1e2` or `e1R` into origin, destination and quarter turns.
    pub fn parse_notation(notation: &str) -> Option<(Square, Square, u8)> {
        if !notation.is_ascii() {
            return None;
        }
        match notation.len() {
            3 => {
                let square = Square::parse(&notation[..2])?;
                let rotation = match &notation[2..] {
                    "R" => 1,
                    "U" => 2,
                    "L" => 3,
                    _ => return None,
                };
                Some((square, square, rotation))
            }
            4 => Some((
                Square::parse(&notation[..2])?,
                Square::parse(&notation[2..])?,
                0,
            )),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_rotation(), self.rotation) {
            (true, 1) => write!(f, "{}R", self.from),
            (true, 2) => write!(f, "{}U", self.from),
            (true, 3) => write!(f, "{}L", self.from),
            _ => write!(f, "{}{}", self.from, self.to),
        }
    }
}
