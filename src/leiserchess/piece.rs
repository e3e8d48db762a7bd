use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn to_index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    pub fn flip(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn code(self) -> u64 {
        match self {
            Color::White => 32,
            Color::Black => 16,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// Beam headings and piece facings, clockwise from north.
pub const NORTH: u8 = 0;
pub const EAST: u8 = 1;
pub const SOUTH: u8 = 2;
pub const WEST: u8 = 3;

const STEPS: [i16; 8] = [15, -1, -17, 16, -16, 17, 1, -15];

// Both tables are indexed by [beam heading][pawn facing].
const REFLECT: [[u8; 4]; 4] = [[1, 3, 1, 3], [0, 2, 0, 2], [3, 1, 3, 1], [2, 0, 2, 0]];
const ABSORB: [[bool; 4]; 4] = [
    [true, true, false, false],
    [false, true, true, false],
    [false, false, true, true],
    [true, false, false, true],
];

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PieceKind {
    Pawn,
    King,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LaserHit {
    Victim,
    Deflect(u8),
}

impl PieceKind {
    /// Neighbour offsets on the padded board. Pawns and kings step alike.
    pub fn steps(self) -> &'static [i16] {
        &STEPS
    }

    pub fn laser_hit(self, heading: u8, facing: u8) -> LaserHit {
        match self {
            PieceKind::King => LaserHit::Victim,
            PieceKind::Pawn if ABSORB[heading as usize][facing as usize] => LaserHit::Victim,
            PieceKind::Pawn => LaserHit::Deflect(REFLECT[heading as usize][facing as usize]),
        }
    }

    /// A pawn sitting in the opponent's beam is frozen.
    pub fn frozen_by_laser(self) -> bool {
        self == PieceKind::Pawn
    }

    pub fn has_null_move(self) -> bool {
        self == PieceKind::King
    }

    fn code(self) -> u64 {
        match self {
            PieceKind::Pawn => 4,
            PieceKind::King => 8,
        }
    }

    fn facing_names(self) -> [&'static str; 4] {
        match self {
            PieceKind::Pawn => ["NW", "NE", "SE", "SW"],
            PieceKind::King => ["NN", "EE", "SS", "WW"],
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
    pub facing: u8,
}

impl Piece {
    pub fn rotated(self, quarter_turns: u8) -> Piece {
        Piece {
            facing: (self.facing + quarter_turns) & 3,
            ..self
        }
    }

    fn code(self) -> u64 {
        self.color.code() | self.kind.code() | self.facing as u64
    }

    /// Reads a two letter FEN token such as `NW` (white pawn) or `ss` (black king).
    pub fn from_fen(first: char, second: char) -> Option<Piece> {
        let color = if first.is_ascii_uppercase() && second.is_ascii_uppercase() {
            Color::White
        } else if first.is_ascii_lowercase() && second.is_ascii_lowercase() {
            Color::Black
        } else {
            return None;
        };
        let token: String = [first, second].iter().map(char::to_ascii_uppercase).collect();
        [PieceKind::Pawn, PieceKind::King]
            .into_iter()
            .find_map(|kind| {
                let facing = kind.facing_names().iter().position(|n| *n == token)?;
                Some(Piece {
                    color,
                    kind,
                    facing: facing as u8,
                })
            })
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind.facing_names()[self.facing as usize];
        match self.color {
            Color::White => write!(f, "{name}"),
            Color::Black => write!(f, "{}", name.to_ascii_lowercase()),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Empty,
    Offboard,
    Occupied(Piece),
}

impl Cell {
    pub fn piece(self) -> Option<Piece> {
        match self {
            Cell::Occupied(piece) => Some(piece),
            _ => None,
        }
    }

    pub fn code(self) -> u64 {
        match self {
            Cell::Empty => 0,
            Cell::Offboard => 48,
            Cell::Occupied(piece) => piece.code(),
        }
    }
}
