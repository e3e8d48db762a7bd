use super::moves::Move;
use super::piece::{Cell, Color, Piece, PieceKind};
use std::fmt;
use thiserror::Error;

pub const BOARD_WIDTH: u8 = 8;
const ARRAY_WIDTH: u8 = 16;
const CELL_COUNT: usize = ARRAY_WIDTH as usize * ARRAY_WIDTH as usize;
// Playable rows start after two rows of sentinels.
const TOP_ROW: u8 = 2;
const HASH_SEED: u64 = 203998918981981;

pub const START_FEN: &str = "ss3nw3/3nw4/2nw1nw3/1nw3SE1SE/nw1nw3SE1/3SE1SE2/4SE3/3SE3NN W";

/// Index into the padded 16x16 board.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub fn new(file: u8, rank: u8) -> Square {
        Square((TOP_ROW + BOARD_WIDTH - 1 - rank) * ARRAY_WIDTH + file)
    }

    pub fn file(self) -> u8 {
        self.0 % ARRAY_WIDTH
    }

    pub fn rank(self) -> u8 {
        (TOP_ROW + BOARD_WIDTH - 1).wrapping_sub(self.0 / ARRAY_WIDTH)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn offset(self, delta: i16) -> Square {
        Square((self.0 as i16 + delta) as u8)
    }

    pub fn parse(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('0'..='7').contains(&rank) {
            return None;
        }
        Some(Square::new(file as u8 - b'a', rank as u8 - b'0'))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    #[error("unexpected {0:?} in rank {1}")]
    BadToken(char, u8),
    #[error("rank {0} does not describe exactly 8 squares")]
    RankWidth(u8),
    #[error("side to move must be W or B, found {0:?}")]
    SideToMove(String),
    #[error("{0} must have exactly one king")]
    KingCount(Color),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct MoveEffect {
    pub captured: usize,
    /// Color of a king removed by the laser, if any.
    pub king_captured: Option<Color>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    pub(super) cells: [Cell; CELL_COUNT],
    pub(super) kings: [Square; 2],
    ply: u32,
}

impl Position {
    pub fn startpos() -> Position {
        Position::from_fen(START_FEN).expect("start position FEN is valid")
    }

    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let (board, side) = fen.trim().split_once(' ').unwrap_or((fen.trim(), "W"));

        let mut cells = [Cell::Offboard; CELL_COUNT];
        for file in 0..BOARD_WIDTH {
            for rank in 0..BOARD_WIDTH {
                cells[Square::new(file, rank).index()] = Cell::Empty;
            }
        }

        let ranks: Vec<&str> = board.split('/').collect();
        if ranks.len() != BOARD_WIDTH as usize {
            return Err(FenError::RankCount(ranks.len()));
        }

        let mut kings: [Option<Square>; 2] = [None, None];
        for (row, text) in ranks.iter().enumerate() {
            let rank = BOARD_WIDTH - 1 - row as u8;
            let mut file = 0u8;
            let mut chars = text.chars();
            while let Some(c) = chars.next() {
                if let Some(run) = c.to_digit(10).filter(|&n| n > 0) {
                    file += run as u8;
                    if file > BOARD_WIDTH {
                        return Err(FenError::RankWidth(rank));
                    }
                    continue;
                }
                let piece = chars
                    .next()
                    .and_then(|second| Piece::from_fen(c, second))
                    .ok_or(FenError::BadToken(c, rank))?;
                if file >= BOARD_WIDTH {
                    return Err(FenError::RankWidth(rank));
                }
                let square = Square::new(file, rank);
                cells[square.index()] = Cell::Occupied(piece);
                if piece.kind == PieceKind::King {
                    let slot = &mut kings[piece.color.to_index()];
                    if slot.is_some() {
                        return Err(FenError::KingCount(piece.color));
                    }
                    *slot = Some(square);
                }
                file += 1;
            }
            if file != BOARD_WIDTH {
                return Err(FenError::RankWidth(rank));
            }
        }

        let ply = match side.trim() {
            "W" | "w" => 0,
            "B" | "b" => 1,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        let [Some(white), Some(black)] = kings else {
            let missing = if kings[0].is_none() { Color::White } else { Color::Black };
            return Err(FenError::KingCount(missing));
        };

        Ok(Position {
            cells,
            kings: [white, black],
            ply,
        })
    }

    pub fn side_to_move(&self) -> Color {
        if self.ply % 2 == 0 { Color::White } else { Color::Black }
    }

    pub fn cell(&self, square: Square) -> Cell {
        self.cells[square.index()]
    }

    pub fn king_square(&self, color: Color) -> Square {
        self.kings[color.to_index()]
    }

    /// Board hash over every cell, sentinels included. The side to move is not part of it.
    pub fn hash(&self) -> u64 {
        self.cells.iter().fold(HASH_SEED, |h, cell| {
            h.wrapping_mul(31).wrapping_add(11).wrapping_add(cell.code())
        })
    }

    pub fn generate_moves(&self) -> Vec<Move> {
        let side = self.side_to_move();
        let mut targeted = [false; CELL_COUNT];
        self.trace_laser(side.flip(), |square| targeted[square.index()] = true);

        let mut moves = Vec::with_capacity(128);
        for file in 0..BOARD_WIDTH {
            for rank in 0..BOARD_WIDTH {
                let from = Square::new(file, rank);
                let Some(piece) = self.cell(from).piece() else {
                    continue;
                };
                if piece.color != side
                    || (piece.kind.frozen_by_laser() && targeted[from.index()])
                {
                    continue;
                }
                for &step in piece.kind.steps() {
                    let to = from.offset(step);
                    if self.cell(to) != Cell::Offboard {
                        moves.push(Move::step(from, to, piece.kind));
                    }
                }
                for quarter_turns in 1..=3 {
                    moves.push(Move::rotation(from, piece.kind, quarter_turns));
                }
                if piece.kind.has_null_move() {
                    moves.push(Move::null(from, piece.kind));
                }
            }
        }
        moves
    }

    /// Resolves notation against the piece on the origin square. Legality is not checked.
    pub fn parse_move(&self, notation: &str) -> Option<Move> {
        let (from, to, rotation) = Move::parse_notation(notation)?;
        let piece = self.cell(from).piece()?;
        Some(Move {
            from,
            to,
            kind: piece.kind,
            rotation,
        })
    }

    /// Plays `mv` without any legality check, then fires the mover's laser until it stops
    /// removing pieces.
    pub fn apply(&mut self, mv: Move) -> MoveEffect {
        let mover = self.side_to_move();

        let moving = match self.cells[mv.from.index()] {
            Cell::Occupied(piece) => Cell::Occupied(piece.rotated(mv.rotation)),
            other => other,
        };
        self.cells[mv.from.index()] = self.cells[mv.to.index()];
        self.cells[mv.to.index()] = moving;
        for square in [mv.from, mv.to] {
            if let Some(piece) = self.cell(square).piece()
                && piece.kind == PieceKind::King
            {
                self.kings[piece.color.to_index()] = square;
            }
        }
        self.ply += 1;

        let mut effect = MoveEffect::default();
        while let Some(victim) = self.laser_victim(mover) {
            let removed = std::mem::take(&mut self.cells[victim.index()]);
            effect.captured += 1;
            if let Some(piece) = removed.piece()
                && piece.kind == PieceKind::King
            {
                effect.king_captured = Some(piece.color);
                break;
            }
        }
        effect
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..BOARD_WIDTH).rev() {
            write!(f, "{rank} ")?;
            for file in 0..BOARD_WIDTH {
                match self.cell(Square::new(file, rank)) {
                    Cell::Occupied(piece) => write!(f, " {piece}")?,
                    _ => write!(f, " --")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for file in 0..BOARD_WIDTH {
            write!(f, "  {}", (b'a' + file) as char)?;
        }
        writeln!(f)?;
        writeln!(f, "{} to move", self.side_to_move())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leiserchess::piece::{NORTH, SOUTH};

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn square_notation() {
        assert_eq!(sq("a7").index(), 2 * 16);
        assert_eq!(sq("h0").index(), 9 * 16 + 7);
        assert_eq!(sq("d3").to_string(), "d3");
        assert_eq!(Square::parse("i0"), None);
        assert_eq!(Square::parse("a8"), None);
        assert_eq!(Square::parse("a"), None);
    }

    #[test]
    fn start_position() {
        let position = Position::startpos();
        assert_eq!(position.side_to_move(), Color::White);
        assert_eq!(position.king_square(Color::White), sq("h0"));
        assert_eq!(position.king_square(Color::Black), sq("a7"));

        let white_king = position.cell(sq("h0")).piece().unwrap();
        assert_eq!(white_king.facing, NORTH);
        let black_king = position.cell(sq("a7")).piece().unwrap();
        assert_eq!(black_king.facing, SOUTH);

        assert_eq!(position.cell(sq("d0")).piece().unwrap().to_string(), "SE");
        assert_eq!(position.cell(sq("a3")).piece().unwrap().to_string(), "nw");
        assert_eq!(position.cell(sq("b0")), Cell::Empty);
        assert_eq!(position.cell(Square::new(8, 0)), Cell::Offboard);
    }

    #[test]
    fn display_lists_ranks_top_down() {
        let text = Position::startpos().to_string();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "7  ss -- -- -- nw -- -- --");
        assert!(text.contains("0  -- -- -- SE -- -- -- NN"));
        assert!(text.ends_with("White to move\n"));
    }

    #[test]
    fn fen_errors() {
        assert_eq!(Position::from_fen("8/8/8"), Err(FenError::RankCount(3)));
        assert_eq!(
            Position::from_fen("ss8/8/8/8/8/8/8/7NN"),
            Err(FenError::RankWidth(7))
        );
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/7NN"),
            Err(FenError::KingCount(Color::Black))
        );
        assert_eq!(
            Position::from_fen("ss7/8/8/8/8/8/8/7NN X").unwrap_err(),
            FenError::SideToMove("X".to_string())
        );
        assert!(matches!(
            Position::from_fen("ss6xx/8/8/8/8/8/8/7NN"),
            Err(FenError::BadToken('x', 7))
        ));
    }

    #[test]
    fn black_to_move_fen() {
        let position = Position::from_fen("ss7/8/8/8/8/8/8/7NN B").unwrap();
        assert_eq!(position.side_to_move(), Color::Black);
        assert_eq!(position.king_square(Color::White), sq("h0"));
    }

    #[test]
    fn first_generated_moves() {
        let moves: Vec<String> = Position::startpos()
            .generate_moves()
            .iter()
            .take(9)
            .map(|m| m.to_string())
            .collect();
        assert_eq!(
            moves,
            ["d0c0", "d0c1", "d0d1", "d0e0", "d0e1", "d0R", "d0U", "d0L", "d2c1"]
        );
    }

    #[test]
    fn null_move_only_for_kings() {
        let moves = Position::startpos().generate_moves();
        let nulls: Vec<String> = moves
            .iter()
            .filter(|m| m.from == m.to && !m.is_rotation())
            .map(|m| m.to_string())
            .collect();
        assert_eq!(nulls, ["h0h0"]);
    }

    #[test]
    fn parsed_notation_matches_generated_moves() {
        let position = Position::startpos();
        for mv in position.generate_moves() {
            assert_eq!(position.parse_move(&mv.to_string()), Some(mv));
        }
        assert_eq!(position.parse_move("b0b1"), None);
    }

    #[test]
    fn laser_removes_own_pawn() {
        let mut position = Position::startpos();
        let mv = position.parse_move("h4R").unwrap();
        let effect = position.apply(mv);
        assert_eq!(effect.captured, 1);
        assert_eq!(effect.king_captured, None);
        assert_eq!(position.cell(sq("f2")), Cell::Empty);
        assert_eq!(position.side_to_move(), Color::Black);
    }

    #[test]
    fn swap_updates_king_cache() {
        let mut position = Position::startpos();
        let mv = position.parse_move("h0g0").unwrap();
        position.apply(mv);
        assert_eq!(position.king_square(Color::White), sq("g0"));
        assert_eq!(position.cell(sq("h0")), Cell::Empty);
    }

    #[test]
    fn hash_tracks_board_only() {
        let start = Position::startpos();
        let mut rotated = start.clone();
        rotated.apply(start.parse_move("h0R").unwrap());
        assert_ne!(start.hash(), rotated.hash());

        let mut back = rotated.clone();
        back.apply(rotated.parse_move("h0L").unwrap());
        assert_eq!(start.hash(), back.hash());
    }
}
