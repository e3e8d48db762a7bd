use super::piece::{Cell, Color, EAST, LaserHit, NORTH, SOUTH, WEST};
use super::position::{Position, Square};

// Indexed by heading.
const BEAM_STEP: [i16; 4] = {
    let mut steps = [0; 4];
    steps[NORTH as usize] = -16;
    steps[EAST as usize] = 1;
    steps[SOUTH as usize] = 16;
    steps[WEST as usize] = -1;
    steps
};

impl Position {
    /// Follows `shooter`'s laser out of its king, calling `visit` for every cell the beam
    /// enters. Returns the square of the first piece the beam strikes, or `None` once it
    /// leaves the board.
    pub fn trace_laser(&self, shooter: Color, mut visit: impl FnMut(Square)) -> Option<Square> {
        let origin = self.king_square(shooter);
        let mut heading = self.cell(origin).piece()?.facing;
        let mut square = origin;
        loop {
            square = square.offset(BEAM_STEP[heading as usize]);
            visit(square);
            match self.cells[square.index()] {
                Cell::Empty => {}
                Cell::Offboard => return None,
                Cell::Occupied(piece) => match piece.kind.laser_hit(heading, piece.facing) {
                    LaserHit::Victim => return Some(square),
                    LaserHit::Deflect(next) => heading = next,
                },
            }
        }
    }

    pub fn laser_victim(&self, shooter: Color) -> Option<Square> {
        self.trace_laser(shooter, |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_lasers_are_harmless() {
        let position = Position::startpos();
        assert_eq!(position.laser_victim(Color::White), None);
        assert_eq!(position.laser_victim(Color::Black), None);
    }

    #[test]
    fn beam_path_reflects_off_pawns() {
        let position = Position::startpos();
        let mut path = vec![];
        position.trace_laser(Color::Black, |square| path.push(square.to_string()));
        // Down the a-file, off the a3 mirror and out the west edge.
        assert_eq!(path.len(), 5);
        assert_eq!(&path[..4], ["a6", "a5", "a4", "a3"]);
    }

    #[test]
    fn king_in_line_of_fire() {
        let position = Position::from_fen("ss7/8/8/8/8/8/8/NN7").unwrap();
        assert_eq!(position.laser_victim(Color::White), Square::parse("a7"));
        assert_eq!(position.laser_victim(Color::Black), Square::parse("a0"));
    }
}
