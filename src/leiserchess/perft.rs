use super::position::Position;

/// Counts leaf nodes of the legal move tree. A move that zaps a king ends its branch
/// and counts as one leaf.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = position.generate_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .into_iter()
        .map(|mv| {
            let mut child = position.clone();
            if child.apply(mv).king_captured.is_some() {
                1
            } else {
                perft(&child, depth - 1)
            }
        })
        .sum()
}
