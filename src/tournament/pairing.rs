use crate::roster::Roster;
use itertools::Itertools;

/// Games played or in flight between every two players, kept symmetric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingMatrix {
    players: usize,
    counts: Vec<u32>,
}

impl PairingMatrix {
    pub fn new(players: usize) -> PairingMatrix {
        PairingMatrix {
            players,
            counts: vec![0; players * players],
        }
    }

    pub fn count(&self, a: usize, b: usize) -> u32 {
        self.counts[a * self.players + b]
    }

    pub fn record(&mut self, a: usize, b: usize) {
        self.counts[a * self.players + b] += 1;
        self.counts[b * self.players + a] += 1;
    }

    /// The least played pair of players from different families, as `(white, black)`.
    /// The lexicographically larger name takes white unless the pair has played an odd
    /// number of games. Ties go to the pair found first in roster order.
    pub fn next_pairing(&self, roster: &Roster) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (a, b) in (0..self.players).tuple_combinations() {
            if !roster.may_meet(a, b) {
                continue;
            }
            if best.is_none_or(|(x, y)| self.count(a, b) < self.count(x, y)) {
                best = Some((a, b));
            }
        }
        let (a, b) = best?;
        let (white, black) = if roster.get(a).name > roster.get(b).name {
            (a, b)
        } else {
            (b, a)
        };
        if self.count(white, black) % 2 == 1 {
            Some((black, white))
        } else {
            Some((white, black))
        }
    }
}
