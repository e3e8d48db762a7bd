use crate::{
    book::OpeningBook,
    roster::Roster,
    tournament::{MatchRecord, MatchTicket, OpeningSchedule, PairingMatrix, Tournament},
};
use log::{info, warn};
use std::sync::Arc;

/// Keeps launching whichever eligible pair has met least often until `game_rounds`
/// games have been started.
#[derive(Debug)]
pub struct LeastPlayed {
    roster: Arc<Roster>,
    matrix: PairingMatrix,
    openings: OpeningSchedule,
    book: OpeningBook,
    game_rounds: u64,
    next_game: u64,
    launched: u64,
}

impl LeastPlayed {
    pub fn new(roster: Arc<Roster>, book: OpeningBook, game_rounds: u64) -> LeastPlayed {
        LeastPlayed {
            matrix: PairingMatrix::new(roster.len()),
            openings: OpeningSchedule::new(&roster, book.len()),
            roster,
            book,
            game_rounds,
            next_game: 0,
            launched: 0,
        }
    }

    /// Counts games already in the log. Games involving players no longer on the roster
    /// are ignored and do not consume a game number.
    pub fn resume(&mut self, games: &[(String, String)]) {
        let mut counted = 0;
        for (white, black) in games {
            if let (Some(w), Some(b)) = (self.roster.find(white), self.roster.find(black)) {
                self.matrix.record(w, b);
                counted += 1;
            }
        }
        if counted < games.len() {
            warn!(
                "Ignoring {} logged games with unknown players",
                games.len() - counted
            );
        }
        self.next_game += counted as u64;
        info!("Resuming at game {}", self.next_game);
    }

    pub fn next_game_number(&self) -> u64 {
        self.next_game
    }

    #[cfg(test)]
    pub fn matrix(&self) -> &PairingMatrix {
        &self.matrix
    }
}

impl Tournament for LeastPlayed {
    fn next(&mut self) -> Option<MatchTicket> {
        if self.launched >= self.game_rounds {
            return None;
        }
        let (white, black) = self.matrix.next_pairing(&self.roster)?;
        let k = (self.matrix.count(white, black) / 2) as usize;
        let opening = self.book.line(self.openings.index(white, black, k)).to_vec();
        self.matrix.record(white, black);

        let id = self.next_game;
        self.next_game += 1;
        self.launched += 1;
        Some(MatchTicket {
            id,
            white,
            black,
            opening,
        })
    }

    fn match_complete(&mut self, _: &MatchRecord) {}

    fn print_interval_report(&self) {}

    fn tournament_complete(&mut self) {}

    fn expected_maximum_match_count(&self) -> Option<u64> {
        Some(self.next_game - self.launched + self.game_rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::tests::participant;

    fn tournament(book: &str, game_rounds: u64) -> LeastPlayed {
        let roster = Roster::new(vec![
            participant("alpha", "alpha"),
            participant("beta", "beta"),
        ]);
        LeastPlayed::new(
            Arc::new(roster),
            OpeningBook::from_lines(book.lines()),
            game_rounds,
        )
    }

    #[test]
    fn stops_at_round_target() {
        let mut t = tournament("", 3);
        let ids: Vec<u64> = std::iter::from_fn(|| t.next()).map(|ticket| ticket.id).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert_eq!(t.matrix().count(0, 1), 3);
        assert!(t.next().is_none());
    }

    #[test]
    fn colours_alternate_and_share_an_opening() {
        let book = (0..10).map(|i| format!("h0R a7R o{i}")).collect::<Vec<_>>().join("\n");
        let mut t = tournament(&book, 6);
        let tickets: Vec<MatchTicket> = std::iter::from_fn(|| t.next()).collect();
        // "beta" sorts after "alpha" so it gets white first.
        assert_eq!((tickets[0].white, tickets[0].black), (1, 0));
        assert_eq!((tickets[1].white, tickets[1].black), (0, 1));
        assert_eq!((tickets[2].white, tickets[2].black), (1, 0));
        // skip 9, offset 9 for alpha/beta over ten lines.
        let last: Vec<&str> = tickets.iter().map(|t| t.opening[2].as_str()).collect();
        assert_eq!(last, ["o9", "o9", "o8", "o8", "o7", "o7"]);
    }

    #[test]
    fn resume_counts_known_games() {
        let mut t = tournament("", 10);
        let logged = [
            ("beta".to_string(), "alpha".to_string()),
            ("alpha".to_string(), "beta".to_string()),
            ("gone".to_string(), "alpha".to_string()),
        ];
        t.resume(&logged);
        assert_eq!(t.next_game_number(), 2);
        assert_eq!(t.matrix().count(0, 1), 2);
        let ticket = t.next().unwrap();
        assert_eq!(ticket.id, 2);
        assert_eq!((ticket.white, ticket.black), (1, 0));
        assert_eq!(t.expected_maximum_match_count(), Some(12));
    }
}
