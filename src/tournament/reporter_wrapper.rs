use crate::tournament::{self, MatchRecord, Tournament};
use std::time::Instant;

pub struct ReporterWrapper {
    inner: Box<dyn tournament::Tournament>,
    engine_names: Vec<String>,
    start: Instant,
    /// Games in the log plus games started by this run.
    games: u64,
    finished: u64,
}

impl ReporterWrapper {
    pub fn new(
        inner: Box<dyn tournament::Tournament>,
        engine_names: Vec<String>,
        first_game: u64,
    ) -> ReporterWrapper {
        ReporterWrapper {
            inner,
            engine_names,
            start: Instant::now(),
            games: first_game,
            finished: 0,
        }
    }
}

impl ReporterWrapper {
    fn format_of_max_string(&self) -> String {
        match self.expected_maximum_match_count() {
            Some(count) => format!(" of {count}"),
            None => String::from(""),
        }
    }

    fn throughput_line(&self) -> String {
        let seconds = self.start.elapsed().as_secs_f64();
        let per_minute = if seconds > 0.0 {
            60.0 * self.finished as f64 / seconds
        } else {
            0.0
        };
        format!(
            "{seconds:12.1} sec  {per_minute:14.3} gpm  {:8} games",
            self.games
        )
    }
}

impl tournament::Tournament for ReporterWrapper {
    fn next(&mut self) -> Option<tournament::MatchTicket> {
        let ticket = self.inner.as_mut().next();
        if let Some(ticket) = &ticket {
            self.games = self.games.max(ticket.id + 1);
            println!(
                "Started game {}{} ({} vs {})",
                ticket.id,
                self.format_of_max_string(),
                &self.engine_names[ticket.white],
                &self.engine_names[ticket.black]
            );
        }
        ticket
    }
    fn match_complete(&mut self, record: &MatchRecord) {
        self.finished += 1;
        println!(
            "Finished game {} ({} vs {}): {} {{{}}}",
            record.id,
            record.white,
            record.black,
            record.result(),
            record.termination,
        );
        self.inner.as_mut().match_complete(record)
    }
    fn print_interval_report(&self) {
        println!("{}", self.throughput_line());
        self.inner.print_interval_report()
    }
    fn tournament_complete(&mut self) {
        self.inner.tournament_complete();
        println!("{}", self.throughput_line());
        println!("Finished ...");
    }
    fn expected_maximum_match_count(&self) -> Option<u64> {
        self.inner.as_ref().expected_maximum_match_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::OpeningBook;
    use crate::roster::{Roster, tests::participant};
    use crate::tournament::LeastPlayed;
    use std::sync::Arc;

    fn games_column(reporter: &ReporterWrapper) -> u64 {
        let line = reporter.throughput_line();
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields[fields.len() - 1], "games");
        fields[fields.len() - 2].parse().unwrap()
    }

    #[test]
    fn throughput_counts_games_already_logged() {
        let roster = Arc::new(Roster::new(vec![participant("a", "a"), participant("b", "b")]));
        let mut league = LeastPlayed::new(roster.clone(), OpeningBook::start_position_only(), 3);
        league.resume(&[
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "a".to_string()),
        ]);
        let mut reporter = ReporterWrapper::new(Box::new(league), roster.names(), 2);
        assert_eq!(games_column(&reporter), 2);

        let ticket = reporter.next().unwrap();
        assert_eq!(ticket.id, 2);
        assert_eq!(games_column(&reporter), 3);
        reporter.next().unwrap();
        assert_eq!(games_column(&reporter), 4);
    }
}
