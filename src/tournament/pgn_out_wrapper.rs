use crate::{
    sequencer::ResultSequencer,
    tournament::{MatchRecord, MatchTicket, Tournament},
};
use log::error;
use std::io::Write;

pub struct PgnOutWrapper<W: Write> {
    inner: Box<dyn Tournament>,
    sequencer: ResultSequencer<W>,
}

impl<W: Write> PgnOutWrapper<W> {
    pub fn new(inner: Box<dyn Tournament>, sequencer: ResultSequencer<W>) -> PgnOutWrapper<W> {
        PgnOutWrapper { inner, sequencer }
    }
}

impl<W: Write> Tournament for PgnOutWrapper<W> {
    fn next(&mut self) -> Option<MatchTicket> {
        self.inner.as_mut().next()
    }
    fn match_complete(&mut self, record: &MatchRecord) {
        if let Err(e) = self.sequencer.commit(record.clone()) {
            error!("Could not write game {}: {e}", record.id);
        }
        self.inner.as_mut().match_complete(record)
    }
    fn print_interval_report(&self) {
        self.inner.print_interval_report()
    }
    fn tournament_complete(&mut self) {
        match self.sequencer.drain() {
            Ok(0) => {}
            Ok(n) => error!("{n} games were written out of order"),
            Err(e) => error!("Could not write remaining games: {e}"),
        }
        self.inner.tournament_complete()
    }
    fn expected_maximum_match_count(&self) -> Option<u64> {
        self.inner.as_ref().expected_maximum_match_count()
    }
}
