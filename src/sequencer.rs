use crate::pgn::PgnWriter;
use crate::tournament::MatchRecord;
use log::{debug, warn};
use std::{collections::BTreeMap, io, io::Write};

/// Holds finished games until every lower-numbered game has been written, so the log
/// is always in game-number order no matter which match finishes first.
#[derive(Debug)]
pub struct ResultSequencer<W: Write> {
    pgn: PgnWriter<W>,
    next: u64,
    pending: BTreeMap<u64, MatchRecord>,
}

impl<W: Write> ResultSequencer<W> {
    pub fn new(pgn: PgnWriter<W>, first_game: u64) -> ResultSequencer<W> {
        ResultSequencer {
            pgn,
            next: first_game,
            pending: BTreeMap::new(),
        }
    }

    /// Buffers `record` and writes out the contiguous run starting at the next expected
    /// game number. Returns how many records were written.
    pub fn commit(&mut self, record: MatchRecord) -> io::Result<usize> {
        if record.id < self.next {
            warn!("Game {} committed after it was due", record.id);
        }
        self.pending.insert(record.id, record);
        let mut written = 0;
        while let Some(record) = self.pending.remove(&self.next) {
            self.pgn.write(&record)?;
            self.next += 1;
            written += 1;
        }
        if !self.pending.is_empty() {
            debug!(
                "{} finished games waiting for game {}",
                self.pending.len(),
                self.next
            );
        }
        Ok(written)
    }

    /// Writes whatever is still buffered in ascending order, gaps and all.
    pub fn drain(&mut self) -> io::Result<usize> {
        let mut written = 0;
        while let Some((id, record)) = self.pending.pop_first() {
            self.pgn.write(&record)?;
            self.next = self.next.max(id + 1);
            written += 1;
        }
        Ok(written)
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.pgn.into_inner()
    }
}
