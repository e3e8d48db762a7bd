use crate::match_runner::{self, MatchSettings};
use crate::roster::Roster;
use crate::tournament::{MatchRecord, MatchTicket, Tournament};
use crossbeam_channel::{self, Receiver, Sender};
use log::{error, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const TICK: Duration = Duration::from_millis(10);
pub const REPORT_INTERVAL_TICKS: u64 = 2048;
pub const SHUTDOWN_FILE: &str = "killme.now";

#[derive(Debug)]
pub struct Runner {
    roster: Arc<Roster>,
    settings: Arc<MatchSettings>,
    concurrency: usize,
    shutdown_file: PathBuf,
}

impl Runner {
    pub fn new(roster: Arc<Roster>, settings: MatchSettings, concurrency: usize) -> Runner {
        Runner {
            roster,
            settings: Arc::new(settings),
            concurrency: concurrency.max(1),
            shutdown_file: PathBuf::from(SHUTDOWN_FILE),
        }
    }

    pub fn with_shutdown_file(mut self, path: impl Into<PathBuf>) -> Runner {
        self.shutdown_file = path.into();
        self
    }

    /// Launches at most one match per tick while fewer than `concurrency` are running,
    /// and hands finished records to `tournament` on this thread. Returns once the
    /// tournament has no more tickets (or the shutdown file appears) and every running
    /// match has finished.
    pub fn run(&self, tournament: &mut dyn Tournament) {
        let (send_result, recv_result) = crossbeam_channel::unbounded();
        let mut in_flight: HashMap<u64, JoinHandle<()>> = HashMap::new();
        let mut draining = false;
        let mut cycle: u64 = 0;

        loop {
            if !draining && self.shutdown_file.exists() {
                info!(
                    "Found {}, waiting for {} running games",
                    self.shutdown_file.display(),
                    in_flight.len()
                );
                draining = true;
            }
            if !draining && in_flight.len() < self.concurrency {
                match tournament.next() {
                    Some(ticket) => {
                        let id = ticket.id;
                        if let Some(handle) = self.launch(ticket, send_result.clone()) {
                            in_flight.insert(id, handle);
                        }
                    }
                    None => draining = true,
                }
            }
            if draining && in_flight.is_empty() {
                break;
            }

            crossbeam_channel::select! {
                recv(recv_result) -> record => {
                    if let Ok(record) = record {
                        Self::complete(tournament, &mut in_flight, record);
                    }
                }
                default(TICK) => {}
            }
            Self::reap(tournament, &mut in_flight, &recv_result);

            cycle += 1;
            if cycle % REPORT_INTERVAL_TICKS == 100 {
                tournament.print_interval_report();
            }
        }

        tournament.tournament_complete();
    }

    fn launch(&self, ticket: MatchTicket, send: Sender<MatchRecord>) -> Option<JoinHandle<()>> {
        let roster = Arc::clone(&self.roster);
        let settings = Arc::clone(&self.settings);
        let id = ticket.id;
        let spawned = thread::Builder::new()
            .name(format!("game-{id}"))
            .spawn(move || {
                let record = match_runner::run_match(&settings, &roster, &ticket);
                if send.send(record).is_err() {
                    warn!("Game {id} finished after the runner stopped listening");
                }
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Could not start a thread for game {id}: {e}");
                None
            }
        }
    }

    fn complete(
        tournament: &mut dyn Tournament,
        in_flight: &mut HashMap<u64, JoinHandle<()>>,
        record: MatchRecord,
    ) {
        if let Some(handle) = in_flight.remove(&record.id)
            && handle.join().is_err()
        {
            error!("Thread for game {} panicked", record.id);
        }
        tournament.match_complete(&record);
    }

    /// Collects every result already sent, then drops threads that finished without
    /// sending one.
    fn reap(
        tournament: &mut dyn Tournament,
        in_flight: &mut HashMap<u64, JoinHandle<()>>,
        recv: &Receiver<MatchRecord>,
    ) {
        // A thread only finishes after its send, so anything finished before the drain
        // below either delivered a record or never will.
        let finished: Vec<u64> = in_flight
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(id, _)| *id)
            .collect();
        while let Ok(record) = recv.try_recv() {
            Self::complete(tournament, in_flight, record);
        }
        for id in finished {
            if let Some(handle) = in_flight.remove(&id) {
                let _ = handle.join();
                error!("Game {id} ended without a result");
            }
        }
    }
}
