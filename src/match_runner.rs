use crate::{
    engine::EngineProcess,
    leiserchess::{Color, Game, Status},
    roster::{Participant, Roster},
    tc::TimeForfeit,
    tournament::{MatchRecord, MatchTicket, MoveRecord, MoveTiming, Termination},
};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

/// Opening lines are cut off after this many plies.
pub const MAX_BOOK_PLIES: usize = 10;
/// Plies without a capture before the game is drawn.
pub const NO_PROGRESS_PLIES: u32 = 200;

#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub event: String,
    /// Games are drawn once this many full moves have been played.
    pub adjudicate: u32,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Phase {
    Setup,
    BookMoves,
    EngineMoves,
}

/// Plays one game to completion. Engine failures of any kind become a loss for the
/// engine at fault; nothing here returns an error.
pub fn run_match(settings: &MatchSettings, roster: &Roster, ticket: &MatchTicket) -> MatchRecord {
    MatchRunner::new(settings, [roster.get(ticket.white), roster.get(ticket.black)], ticket).run()
}

struct MatchRunner<'a> {
    settings: &'a MatchSettings,
    players: [&'a Participant; 2],
    ticket: &'a MatchTicket,
    phase: Phase,
    game: Game,
    moves: Vec<MoveRecord>,
    used: [Duration; 2],
    no_progress: u32,
}

impl<'a> MatchRunner<'a> {
    fn new(
        settings: &'a MatchSettings,
        players: [&'a Participant; 2],
        ticket: &'a MatchTicket,
    ) -> MatchRunner<'a> {
        MatchRunner {
            settings,
            players,
            ticket,
            phase: Phase::Setup,
            game: Game::new(),
            moves: vec![],
            used: [Duration::ZERO; 2],
            no_progress: NO_PROGRESS_PLIES,
        }
    }

    fn run(mut self) -> MatchRecord {
        let game_start = Utc::now();
        info!(
            "Game {}: {} vs {}",
            self.ticket.id, self.players[0].name, self.players[1].name
        );

        let mut engines = self.setup();
        let termination = self.play(&mut engines);
        for engine in &mut engines {
            engine.send("quit");
        }
        for engine in &mut engines {
            engine.cleanup();
        }

        info!("Game {}: {termination}", self.ticket.id);
        debug!("Game {}: final position\n{}", self.ticket.id, self.game.position());
        MatchRecord {
            id: self.ticket.id,
            event: self.settings.event.clone(),
            white: self.players[0].name.clone(),
            black: self.players[1].name.clone(),
            game_start,
            moves: self.moves,
            time_used: self.used,
            termination,
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Game {}: {:?} -> {phase:?}", self.ticket.id, self.phase);
        self.phase = phase;
    }

    fn setup(&self) -> [EngineProcess; 2] {
        let mut engines = self.players.map(|player| {
            EngineProcess::spawn(&player.name, &player.invocation).unwrap_or_else(|e| {
                error!("Could not start {} ({}): {e}", player.name, player.invocation);
                EngineProcess::exited(&player.name)
            })
        });
        for engine in &mut engines {
            engine.send("uci");
        }
        for engine in &mut engines {
            engine.wait_for("uciok");
        }
        for (engine, player) in engines.iter_mut().zip(self.players) {
            for line in player.setoption_lines() {
                engine.send(&line);
            }
            engine.send("isready");
            engine.wait_for("readyok");
        }
        engines
    }

    fn play(&mut self, engines: &mut [EngineProcess; 2]) -> Termination {
        for side in [Color::White, Color::Black] {
            let engine = &engines[side.to_index()];
            if engine.has_died() {
                warn!("Game {}: {} failed during setup", self.ticket.id, engine.name());
                return Termination::Crash { loser: side };
            }
        }

        let book_plies = self.ticket.opening.len().min(MAX_BOOK_PLIES);
        self.enter(if book_plies > 0 { Phase::BookMoves } else { Phase::EngineMoves });
        loop {
            let ply = self.game.plies_played();
            let side = self.game.side_to_move();
            if self.phase == Phase::BookMoves && ply as usize >= book_plies {
                self.enter(Phase::EngineMoves);
            }

            let captured = match self.phase {
                Phase::BookMoves => self.book_move(ply as usize, side),
                _ => self.engine_move(&mut engines[side.to_index()], side, ply),
            };
            let captured = match captured {
                Ok(captured) => captured,
                Err(termination) => return termination,
            };

            let exhausted = self.count_progress(captured);

            match self.game.status() {
                Status::Won(winner) => return Termination::KingCaptured { winner },
                Status::Draw => return Termination::Repetition,
                Status::Ongoing => {}
            }
            if ply > (self.settings.adjudicate - 1) * 2 {
                return Termination::MoveLimit;
            }
            if exhausted {
                return Termination::NoProgress;
            }
        }
    }

    /// Book plies restart the count and then count like any other ply. Returns true once
    /// no piece has been captured for `NO_PROGRESS_PLIES` plies.
    fn count_progress(&mut self, captured: usize) -> bool {
        if captured > 0 || self.phase == Phase::BookMoves {
            self.no_progress = NO_PROGRESS_PLIES;
        }
        if captured == 0 {
            self.no_progress -= 1;
        }
        self.no_progress == 0
    }

    fn book_move(&mut self, ply: usize, side: Color) -> Result<usize, Termination> {
        let notation = &self.ticket.opening[ply];
        let captured = self.game.make_move(notation).map_err(|e| {
            warn!("Game {}: book move rejected: {e}", self.ticket.id);
            Termination::IllegalMove {
                loser: side,
                attempted: notation.clone(),
            }
        })?;
        self.moves.push(MoveRecord {
            notation: notation.clone(),
            timing: MoveTiming::Book,
        });
        Ok(captured)
    }

    fn engine_move(
        &mut self,
        engine: &mut EngineProcess,
        side: Color,
        ply: u32,
    ) -> Result<usize, Termination> {
        let player = self.players[side.to_index()];
        let directive = player
            .time_control
            .directive(ply, self.used[side.to_index()])
            .map_err(|TimeForfeit| {
                warn!("Game {}: {} ran out of time", self.ticket.id, player.name);
                Termination::TimeForfeit { loser: side }
            })?;

        engine.send(&self.position_command());
        engine.send(&format!("go {directive}"));
        let start = Instant::now();
        let Some(reply) = engine.wait_for("bestmove") else {
            warn!("Game {}: {} crashed", self.ticket.id, player.name);
            return Err(Termination::Crash { loser: side });
        };
        let elapsed = start.elapsed();

        let notation = reply.split_whitespace().nth(1).unwrap_or("").to_string();
        let captured = self.game.make_move(&notation).map_err(|e| {
            warn!("Game {}: {}: {e}", self.ticket.id, player.name);
            Termination::IllegalMove {
                loser: side,
                attempted: notation.clone(),
            }
        })?;

        self.used[side.to_index()] += elapsed;
        self.moves.push(MoveRecord {
            notation,
            timing: MoveTiming::Engine {
                elapsed,
                depth: engine.depth(),
                nodes: engine.nodes(),
            },
        });
        Ok(captured)
    }

    fn position_command(&self) -> String {
        let mut command = String::from("position startpos moves");
        for mv in &self.moves {
            command.push(' ');
            command.push_str(&mv.notation);
        }
        command
    }
}
