use crate::tournament::{MatchRecord, MoveTiming};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    fmt::Write as _,
    fs::{self, File},
    io::{self, BufRead, BufReader, Error, Write},
    path::Path,
};

const FULL_MOVES_PER_LINE: usize = 5;

lazy_static! {
    static ref EVENT_TAG: Regex = Regex::new(r#"^\[Event "#).unwrap();
    static ref WHITE_TAG: Regex = Regex::new(r#"^\[White "(.*)""#).unwrap();
    static ref BLACK_TAG: Regex = Regex::new(r#"^\[Black "(.*)""#).unwrap();
    static ref RESULT_TAG: Regex = Regex::new(r#"^\[Result "(.*)""#).unwrap();
}

#[derive(Debug)]
pub struct PgnWriter<W: Write> {
    out: W,
}

impl<W: Write> PgnWriter<W> {
    pub fn new(out: W) -> PgnWriter<W> {
        PgnWriter { out }
    }

    fn write_header(out: &mut W, key: &str, value: &str) -> Result<(), Error> {
        writeln!(out, "[{key} \"{value}\"]")
    }

    pub fn write(&mut self, record: &MatchRecord) -> Result<(), Error> {
        let out = &mut self.out;
        let result = record.result().to_string();

        Self::write_header(out, "Event", &record.event)?;
        Self::write_header(out, "Site", "Local")?;
        Self::write_header(out, "Date", &record.game_start.format("%Y.%m.%d").to_string())?;
        Self::write_header(out, "Round", &record.id.to_string())?;
        Self::write_header(out, "White", &record.white)?;
        Self::write_header(out, "Black", &record.black)?;
        Self::write_header(out, "Result", &result)?;
        Self::write_header(out, "PlyCount", &record.moves.len().to_string())?;
        Self::write_header(out, "Termination", record.termination.to_pgn_termination_string())?;
        Self::write_header(out, "GameStartTime", &record.game_start.to_rfc3339())?;
        writeln!(out)?;

        let mut text = movetext(record);
        if !text.is_empty() {
            text.push(' ');
        }
        writeln!(out, "{text}{{{}}} {result}", record.termination)?;
        writeln!(out)?;
        out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `1. m {ns depth nodes} m {...} 2. ...`, wrapping before every sixth full move. Book
/// moves take no search time and report no search, so they read `{0 0 0}`.
fn movetext(record: &MatchRecord) -> String {
    let mut text = String::new();
    for (ply, mv) in record.moves.iter().enumerate() {
        if ply % 2 == 0 {
            let number = ply / 2 + 1;
            if number != 1 && (number - 1) % FULL_MOVES_PER_LINE == 0 {
                text.push('\n');
            } else if number != 1 {
                text.push(' ');
            }
            let _ = write!(text, "{number}.");
        }
        let _ = match mv.timing {
            MoveTiming::Book => write!(text, " {} {{0 0 0}}", mv.notation),
            MoveTiming::Engine {
                elapsed,
                depth,
                nodes,
            } => write!(
                text,
                " {} {{{} {depth} {nodes}}}",
                mv.notation,
                elapsed.as_nanos()
            ),
        };
    }
    text
}

/// White and Black of every finished game in a log, in order.
pub fn scan_games(reader: impl BufRead) -> io::Result<Vec<(String, String)>> {
    let mut games = vec![];
    let mut white = String::new();
    let mut black = String::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(captures) = WHITE_TAG.captures(&line) {
            white = captures[1].to_string();
        } else if let Some(captures) = BLACK_TAG.captures(&line) {
            black = captures[1].to_string();
        } else if RESULT_TAG.is_match(&line) {
            games.push((white.clone(), black.clone()));
        }
    }
    Ok(games)
}

pub fn scan_file(path: &Path) -> io::Result<Vec<(String, String)>> {
    scan_games(BufReader::new(File::open(path)?))
}

/// Splits a log into games at each `[Event` tag and keeps those whose players all
/// pass `keep`. Returns the surviving text and how many games were dropped.
pub fn clean_text(text: &str, keep: impl Fn(&str) -> bool) -> (String, usize) {
    let mut kept = String::new();
    let mut game = String::new();
    let mut ok = false;
    let mut dropped = 0;
    let mut flush = |game: &mut String, ok: bool, kept: &mut String| {
        if ok {
            kept.push_str(game);
        } else if !game.is_empty() {
            dropped += 1;
        }
        game.clear();
    };
    for line in text.lines() {
        if EVENT_TAG.is_match(line) {
            flush(&mut game, ok, &mut kept);
            ok = true;
        }
        game.push_str(line);
        game.push('\n');
        let player = WHITE_TAG
            .captures(line)
            .or_else(|| BLACK_TAG.captures(line));
        if let Some(captures) = player
            && !keep(&captures[1])
        {
            ok = false;
        }
    }
    flush(&mut game, ok, &mut kept);
    (kept, dropped)
}

/// Rewrites the log in place without the games `keep` rejects.
pub fn clean_file(path: &Path, keep: impl Fn(&str) -> bool) -> io::Result<usize> {
    let text = fs::read_to_string(path)?;
    let (kept, dropped) = clean_text(&text, keep);
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    fs::write(&temp, kept)?;
    fs::rename(&temp, path)?;
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leiserchess::Color;
    use crate::tournament::{MoveRecord, Termination, tests::record};
    use std::time::Duration;

    fn engine_move(notation: &str) -> MoveRecord {
        MoveRecord {
            notation: notation.to_string(),
            timing: MoveTiming::Engine {
                elapsed: Duration::from_nanos(1500),
                depth: 3,
                nodes: 42,
            },
        }
    }

    fn render(record: &MatchRecord) -> String {
        let mut writer = PgnWriter::new(Vec::new());
        writer.write(record).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn record_layout() {
        let mut game = record(7, Termination::Crash { loser: Color::Black });
        game.moves = vec![
            MoveRecord {
                notation: "h0R".to_string(),
                timing: MoveTiming::Book,
            },
            engine_move("a7R"),
            engine_move("h0L"),
        ];
        let text = render(&game);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], r#"[Event "test"]"#);
        assert_eq!(lines[1], r#"[Site "Local"]"#);
        assert_eq!(lines[2], r#"[Date "2023.11.14"]"#);
        assert_eq!(lines[3], r#"[Round "7"]"#);
        assert_eq!(lines[4], r#"[White "alpha"]"#);
        assert_eq!(lines[5], r#"[Black "beta"]"#);
        assert_eq!(lines[6], r#"[Result "1-0"]"#);
        assert!(lines[9].starts_with(r#"[GameStartTime "2023-11-14T22:13:20"#));
        assert_eq!(lines[10], "");
        assert_eq!(
            lines[11],
            "1. h0R {0 0 0} a7R {1500 3 42} 2. h0L {1500 3 42} {White wins due to program crash} 1-0"
        );
        assert_eq!(lines[12], "");
        assert_eq!(lines.len(), 13);
    }

    #[test]
    fn long_games_wrap_every_five_moves() {
        let mut game = record(0, Termination::Repetition);
        game.moves = (0..12).map(|_| engine_move("h0R")).collect();
        let text = render(&game);
        let body: Vec<&str> = text.lines().skip(11).take(2).collect();
        assert!(body[0].starts_with("1. h0R"));
        assert!(body[0].ends_with("5. h0R {1500 3 42} h0R {1500 3 42}"));
        assert!(body[1].starts_with("6. h0R"));
        assert!(body[1].ends_with("{Draw by repetition} 1/2-1/2"));
    }

    #[test]
    fn scanning_finished_games() {
        let mut log = Vec::new();
        let mut first = record(0, Termination::Repetition);
        first.white = "x".to_string();
        let second = record(1, Termination::MoveLimit);
        for game in [&first, &second] {
            let mut writer = PgnWriter::new(&mut log);
            writer.write(game).unwrap();
        }
        // A game cut off before its result line does not count.
        log.extend_from_slice(b"[Event \"test\"]\n[White \"y\"]\n[Black \"z\"]\n");

        let games = scan_games(log.as_slice()).unwrap();
        assert_eq!(
            games,
            [
                ("x".to_string(), "beta".to_string()),
                ("alpha".to_string(), "beta".to_string())
            ]
        );
    }

    #[test]
    fn cleaning_drops_unknown_players() {
        let mut games = vec![];
        for white in ["alpha", "retired", "alpha"] {
            let mut game = record(games.len() as u64, Termination::NoProgress);
            game.white = white.to_string();
            games.push(render(&game));
        }
        let log = games.concat();
        let (kept, dropped) = clean_text(&log, |name| name != "retired");
        assert_eq!(dropped, 1);
        assert_eq!(kept, format!("{}{}", games[0], games[2]));
        assert_eq!(scan_games(kept.as_bytes()).unwrap().len(), 2);
    }

    #[test]
    fn clean_file_in_place() {
        let path = std::env::temp_dir().join(format!("leisertest-clean-{}.pgn", std::process::id()));
        let mut game = record(0, Termination::Repetition);
        let mut text = render(&game);
        game.black = "retired".to_string();
        text.push_str(&render(&game));
        fs::write(&path, &text).unwrap();

        assert_eq!(clean_file(&path, |name| name != "retired").unwrap(), 1);
        let games = scan_file(&path).unwrap();
        assert_eq!(games, [("alpha".to_string(), "beta".to_string())]);
        fs::remove_file(&path).unwrap();
    }
}
