use crate::roster::{self, Invocation, OptionDecl, OptionError, Participant, Roster};
use crate::tc::TimeControl;
use itertools::Itertools;
use log::{debug, info};
use std::{fs, io, path::Path, path::PathBuf, time::Duration};
use thiserror::Error;

pub const DEFAULT_TITLE: &str = "Autotest";
pub const DEFAULT_ADJUDICATE: u32 = 400;
pub const DEFAULT_GAME_ROUNDS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("illegal line {line} in configuration file: {text}")]
    Syntax { line: usize, text: String },
    #[error("player {0:?} defined twice")]
    DuplicatePlayer(String),
    #[error("line {line}: {key:?} appears before any player")]
    NoPlayer { line: usize, key: String },
    #[error("line {line}: bad value {value:?} for {key:?}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },
    #[error("error running program {player}: {source}")]
    OptionQuery { player: String, source: io::Error },
    #[error("player {0:?} has no invoke line")]
    MissingInvoke(String),
    #[error("illegal option for player {player}: {source}")]
    PlayerOption { player: String, source: OptionError },
    #[error("no two players are allowed to meet")]
    NoEligiblePairing,
}

#[derive(Debug, Clone)]
pub struct TournamentConfig {
    pub title: String,
    pub cpus: usize,
    /// Full moves before a game is drawn by adjudication.
    pub adjudicate: u32,
    pub book: Option<PathBuf>,
    pub game_rounds: u64,
    pub roster: Roster,
}

#[derive(Debug, Default)]
struct PlayerBuilder {
    name: String,
    family: String,
    invocation: Option<Invocation>,
    declared: Vec<OptionDecl>,
    options: Vec<(String, String)>,
    depth: Option<u32>,
    nodes: Option<u64>,
    movetime: Option<Duration>,
    classical: Option<TimeControl>,
    fischer: Option<TimeControl>,
}

impl PlayerBuilder {
    fn new(name: &str) -> PlayerBuilder {
        PlayerBuilder {
            name: name.to_string(),
            family: name.to_string(),
            ..Default::default()
        }
    }

    fn time_control(&self) -> TimeControl {
        if let Some(depth) = self.depth {
            TimeControl::Depth(depth)
        } else if let Some(nodes) = self.nodes {
            TimeControl::Nodes(nodes)
        } else if let Some(time) = self.movetime {
            TimeControl::MoveTime(time)
        } else {
            self.classical.or(self.fischer).unwrap_or_default()
        }
    }

    fn finish(self) -> Result<Participant, ConfigError> {
        let Some(invocation) = self.invocation.clone() else {
            return Err(ConfigError::MissingInvoke(self.name));
        };
        for (name, value) in &self.options {
            roster::validate_option(&self.declared, name, value).map_err(|source| {
                ConfigError::PlayerOption {
                    player: self.name.clone(),
                    source,
                }
            })?;
        }
        let time_control = self.time_control();
        debug!("Player {} plays at {time_control}", self.name);
        Ok(Participant {
            id: 0,
            name: self.name,
            family: self.family,
            invocation,
            options: self.options,
            time_control,
        })
    }
}

fn seconds(value: &str) -> Option<Duration> {
    Duration::try_from_secs_f64(value.parse().ok()?).ok()
}

impl TournamentConfig {
    pub fn load(
        path: &Path,
        query: impl FnMut(&str, &Invocation) -> io::Result<Vec<String>>,
    ) -> Result<TournamentConfig, ConfigError> {
        info!("Reading configuration from {}", path.display());
        let text = fs::read_to_string(path)?;
        TournamentConfig::parse(&text, query)
    }

    /// Parses the `key = value` configuration format. `query` runs a player's
    /// `invoke` command and returns the lines it printed before `uciok`.
    pub fn parse(
        text: &str,
        mut query: impl FnMut(&str, &Invocation) -> io::Result<Vec<String>>,
    ) -> Result<TournamentConfig, ConfigError> {
        let mut config = TournamentConfig {
            title: DEFAULT_TITLE.to_string(),
            cpus: 1,
            adjudicate: DEFAULT_ADJUDICATE,
            book: None,
            game_rounds: 0,
            roster: Roster::default(),
        };
        let mut players: Vec<PlayerBuilder> = vec![];

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            if raw.trim().len() < 3 || raw.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = raw.split_once('=') else {
                return Err(ConfigError::Syntax {
                    line,
                    text: raw.to_string(),
                });
            };
            let (key, value) = (key.trim(), value.trim());
            let invalid = || ConfigError::InvalidValue {
                line,
                key: key.to_string(),
                value: value.to_string(),
            };

            match key {
                "title" => config.title = value.to_string(),
                "cpus" => {
                    config.cpus = value
                        .parse::<usize>()
                        .ok()
                        .filter(|&n| n > 0)
                        .ok_or_else(invalid)?;
                }
                "adjudicate" => {
                    let moves: i64 = value.parse().map_err(|_| invalid())?;
                    config.adjudicate = moves.clamp(2, 4000) as u32;
                }
                "book" => config.book = Some(PathBuf::from(value)),
                "game_rounds" => config.game_rounds = value.parse().map_err(|_| invalid())?,
                "player" => {
                    if players.iter().any(|p| p.name == value) {
                        return Err(ConfigError::DuplicatePlayer(value.to_string()));
                    }
                    players.push(PlayerBuilder::new(value));
                }
                _ => {
                    let Some(player) = players.last_mut() else {
                        return Err(ConfigError::NoPlayer {
                            line,
                            key: key.to_string(),
                        });
                    };
                    match key {
                        "family" => player.family = value.to_string(),
                        "invoke" => {
                            let invocation = Invocation::parse(value).ok_or_else(invalid)?;
                            let lines = query(&player.name, &invocation).map_err(|source| {
                                ConfigError::OptionQuery {
                                    player: player.name.clone(),
                                    source,
                                }
                            })?;
                            player.declared =
                                lines.iter().filter_map(|l| OptionDecl::parse(l)).collect();
                            player.invocation = Some(invocation);
                        }
                        "depth" => player.depth = Some(value.parse().map_err(|_| invalid())?),
                        "nodes" => {
                            let digits = value.replace(['.', ','], "");
                            player.nodes = Some(digits.parse().map_err(|_| invalid())?);
                        }
                        "movetime" => player.movetime = Some(seconds(value).ok_or_else(invalid)?),
                        "tc" => {
                            player.classical =
                                Some(TimeControl::parse_classical(value).ok_or_else(invalid)?);
                        }
                        "fis" => {
                            player.fischer =
                                Some(TimeControl::parse_fischer(value).ok_or_else(invalid)?);
                        }
                        "desc" => {}
                        _ => player.options.push((key.to_string(), value.to_string())),
                    }
                }
            }
        }

        if config.game_rounds == 0 {
            config.game_rounds = DEFAULT_GAME_ROUNDS;
        }
        let participants = players
            .into_iter()
            .map(PlayerBuilder::finish)
            .collect::<Result<Vec<_>, _>>()?;
        config.roster = Roster::new(participants);
        if !(0..config.roster.len())
            .tuple_combinations()
            .any(|(a, b)| config.roster.may_meet(a, b))
        {
            return Err(ConfigError::NoEligiblePairing);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: &[&str] = &[
        "id name fake",
        "option name hash type spin default 16 min 1 max 1024",
        "option name ponder type check default false",
        "option name book type string default <empty>",
    ];

    fn fake_query(_name: &str, _invocation: &Invocation) -> io::Result<Vec<String>> {
        Ok(OPTIONS.iter().map(|s| s.to_string()).collect())
    }

    fn parse(text: &str) -> Result<TournamentConfig, ConfigError> {
        TournamentConfig::parse(text, fake_query)
    }

    #[test]
    fn full_configuration() {
        let config = parse(
            "# blitz test\n\
             title = blitz\n\
             cpus = 3\n\
             adjudicate = 5000\n\
             book = openings.txt\n\
             game_rounds = 50\n\
             \n\
             player = ref\n\
             invoke = ../bin/leiserchess --quiet\n\
             fis = 60 0.5\n\
             hash = 64\n\
             ponder = true\n\
             player = ref-b\n\
             family = ref\n\
             invoke = ../bin/leiserchess\n\
             depth = 6\n\
             player = new\n\
             invoke = ./leiserchess\n\
             nodes = 1.000.000\n\
             tc = 40 60 20 30\n",
        )
        .unwrap();

        assert_eq!(config.title, "blitz");
        assert_eq!(config.cpus, 3);
        assert_eq!(config.adjudicate, 4000);
        assert_eq!(config.book, Some(PathBuf::from("openings.txt")));
        assert_eq!(config.game_rounds, 50);
        assert_eq!(config.roster.names(), ["ref", "ref-b", "new"]);

        let reference = config.roster.get(0);
        assert_eq!(reference.family, "ref");
        assert_eq!(reference.invocation.program, "../bin/leiserchess");
        assert_eq!(reference.invocation.args, ["--quiet"]);
        assert_eq!(reference.time_control.to_string(), "60s+0.5s");
        assert_eq!(
            reference.setoption_lines().collect::<Vec<_>>(),
            [
                "setoption name hash value 64",
                "setoption name ponder value true"
            ]
        );

        assert_eq!(config.roster.get(1).family, "ref");
        assert_eq!(config.roster.get(1).time_control, TimeControl::Depth(6));
        assert_eq!(config.roster.get(2).id, 2);
        assert_eq!(config.roster.get(2).time_control, TimeControl::Nodes(1_000_000));
        assert!(!config.roster.may_meet(0, 1));
        assert!(config.roster.may_meet(0, 2));
    }

    #[test]
    fn defaults() {
        let config = parse("player = a\ninvoke = ./a\nplayer = b\ninvoke = ./b\n").unwrap();
        assert_eq!(config.title, DEFAULT_TITLE);
        assert_eq!(config.cpus, 1);
        assert_eq!(config.adjudicate, DEFAULT_ADJUDICATE);
        assert_eq!(config.book, None);
        assert_eq!(config.game_rounds, DEFAULT_GAME_ROUNDS);
        assert_eq!(config.roster.get(0).time_control, TimeControl::default());
    }

    #[test]
    fn time_control_priority() {
        let config = parse(
            "player = a\ninvoke = ./a\nfis = 60 1\ntc = 40 60\nmovetime = 0.25\n\
             player = b\ninvoke = ./b\nfis = main=60 inc=1\ntc = 40 60\n",
        )
        .unwrap();
        assert_eq!(
            config.roster.get(0).time_control,
            TimeControl::MoveTime(Duration::from_millis(250))
        );
        assert_eq!(config.roster.get(1).time_control.to_string(), "40/60s");
    }

    #[test]
    fn adjudicate_lower_clamp_and_short_lines() {
        let config =
            parse("ab\nadjudicate = 1\nplayer = a\ninvoke = ./a\nplayer = b\ninvoke = ./b\n")
                .unwrap();
        assert_eq!(config.adjudicate, 2);
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(matches!(
            parse("title blitz\n"),
            Err(ConfigError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            parse("depth = 4\n"),
            Err(ConfigError::NoPlayer { line: 1, .. })
        ));
        assert!(matches!(
            parse("cpus = 0\n"),
            Err(ConfigError::InvalidValue { line: 1, .. })
        ));
        assert!(matches!(
            parse("player = a\ninvoke = ./a\ntc = 0 60\n"),
            Err(ConfigError::InvalidValue { line: 3, .. })
        ));
        for movetime in ["1e20", "-1", "inf", "NaN"] {
            assert!(matches!(
                parse(&format!("player = a\ninvoke = ./a\nmovetime = {movetime}\n")),
                Err(ConfigError::InvalidValue { line: 3, .. })
            ));
        }
        assert!(matches!(
            parse("player = a\nplayer = a\n"),
            Err(ConfigError::DuplicatePlayer(name)) if name == "a"
        ));
        assert!(matches!(
            parse("player = a\ninvoke = ./a\nplayer = b\n"),
            Err(ConfigError::MissingInvoke(name)) if name == "b"
        ));
    }

    #[test]
    fn rejects_undeclared_or_mistyped_options() {
        let base = "player = b\ninvoke = ./b\nplayer = a\ninvoke = ./a\n";
        for (line, expected) in [
            ("threads = 2", OptionError::Unknown("threads".to_string())),
            (
                "hash = lots",
                OptionError::NotInteger {
                    name: "hash".to_string(),
                    value: "lots".to_string(),
                },
            ),
            (
                "ponder = yes",
                OptionError::NotBoolean {
                    name: "ponder".to_string(),
                    value: "yes".to_string(),
                },
            ),
        ] {
            match parse(&format!("{base}{line}\n")) {
                Err(ConfigError::PlayerOption { player, source }) => {
                    assert_eq!(player, "a");
                    assert_eq!(source, expected);
                }
                other => panic!("{line}: {other:?}"),
            }
        }
        assert!(parse(&format!("{base}book = none\n")).is_ok());
    }

    #[test]
    fn option_query_failures_and_lonely_families() {
        let failing = |_: &str, _: &Invocation| -> io::Result<Vec<String>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        };
        assert!(matches!(
            TournamentConfig::parse("player = a\ninvoke = ./missing\n", failing),
            Err(ConfigError::OptionQuery { player, .. }) if player == "a"
        ));
        assert!(matches!(
            parse("player = a\ninvoke = ./a\nplayer = b\nfamily = a\ninvoke = ./b\n"),
            Err(ConfigError::NoEligiblePairing)
        ));
        assert!(matches!(
            parse("player = a\ninvoke = ./a\n"),
            Err(ConfigError::NoEligiblePairing)
        ));
    }
}
