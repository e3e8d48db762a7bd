use lazy_static::lazy_static;
use regex::Regex;
use std::{fmt, time::Duration};

pub const DEFAULT_DEPTH: u32 = 4;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Period {
    pub moves: u32,
    pub time: Duration,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TimeControl {
    Depth(u32),
    Nodes(u64),
    MoveTime(Duration),
    /// `first.moves` moves in `first.time`, then `then.moves` more per `then.time` forever.
    Classical {
        first: Period,
        then: Period,
    },
    Fischer {
        base: Duration,
        increment: Duration,
    },
}

impl Default for TimeControl {
    fn default() -> Self {
        TimeControl::Depth(DEFAULT_DEPTH)
    }
}

/// The side to move has no clock left.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TimeForfeit;

/// Search limits sent with `go`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Directive {
    Depth(u32),
    Nodes(u64),
    MoveTime(Duration),
    MovesToGo { remaining: Duration, moves: u32 },
    Increment { remaining: Duration, increment: Duration },
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Depth(depth) => write!(f, "depth {depth}"),
            Directive::Nodes(nodes) => write!(f, "nodes {nodes}"),
            Directive::MoveTime(time) => write!(f, "movetime {}", time.as_millis()),
            Directive::MovesToGo { remaining, moves } => {
                write!(f, "time {} movestogo {moves}", remaining.as_millis())
            }
            Directive::Increment {
                remaining,
                increment,
            } => write!(
                f,
                "time {} inc {}",
                remaining.as_millis(),
                increment.as_millis()
            ),
        }
    }
}

lazy_static! {
    static ref CLASSICAL: Regex =
        Regex::new(r"^([0-9]+)\s+([0-9.]+)(?:\s+([0-9]+)\s+([0-9.]+))?$").unwrap();
    static ref FISCHER: Regex =
        Regex::new(r"^(?:main=)?([0-9.]+)\s+(?:inc=)?([0-9.]+)$").unwrap();
}

fn seconds(s: &str) -> Option<Duration> {
    Duration::try_from_secs_f64(s.parse().ok()?).ok()
}

impl TimeControl {
    /// `40 60` or `40 60 20 30`: moves and seconds, with an optional repeating period.
    /// Without the second pair the first one repeats.
    pub fn parse_classical(s: &str) -> Option<TimeControl> {
        let captures = CLASSICAL.captures(s.trim())?;
        let first = Period {
            moves: captures[1].parse().ok()?,
            time: seconds(&captures[2])?,
        };
        let then = match (captures.get(3), captures.get(4)) {
            (Some(moves), Some(time)) => Period {
                moves: moves.as_str().parse().ok()?,
                time: seconds(time.as_str())?,
            },
            _ => first,
        };
        if first.moves == 0 || then.moves == 0 {
            return None;
        }
        Some(TimeControl::Classical { first, then })
    }

    /// `60 1` or `main=60 inc=1`, both in seconds.
    pub fn parse_fischer(s: &str) -> Option<TimeControl> {
        let captures = FISCHER.captures(s.trim())?;
        Some(TimeControl::Fischer {
            base: seconds(&captures[1])?,
            increment: seconds(&captures[2])?,
        })
    }

    /// Limits for the search at `ply` (counted from the start of the game, book plies
    /// included) given the think time the side to move has already used.
    pub fn directive(&self, ply: u32, used: Duration) -> Result<Directive, TimeForfeit> {
        let own_moves = ply / 2;
        match *self {
            TimeControl::Depth(depth) => Ok(Directive::Depth(depth)),
            TimeControl::Nodes(nodes) => Ok(Directive::Nodes(nodes)),
            TimeControl::MoveTime(time) => Ok(Directive::MoveTime(time)),
            TimeControl::Classical { first, then } => {
                let mut moves = first.moves as i64 - own_moves as i64;
                let mut budget = first.time;
                while moves < 1 {
                    moves += then.moves as i64;
                    budget += then.time;
                }
                Ok(Directive::MovesToGo {
                    remaining: remaining(budget, used)?,
                    moves: moves as u32,
                })
            }
            TimeControl::Fischer { base, increment } => Ok(Directive::Increment {
                remaining: remaining(base + increment * own_moves, used)?,
                increment,
            }),
        }
    }
}

fn remaining(budget: Duration, used: Duration) -> Result<Duration, TimeForfeit> {
    match budget.checked_sub(used) {
        Some(left) if !left.is_zero() => Ok(left),
        _ => Err(TimeForfeit),
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeControl::Depth(depth) => write!(f, "depth={depth}"),
            TimeControl::Nodes(nodes) => write!(f, "nodes={nodes}"),
            TimeControl::MoveTime(time) => write!(f, "movetime={}s", time.as_secs_f64()),
            TimeControl::Classical { first, then } => {
                write!(f, "{}/{}s", first.moves, first.time.as_secs_f64())?;
                if then != first {
                    write!(f, "+{}/{}s", then.moves, then.time.as_secs_f64())?;
                }
                Ok(())
            }
            TimeControl::Fischer { base, increment } => {
                write!(f, "{}s+{}s", base.as_secs_f64(), increment.as_secs_f64())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn fixed_limits() {
        assert_eq!(
            TimeControl::default().directive(0, Duration::ZERO).unwrap().to_string(),
            "depth 4"
        );
        assert_eq!(
            TimeControl::Nodes(50000).directive(7, secs(100)).unwrap().to_string(),
            "nodes 50000"
        );
        assert_eq!(
            TimeControl::MoveTime(Duration::from_millis(1500))
                .directive(3, Duration::ZERO)
                .unwrap()
                .to_string(),
            "movetime 1500"
        );
    }

    #[test]
    fn fischer_clock() {
        let tc = TimeControl::parse_fischer("60 1").unwrap();
        assert_eq!(
            tc.directive(0, Duration::ZERO).unwrap().to_string(),
            "time 60000 inc 1000"
        );
        assert_eq!(
            tc.directive(1, Duration::ZERO).unwrap().to_string(),
            "time 60000 inc 1000"
        );
        assert_eq!(
            tc.directive(4, secs(10)).unwrap().to_string(),
            "time 52000 inc 1000"
        );
        assert_eq!(tc.directive(0, secs(60)), Err(TimeForfeit));
        assert_eq!(tc.directive(0, secs(61)), Err(TimeForfeit));
    }

    #[test]
    fn classical_clock_tops_up() {
        let tc = TimeControl::parse_classical("40 60 20 30").unwrap();
        assert_eq!(
            tc.directive(0, Duration::ZERO).unwrap().to_string(),
            "time 60000 movestogo 40"
        );
        assert_eq!(
            tc.directive(78, secs(59)).unwrap().to_string(),
            "time 1000 movestogo 1"
        );
        assert_eq!(
            tc.directive(80, secs(50)).unwrap().to_string(),
            "time 40000 movestogo 20"
        );
        assert_eq!(tc.directive(80, secs(90)), Err(TimeForfeit));
    }

    #[test]
    fn parse_forms() {
        assert_eq!(
            TimeControl::parse_classical("40 60"),
            Some(TimeControl::Classical {
                first: Period {
                    moves: 40,
                    time: secs(60)
                },
                then: Period {
                    moves: 40,
                    time: secs(60)
                },
            })
        );
        assert_eq!(
            TimeControl::parse_fischer("main=60 inc=1"),
            TimeControl::parse_fischer("60 1")
        );
        assert_eq!(
            TimeControl::parse_fischer("0.5 0.05"),
            Some(TimeControl::Fischer {
                base: Duration::from_millis(500),
                increment: Duration::from_millis(50),
            })
        );
        assert_eq!(TimeControl::parse_classical("0 60"), None);
        assert_eq!(TimeControl::parse_classical("40"), None);
        assert_eq!(TimeControl::parse_fischer("fast"), None);
        assert_eq!(TimeControl::parse_fischer("99999999999999999999999 1"), None);
        assert_eq!(TimeControl::parse_classical("40 1.2.3"), None);
    }

    #[test]
    fn display() {
        assert_eq!(TimeControl::default().to_string(), "depth=4");
        assert_eq!(
            TimeControl::parse_fischer("60 1").unwrap().to_string(),
            "60s+1s"
        );
        assert_eq!(
            TimeControl::parse_classical("40 60 20 30").unwrap().to_string(),
            "40/60s+20/30s"
        );
    }
}
