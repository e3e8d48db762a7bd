use crate::tc::TimeControl;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use thiserror::Error;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn parse(command_line: &str) -> Option<Invocation> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        Some(Invocation {
            program: words.next()?,
            args: words.collect(),
        })
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum OptionType {
    Spin,
    Check,
    Other(String),
}

/// One `option name <N> type <T> ...` line from an engine's `uci` reply.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OptionDecl {
    pub name: String,
    pub kind: OptionType,
}

lazy_static! {
    static ref OPTION_LINE: Regex = Regex::new(r"^option name (.*) type (\S+)").unwrap();
}

impl OptionDecl {
    pub fn parse(line: &str) -> Option<OptionDecl> {
        let captures = OPTION_LINE.captures(line.trim())?;
        let kind = match &captures[2] {
            "spin" => OptionType::Spin,
            "check" => OptionType::Check,
            other => OptionType::Other(other.to_string()),
        };
        Some(OptionDecl {
            name: captures[1].trim().to_string(),
            kind,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("option {0:?} is not declared by the engine")]
    Unknown(String),
    #[error("option {name:?} is a spin option, {value:?} is not an integer")]
    NotInteger { name: String, value: String },
    #[error("option {name:?} is a check option, {value:?} is not true or false")]
    NotBoolean { name: String, value: String },
}

pub fn validate_option(declared: &[OptionDecl], name: &str, value: &str) -> Result<(), OptionError> {
    let decl = declared
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| OptionError::Unknown(name.to_string()))?;
    match decl.kind {
        OptionType::Spin if value.parse::<i64>().is_err() => Err(OptionError::NotInteger {
            name: name.to_string(),
            value: value.to_string(),
        }),
        OptionType::Check if value != "true" && value != "false" => {
            Err(OptionError::NotBoolean {
                name: name.to_string(),
                value: value.to_string(),
            })
        }
        _ => Ok(()),
    }
}

#[derive(Clone, Debug)]
pub struct Participant {
    pub id: usize,
    pub name: String,
    /// Players sharing a family never meet.
    pub family: String,
    pub invocation: Invocation,
    pub options: Vec<(String, String)>,
    pub time_control: TimeControl,
}

impl Participant {
    pub fn setoption_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.options
            .iter()
            .map(|(name, value)| format!("setoption name {name} value {value}"))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    /// Renumbers the participants by position.
    pub fn new(mut participants: Vec<Participant>) -> Roster {
        for (id, participant) in participants.iter_mut().enumerate() {
            participant.id = id;
        }
        Roster { participants }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn get(&self, id: usize) -> &Participant {
        &self.participants[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.name == name)
    }

    pub fn may_meet(&self, a: usize, b: usize) -> bool {
        a != b && self.participants[a].family != self.participants[b].family
    }
}
