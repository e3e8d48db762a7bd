use crate::roster::Invocation;
use lazy_static::lazy_static;
use log::{error, info, trace, warn};
use regex::Regex;
use std::{
    io::{self, BufRead, BufReader, Write},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
    time::Duration,
};
use wait_timeout::ChildExt;

const EXIT_GRACE: Duration = Duration::from_secs(5);

lazy_static! {
    static ref DEPTH: Regex = Regex::new(r" depth (\d+)").unwrap();
    static ref NODES: Regex = Regex::new(r" nodes (\d+)").unwrap();
}

/// One running engine. Once its output ends every read returns `None` and writes are
/// dropped, so callers only need to check for `None` where they wait for a reply.
#[derive(Debug)]
pub struct EngineProcess {
    name: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    died: bool,
    depth: u32,
    nodes: u64,
}

impl EngineProcess {
    pub fn spawn(name: &str, invocation: &Invocation) -> io::Result<EngineProcess> {
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(BufReader::new);
        trace!("{name}: started {invocation} (pid {})", child.id());

        Ok(EngineProcess {
            name: name.to_string(),
            child: Some(child),
            stdin,
            stdout,
            died: false,
            depth: 0,
            nodes: 0,
        })
    }

    /// Stand-in for an engine that could not be started.
    pub fn exited(name: &str) -> EngineProcess {
        EngineProcess {
            name: name.to_string(),
            child: None,
            stdin: None,
            stdout: None,
            died: true,
            depth: 0,
            nodes: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_died(&self) -> bool {
        self.died
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn send(&mut self, line: &str) {
        if self.died {
            return;
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return;
        };
        trace!("{} < {line}", self.name);
        if let Err(e) = writeln!(stdin, "{line}").and_then(|_| stdin.flush()) {
            warn!("{}: write failed: {e}", self.name);
            self.died = true;
        }
    }

    /// Bytes that are not UTF-8 are replaced rather than treated as a failure; only the
    /// end of the stream (or a failing pipe) marks the engine dead.
    fn read_line(&mut self) -> Option<String> {
        if self.died {
            return None;
        }
        let stdout = self.stdout.as_mut()?;
        let mut input = vec![];
        match stdout.read_until(b'\n', &mut input) {
            Ok(0) => {
                error!("{} disconnected", self.name);
                self.died = true;
                None
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&input).trim_end().to_string();
                trace!("{} > {line}", self.name);
                Some(line)
            }
            Err(e) => {
                error!("{}: read failed: {e}", self.name);
                self.died = true;
                None
            }
        }
    }

    /// Blocks until a line starting with `prefix` arrives, remembering the latest
    /// ` depth <n>` and ` nodes <n>` values seen on the way.
    pub fn wait_for(&mut self, prefix: &str) -> Option<String> {
        loop {
            let line = self.read_line()?;
            if let Some(captures) = DEPTH.captures(&line)
                && let Ok(depth) = captures[1].parse()
            {
                self.depth = depth;
            }
            if let Some(captures) = NODES.captures(&line)
                && let Ok(nodes) = captures[1].parse()
            {
                self.nodes = nodes;
            }
            if line.starts_with(prefix) {
                return Some(line);
            }
        }
    }

    /// Everything printed before `uciok`.
    pub fn query_options(&mut self) -> Option<Vec<String>> {
        let mut lines = vec![];
        loop {
            let line = self.read_line()?;
            if line.starts_with("uciok") {
                return Some(lines);
            }
            lines.push(line);
        }
    }

    pub fn cleanup(&mut self) {
        // Closing stdin is an end-of-file for engines that ignore `quit`.
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            match child.wait_timeout(EXIT_GRACE) {
                Ok(Some(status)) => trace!("{} exited with {status}", self.name),
                Ok(None) => {
                    warn!("{} still running after quit, killing it", self.name);
                    if let Err(e) = child.kill().and_then(|_| child.wait()) {
                        error!("{}: could not kill: {e}", self.name);
                    }
                }
                Err(e) => error!("{}: wait failed: {e}", self.name),
            }
        }
        self.stdout = None;
        self.died = true;
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Starts an engine just long enough to list the options it declares.
pub fn declared_options(name: &str, invocation: &Invocation) -> io::Result<Vec<String>> {
    info!("Testing player: {name}");
    let mut engine = EngineProcess::spawn(name, invocation)?;
    engine.send("uci");
    let declared = engine.query_options();
    engine.send("quit");
    engine.cleanup();
    declared.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{invocation} exited before uciok"),
        )
    })
}
