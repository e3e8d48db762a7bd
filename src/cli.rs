use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Perft {
        depth: u32,
    },
    Display,
    /// Play the tournament described by `config`, appending games to `log`.
    Run {
        config: PathBuf,
        log: PathBuf,
        clean: bool,
    },
}

fn usage() {
    println!("usage: leisertest <test>[.txt] [clean]");
    println!("       leisertest perft <depth>");
    println!("       leisertest display");
    println!();
    println!("\t<test>.txt: tournament configuration, games are logged to <test>.pgn");
    println!("\tclean: drop games from <test>.pgn whose players are no longer configured");
    println!("\tperft: count leaf positions from the start position");
    println!("\tdisplay: print the start position");
}

pub fn parse() -> Option<Command> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    parse_args(&args)
}

/// Returns `None` when there is nothing to run, after printing whatever the user
/// asked for or why the arguments were rejected.
pub fn parse_args(args: &[String]) -> Option<Command> {
    let mut it = args.iter();
    let Some(first) = it.next() else {
        usage();
        return None;
    };

    match first.as_str() {
        "-h" | "--help" => {
            usage();
            None
        }
        "-version" | "--version" => {
            println!("leisertest version {}", env!("CARGO_PKG_VERSION"));
            None
        }
        "perft" => {
            let Some(depth) = it.next().and_then(|d| d.parse().ok()) else {
                eprintln!("Expected a depth for perft");
                return None;
            };
            Some(Command::Perft { depth })
        }
        "display" => Some(Command::Display),
        test => {
            let base = test.strip_suffix(".txt").unwrap_or(test);
            let clean = match it.next().map(String::as_str) {
                None => false,
                Some("clean") => true,
                Some(other) => {
                    println!();
                    println!("Do not understand \"{other}\"");
                    println!("Perhaps you mean \"clean\"");
                    println!();
                    return None;
                }
            };
            Some(Command::Run {
                config: PathBuf::from(format!("{base}.txt")),
                log: PathBuf::from(format!("{base}.pgn")),
                clean,
            })
        }
    }
}
