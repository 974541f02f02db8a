use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::error;

use crate::options::CliOptions;

pub const USAGE: &str = "usage:
  scrubber info <file> [--json]
  scrubber explode <file> <dir>
  scrubber frame <file> <index> <out.png>

options:
  --json                     print info as JSON
  --loop                     wrap around at either end
  --keep-all                 cache every frame, not just keyframes
  --key-frame-interval <n>   cache every n-th frame (default 15)
  --config <file>            timeline options as JSON
  --log-dir <dir>            also write logs to <dir>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Info {
        file: PathBuf,
    },
    Explode {
        file: PathBuf,
        dir: PathBuf,
    },
    Frame {
        file: PathBuf,
        index: usize,
        out: PathBuf,
    },
}

#[derive(Debug, Default)]
pub struct Args {
    pub command: Option<Command>,
    pub options: CliOptions,
    pub key_frame_interval: Option<usize>,
    pub config: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Args {
    // parse arguments, return set of unrecognized args
    pub fn parse(args: &[String]) -> (Self, BTreeSet<String>) {
        let mut unrecognized_args = BTreeSet::new();
        let mut positional: Vec<&String> = vec![];
        let mut res = Args::default();

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--json" {
                res.options.set(CliOptions::Json, true);
            } else if arg == "--loop" {
                res.options.set(CliOptions::Loop, true);
            } else if arg == "--keep-all" {
                res.options.set(CliOptions::KeepAll, true);
            } else if arg == "--key-frame-interval" {
                i += 1;
                let Some(interval) = args.get(i) else {
                    error!("key-frame-interval argument missing?");
                    continue;
                };

                match interval.parse::<usize>() {
                    Ok(interval) if interval > 0 => res.key_frame_interval = Some(interval),
                    _ => error!("key-frame-interval must be a positive number, got '{interval}'"),
                }
            } else if arg == "--config" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("config argument missing?");
                    continue;
                };
                res.config = Some(PathBuf::from(path));
            } else if arg == "--log-dir" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("log-dir argument missing?");
                    continue;
                };
                res.log_dir = Some(PathBuf::from(path));
            } else if arg.starts_with("--") {
                unrecognized_args.insert(arg.clone());
            } else {
                positional.push(arg);
            }

            i += 1;
        }

        let (command, rest) = parse_command(&positional);
        res.command = command;
        unrecognized_args.extend(rest.iter().map(|arg| (*arg).clone()));

        (res, unrecognized_args)
    }
}

/// Returns the command, if the positionals form one, and whatever is left
/// over.
fn parse_command<'a>(positional: &'a [&'a String]) -> (Option<Command>, &'a [&'a String]) {
    let name = positional.first().map(|s| s.as_str());

    match (name, positional.len()) {
        (Some("info"), 2..) => (
            Some(Command::Info {
                file: PathBuf::from(positional[1]),
            }),
            &positional[2..],
        ),
        (Some("explode"), 3..) => (
            Some(Command::Explode {
                file: PathBuf::from(positional[1]),
                dir: PathBuf::from(positional[2]),
            }),
            &positional[3..],
        ),
        (Some("frame"), 4..) => match positional[2].parse() {
            Ok(index) => (
                Some(Command::Frame {
                    file: PathBuf::from(positional[1]),
                    index,
                    out: PathBuf::from(positional[3]),
                }),
                &positional[4..],
            ),
            Err(_) => {
                error!("frame index must be a number, got '{}'", positional[2]);
                (None, positional)
            }
        },
        _ => (None, positional),
    }
}
