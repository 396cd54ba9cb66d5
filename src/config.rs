//! Configuration and command-line argument parsing

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Raw 12-bit I/Q capture, demodulated here. `-` reads stdin.
    Samples(String),
    /// Recorded frames, `{u64 timestamp}{14 bytes}` per record.
    Replay(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: Option<Input>,
    /// Pace frames by their recorded timestamps. `None` picks the
    /// default for the input kind.
    pub realtime: Option<bool>,
    pub aircraft_db: Option<String>,

    // Pipeline
    pub queue_capacity: usize,
    pub batch: usize,
    pub tick: Duration,

    // Output
    pub stats_interval: Duration,
    pub json: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: None,
            realtime: None,
            aircraft_db: None,
            queue_capacity: 1024,
            batch: 10,
            tick: Duration::from_millis(16),
            stats_interval: Duration::from_secs(5),
            json: false,
            debug: false,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone)]
pub enum Command {
    Run(Config),
    Help,
}

impl Config {
    /// Parse `std::env::args()`, exiting on `--help` or bad options.
    pub fn from_args() -> Self {
        match Self::parse_from(env::args().skip(1)) {
            Ok(Command::Run(config)) => config,
            Ok(Command::Help) => {
                print_help();
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("{}", e);
                print_help();
                std::process::exit(1);
            }
        }
    }

    pub fn parse_from<I, S>(args: I) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut config = Config::default();
        let mut ifile = None;
        let mut replay = None;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--ifile" => {
                    i += 1;
                    ifile = Some(value(&args, i)?.to_string());
                }
                "--replay" => {
                    i += 1;
                    replay = Some(value(&args, i)?.to_string());
                }
                "--realtime" => config.realtime = Some(true),
                "--no-realtime" => config.realtime = Some(false),
                "--aircraft-db" => {
                    i += 1;
                    config.aircraft_db = Some(value(&args, i)?.to_string());
                }
                "--queue-capacity" => {
                    i += 1;
                    config.queue_capacity = positive(&args, i)?;
                }
                "--batch" => {
                    i += 1;
                    config.batch = positive(&args, i)?;
                }
                "--tick-ms" => {
                    i += 1;
                    config.tick = Duration::from_millis(positive(&args, i)? as u64);
                }
                "--stats-interval" => {
                    i += 1;
                    config.stats_interval = Duration::from_secs(positive(&args, i)? as u64);
                }
                "--json" => config.json = true,
                "--debug" => config.debug = true,
                "--help" => return Ok(Command::Help),
                other => {
                    return Err(Error::InvalidArgument(format!("unknown option: {}", other)));
                }
            }
            i += 1;
        }

        config.input = match (ifile, replay) {
            (Some(path), _) => Some(Input::Samples(path)),
            (None, Some(path)) => Some(Input::Replay(path)),
            (None, None) => None,
        };
        Ok(Command::Run(config))
    }

    /// Whether frames should be paced by their timestamps.
    pub fn is_realtime(&self) -> bool {
        self.realtime
            .unwrap_or(matches!(self.input, Some(Input::Replay(_))))
    }
}

fn value(args: &[String], i: usize) -> Result<&str> {
    args.get(i).map(String::as_str).ok_or_else(|| {
        Error::InvalidArgument(format!("{} needs a value", args[i - 1]))
    })
}

fn positive(args: &[String], i: usize) -> Result<usize> {
    let raw = value(args, i)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidArgument(format!(
            "{} expects a positive integer, got {:?}",
            args[i - 1],
            raw
        ))),
    }
}

fn print_help() {
    println!(
        r#"adsb-track - ADS-B 1090ES decoder and aircraft tracker

Usage: adsb-track [OPTIONS]

Input:
  --ifile <file>           Read raw 12-bit I/Q samples (use '-' for stdin)
  --replay <file>          Read recorded frames instead of samples
  --realtime               Pace frames by their timestamps (default with --replay)
  --no-realtime            Process frames as fast as possible
  --aircraft-db <file>     CSV aircraft database (ICAO,reg,type,model,desc,wtc)

Pipeline:
  --queue-capacity <n>     Message queue capacity (default: 1024)
  --batch <n>              Messages handled per tick (default: 10)
  --tick-ms <ms>           Consumer tick period (default: 16)

Output:
  --stats-interval <s>     Seconds between statistics lines (default: 5)
  --json                   Print visible aircraft as JSON with each statistics line
  --debug                  Debug logging (RUST_LOG overrides)
  --help                   Show this help
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        match Config::parse_from(args.iter().copied()).unwrap() {
            Command::Run(config) => config,
            Command::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.input, None);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.batch, 10);
        assert_eq!(config.tick, Duration::from_millis(16));
        assert!(!config.is_realtime());
    }

    #[test]
    fn test_inputs_and_realtime() {
        let config = parse(&["--replay", "a.bin"]);
        assert_eq!(config.input, Some(Input::Replay("a.bin".into())));
        assert!(config.is_realtime());

        let config = parse(&["--replay", "a.bin", "--no-realtime"]);
        assert!(!config.is_realtime());

        let config = parse(&["--replay", "a.bin", "--ifile", "-", "--realtime"]);
        assert_eq!(config.input, Some(Input::Samples("-".into())));
        assert!(config.is_realtime());
    }

    #[test]
    fn test_numeric_options() {
        let config = parse(&["--batch", "25", "--tick-ms", "40", "--stats-interval", "2", "--json"]);
        assert_eq!(config.batch, 25);
        assert_eq!(config.tick, Duration::from_millis(40));
        assert_eq!(config.stats_interval, Duration::from_secs(2));
        assert!(config.json);
    }

    #[test]
    fn test_errors() {
        assert!(Config::parse_from(["--bogus"]).is_err());
        assert!(Config::parse_from(["--batch"]).is_err());
        assert!(Config::parse_from(["--batch", "0"]).is_err());
        assert!(Config::parse_from(["--queue-capacity", "x"]).is_err());
        assert!(matches!(Config::parse_from(["--help"]), Ok(Command::Help)));
    }
}
