//! Command line tool constructing all minimal unsatisfiable subsets from a
//! file of minimal correction subsets.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use log::LevelFilter;

use unsatkit::io::{read_covers, ReadError};
use unsatkit::mus::{MusBuilder, MusConfig};

#[derive(Debug, Parser)]
#[command(
    name = "musbuild",
    version,
    about = "Constructs all minimal unsatisfiable subsets (MUSes) from a file of MCSes.\nReads from stdin when no file is given."
)]
struct Args {
    /// The MCSes to build MUSes from, one per line as space-separated
    /// selector indices.
    mcses: Option<PathBuf>,

    /// Verbose output (search traces on stderr).
    #[arg(short = 'v')]
    verbose: bool,

    /// Report the elapsed time in seconds on stderr.
    #[arg(short = 's')]
    stats: bool,

    /// Prefix every emitted MUS with a Unix timestamp (for anytime plots).
    #[arg(short = 'T')]
    timestamps: bool,

    /// Branch and bound towards a minimum-cardinality MUS.
    #[arg(short = 'b')]
    branch_and_bound: bool,

    /// Exit with an error after the given number of seconds.
    #[arg(short = 't', value_name = "SECONDS")]
    timeout: Option<u64>,
}

fn main() {
    process::exit(match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            1
        }
    });
}

fn run() -> anyhow::Result<i32> {
    let start = Instant::now();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let usage_only = !matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion);
            e.print().context("failed to print usage")?;
            return Ok(i32::from(usage_only));
        }
    };
    configure_logging(args.verbose);
    if let Some(seconds) = args.timeout {
        arm_timeout(seconds);
    }

    let (covers, singletons) = match &args.mcses {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| ReadError::Io { path: path.display().to_string(), source: e })?;
            read_covers(BufReader::new(file), path)?
        }
        None => {
            let stdin = std::io::stdin();
            read_covers(stdin.lock(), Path::new("<stdin>"))?
        }
    };

    let config = MusConfig {
        branch_and_bound: args.branch_and_bound,
        timestamps: args.timestamps,
        ..MusConfig::default()
    };
    let mut builder = MusBuilder::new(config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    builder.enumerate(covers, singletons, &mut out)?;

    if args.stats {
        eprintln!("{:.3}", start.elapsed().as_secs_f64());
    }
    Ok(0)
}

fn configure_logging(verbose: bool) {
    let level_filter = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "c {} {}", record.level(), record.args()))
        .filter_level(level_filter)
        .init();
}

fn arm_timeout(seconds: u64) {
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(seconds));
        eprintln!("Timeout reached.");
        process::exit(1);
    });
}
