//! Command line tool enumerating the minimal correction subsets of a CNF
//! formula.

use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use log::{info, LevelFilter};

use unsatkit::io::{read_cnf, read_groups, read_mcses, read_partition, read_y_clauses};
use unsatkit::mcs::{McsConfig, McsFinder, RawOutcome};

#[derive(Debug, Parser)]
#[command(name = "mcsfind", version, about = "Enumerates the minimal correction subsets (MCSes) of a CNF formula")]
struct Args {
    /// The instance to solve, in DIMACS CNF format.
    cnf: PathBuf,

    /// MCSes of a previous run to resume from (one per line, 1-based,
    /// non-decreasing in size).
    mcses: Option<PathBuf>,

    /// Verbose output (search traces on stderr).
    #[arg(short = 'v')]
    verbose: bool,

    /// Report the elapsed time in seconds on stderr.
    #[arg(short = 's')]
    stats: bool,

    /// Exit with an error after the given number of seconds.
    #[arg(short = 't', value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Just solve the instance and report SAT/UNSAT.
    #[arg(short = 'j')]
    just_solve: bool,

    /// Solve MaxSAT: stop after the first MCS, which is one of minimum
    /// cardinality.
    #[arg(short = 'm')]
    max_sat: bool,

    /// Print a single (not necessarily minimal) unsat core extracted from
    /// the resolution derivation.
    #[arg(short = 'o')]
    one_core: bool,

    /// Find a single MUS (equivalent to '-z 1').
    #[arg(short = 'e')]
    single_mus: bool,

    /// Grow the cardinality bound by this increment (disables core
    /// guidance).
    #[arg(short = 'x', value_name = "N")]
    bound_increment: Option<usize>,

    /// Truncate each MCS to at most N entries, producing partial correction
    /// subsets.
    #[arg(short = 'z', value_name = "N")]
    size_limit: Option<usize>,

    /// File assigning clauses to groups: each line lists the 1-based clause
    /// indices of one group.
    #[arg(short = 'g', value_name = "FILE")]
    groups: Option<PathBuf>,

    /// File partitioning the clauses: each line holds the 1-based index of
    /// the last clause of a partition.
    #[arg(short = 'p', value_name = "FILE")]
    partition: Option<PathBuf>,

    /// File with extra clauses over the selector variables.
    #[arg(short = 'y', value_name = "FILE")]
    y_clauses: Option<PathBuf>,

    /// Stop reporting once the bound reaches N.
    #[arg(short = 'l', value_name = "N")]
    report_threshold: Option<usize>,

    /// Disable unsat-core guidance (not recommended; much slower).
    #[arg(short = 'u')]
    no_cores: bool,
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

    let mut cnf = read_cnf(&args.cnf)?;
    if let Some(path) = &args.groups {
        cnf.set_group_map(read_groups(path, cnf.num_clauses())?);
    }
    if let Some(path) = &args.partition {
        cnf.set_group_map(read_partition(path, cnf.num_clauses())?);
    }
    if let Some(path) = &args.y_clauses {
        cnf.set_y_clauses(read_y_clauses(path, cnf.num_selectors())?);
    }

    let mut config = McsConfig {
        max_sat: args.max_sat,
        use_cores: !args.no_cores,
        report_threshold: args.report_threshold.unwrap_or(0),
        ..McsConfig::default()
    };
    if let Some(increment) = args.bound_increment {
        config.bound_increment = increment;
        config.initial_bound = increment;
    }
    if args.single_mus {
        config.size_limit = 1;
    }
    if let Some(limit) = args.size_limit {
        config.size_limit = limit;
    }

    let mut finder = McsFinder::new(&cnf, config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.just_solve {
        match finder.solve_raw(None, None, false) {
            RawOutcome::Sat => info!("original formula is SAT"),
            RawOutcome::Unsat => info!("original formula is UNSAT"),
            RawOutcome::UnsatEarly => info!("original formula is UNSAT by propagation alone"),
        }
        report_time(args.stats, start);
        return Ok(0);
    }

    if args.one_core {
        let core: Vec<String> = finder.single_core().iter().map(ToString::to_string).collect();
        writeln!(out, "{}", core.join(" "))?;
        report_time(args.stats, start);
        return Ok(0);
    }

    if let Some(path) = &args.mcses {
        let previous = read_mcses(path, cnf.num_selectors())?;
        if !previous.is_empty() {
            finder.load_previous(previous);
            if !finder.check_for_more() {
                writeln!(out, "All MCSes included in {}, nothing more to find.", path.display())?;
                report_time(args.stats, start);
                return Ok(0);
            }
        }
    }

    info!("finding MCSes");
    finder.find_mcses(&mut out)?;
    report_time(args.stats, start);
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

fn report_time(enabled: bool, start: Instant) {
    if enabled {
        eprintln!("{:.3}", start.elapsed().as_secs_f64());
    }
}
