//! Keep only the lines of preprocessor output that belong to one file.
//!
//! Usage:
//!   qc_filter [-v] TARGET < merged.i > target-only.h
//!
//! Line markers (`# 12 "file.h"`) switch output on when they name TARGET and off
//! otherwise; the markers themselves are dropped.

use clap::Parser as ClapParser;
use qcgen::{filter, logger};
use std::io;

#[derive(ClapParser, Debug)]
#[command(name = "qc_filter", version, about = "Keep the lines of preprocessor output that belong to one file")]
struct Args {
    /// File name whose lines are kept, as spelled in the line markers
    target: String,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbose);

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    let stats = filter::filter_stream(&args.target, stdin, io::BufWriter::new(stdout))?;
    log::info!(
        "{}: kept {} of {} line(s)",
        args.target,
        stats.lines_written,
        stats.lines_read
    );
    Ok(())
}
