//! dupefinder CLI: find duplicate files under a root directory.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;

use dupefinder::cli::Cli;
use dupefinder::orchestrator;
use dupefinder::utils::setup_logging;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let opts = cli.to_scan_options();
    let report = orchestrator::run(&opts)?;

    log::info!(
        "scanned {} ({} updated, {} unchanged, {} errors); {} duplicate group(s); {} file(s) deleted; {} row(s) swept",
        report.scan.scanned,
        report.scan.updated,
        report.scan.skipped_unchanged,
        report.scan.skipped_error,
        report.duplicate_groups,
        report.interact.files_deleted,
        report.rows_swept,
    );
    log::debug!("total time: {:?}", start_time.elapsed());

    Ok(())
}
