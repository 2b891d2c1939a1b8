//! Command-line surface: flag parsing and translation into a [`ScanOptions`].

use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_DB_FILENAME;
use crate::types::{HashComponents, ScanOptions};

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Parse a `+`/`-` component toggle. Any other value is rejected by clap
/// before this ever runs.
fn parse_toggle(raw: &str) -> Result<bool, String> {
    match raw {
        "+" => Ok(true),
        "-" => Ok(false),
        other => Err(format!("expected '+' or '-', got '{other}'")),
    }
}

/// Incremental, parallel duplicate-file finder with a persistent SQLite index.
#[derive(Clone, Parser)]
#[command(name = "dupefinder")]
#[command(about = "Find duplicate files by a configurable mix of size, time, name, and content.")]
pub struct Cli {
    /// Root directory to scan. Default: current directory.
    #[arg(value_name = "PATH", default_value = DefaultArgs::DIR)]
    pub path: PathBuf,

    /// Toggle the sampled-content bit. Default: off.
    #[arg(long, value_parser = parse_toggle)]
    pub content: Option<bool>,

    /// Toggle the size bit. Default: on.
    #[arg(long, value_parser = parse_toggle)]
    pub size: Option<bool>,

    /// Toggle the modification-time bit. Default: off.
    #[arg(long, value_parser = parse_toggle)]
    pub mtime: Option<bool>,

    /// Toggle the creation-time bit. Default: off.
    #[arg(long, value_parser = parse_toggle)]
    pub ctime: Option<bool>,

    /// Toggle the case-folded filename bit. Default: off.
    #[arg(long, value_parser = parse_toggle)]
    pub name: Option<bool>,

    /// Worker thread count. Default: number of CPUs.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Path to the index database.
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Ignore the cache; treat every path as new.
    #[arg(long)]
    pub full_scan: bool,

    /// Verbose (debug-level) logging.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the component toggles into a [`HashComponents`] mask. Size is
    /// on by default; every other component defaults off.
    pub fn components(&self) -> HashComponents {
        let mut mask = HashComponents::NONE;
        if self.content.unwrap_or(false) {
            mask.insert(HashComponents::CONTENT);
        }
        if self.size.unwrap_or(true) {
            mask.insert(HashComponents::SIZE);
        }
        if self.mtime.unwrap_or(false) {
            mask.insert(HashComponents::MODIFIED);
        }
        if self.ctime.unwrap_or(false) {
            mask.insert(HashComponents::CREATED);
        }
        if self.name.unwrap_or(false) {
            mask.insert(HashComponents::FILENAME);
        }
        mask
    }

    /// Database path, defaulting to [`DEFAULT_DB_FILENAME`] inside the scan root.
    pub fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| self.path.join(DEFAULT_DB_FILENAME))
    }

    pub fn to_scan_options(&self) -> ScanOptions {
        ScanOptions {
            root: self.path.clone(),
            db_path: self.db_path(),
            workers: self.workers.unwrap_or_else(num_cpus::get),
            components: self.components(),
            full_scan: self.full_scan,
            follow_links: false,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_defaults_on_others_off() {
        let cli = Cli::parse_from(["dupefinder", "/tmp"]);
        let mask = cli.components();
        assert!(mask.contains(HashComponents::SIZE));
        assert!(!mask.contains(HashComponents::CONTENT));
        assert!(!mask.contains(HashComponents::MODIFIED));
    }

    #[test]
    fn toggles_flip_defaults_in_both_directions() {
        let cli = Cli::parse_from(["dupefinder", "/tmp", "--content", "+", "--size", "-"]);
        let mask = cli.components();
        assert!(mask.contains(HashComponents::CONTENT));
        assert!(!mask.contains(HashComponents::SIZE));
    }

    #[test]
    fn db_path_defaults_under_root() {
        let cli = Cli::parse_from(["dupefinder", "/tmp/root"]);
        assert_eq!(cli.db_path(), PathBuf::from("/tmp/root/.dups.db"));
    }

    #[test]
    fn invalid_toggle_value_is_rejected() {
        let result = Cli::try_parse_from(["dupefinder", "/tmp", "--content", "maybe"]);
        assert!(result.is_err());
    }
}
