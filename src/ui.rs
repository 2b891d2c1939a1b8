//! Interactive UI: a minimal keep/delete/quit shell over one duplicate group
//! at a time, so the binary is runnable end-to-end.
//!
//! Pulls one group at a time from the detector's lazy iterator and acts
//! before asking for the next, so it never forces the whole stream into
//! memory.

use std::fmt;

use inquire::{Select, Text};
use log::{info, warn};

use crate::types::DuplicateGroup;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    KeepAll,
    DeleteByIndex,
    KeepOldest,
    KeepNewest,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::KeepAll => "Keep all",
            Action::DeleteByIndex => "Delete by index (e.g. \"2,3\")",
            Action::KeepOldest => "Keep oldest, delete the rest",
            Action::KeepNewest => "Keep newest, delete the rest",
            Action::Quit => "Quit",
        };
        write!(f, "{label}")
    }
}

const ACTIONS: [Action; 5] = [
    Action::KeepAll,
    Action::DeleteByIndex,
    Action::KeepOldest,
    Action::KeepNewest,
    Action::Quit,
];

/// Totals accumulated across the interactive session.
#[derive(Default, Debug, Clone, Copy)]
pub struct InteractSummary {
    pub groups_shown: usize,
    pub files_deleted: usize,
    pub delete_errors: usize,
    pub quit_early: bool,
}

/// Drive the interactive loop over a lazy group stream. Returns once the
/// stream is exhausted or the user quits.
pub fn run_interactive(groups: impl Iterator<Item = DuplicateGroup>) -> InteractSummary {
    let mut summary = InteractSummary::default();

    for group in groups {
        summary.groups_shown += 1;
        print_group(&group);

        let action = match Select::new("Action:", ACTIONS.to_vec()).prompt() {
            Ok(a) => a,
            Err(_) => {
                summary.quit_early = true;
                break;
            }
        };

        match action {
            Action::KeepAll => {}
            Action::Quit => {
                summary.quit_early = true;
                break;
            }
            Action::DeleteByIndex => {
                let Ok(raw) = Text::new("Indexes to delete (1-based, comma-separated):").prompt() else {
                    summary.quit_early = true;
                    break;
                };
                let indexes = parse_index_list(&raw, group.members.len());
                for i in indexes {
                    delete_member(&group, i, &mut summary);
                }
            }
            Action::KeepOldest => delete_all_but(&group, oldest_index(&group), &mut summary),
            Action::KeepNewest => delete_all_but(&group, newest_index(&group), &mut summary),
        }
    }

    summary
}

fn print_group(group: &DuplicateGroup) {
    match group.hash {
        Some(hash) => info!("duplicate group: size={} hash={:016x} members={}", group.size, hash, group.members.len()),
        None => info!("duplicate group: size={} members={}", group.size, group.members.len()),
    }
    for (i, member) in group.members.iter().enumerate() {
        info!("  [{}] {}", i + 1, member.path.display());
    }
}

fn parse_index_list(raw: &str, len: usize) -> Vec<usize> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<usize>().ok())
        .filter(|&i| i >= 1 && i <= len)
        .map(|i| i - 1)
        .collect()
}

fn oldest_index(group: &DuplicateGroup) -> usize {
    group
        .members
        .iter()
        .enumerate()
        .min_by_key(|(_, m)| m.mtime)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn newest_index(group: &DuplicateGroup) -> usize {
    group
        .members
        .iter()
        .enumerate()
        .max_by_key(|(_, m)| m.mtime)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn delete_all_but(group: &DuplicateGroup, keep: usize, summary: &mut InteractSummary) {
    for i in 0..group.members.len() {
        if i != keep {
            delete_member(group, i, summary);
        }
    }
}

fn delete_member(group: &DuplicateGroup, index: usize, summary: &mut InteractSummary) {
    let Some(member) = group.members.get(index) else {
        return;
    };
    match std::fs::remove_file(&member.path) {
        Ok(()) => summary.files_deleted += 1,
        Err(e) => {
            warn!("failed to delete {}: {}", member.path.display(), e);
            summary.delete_errors += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_index_list_filters_out_of_range_and_garbage() {
        assert_eq!(parse_index_list("1, 3, 99, x", 3), vec![0, 2]);
    }

    #[test]
    fn oldest_and_newest_pick_extremes() {
        use crate::types::FileRecord;
        use std::path::PathBuf;
        let member = |mtime: i64| FileRecord {
            id: 0,
            path: PathBuf::from(format!("/f{mtime}")),
            size: 1,
            mtime,
            ctime: 0,
            hash: None,
            scan_id: 1,
        };
        let group = DuplicateGroup {
            size: 1,
            hash: None,
            members: vec![member(30), member(10), member(20)],
        };
        assert_eq!(oldest_index(&group), 1);
        assert_eq!(newest_index(&group), 0);
    }
}
