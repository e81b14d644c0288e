//! Per-line gutter markers and "what changed here" lookups.

use crate::group::{ChangeBlock, change_blocks};
use crate::{ChangeRegion, DiffHunk, DiffLine, FileDiff};
use serde::Serialize;
use std::collections::BTreeMap;

/// Marker shown in the editor gutter for a new-file line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GutterChange {
    Added,
    Modified,
    Deleted,
}

impl GutterChange {
    pub fn symbol(&self) -> char {
        match self {
            GutterChange::Added => '+',
            GutterChange::Modified => '~',
            GutterChange::Deleted => '_',
        }
    }
}

/// Classify new-file lines of `file`.
///
/// A deletion run followed by an addition run marks the additions as
/// modified. A lone addition run is added. A lone deletion run leaves one
/// deleted marker on the nearest new-file line. The first marker assigned
/// to a line wins; context lines are never classified on their own.
pub fn classify(file: &FileDiff) -> BTreeMap<u32, GutterChange> {
    let mut markers = BTreeMap::new();

    for hunk in &file.hunks {
        for block in change_blocks(&hunk.lines) {
            if block.additions.is_empty() {
                if let Some(line) = deletion_anchor(&hunk.lines, &block) {
                    markers.entry(line).or_insert(GutterChange::Deleted);
                }
                continue;
            }

            let change = if block.is_modification() {
                GutterChange::Modified
            } else {
                GutterChange::Added
            };
            for line in &hunk.lines[block.additions.clone()] {
                if let Some(n) = line.new_line_number {
                    markers.entry(n).or_insert(change);
                }
            }
        }
    }

    markers
}

/// New-file line that stands in for a pure deletion.
///
/// Searches forward through the rest of the hunk first, then backward.
fn deletion_anchor(lines: &[DiffLine], block: &ChangeBlock) -> Option<u32> {
    lines[block.deletions.end..]
        .iter()
        .find_map(|l| l.new_line_number)
        .or_else(|| {
            lines[..block.deletions.start]
                .iter()
                .rev()
                .find_map(|l| l.new_line_number)
        })
}

/// Find the change cluster covering new-file line `line`.
///
/// Returns `None` when the line is unmodified context.
pub fn change_region(file: &FileDiff, line: u32) -> Option<ChangeRegion> {
    file.hunks.iter().find_map(|hunk| region_in_hunk(hunk, line))
}

fn region_in_hunk(hunk: &DiffHunk, line: u32) -> Option<ChangeRegion> {
    let texts = |range: std::ops::Range<usize>| -> Vec<String> {
        hunk.lines[range].iter().map(|l| l.text.clone()).collect()
    };

    for block in change_blocks(&hunk.lines) {
        let span = if block.additions.is_empty() {
            deletion_anchor(&hunk.lines, &block).map(|anchor| anchor..=anchor)
        } else {
            let added = &hunk.lines[block.additions.clone()];
            let first = added.iter().find_map(|l| l.new_line_number);
            let last = added.iter().rev().find_map(|l| l.new_line_number);
            first.zip(last).map(|(first, last)| first..=last)
        };

        if let Some(span) = span
            && span.contains(&line)
        {
            return Some(ChangeRegion {
                deleted: texts(block.deletions.clone()),
                added: texts(block.additions.clone()),
                new_lines: span,
            });
        }
    }

    None
}
