//! Run detection over a hunk's lines.
//!
//! Highlighting, gutter classification and region lookup all walk hunks in
//! terms of deletion/addition runs. They share this one traversal so they
//! can never disagree on where a run starts or ends.

use crate::{DiffLine, LineKind};
use std::ops::Range;

/// Classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Header,
    Context,
    Deletions,
    Additions,
}

/// A classified span of line indices within a hunk.
///
/// Deletion and addition runs are maximal; header and context lines are
/// always singleton runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub kind: RunKind,
    pub lines: Range<usize>,
}

/// A deletion run and the addition run directly after it.
///
/// At least one side is non-empty. A block with both sides is a
/// modification; a block with one side is a pure deletion or insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBlock {
    pub deletions: Range<usize>,
    pub additions: Range<usize>,
}

impl ChangeBlock {
    pub fn is_modification(&self) -> bool {
        !self.deletions.is_empty() && !self.additions.is_empty()
    }
}

/// Split `lines` into ordered runs.
pub fn runs(lines: &[DiffLine]) -> Vec<Run> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let kind = match lines[i].kind {
            LineKind::HunkHeader => RunKind::Header,
            LineKind::Context => RunKind::Context,
            LineKind::Deletion => RunKind::Deletions,
            LineKind::Addition => RunKind::Additions,
        };

        let start = i;
        i += 1;
        if matches!(kind, RunKind::Deletions | RunKind::Additions) {
            while i < lines.len() && lines[i].kind == lines[start].kind {
                i += 1;
            }
        }

        result.push(Run {
            kind,
            lines: start..i,
        });
    }

    result
}

/// Pair every deletion run with the addition run that immediately follows
/// it. Addition runs with no deletion run before them form their own block.
pub fn change_blocks(lines: &[DiffLine]) -> Vec<ChangeBlock> {
    let runs = runs(lines);
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < runs.len() {
        let run = &runs[i];
        match run.kind {
            RunKind::Deletions => {
                let additions = match runs.get(i + 1) {
                    Some(next) if next.kind == RunKind::Additions => {
                        i += 1;
                        next.lines.clone()
                    }
                    _ => run.lines.end..run.lines.end,
                };
                blocks.push(ChangeBlock {
                    deletions: run.lines.clone(),
                    additions,
                });
            }
            RunKind::Additions => blocks.push(ChangeBlock {
                deletions: run.lines.start..run.lines.start,
                additions: run.lines.clone(),
            }),
            RunKind::Header | RunKind::Context => {}
        }
        i += 1;
    }

    blocks
}
