//! Character-level change highlighting for paired deletion/addition lines.
//!
//! Highlighting never mutates a parsed tree. [`inline_highlights`] returns a
//! companion table keyed by line position, and [`annotate`] consumes a tree
//! and returns a new one with `inline_highlights` filled in.

use crate::group::change_blocks;
use crate::{DiffHunk, FileDiff};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

/// Default token count above which the LCS is skipped.
pub const DEFAULT_MAX_TOKENS: usize = 500;

/// Tuning for the highlighter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightOptions {
    /// Lines with more tokens than this on either side skip the token LCS
    /// and use the prefix/suffix fallback instead.
    pub max_tokens: usize,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Position of a line within a `FileDiff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineRef {
    pub hunk: usize,
    pub line: usize,
}

/// Changed byte ranges per line. Lines without an entry change as a whole.
pub type HighlightMap = HashMap<LineRef, Vec<Range<usize>>>;

/// Highlights for one old/new line pair. Empty means "whole line".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairHighlights {
    pub old: Vec<Range<usize>>,
    pub new: Vec<Range<usize>>,
}

/// Compute highlights for every paired line in `file`.
pub fn inline_highlights(file: &FileDiff, options: &HighlightOptions) -> HighlightMap {
    let mut map = HighlightMap::new();
    for (hunk_idx, hunk) in file.hunks.iter().enumerate() {
        for (line_idx, ranges) in hunk_highlights(hunk, options) {
            map.insert(
                LineRef {
                    hunk: hunk_idx,
                    line: line_idx,
                },
                ranges,
            );
        }
    }
    map
}

/// Compute highlights for one hunk, keyed by line index.
///
/// The i-th line of a deletion run pairs with the i-th line of the addition
/// run that follows it. Surplus lines on the longer side stay unhighlighted.
pub fn hunk_highlights(
    hunk: &DiffHunk,
    options: &HighlightOptions,
) -> HashMap<usize, Vec<Range<usize>>> {
    let mut result = HashMap::new();

    for block in change_blocks(&hunk.lines) {
        for (old_idx, new_idx) in block.deletions.clone().zip(block.additions.clone()) {
            let pair = line_pair_highlights(
                &hunk.lines[old_idx].text,
                &hunk.lines[new_idx].text,
                options,
            );
            if !pair.old.is_empty() {
                result.insert(old_idx, pair.old);
            }
            if !pair.new.is_empty() {
                result.insert(new_idx, pair.new);
            }
        }
    }

    result
}

/// Annotate every hunk with default options.
pub fn annotate(files: Vec<FileDiff>) -> Vec<FileDiff> {
    annotate_with(files, &HighlightOptions::default())
}

/// Consume parsed files and return them with `inline_highlights` attached.
pub fn annotate_with(files: Vec<FileDiff>, options: &HighlightOptions) -> Vec<FileDiff> {
    files
        .into_iter()
        .map(|mut file| {
            let mut table = inline_highlights(&file, options);
            for (hunk_idx, hunk) in file.hunks.iter_mut().enumerate() {
                for (line_idx, line) in hunk.lines.iter_mut().enumerate() {
                    line.inline_highlights = table.remove(&LineRef {
                        hunk: hunk_idx,
                        line: line_idx,
                    });
                }
            }
            file
        })
        .collect()
}

/// Highlight the changed parts of `old` and `new`.
pub fn line_pair_highlights(old: &str, new: &str, options: &HighlightOptions) -> PairHighlights {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);

    if old_tokens.len() > options.max_tokens || new_tokens.len() > options.max_tokens {
        log::debug!(
            "skipping token LCS ({} x {} tokens)",
            old_tokens.len(),
            new_tokens.len()
        );
        return affix_highlights(old, new);
    }

    let old_words: Vec<&str> = old_tokens.iter().map(|r| &old[r.clone()]).collect();
    let new_words: Vec<&str> = new_tokens.iter().map(|r| &new[r.clone()]).collect();
    let pairs = lcs_pairs(&old_words, &new_words);

    if pairs.is_empty() {
        return affix_highlights(old, new);
    }

    let mut old_changed = vec![true; old_tokens.len()];
    let mut new_changed = vec![true; new_tokens.len()];
    for &(i, j) in &pairs {
        old_changed[i] = false;
        new_changed[j] = false;
    }

    PairHighlights {
        old: merge_changed(&old_tokens, &old_changed),
        new: merge_changed(&new_tokens, &new_changed),
    }
}

/// Byte ranges of the whitespace-separated tokens of `s`.
fn tokenize(s: &str) -> Vec<Range<usize>> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, ch) in s.char_indices() {
        if ch.is_whitespace() {
            if let Some(s_idx) = start.take() {
                tokens.push(s_idx..i);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s_idx) = start {
        tokens.push(s_idx..s.len());
    }

    tokens
}

/// Matched `(a_index, b_index)` pairs of a longest common subsequence.
pub fn lcs_pairs<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    let m = a.len();
    let n = b.len();
    let mut table = vec![vec![0usize; n + 1]; m + 1];

    for i in 1..=m {
        for j in 1..=n {
            table[i][j] = if a[i - 1] == b[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[m][n]);
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        if a[i - 1] == b[j - 1] {
            pairs.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if table[i - 1][j] >= table[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    pairs.reverse();
    pairs
}

/// Merge runs of adjacent changed tokens into single ranges.
fn merge_changed(tokens: &[Range<usize>], changed: &[bool]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut previous_changed = false;

    for (token, &is_changed) in tokens.iter().zip(changed) {
        if is_changed {
            match ranges.last_mut() {
                Some(last) if previous_changed => last.end = token.end,
                _ => ranges.push(token.clone()),
            }
        }
        previous_changed = is_changed;
    }

    ranges
}

/// Fallback when no token matched: everything between the common prefix and
/// common suffix is changed. Without any shared affix nothing is highlighted.
fn affix_highlights(old: &str, new: &str) -> PairHighlights {
    let old_chars: Vec<(usize, char)> = old.char_indices().collect();
    let new_chars: Vec<(usize, char)> = new.char_indices().collect();

    let prefix = old_chars
        .iter()
        .zip(&new_chars)
        .take_while(|((_, a), (_, b))| a == b)
        .count();
    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|((_, a), (_, b))| a == b)
        .count();

    if prefix == 0 && suffix == 0 {
        return PairHighlights::default();
    }

    PairHighlights {
        old: middle_range(old, &old_chars, prefix, suffix),
        new: middle_range(new, &new_chars, prefix, suffix),
    }
}

fn middle_range(
    s: &str,
    chars: &[(usize, char)],
    prefix: usize,
    suffix: usize,
) -> Vec<Range<usize>> {
    let end_char = chars.len() - suffix;
    if prefix >= end_char {
        return Vec::new();
    }
    let start = chars[prefix].0;
    let end = chars.get(end_char).map_or(s.len(), |&(i, _)| i);
    vec![start..end]
}
