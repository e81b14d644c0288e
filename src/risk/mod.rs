//! Heuristic risk flags for hunks.
//!
//! Rules are lexical patterns, not language parsers. False positives and
//! false negatives are expected; scanning never fails.

use crate::{DiffHunk, DiffLine, LineKind, RiskFlag, RiskKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Default number of leading bytes of a line that rules look at.
pub const DEFAULT_MAX_LINE_BYTES: usize = 4096;

/// Default excerpt length in flag descriptions.
pub const DEFAULT_EXCERPT_CHARS: usize = 60;

/// Tuning for the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Only this many leading bytes of each line are matched.
    pub max_line_bytes: usize,
    /// Maximum characters of the triggering line quoted in a description.
    pub excerpt_chars: usize,
    /// Rules that never fire.
    pub disabled: Vec<RiskKind>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            disabled: Vec::new(),
        }
    }
}

struct Rule {
    kind: RiskKind,
    /// Line kind the rule applies to.
    on: LineKind,
    pattern: Regex,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let rule = |kind, on, pattern: &str| Rule {
            kind,
            on,
            pattern: Regex::new(pattern).expect("risk rule pattern is valid"),
        };
        vec![
            rule(
                RiskKind::DeletedErrorHandling,
                LineKind::Deletion,
                r"\b(try|catch|except|rescue|finally|throw|throws|raise)\b|\berr\s*!=\s*nil\b|\.map_err\(|\.catch\(|\?;|\bon_error\b",
            ),
            rule(
                RiskKind::DeletedGuardCheck,
                LineKind::Deletion,
                r"(==|!=|===|!==)\s*(nil|null|None|undefined|NULL)\b|\b(nil|null|None|undefined|NULL)\s*(==|!=|===|!==)|\bis\s+(not\s+)?None\b|\b(is_none|is_some|is_null|isEmpty|is_empty)\(|\bguard\s+(let|var)?\b|\bif\s+let\s+Some\b",
            ),
            rule(
                RiskKind::DeletedTestAssertion,
                LineKind::Deletion,
                r"\b(assert\w*|XCTAssert\w*|expect|should)!?\s*\(|\.should\b|\bassert\s",
            ),
            rule(
                RiskKind::PossibleCredential,
                LineKind::Addition,
                r#"(?i)(api[_-]?key|secret|passw(or)?d|passwd|token|access[_-]?key|private[_-]?key|auth)\w*["']?\s*[:=]+\s*["'][^"'\s]{6,}["']|\bAKIA[0-9A-Z]{16}\b|-----BEGIN [A-Z ]*PRIVATE KEY-----|\bgh[pousr]_[A-Za-z0-9]{20,}\b"#,
            ),
            rule(
                RiskKind::ForceUnwrapAdded,
                LineKind::Addition,
                r"\.unwrap\(\)|\.expect\(|\btry!|\bas!|!!|\w!\.|\w!\s*$|\w!\)",
            ),
            rule(
                RiskKind::TodoMarker,
                LineKind::Addition,
                r"\b(TODO|FIXME|HACK|XXX)\b",
            ),
        ]
    })
}

/// Scan a hunk with default options.
pub fn scan_hunk(hunk: &DiffHunk) -> Vec<RiskFlag> {
    scan_hunk_with(hunk, &ScanOptions::default())
}

/// Evaluate every enabled rule against the hunk's changed lines.
///
/// Flags are ordered by line, then by rule. Several flags may fire on one
/// line.
pub fn scan_hunk_with(hunk: &DiffHunk, options: &ScanOptions) -> Vec<RiskFlag> {
    let mut flags = Vec::new();

    for line in hunk.body() {
        if !matches!(line.kind, LineKind::Addition | LineKind::Deletion) {
            continue;
        }
        let text = clip(&line.text, options.max_line_bytes);

        for rule in rules() {
            if rule.on != line.kind || options.disabled.contains(&rule.kind) {
                continue;
            }
            if rule.pattern.is_match(text) {
                flags.push(flag(rule.kind, line, options.excerpt_chars));
            }
        }
    }

    flags
}

fn flag(kind: RiskKind, line: &DiffLine, excerpt_chars: usize) -> RiskFlag {
    let line_number = match line.kind {
        LineKind::Deletion => line.old_line_number,
        _ => line.new_line_number,
    };
    RiskFlag {
        kind,
        line_number,
        description: format!("{}: {}", kind.label(), excerpt(&line.text, excerpt_chars)),
    }
}

/// Leading `max_bytes` of `s`, cut on a char boundary.
fn clip(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Trimmed excerpt of at most `max_chars` characters.
///
/// The `...` marker counts toward the limit and is itself cut short when the
/// limit is below three.
fn excerpt(s: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";

    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let marker = &ELLIPSIS[..max_chars.min(ELLIPSIS.len())];
    let keep = max_chars - marker.len();
    let mut out: String = trimmed.chars().take(keep).collect();
    out.push_str(marker);
    out
}
