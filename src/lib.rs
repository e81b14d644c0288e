pub mod cli;
pub mod config;
pub mod group;
pub mod gutter;
pub mod highlight;
pub mod parser;
pub mod patch;
pub mod risk;
pub mod staged;
pub mod stat;
pub mod synthetic;

use serde::Serialize;
use std::ops::{Range, RangeInclusive};

/// Path used by git for the missing side of a created or deleted file.
pub const DEV_NULL: &str = "/dev/null";

/// Kind of a physical line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineKind {
    Context,
    Addition,
    Deletion,
    HunkHeader,
}

impl LineKind {
    /// Marker character this line carries in unified diff text.
    pub fn marker(&self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Addition => '+',
            LineKind::Deletion => '-',
            LineKind::HunkHeader => '@',
        }
    }
}

/// A single line in a hunk, without its leading marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
    /// Present for context and deletion lines.
    pub old_line_number: Option<u32>,
    /// Present for context and addition lines.
    pub new_line_number: Option<u32>,
    /// Changed byte ranges into `text`. `None` means the whole line changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_highlights: Option<Vec<Range<usize>>>,
}

impl DiffLine {
    pub fn header(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::HunkHeader,
            text: text.into(),
            old_line_number: None,
            new_line_number: None,
            inline_highlights: None,
        }
    }

    pub fn context(text: impl Into<String>, old_line: u32, new_line: u32) -> Self {
        Self {
            kind: LineKind::Context,
            text: text.into(),
            old_line_number: Some(old_line),
            new_line_number: Some(new_line),
            inline_highlights: None,
        }
    }

    pub fn addition(text: impl Into<String>, new_line: u32) -> Self {
        Self {
            kind: LineKind::Addition,
            text: text.into(),
            old_line_number: None,
            new_line_number: Some(new_line),
            inline_highlights: None,
        }
    }

    pub fn deletion(text: impl Into<String>, old_line: u32) -> Self {
        Self {
            kind: LineKind::Deletion,
            text: text.into(),
            old_line_number: Some(old_line),
            new_line_number: None,
            inline_highlights: None,
        }
    }

    /// Whether this line exists in the old file.
    pub fn is_old_side(&self) -> bool {
        matches!(self.kind, LineKind::Context | LineKind::Deletion)
    }

    /// Whether this line exists in the new file.
    pub fn is_new_side(&self) -> bool {
        matches!(self.kind, LineKind::Context | LineKind::Addition)
    }
}

/// A contiguous block of change.
///
/// `lines[0]` is always the hunk-header line. The `*_start`/`*_count` fields
/// are the values declared by the header, not recomputed from the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffHunk {
    /// Stable hex identifier, unique within the owning `FileDiff`.
    pub id: String,
    /// The `@@ -a,b +c,d @@` header, verbatim.
    pub header: String,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Body lines, i.e. everything after the header line.
    pub fn body(&self) -> &[DiffLine] {
        match self.lines.first() {
            Some(first) if first.kind == LineKind::HunkHeader => &self.lines[1..],
            _ => &self.lines,
        }
    }

    pub fn addition_count(&self) -> usize {
        self.count_of(LineKind::Addition)
    }

    pub fn deletion_count(&self) -> usize {
        self.count_of(LineKind::Deletion)
    }

    fn count_of(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }

    /// Number of body lines present in the old file (deletions + context).
    pub fn old_side_len(&self) -> u32 {
        self.lines.iter().filter(|l| l.is_old_side()).count() as u32
    }

    /// Closed old-file line range this hunk covers.
    ///
    /// `None` for pure insertions, which occupy no old-file lines.
    pub fn old_range(&self) -> Option<RangeInclusive<u32>> {
        let len = self.old_side_len();
        if len == 0 {
            return None;
        }
        Some(self.old_start..=self.old_start.saturating_add(len - 1))
    }

    /// Whether the hunk only adds lines.
    pub fn is_pure_insertion(&self) -> bool {
        self.old_side_len() == 0
    }
}

/// The full change for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiff {
    /// Stable key: the new path, or the old path for deletions.
    pub id: String,
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<DiffHunk>,
    /// The new side's final line has no trailing newline.
    pub no_trailing_newline: bool,
}

impl FileDiff {
    pub fn addition_count(&self) -> usize {
        self.hunks.iter().map(DiffHunk::addition_count).sum()
    }

    pub fn deletion_count(&self) -> usize {
        self.hunks.iter().map(DiffHunk::deletion_count).sum()
    }

    pub fn is_new_file(&self) -> bool {
        self.old_path == DEV_NULL
    }

    pub fn is_deleted_file(&self) -> bool {
        self.new_path == DEV_NULL
    }

    pub fn is_rename(&self) -> bool {
        !self.is_new_file() && !self.is_deleted_file() && self.old_path != self.new_path
    }

    /// Look up a hunk by its identifier.
    pub fn hunk(&self, id: &str) -> Option<&DiffHunk> {
        self.hunks.iter().find(|h| h.id == id)
    }
}

/// Taxonomy of heuristic risk annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskKind {
    DeletedErrorHandling,
    DeletedGuardCheck,
    PossibleCredential,
    ForceUnwrapAdded,
    DeletedTestAssertion,
    TodoMarker,
}

impl RiskKind {
    pub const ALL: [RiskKind; 6] = [
        RiskKind::DeletedErrorHandling,
        RiskKind::DeletedGuardCheck,
        RiskKind::PossibleCredential,
        RiskKind::ForceUnwrapAdded,
        RiskKind::DeletedTestAssertion,
        RiskKind::TodoMarker,
    ];

    /// Short human label used in flag descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            RiskKind::DeletedErrorHandling => "Deleted error handling",
            RiskKind::DeletedGuardCheck => "Deleted nil/guard check",
            RiskKind::PossibleCredential => "Possible credential",
            RiskKind::ForceUnwrapAdded => "Force unwrap added",
            RiskKind::DeletedTestAssertion => "Deleted test assertion",
            RiskKind::TodoMarker => "TODO/HACK marker added",
        }
    }
}

/// A heuristic annotation on a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskFlag {
    pub kind: RiskKind,
    /// Old line for deletion-based kinds, new line for addition-based kinds.
    pub line_number: Option<u32>,
    pub description: String,
}

/// Deleted and added text for one contiguous change cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRegion {
    pub deleted: Vec<String>,
    pub added: Vec<String>,
    /// New-file lines the region occupies.
    pub new_lines: RangeInclusive<u32>,
}

pub use parser::{parse_diff, parse_diff_raw};
pub use patch::{PatchError, hunk_patch};
