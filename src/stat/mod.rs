//! Companion inputs: `git diff --numstat` and `git diff --name-status`.

use crate::FileDiff;
use serde::Serialize;

/// One `--numstat` line. Counts are `None` for binary files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumStat {
    pub additions: Option<usize>,
    pub deletions: Option<usize>,
    pub path: String,
}

/// Per-file status letter from `--name-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Unmerged,
    Unknown,
}

impl FileStatus {
    pub fn from_letter(letter: char) -> Self {
        match letter {
            'A' => FileStatus::Added,
            'M' => FileStatus::Modified,
            'D' => FileStatus::Deleted,
            'R' => FileStatus::Renamed,
            'C' => FileStatus::Copied,
            'T' => FileStatus::TypeChanged,
            'U' => FileStatus::Unmerged,
            _ => FileStatus::Unknown,
        }
    }

    /// Single-character badge.
    pub fn as_char(&self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Modified => 'M',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
            FileStatus::Copied => 'C',
            FileStatus::TypeChanged => 'T',
            FileStatus::Unmerged => 'U',
            FileStatus::Unknown => '?',
        }
    }
}

/// One `--name-status` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameStatus {
    pub status: FileStatus,
    /// Source path for renames and copies.
    pub old_path: Option<String>,
    pub path: String,
}

/// Parse `<additions>\t<deletions>\t<path>` lines. Malformed lines are skipped.
pub fn parse_numstat(input: &str) -> Vec<NumStat> {
    let mut stats = Vec::new();

    for line in input.lines() {
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.splitn(3, '\t').collect();
        if parts.len() < 3 {
            log::debug!("skipping numstat line {line:?}");
            continue;
        }

        // Binary files are marked with "-"
        let count = |s: &str| -> Result<Option<usize>, ()> {
            if s == "-" {
                Ok(None)
            } else {
                s.parse().map(Some).map_err(|_| ())
            }
        };
        let (Ok(additions), Ok(deletions)) = (count(parts[0]), count(parts[1])) else {
            log::debug!("skipping numstat line {line:?}");
            continue;
        };

        stats.push(NumStat {
            additions,
            deletions,
            path: rename_target(parts[2]),
        });
    }

    stats
}

/// Resolve numstat rename notation (`old => new`, `dir/{a => b}/f`) to the
/// new path.
fn rename_target(path: &str) -> String {
    if let (Some(open), Some(close)) = (path.find('{'), path.find('}'))
        && open < close
        && let Some((_, new)) = path[open + 1..close].split_once(" => ")
    {
        let joined = format!("{}{}{}", &path[..open], new, &path[close + 1..]);
        return joined.replace("//", "/");
    }
    match path.split_once(" => ") {
        Some((_, new)) => new.to_string(),
        None => path.to_string(),
    }
}

/// Parse `<status>[score]\t<path>` and `R<score>\t<old>\t<new>` lines.
pub fn parse_name_status(input: &str) -> Vec<NameStatus> {
    let mut entries = Vec::new();

    for line in input.lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        let Some(letter) = parts[0].chars().next() else {
            continue;
        };
        let status = FileStatus::from_letter(letter);

        let entry = match parts.as_slice() {
            [_, old, new] if matches!(status, FileStatus::Renamed | FileStatus::Copied) => {
                NameStatus {
                    status,
                    old_path: Some(old.to_string()),
                    path: new.to_string(),
                }
            }
            [_, path, ..] => NameStatus {
                status,
                old_path: None,
                path: path.to_string(),
            },
            _ => {
                log::debug!("skipping name-status line {line:?}");
                continue;
            }
        };
        entries.push(entry);
    }

    entries
}

/// Per-file row of a [`DiffSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: String,
    pub status: Option<FileStatus>,
    pub hunks: usize,
    pub additions: usize,
    pub deletions: usize,
    pub binary: bool,
}

/// Aggregate counts across a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub files: Vec<FileSummary>,
    pub total_additions: usize,
    pub total_deletions: usize,
}

impl DiffSummary {
    /// Combine parsed diffs with optional numstat and name-status data.
    ///
    /// Numstat counts win over counts derived from the parsed diff. Files that
    /// only appear in numstat (e.g. binary files) are appended.
    pub fn from_parts(files: &[FileDiff], numstat: &[NumStat], statuses: &[NameStatus]) -> Self {
        let status_of = |path: &str| statuses.iter().find(|s| s.path == path).map(|s| s.status);

        let mut rows: Vec<FileSummary> = files
            .iter()
            .map(|file| {
                let stat = numstat.iter().find(|s| s.path == file.id);
                FileSummary {
                    path: file.id.clone(),
                    status: status_of(&file.id).or_else(|| Some(derived_status(file))),
                    hunks: file.hunks.len(),
                    additions: stat
                        .and_then(|s| s.additions)
                        .unwrap_or_else(|| file.addition_count()),
                    deletions: stat
                        .and_then(|s| s.deletions)
                        .unwrap_or_else(|| file.deletion_count()),
                    binary: false,
                }
            })
            .collect();

        for stat in numstat {
            if rows.iter().any(|r| r.path == stat.path) {
                continue;
            }
            rows.push(FileSummary {
                path: stat.path.clone(),
                status: status_of(&stat.path),
                hunks: 0,
                additions: stat.additions.unwrap_or(0),
                deletions: stat.deletions.unwrap_or(0),
                binary: stat.additions.is_none() && stat.deletions.is_none(),
            });
        }

        Self {
            total_additions: rows.iter().map(|r| r.additions).sum(),
            total_deletions: rows.iter().map(|r| r.deletions).sum(),
            files: rows,
        }
    }
}

fn derived_status(file: &FileDiff) -> FileStatus {
    if file.is_new_file() {
        FileStatus::Added
    } else if file.is_deleted_file() {
        FileStatus::Deleted
    } else if file.is_rename() {
        FileStatus::Renamed
    } else {
        FileStatus::Modified
    }
}
