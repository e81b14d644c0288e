use crate::highlight::{HighlightOptions, annotate_with};
use crate::{DEV_NULL, DiffHunk, DiffLine, FileDiff};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Parse raw `git diff` output into annotated `FileDiff` entries.
///
/// Equivalent to [`parse_diff_raw`] followed by the inline highlighting
/// stage. Never fails: truncated or malformed input yields fewer files.
pub fn parse_diff(input: &str) -> Vec<FileDiff> {
    parse_diff_with(input, &HighlightOptions::default())
}

/// [`parse_diff`] with explicit highlighting options.
pub fn parse_diff_with(input: &str, options: &HighlightOptions) -> Vec<FileDiff> {
    annotate_with(parse_diff_raw(input), options)
}

/// Parse raw `git diff` output without inline highlights.
///
/// Files are delimited by `diff --git a/<old> b/<new>` headers. Metadata
/// lines between the file header and the first hunk are skipped, except
/// `--- /dev/null` and `+++ /dev/null`, which mark creation and deletion.
/// Files without any hunk (binary files, mode-only changes) are dropped.
pub fn parse_diff_raw(input: &str) -> Vec<FileDiff> {
    let lines: Vec<&str> = input.lines().collect();
    let mut files = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(rest) = lines[i].strip_prefix("diff --git ") else {
            i += 1;
            continue;
        };

        let (mut old_path, mut new_path) = parse_file_header(rest);
        i += 1;

        // Metadata until the first hunk or the next file
        while i < lines.len() {
            let current = lines[i];
            if current.starts_with("@@") || current.starts_with("diff --git ") {
                break;
            }
            if let Some(path) = current.strip_prefix("--- ")
                && path.trim_end() == DEV_NULL
            {
                old_path = DEV_NULL.to_string();
            }
            if let Some(path) = current.strip_prefix("+++ ")
                && path.trim_end() == DEV_NULL
            {
                new_path = DEV_NULL.to_string();
            }
            i += 1;
        }

        let mut hunks: Vec<DiffHunk> = Vec::new();
        let mut no_trailing_newline = false;

        while i < lines.len() && !lines[i].starts_with("diff --git ") {
            if lines[i].starts_with("@@") {
                let hunk = parse_hunk(&lines, &mut i, &mut no_trailing_newline);
                hunks.push(hunk);
            } else {
                i += 1;
            }
        }

        if hunks.is_empty() {
            log::debug!("dropping {} (no hunks)", new_path);
            continue;
        }

        let id = if new_path == DEV_NULL {
            old_path.clone()
        } else {
            new_path.clone()
        };

        files.push(FileDiff {
            id,
            old_path,
            new_path,
            hunks,
            no_trailing_newline,
        });
    }

    files
}

/// Split the part after `diff --git ` into old and new paths.
fn parse_file_header(rest: &str) -> (String, String) {
    let mut tokens = rest.split_whitespace();
    let old = tokens.next().unwrap_or("");
    let new = tokens.next().unwrap_or(old);
    (strip_side_prefix(old, "a/"), strip_side_prefix(new, "b/"))
}

fn strip_side_prefix(path: &str, prefix: &str) -> String {
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

/// Parse a single hunk starting at the `@@` line at `lines[*i]`.
///
/// Leaves `*i` on the first line that does not belong to the hunk.
fn parse_hunk(lines: &[&str], i: &mut usize, no_trailing_newline: &mut bool) -> DiffHunk {
    let header = lines[*i];
    let ranges = parse_hunk_header(header).unwrap_or_else(|| {
        log::warn!("unparseable hunk header {header:?}, assuming line 1");
        HunkRanges {
            old_start: 1,
            old_count: 1,
            new_start: 1,
            new_count: 1,
        }
    });

    let mut body = vec![DiffLine::header(header)];
    let mut old_line = ranges.old_start;
    let mut new_line = ranges.new_start;
    // Old/new lines consumed so far, compared against the declared counts
    let mut old_seen = 0u32;
    let mut new_seen = 0u32;
    *i += 1;

    while *i < lines.len() {
        let current = lines[*i];

        if current.starts_with("@@") || current.starts_with("diff --git ") {
            break;
        }

        match current.as_bytes().first() {
            Some(b'+') => {
                body.push(DiffLine::addition(&current[1..], new_line));
                new_line = new_line.saturating_add(1);
                new_seen = new_seen.saturating_add(1);
            }
            Some(b'-') => {
                body.push(DiffLine::deletion(&current[1..], old_line));
                old_line = old_line.saturating_add(1);
                old_seen = old_seen.saturating_add(1);
            }
            Some(b' ') => {
                body.push(DiffLine::context(&current[1..], old_line, new_line));
                old_line = old_line.saturating_add(1);
                new_line = new_line.saturating_add(1);
                old_seen = old_seen.saturating_add(1);
                new_seen = new_seen.saturating_add(1);
            }
            Some(b'\\') => {
                // "\ No newline at end of file" applies to the preceding line
                if body.last().is_some_and(DiffLine::is_new_side) {
                    *no_trailing_newline = true;
                }
            }
            // A blank context line may lose its leading space
            // (diff.suppressBlankEmpty); only take it while both sides still
            // expect lines.
            None if old_seen < ranges.old_count && new_seen < ranges.new_count => {
                body.push(DiffLine::context("", old_line, new_line));
                old_line = old_line.saturating_add(1);
                new_line = new_line.saturating_add(1);
                old_seen += 1;
                new_seen += 1;
            }
            None => {}
            Some(_) => {
                log::trace!("hunk body ended at {current:?}");
                *i += 1;
                break;
            }
        }
        *i += 1;
    }

    DiffHunk {
        id: hunk_id(&body),
        header: header.to_string(),
        old_start: ranges.old_start,
        old_count: ranges.old_count,
        new_start: ranges.new_start,
        new_count: ranges.new_count,
        lines: body,
    }
}

/// Ranges declared by a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkRanges {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
}

fn hunk_header_regex() -> &'static Regex {
    static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();
    HUNK_HEADER.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@")
            .expect("hunk header pattern is valid")
    })
}

/// Parse `@@ -old_start[,old_count] +new_start[,new_count] @@ [context]`.
///
/// An omitted count means 1.
fn parse_hunk_header(line: &str) -> Option<HunkRanges> {
    let caps = hunk_header_regex().captures(line)?;
    let number = |idx: usize| -> Option<u32> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(1),
        }
    };

    Some(HunkRanges {
        old_start: number(1)?,
        old_count: number(2)?,
        new_start: number(3)?,
        new_count: number(4)?,
    })
}

/// Stable identifier from the header and body of a hunk.
///
/// `lines` starts with the header line, so the hunk position is part of the
/// hash. Shared with synthetic diffs so both paths agree on ids.
pub(crate) fn hunk_id(lines: &[DiffLine]) -> String {
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update([line.kind.marker() as u8]);
        hasher.update(line.text.as_bytes());
        hasher.update(b"\n");
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LineKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_empty_diff_returns_empty() {
        assert!(parse_diff("").is_empty());
    }

    #[test]
    fn parse_single_file_single_hunk() {
        let diff = r#"diff --git a/file.txt b/file.txt
index 1234567..abcdefg 100644
--- a/file.txt
+++ b/file.txt
@@ -1,3 +1,3 @@
 line1
-line2
+line2_modified
 line3
"#;
        let files = parse_diff(diff);
        assert_eq!(files.len(), 1);
        let file = &files[0];
        assert_eq!(file.id, "file.txt");
        assert_eq!(file.old_path, "file.txt");
        assert_eq!(file.new_path, "file.txt");
        assert_eq!(file.addition_count(), 1);
        assert_eq!(file.deletion_count(), 1);
        assert!(!file.no_trailing_newline);

        let hunk = &file.hunks[0];
        assert_eq!(hunk.header, "@@ -1,3 +1,3 @@");
        assert_eq!(
            (hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count),
            (1, 3, 1, 3)
        );

        let numbers: Vec<(LineKind, Option<u32>, Option<u32>)> = hunk
            .lines
            .iter()
            .map(|l| (l.kind, l.old_line_number, l.new_line_number))
            .collect();
        assert_eq!(
            numbers,
            vec![
                (LineKind::HunkHeader, None, None),
                (LineKind::Context, Some(1), Some(1)),
                (LineKind::Deletion, Some(2), None),
                (LineKind::Addition, None, Some(2)),
                (LineKind::Context, Some(3), Some(3)),
            ]
        );
        assert_eq!(hunk.lines[2].text, "line2");
        assert_eq!(hunk.lines[3].text, "line2_modified");
    }

    #[test]
    fn parse_multiple_hunks_keeps_independent_counters() {
        let diff = r#"diff --git a/file.txt b/file.txt
--- a/file.txt
+++ b/file.txt
@@ -1,3 +1,3 @@
 line1
-line2
+line2_modified
 line3
@@ -10,2 +10,3 @@ fn tail()
 line10
+new_line
 line11
"#;
        let files = parse_diff(diff);
        assert_eq!(files[0].hunks.len(), 2);

        let second = &files[0].hunks[1];
        assert_eq!(second.header, "@@ -10,2 +10,3 @@ fn tail()");
        assert_eq!(second.lines[2].new_line_number, Some(11));
        assert_eq!(second.lines[3].old_line_number, Some(11));
        assert_eq!(second.lines[3].new_line_number, Some(12));
        assert_ne!(files[0].hunks[0].id, second.id);
    }

    #[test]
    fn parse_multiple_files() {
        let diff = r#"diff --git a/file1.txt b/file1.txt
index 1234567..abcdefg 100644
--- a/file1.txt
+++ b/file1.txt
@@ -1,1 +1,1 @@
-old
+new
diff --git a/file2.txt b/file2.txt
index 1234567..abcdefg 100644
--- a/file2.txt
+++ b/file2.txt
@@ -1,1 +1,1 @@
-old2
+new2
"#;
        let files = parse_diff(diff);
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["file1.txt", "file2.txt"]);
    }

    #[test]
    fn parse_binary_file_skipped() {
        let diff = r#"diff --git a/image.png b/image.png
index 1234567..abcdefg 100644
Binary files a/image.png and b/image.png differ
diff --git a/file.txt b/file.txt
--- a/file.txt
+++ b/file.txt
@@ -1 +1 @@
-old
+new
"#;
        let files = parse_diff(diff);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "file.txt");
    }

    #[test]
    fn parse_new_file() {
        let diff = r#"diff --git a/new.txt b/new.txt
new file mode 100644
index 0000000..abcdefg
--- /dev/null
+++ b/new.txt
@@ -0,0 +1,2 @@
+line1
+line2
"#;
        let files = parse_diff(diff);
        assert_eq!(files[0].old_path, DEV_NULL);
        assert_eq!(files[0].new_path, "new.txt");
        assert!(files[0].is_new_file());
        assert_eq!(files[0].addition_count(), 2);
    }

    #[test]
    fn parse_deleted_file_keys_by_old_path() {
        let diff = r#"diff --git a/deleted.txt b/deleted.txt
deleted file mode 100644
index abcdefg..0000000
--- a/deleted.txt
+++ /dev/null
@@ -1,2 +0,0 @@
-line1
-line2
"#;
        let files = parse_diff(diff);
        assert_eq!(files[0].id, "deleted.txt");
        assert_eq!(files[0].new_path, DEV_NULL);
        assert!(files[0].is_deleted_file());
        assert_eq!(files[0].deletion_count(), 2);
    }

    #[test]
    fn parse_renamed_file() {
        let diff = r#"diff --git a/old_name.rs b/new_name.rs
similarity index 95%
rename from old_name.rs
rename to new_name.rs
--- a/old_name.rs
+++ b/new_name.rs
@@ -1,3 +1,3 @@
 fn example() {
-    // old
+    // new
 }
"#;
        let files = parse_diff(diff);
        assert_eq!(files[0].old_path, "old_name.rs");
        assert_eq!(files[0].new_path, "new_name.rs");
        assert!(files[0].is_rename());
    }

    #[test]
    fn no_newline_marker_is_consumed() {
        let diff = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-old\n\\ No newline at end of file\n+new\n\\ No newline at end of file\n";
        let files = parse_diff(diff);
        let hunk = &files[0].hunks[0];
        assert_eq!(hunk.lines.len(), 3);
        assert!(files[0].no_trailing_newline);
    }

    #[test]
    fn no_newline_after_deletion_only_is_old_side() {
        let diff = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-old\n\\ No newline at end of file\n+new\n";
        let files = parse_diff(diff);
        assert!(!files[0].no_trailing_newline);
    }

    #[test]
    fn hunk_header_edge_cases() {
        let ranges = parse_hunk_header("@@ -5 +5 @@").unwrap();
        assert_eq!(
            ranges,
            HunkRanges {
                old_start: 5,
                old_count: 1,
                new_start: 5,
                new_count: 1
            }
        );

        let ranges = parse_hunk_header("@@ -0,0 +1,2 @@ ctx").unwrap();
        assert_eq!((ranges.old_start, ranges.old_count), (0, 0));
        assert_eq!((ranges.new_start, ranges.new_count), (1, 2));

        assert!(parse_hunk_header("@@ garbage @@").is_none());
    }

    #[test]
    fn malformed_hunk_header_falls_back_to_line_one() {
        let diff = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ bogus @@\n ctx\n-old\n+new\n";
        let files = parse_diff(diff);
        let hunk = &files[0].hunks[0];
        assert_eq!(hunk.header, "@@ bogus @@");
        assert_eq!((hunk.old_start, hunk.new_start), (1, 1));
        assert_eq!(hunk.lines[1].old_line_number, Some(1));
        assert_eq!(hunk.lines[2].old_line_number, Some(2));
        assert_eq!(hunk.lines[3].new_line_number, Some(2));
    }

    #[test]
    fn header_without_hunks_is_omitted() {
        assert!(parse_diff("diff --git a/f b/f\nold mode 100644\nnew mode 100755\n").is_empty());
    }

    #[test]
    fn line_numbers_near_u32_max_do_not_overflow() {
        let diff = "diff --git a/f b/f\n@@ -4294967295,2 +4294967295,2 @@\n a\n b\n-c\n+d\n";
        let files = parse_diff(diff);
        let hunk = &files[0].hunks[0];

        assert_eq!(hunk.old_start, u32::MAX);
        assert_eq!(hunk.lines.len(), 5);
        assert_eq!(hunk.lines[2].old_line_number, Some(u32::MAX));
        assert_eq!(hunk.lines[4].new_line_number, Some(u32::MAX));
        assert_eq!(hunk.old_range(), Some(u32::MAX..=u32::MAX));
    }

    #[test]
    fn empty_line_inside_hunk_is_blank_context() {
        let diff = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,3 +1,3 @@\n a\n\n-c\n+C\n";
        let files = parse_diff(diff);
        let hunk = &files[0].hunks[0];

        let numbers: Vec<(LineKind, &str, Option<u32>, Option<u32>)> = hunk
            .body()
            .iter()
            .map(|l| (l.kind, l.text.as_str(), l.old_line_number, l.new_line_number))
            .collect();
        assert_eq!(
            numbers,
            vec![
                (LineKind::Context, "a", Some(1), Some(1)),
                (LineKind::Context, "", Some(2), Some(2)),
                (LineKind::Deletion, "c", Some(3), None),
                (LineKind::Addition, "C", None, Some(3)),
            ]
        );
    }

    #[test]
    fn empty_line_past_declared_counts_is_skipped() {
        let diff = "diff --git a/f b/f\n@@ -1 +1 @@\n-a\n+b\n\n\n";
        let files = parse_diff(diff);
        assert_eq!(files[0].hunks[0].lines.len(), 3);
    }

    #[test]
    fn hunk_id_covers_the_header() {
        let at_one = parse_diff("diff --git a/f b/f\n@@ -1 +1 @@\n-old\n+new\n");
        let at_nine = parse_diff("diff --git a/f b/f\n@@ -9 +9 @@\n-old\n+new\n");
        assert_ne!(at_one[0].hunks[0].id, at_nine[0].hunks[0].id);
    }

    #[test]
    fn truncated_input_still_parses() {
        let diff = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,10 +1,10 @@\n ctx\n-gone";
        let files = parse_diff(diff);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].hunks[0].lines.len(), 3);

        for cut in 0..diff.len() {
            if diff.is_char_boundary(cut) {
                let _ = parse_diff(&diff[..cut]);
            }
        }
    }

    #[test]
    fn body_lines_after_foreign_line_are_ignored() {
        let diff = "diff --git a/f b/f\n@@ -1 +1 @@\n-a\n+b\nnot a diff line\n+c\n";
        let files = parse_diff(diff);
        assert_eq!(files[0].hunks[0].lines.len(), 3);
    }

    #[test]
    fn deletion_that_looks_like_file_marker_stays_in_hunk() {
        let diff = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,2 +1,1 @@\n--- a comment\n ctx\n";
        let files = parse_diff(diff);
        let hunk = &files[0].hunks[0];
        assert_eq!(hunk.lines[1].kind, LineKind::Deletion);
        assert_eq!(hunk.lines[1].text, "-- a comment");
    }

    #[test]
    fn hunk_id_is_deterministic() {
        let diff = "diff --git a/f b/f\n@@ -1 +1 @@\n-old\n+new\n";
        assert_eq!(parse_diff(diff)[0].hunks[0].id, parse_diff(diff)[0].hunks[0].id);
        assert_eq!(parse_diff(diff)[0].hunks[0].id.len(), 16);
    }

    #[test]
    fn paired_lines_are_annotated() {
        let diff = "diff --git a/f b/f\n@@ -1 +1 @@\n-foo(a, b)\n+foo(a, c)\n";
        let files = parse_diff(diff);
        assert_eq!(files[0].hunks[0].lines[1].inline_highlights, Some(vec![7..9]));
        assert_eq!(files[0].hunks[0].lines[2].inline_highlights, Some(vec![7..9]));

        let raw = parse_diff_raw(diff);
        assert_eq!(raw[0].hunks[0].lines[1].inline_highlights, None);
    }
}
