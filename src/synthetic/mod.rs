use crate::parser::hunk_id;
use crate::{DEV_NULL, DiffHunk, DiffLine, FileDiff};

/// Build the diff an untracked file would produce against an empty file.
///
/// Returns `None` for empty content, since files without hunks are not
/// represented.
pub fn new_file_diff(path: &str, content: &str) -> Option<FileDiff> {
    if content.is_empty() {
        return None;
    }

    let header = match content.lines().count() {
        1 => "@@ -0,0 +1 @@".to_string(),
        n => format!("@@ -0,0 +1,{n} @@"),
    };

    let mut lines = vec![DiffLine::header(&header)];
    for (idx, text) in content.lines().enumerate() {
        lines.push(DiffLine::addition(text, idx as u32 + 1));
    }

    let new_count = lines.len() as u32 - 1;
    let id = hunk_id(&lines);

    Some(FileDiff {
        id: path.to_string(),
        old_path: DEV_NULL.to_string(),
        new_path: path.to_string(),
        hunks: vec![DiffHunk {
            id,
            header,
            old_start: 0,
            old_count: 0,
            new_start: 1,
            new_count,
            lines,
        }],
        no_trailing_newline: !content.ends_with('\n'),
    })
}

/// Render a synthetic new-file diff as unified diff text.
pub fn new_file_diff_text(path: &str, content: &str) -> Option<String> {
    let file = new_file_diff(path, content)?;
    let hunk = file.hunks.first()?;
    Some(crate::patch::hunk_patch(&file, hunk))
}
