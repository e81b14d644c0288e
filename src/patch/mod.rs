use crate::{DiffHunk, FileDiff};
use thiserror::Error;

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Errors from the checked patch entry point.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("hunk {hunk} not found in {file}")]
    UnknownHunk { file: String, hunk: String },
    #[error("cannot stage a single hunk of deleted file {0}")]
    DeletedFile(String),
}

/// Build a standalone patch that applies only `hunk` of `file`.
///
/// The hunk header is emitted verbatim; its counts are trusted rather than
/// recomputed so the patch matches what git itself produced. Only correct
/// for modified and new files; callers must not pass file deletions.
pub fn hunk_patch(file: &FileDiff, hunk: &DiffHunk) -> String {
    let path = &file.new_path;
    let mut out = String::new();

    out.push_str(&format!("diff --git a/{path} b/{path}\n"));
    if file.is_new_file() {
        out.push_str("new file mode 100644\n");
        out.push_str("--- /dev/null\n");
    } else {
        out.push_str(&format!("--- a/{path}\n"));
    }
    out.push_str(&format!("+++ b/{path}\n"));
    out.push_str(&hunk.header);
    out.push('\n');

    for line in hunk.body() {
        out.push(line.kind.marker());
        out.push_str(&line.text);
        out.push('\n');
    }

    // The marker can only follow the file's final line
    let is_last = file.hunks.last().is_some_and(|last| last.id == hunk.id);
    if file.no_trailing_newline && is_last {
        out.push_str(NO_NEWLINE_MARKER);
        out.push('\n');
    }

    out
}

impl FileDiff {
    /// Checked variant of [`hunk_patch`] for hunk-level staging.
    pub fn patch_for(&self, hunk_id: &str) -> Result<String, PatchError> {
        if self.is_deleted_file() {
            return Err(PatchError::DeletedFile(self.id.clone()));
        }
        let hunk = self.hunk(hunk_id).ok_or_else(|| PatchError::UnknownHunk {
            file: self.id.clone(),
            hunk: hunk_id.to_string(),
        })?;
        Ok(hunk_patch(self, hunk))
    }
}
