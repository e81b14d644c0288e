use crate::FileDiff;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Ids of hunks in `worktree` that are already (at least partly) staged.
///
/// `worktree` is the full diff of a file and `staged` its index diff. Both
/// must be computed against the same base revision; results are undefined
/// otherwise. Hunk boundaries may differ between the two, so hunks are
/// matched by overlap of their old-file line ranges rather than by identity.
/// Pure insertions occupy no old-file lines and are never reported.
pub fn staged_hunk_ids(worktree: &FileDiff, staged: &FileDiff) -> HashSet<String> {
    let staged_ranges: Vec<RangeInclusive<u32>> =
        staged.hunks.iter().filter_map(|h| h.old_range()).collect();

    if staged_ranges.is_empty() {
        return HashSet::new();
    }

    worktree
        .hunks
        .iter()
        .filter(|hunk| {
            hunk.old_range()
                .is_some_and(|range| staged_ranges.iter().any(|s| overlaps(&range, s)))
        })
        .map(|hunk| hunk.id.clone())
        .collect()
}

/// Run [`staged_hunk_ids`] for every worktree file that has a staged
/// counterpart with the same id.
pub fn staged_hunks_by_file<'a>(
    worktree: &'a [FileDiff],
    staged: &[FileDiff],
) -> Vec<(&'a str, HashSet<String>)> {
    worktree
        .iter()
        .filter_map(|file| {
            let index = staged.iter().find(|s| s.id == file.id)?;
            let ids = staged_hunk_ids(file, index);
            (!ids.is_empty()).then_some((file.id.as_str(), ids))
        })
        .collect()
}

fn overlaps(a: &RangeInclusive<u32>, b: &RangeInclusive<u32>) -> bool {
    a.start() <= b.end() && b.start() <= a.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_diff;

    const WORKTREE: &str = r#"diff --git a/f.txt b/f.txt
--- a/f.txt
+++ b/f.txt
@@ -1,3 +1,3 @@
 a
-b
+B
 c
@@ -20,3 +20,3 @@
 t
-u
+U
 v
@@ -40,0 +41,1 @@
+inserted
"#;

    #[test]
    fn overlapping_hunk_is_staged() {
        let staged = parse_diff(
            "diff --git a/f.txt b/f.txt\n--- a/f.txt\n+++ b/f.txt\n@@ -21 +21 @@\n-u\n+U\n",
        );
        let worktree = parse_diff(WORKTREE);
        let ids = staged_hunk_ids(&worktree[0], &staged[0]);

        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&worktree[0].hunks[1].id));
    }

    #[test]
    fn differently_split_staged_hunk_still_matches() {
        let staged = parse_diff(
            "diff --git a/f.txt b/f.txt\n@@ -1,25 +1,25 @@\n a\n-b\n+B\n c\n d\n e\n f\n g\n h\n i\n j\n k\n l\n m\n n\n o\n p\n q\n r\n s\n t\n-u\n+U\n v\n w\n x\n",
        );
        let worktree = parse_diff(WORKTREE);
        let ids = staged_hunk_ids(&worktree[0], &staged[0]);

        assert!(ids.contains(&worktree[0].hunks[0].id));
        assert!(ids.contains(&worktree[0].hunks[1].id));
        assert!(!ids.contains(&worktree[0].hunks[2].id));
    }

    #[test]
    fn pure_insertion_is_never_staged() {
        let staged = parse_diff(
            "diff --git a/f.txt b/f.txt\n@@ -38,5 +38,5 @@\n 38\n 39\n-40\n+forty\n 41\n 42\n",
        );
        let worktree = parse_diff(WORKTREE);
        let insertion = &worktree[0].hunks[2];
        assert!(insertion.is_pure_insertion());

        let ids = staged_hunk_ids(&worktree[0], &staged[0]);
        assert!(!ids.contains(&insertion.id));
    }

    #[test]
    fn staged_pure_insertions_contribute_no_range() {
        let staged = parse_diff("diff --git a/f.txt b/f.txt\n@@ -2,0 +3,1 @@\n+x\n");
        let worktree = parse_diff(WORKTREE);
        assert!(staged_hunk_ids(&worktree[0], &staged[0]).is_empty());
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        assert!(!overlaps(&(1..=3), &(4..=6)));
        assert!(overlaps(&(1..=4), &(4..=6)));
        assert!(overlaps(&(5..=5), &(1..=9)));
    }

    #[test]
    fn by_file_matches_on_id() {
        let worktree = parse_diff(WORKTREE);
        let staged = parse_diff(
            "diff --git a/other.txt b/other.txt\n@@ -1 +1 @@\n-a\n+b\ndiff --git a/f.txt b/f.txt\n@@ -2 +2 @@\n-b\n+B\n",
        );
        let result = staged_hunks_by_file(&worktree, &staged);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "f.txt");
        assert!(result[0].1.contains(&worktree[0].hunks[0].id));
    }
}
