//! Unified diff generation for dry-run previews.
//!
//! Rewrites here are literal substitutions and almost never change the
//! line count, so when both sides have the same number of lines each run
//! of changed lines becomes its own hunk. Otherwise the differing middle
//! (after the common prefix and suffix) is emitted as one hunk. No
//! context lines are included.

/// Diff `before` (absent for a new file) against `after` for `path`.
///
/// Returns an empty string when nothing changed.
pub fn generate_unified_diff(path: &str, before: Option<&str>, after: &str) -> String {
    let new_lines: Vec<&str> = after.lines().collect();

    let Some(before) = before else {
        let mut diff = format!("--- /dev/null\n+++ b/{}\n", path);
        diff.push_str(&format!("@@ -0,0 +1,{} @@\n", new_lines.len()));
        for line in &new_lines {
            diff.push_str(&format!("+{}\n", line));
        }
        return diff;
    };

    if before == after {
        return String::new();
    }

    let old_lines: Vec<&str> = before.lines().collect();
    let mut diff = format!("--- a/{}\n+++ b/{}\n", path, path);

    if old_lines.len() == new_lines.len() {
        let mut hunks = 0;
        let mut i = 0;
        while i < old_lines.len() {
            if old_lines[i] == new_lines[i] {
                i += 1;
                continue;
            }
            let start = i;
            while i < old_lines.len() && old_lines[i] != new_lines[i] {
                i += 1;
            }
            push_hunk(&mut diff, start, &old_lines[start..i], &new_lines[start..i]);
            hunks += 1;
        }
        // Only line endings differ.
        if hunks == 0 {
            return String::new();
        }
        return diff;
    }

    let prefix = old_lines
        .iter()
        .zip(&new_lines)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_lines[prefix..]
        .iter()
        .rev()
        .zip(new_lines[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    push_hunk(
        &mut diff,
        prefix,
        &old_lines[prefix..old_lines.len() - suffix],
        &new_lines[prefix..new_lines.len() - suffix],
    );
    diff
}

fn push_hunk(diff: &mut String, start: usize, old: &[&str], new: &[&str]) {
    diff.push_str(&format!(
        "@@ -{} +{} @@\n",
        range(start, old.len()),
        range(start, new.len())
    ));
    for line in old {
        diff.push_str(&format!("-{}\n", line));
    }
    for line in new {
        diff.push_str(&format!("+{}\n", line));
    }
}

/// Hunk range for a 0-based `start`; empty ranges point at the line before.
fn range(start: usize, len: usize) -> String {
    if len == 0 {
        format!("{},0", start)
    } else {
        format!("{},{}", start + 1, len)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_content_has_no_diff() {
        assert!(generate_unified_diff("A.java", Some("a\nb\n"), "a\nb\n").is_empty());
    }

    #[test]
    fn new_file_diff() {
        let diff = generate_unified_diff("view/A.java", None, "package damose.view;\nclass A {}\n");
        assert_eq!(
            diff,
            "--- /dev/null\n+++ b/view/A.java\n@@ -0,0 +1,2 @@\n\
             +package damose.view;\n+class A {}\n"
        );
    }

    #[test]
    fn separate_hunks_for_scattered_changes() {
        let before = "package damose.ui;\nimport java.util.List;\nimport damose.ui.map.X;\n";
        let after = "package damose.view;\nimport java.util.List;\nimport damose.view.map.X;\n";
        let diff = generate_unified_diff("A.java", Some(before), after);

        assert_eq!(diff.matches("@@ -").count(), 2);
        assert!(diff.contains(
            "@@ -1,1 +1,1 @@\n-package damose.ui;\n+package damose.view;\n"
        ));
        assert!(diff.contains(
            "@@ -3,1 +3,1 @@\n-import damose.ui.map.X;\n+import damose.view.map.X;\n"
        ));
        assert!(!diff.contains("java.util.List"));
    }

    #[test]
    fn line_count_change_uses_single_hunk() {
        let diff = generate_unified_diff("A.java", Some("a\nb\nc\n"), "a\nx\ny\nc\n");
        assert_eq!(
            diff,
            "--- a/A.java\n+++ b/A.java\n@@ -2,1 +2,2 @@\n-b\n+x\n+y\n"
        );
    }

    #[test]
    fn pure_insertion_has_empty_old_range() {
        let diff = generate_unified_diff("A.java", Some("a\nc\n"), "a\nb\nc\n");
        assert!(diff.contains("@@ -1,0 +2,1 @@\n+b\n"));
    }
}
