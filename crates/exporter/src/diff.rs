use std::collections::HashSet;

/// Line set-difference diff: every line present before but not after gets a
/// `-` prefix (original order), then every line present after but not before
/// gets a `+` prefix (original order).
///
/// Deliberately not a minimal-edit or aligned diff — output is a membership
/// summary, cheap and deterministic.
pub fn line_set_diff(before: &str, after: &str) -> String {
    let before_lines: Vec<&str> = before.lines().collect();
    let after_lines: Vec<&str> = after.lines().collect();
    let before_set: HashSet<&str> = before_lines.iter().copied().collect();
    let after_set: HashSet<&str> = after_lines.iter().copied().collect();

    let mut out = Vec::new();
    for line in &before_lines {
        if !after_set.contains(line) {
            out.push(format!("- {line}"));
        }
    }
    for line in &after_lines {
        if !before_set.contains(line) {
            out.push(format!("+ {line}"));
        }
    }
    out.join("\n")
}

/// Fallback when no parent-context snapshot exists: the whole fragment,
/// every line prefixed.
pub fn prefixed(fragment: &str, prefix: char) -> String {
    fragment
        .lines()
        .map(|line| format!("{prefix} {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_inputs_diff_to_nothing() {
        assert_eq!(line_set_diff("a\nb\nc", "a\nb\nc"), "");
        assert_eq!(line_set_diff("", ""), "");
    }

    #[test]
    fn empty_before_yields_only_additions() {
        let diff = line_set_diff("", "x\ny");
        assert_eq!(diff, "+ x\n+ y");
        assert!(diff.lines().all(|line| line.starts_with('+')));
    }

    #[test]
    fn removals_come_before_additions_in_original_order() {
        let before = "one\ntwo\nthree";
        let after = "one\nfour\nfive";
        assert_eq!(line_set_diff(before, after), "- two\n- three\n+ four\n+ five");
    }

    #[test]
    fn repeated_lines_are_membership_not_counted() {
        // A set difference: a line present on both sides never shows, no
        // matter how often it repeats.
        assert_eq!(line_set_diff("a\na\nb", "a\nb\nb"), "");
    }

    #[test]
    fn prefixed_marks_every_line() {
        assert_eq!(prefixed("<li>\n</li>", '+'), "+ <li>\n+ </li>");
    }
}
