pub const DEFAULT_CONTEXT_LINES: usize = 5;

const ERROR_MARKERS: [&str; 3] = ["\"@level\":\"error\"", "\"level\":\"error\"", "error:"];

fn is_error_marking(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Collects every error-marking line together with the `context_lines` lines
/// that follow it, each block closed by a blank line. Overlapping blocks are
/// repeated, not merged. Returns an empty string when nothing matches.
/// A bare `\r` ends a line just like `\n` or `\r\n`.
pub fn extract_error_with_context(log: &str, context_lines: usize) -> String {
    let normalized = log.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.lines().collect();
    let mut selected: Vec<&str> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if !is_error_marking(line) {
            continue;
        }
        let end = index.saturating_add(context_lines).saturating_add(1).min(lines.len());
        selected.extend_from_slice(&lines[index..end]);
        selected.push("");
    }

    selected.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_marker_takes_following_window() {
        let log = "{\"@level\":\"error\",\"msg\":\"x\"}\nline2\nline3\nline4\nline5\nline6\nline7";
        let out = extract_error_with_context(log, DEFAULT_CONTEXT_LINES);
        assert_eq!(
            out,
            "{\"@level\":\"error\",\"msg\":\"x\"}\nline2\nline3\nline4\nline5\nline6\n"
        );
        assert!(!out.contains("line7"));
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        let out = extract_error_with_context("ok\nERROR: boom\nnext", 1);
        assert_eq!(out, "ERROR: boom\nnext\n");
    }

    #[test]
    fn close_markers_repeat_overlapping_lines() {
        let out = extract_error_with_context("Error: a\nError: b\ntail", 2);
        assert_eq!(out, "Error: a\nError: b\ntail\n\nError: b\ntail\n");
    }

    #[test]
    fn window_is_clamped_at_end_of_log() {
        let out = extract_error_with_context("first\nError: last", 5);
        assert_eq!(out, "Error: last\n");
    }

    #[test]
    fn bare_carriage_returns_split_lines() {
        let log = "Refreshing...\rError: timeout\rstep 1\r\nstep 2\nstep 3";
        let out = extract_error_with_context(log, 2);
        assert_eq!(out, "Error: timeout\nstep 1\nstep 2\n");
    }

    #[test]
    fn no_markers_yields_empty_output() {
        assert_eq!(extract_error_with_context("all good\nstill good", 5), "");
        assert_eq!(extract_error_with_context("", 5), "");
    }

    #[test]
    fn extraction_is_deterministic_and_idempotent() {
        let log = "a\nError: one\nb\n{\"level\":\"error\"}\nc\nd";
        let first = extract_error_with_context(log, 3);
        let second = extract_error_with_context(log, 3);
        assert_eq!(first, second);

        // Every kept block starts on a marking line, so re-running over the
        // output with a zero window keeps the marking lines only.
        let rerun = extract_error_with_context(&first, 0);
        assert!(rerun.lines().filter(|l| !l.is_empty()).all(is_error_marking));
    }
}
