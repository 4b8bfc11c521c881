//! Blank-line cleanup of serialized Markdown

/// Collapse runs of blank lines to one and strip blank lines at both ends.
///
/// A line counts as blank when it holds nothing but whitespace; blank lines
/// that survive are emitted empty. The result never contains three
/// consecutive newlines.
///
/// ```rust
/// use pagemd::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("\n\n# Title\n\n \n\n\ntext\n\n"), "# Title\n\ntext");
/// ```
pub fn normalize_whitespace(markdown: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in markdown.lines() {
        if !line.trim().is_empty() {
            lines.push(line);
        } else if lines.last().is_some_and(|prev| !prev.is_empty()) {
            lines.push("");
        }
    }

    while lines.last() == Some(&"") {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_blank_runs() {
        assert_eq!(normalize_whitespace("a\n\n\n\nb\n\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn test_whitespace_only_lines_are_blank() {
        assert_eq!(normalize_whitespace("a\n  \n\t\n \nb"), "a\n\nb");
    }

    #[test]
    fn test_trims_leading_and_trailing_blank_lines() {
        assert_eq!(normalize_whitespace("\n \n\nbody\n\n  \n"), "body");
    }

    #[test]
    fn test_keeps_indentation_and_single_newlines() {
        assert_eq!(
            normalize_whitespace("    code\n    more\n\n* item\n  next"),
            "    code\n    more\n\n* item\n  next"
        );
    }

    #[test]
    fn test_crlf_input() {
        assert_eq!(normalize_whitespace("a\r\n\r\n\r\n\r\nb\r\n"), "a\n\nb");
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("\n\n  \n"), "");
    }

    #[test]
    fn test_never_three_newlines() {
        let input = "x\n\n\n\ny\n \n \n \nz\n\n\n";
        let output = normalize_whitespace(input);
        assert!(!output.contains("\n\n\n"));
        assert_eq!(output, "x\n\ny\n\nz");
    }
}
