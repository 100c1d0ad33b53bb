//! GitHub Actions runner file commands: step outputs, job summaries and
//! workflow error annotations.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Job summaries are capped by GitHub at 1 MiB.
pub const MAX_SUMMARY_CHARS: usize = 1_024_000;

/// The first `max` characters of `text`, never splitting a character.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Append a (possibly multiline) step output to the `$GITHUB_OUTPUT` file.
pub fn set_output(output_file: &Path, name: &str, value: &str) -> Result<()> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_file)?;
    write!(file, "{name}<<{delimiter}\n{value}\n{delimiter}\n")?;
    Ok(())
}

/// Append Markdown to the `$GITHUB_STEP_SUMMARY` file.
pub fn append_summary(summary_file: &Path, markdown: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_file)?;
    file.write_all(markdown.as_bytes())?;
    if !markdown.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// A `::error::` workflow command that marks the step as failed.
#[must_use]
pub fn error_command(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{escaped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("h\u{e9}llo", 2), "h\u{e9}");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_set_output_multiline() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        std::fs::write(&out, "existing=1\n").unwrap();

        set_output(&out, "comment", "## Title\n\nbody").unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("existing=1"));
        let header = lines.next().unwrap();
        let delimiter = header.strip_prefix("comment<<").unwrap();
        assert!(delimiter.starts_with("ghadelimiter_"));
        assert_eq!(lines.next(), Some("## Title"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("body"));
        assert_eq!(lines.next(), Some(delimiter));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_append_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join("summary.md");

        append_summary(&summary, "first").unwrap();
        append_summary(&summary, "second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&summary).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_error_command_escapes() {
        assert_eq!(error_command("bad: 100%\nmore"), "::error::bad: 100%25%0Amore");
    }
}
