//! A hand-rolled recursive-descent parser for unified-diff text. The
//! input is assumed to contain exactly one file's hunks (the `patch` CLI
//! command splits a multi-file diff into single-file chunks before
//! calling this).

use thiserror::Error;

use super::hunk::{Hunk, HunkLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPatch {
    pub old_filename: String,
    pub new_filename: String,
    pub hunks: Vec<Hunk>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: expected a '--- ' old-file header")]
    MissingOldHeader { line: usize },
    #[error("line {line}: expected a '+++ ' new-file header")]
    MissingNewHeader { line: usize },
    #[error("line {line}: malformed hunk header {text:?}")]
    BadHunkHeader { line: usize, text: String },
    #[error("line {line}: hunk body line has no +/-/space prefix: {text:?}")]
    BadHunkLine { line: usize, text: String },
    #[error("line {line}: hunk body shorter than its declared length")]
    ShortHunkBody { line: usize },
}

/// Parses a single-file unified diff into its headers and ordered hunks.
pub fn parse(input: &str) -> Result<ParsedPatch, ParseError> {
    let mut lines = input.lines().enumerate().peekable();

    let mut old_filename = None;
    let mut new_filename = None;

    while let Some(&(idx, line)) = lines.peek() {
        if let Some(rest) = line.strip_prefix("--- ") {
            old_filename = Some(first_field(rest));
            lines.next();
            match lines.next() {
                Some((_, next)) if next.strip_prefix("+++ ").is_some() => {
                    new_filename = Some(first_field(next.strip_prefix("+++ ").unwrap()));
                }
                _ => return Err(ParseError::MissingNewHeader { line: idx + 2 }),
            }
            break;
        }
        lines.next();
    }

    let old_filename = old_filename.ok_or(ParseError::MissingOldHeader { line: 1 })?;
    let new_filename = new_filename.ok_or(ParseError::MissingNewHeader { line: 1 })?;

    let mut hunks = Vec::new();
    while let Some(&(idx, line)) = lines.peek() {
        if !line.starts_with("@@") {
            lines.next();
            continue;
        }
        let (original_start, original_length, modified_start, modified_length) = parse_hunk_header(line, idx + 1)?;
        lines.next();

        let mut body = Vec::new();
        let mut orig_seen = 0u32;
        let mut mod_seen = 0u32;
        while orig_seen < original_length || mod_seen < modified_length {
            let Some((lineno, text)) = lines.next() else {
                return Err(ParseError::ShortHunkBody { line: idx + 1 });
            };
            if let Some(rest) = text.strip_prefix(' ') {
                body.push(HunkLine::Context(rest.to_string()));
                orig_seen += 1;
                mod_seen += 1;
            } else if let Some(rest) = text.strip_prefix('-') {
                body.push(HunkLine::Removed(rest.to_string()));
                orig_seen += 1;
            } else if let Some(rest) = text.strip_prefix('+') {
                body.push(HunkLine::Added(rest.to_string()));
                mod_seen += 1;
            } else if text.is_empty() {
                body.push(HunkLine::Context(String::new()));
                orig_seen += 1;
                mod_seen += 1;
            } else {
                return Err(ParseError::BadHunkLine { line: lineno + 1, text: text.to_string() });
            }
        }

        hunks.push(Hunk {
            original_start,
            original_length,
            modified_start,
            modified_length,
            lines: body,
        });
    }

    Ok(ParsedPatch { old_filename, new_filename, hunks })
}

fn first_field(s: &str) -> String {
    s.split('\t').next().unwrap_or(s).trim().to_string()
}

/// Parses `@@ -o,ol +m,ml @@` (the trailing `@@` and anything after it,
/// such as a function-context hint, is ignored).
fn parse_hunk_header(line: &str, lineno: usize) -> Result<(u32, u32, u32, u32), ParseError> {
    let bad = || ParseError::BadHunkHeader { line: lineno, text: line.to_string() };

    let rest = line.strip_prefix("@@").ok_or_else(bad)?;
    let body = rest.split("@@").next().ok_or_else(bad)?.trim();
    let mut parts = body.split_whitespace();
    let old = parts.next().ok_or_else(bad)?.strip_prefix('-').ok_or_else(bad)?;
    let new = parts.next().ok_or_else(bad)?.strip_prefix('+').ok_or_else(bad)?;

    let (old_start, old_len) = parse_range(old).ok_or_else(bad)?;
    let (new_start, new_len) = parse_range(new).ok_or_else(bad)?;
    Ok((old_start, old_len, new_start, new_len))
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    match s.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "--- a/foo.txt\n+++ b/foo.txt\n@@ -1,3 +1,3 @@\n line one\n-line two\n+line TWO\n line three\n";

    #[test]
    fn parses_headers_and_single_hunk() {
        let patch = parse(SIMPLE).unwrap();
        assert_eq!(patch.old_filename, "a/foo.txt");
        assert_eq!(patch.new_filename, "b/foo.txt");
        assert_eq!(patch.hunks.len(), 1);
        let hunk = &patch.hunks[0];
        assert_eq!(hunk.original_start, 1);
        assert_eq!(hunk.original_length, 3);
        assert_eq!(hunk.modified_length, 3);
        assert_eq!(hunk.lines.len(), 4);
    }

    #[test]
    fn creation_hunk_has_zero_original_start() {
        let text = "--- /dev/null\n+++ b/new.txt\n@@ -0,0 +1,2 @@\n+line one\n+line two\n";
        let patch = parse(text).unwrap();
        assert!(patch.hunks[0].is_creation());
        assert_eq!(patch.hunks[0].modified_length, 2);
    }

    #[test]
    fn short_hunk_body_is_an_error() {
        let text = "--- a/foo\n+++ b/foo\n@@ -1,5 +1,5 @@\n one\n two\n";
        assert!(matches!(parse(text), Err(ParseError::ShortHunkBody { .. })));
    }

    #[test]
    fn missing_new_header_is_an_error() {
        let text = "--- a/foo\n@@ -1,1 +1,1 @@\n one\n";
        assert!(matches!(parse(text), Err(ParseError::MissingNewHeader { .. })));
    }

    #[test]
    fn multiple_hunks_in_order() {
        let text = "--- a/foo\n+++ b/foo\n@@ -1,1 +1,1 @@\n-a\n+A\n@@ -10,1 +10,1 @@\n-z\n+Z\n";
        let patch = parse(text).unwrap();
        assert_eq!(patch.hunks.len(), 2);
        assert_eq!(patch.hunks[0].original_start, 1);
        assert_eq!(patch.hunks[1].original_start, 10);
    }
}
