//! Per-hunk fuzzy placement: finds the target line at which a hunk's
//! original-side content matches, progressively relaxing which leading
//! and trailing context lines are treated as wildcards (the `fuzz`
//! level), the way `seek_sequence.rs`'s staged exact/rstrip/full-trim
//! passes relax comparison strictness — adapted here to the
//! context-window model this engine specifies.

use crate::translate::{contract_keywords, KeywordValues};

use super::hunk::Hunk;

pub const MAX_FUZZ: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// 1-based target line at which the hunk's (un-fuzzed) original
    /// content would begin.
    pub matched_line: u32,
    pub fuzz: u32,
}

/// Attempts to place `hunk` against `target_lines` (1-indexed
/// conceptually; `target_lines[0]` is line 1), honoring `accepted` ranges
/// (1-based, half-open `[start, end)`) that must not be overlapped.
pub fn place_hunk(
    target_lines: &[String],
    hunk: &Hunk,
    ignore_whitespace: bool,
    keywords: Option<&KeywordValues>,
    target_exists: bool,
    accepted: &[(u32, u32)],
) -> Option<Placement> {
    if hunk.is_creation() {
        return if !target_exists { Some(Placement { matched_line: 1, fuzz: 0 }) } else { None };
    }

    let original = hunk.original_lines();
    let leading = hunk.leading_context_len();
    let trailing = hunk.trailing_context_len();

    for fuzz in 0..=MAX_FUZZ {
        if fuzz as usize > leading || fuzz as usize > trailing {
            break;
        }
        let f = fuzz as usize;
        if 2 * f > original.len() {
            break;
        }
        let window = &original[f..original.len() - f];
        if window.is_empty() && f > 0 {
            continue;
        }

        if let Some(line) = try_declared_position(target_lines, hunk, f, window, ignore_whitespace, keywords, accepted) {
            return Some(Placement { matched_line: line, fuzz });
        }
        if let Some(line) = scan_backward(target_lines, hunk, f, window, ignore_whitespace, keywords, accepted) {
            return Some(Placement { matched_line: line, fuzz });
        }
        if let Some(line) = scan_forward(target_lines, hunk, f, window, ignore_whitespace, keywords, accepted) {
            return Some(Placement { matched_line: line, fuzz });
        }
    }
    None
}

/// Step 2: a one-line-window check at exactly `original_start`.
fn try_declared_position(
    target_lines: &[String],
    hunk: &Hunk,
    f: usize,
    window: &[&str],
    ignore_whitespace: bool,
    keywords: Option<&KeywordValues>,
    accepted: &[(u32, u32)],
) -> Option<u32> {
    let declared_0based = hunk.original_start.saturating_sub(1) as usize + f;
    if window_matches(target_lines, declared_0based, window, ignore_whitespace, keywords) {
        let matched_line = declared_0based as u32 + 1 - f as u32;
        if !overlaps(matched_line, hunk.original_length, accepted) {
            return Some(matched_line);
        }
    }
    None
}

/// Step 3: scan forward from line 1 up to (exclusive of) `original_start`,
/// keeping the *last* match found.
fn scan_backward(
    target_lines: &[String],
    hunk: &Hunk,
    f: usize,
    window: &[&str],
    ignore_whitespace: bool,
    keywords: Option<&KeywordValues>,
    accepted: &[(u32, u32)],
) -> Option<u32> {
    let limit = hunk.original_start.saturating_sub(1) as usize;
    let mut best = None;
    for start in 0..limit.min(target_lines.len()) {
        let pos = start + f;
        if window_matches(target_lines, pos, window, ignore_whitespace, keywords) {
            let matched_line = pos as u32 + 1 - f as u32;
            if !overlaps(matched_line, hunk.original_length, accepted) {
                best = Some(matched_line);
            }
        }
    }
    best
}

/// Step 4: scan from `original_start` to EOF, taking the *first* match.
fn scan_forward(
    target_lines: &[String],
    hunk: &Hunk,
    f: usize,
    window: &[&str],
    ignore_whitespace: bool,
    keywords: Option<&KeywordValues>,
    accepted: &[(u32, u32)],
) -> Option<u32> {
    let start_0based = hunk.original_start.saturating_sub(1) as usize;
    for start in start_0based..target_lines.len() {
        let pos = start + f;
        if window_matches(target_lines, pos, window, ignore_whitespace, keywords) {
            let matched_line = pos as u32 + 1 - f as u32;
            if !overlaps(matched_line, hunk.original_length, accepted) {
                return Some(matched_line);
            }
        }
    }
    None
}

fn window_matches(
    target_lines: &[String],
    start: usize,
    expected: &[&str],
    ignore_whitespace: bool,
    keywords: Option<&KeywordValues>,
) -> bool {
    if start + expected.len() > target_lines.len() {
        return false;
    }
    target_lines[start..start + expected.len()]
        .iter()
        .zip(expected.iter())
        .all(|(t, e)| lines_equal(t, e, ignore_whitespace, keywords))
}

fn lines_equal(target_line: &str, hunk_line: &str, ignore_whitespace: bool, keywords: Option<&KeywordValues>) -> bool {
    let normalize = |s: &str| {
        let contracted = if keywords.is_some() { contract_keywords(s) } else { s.to_string() };
        if ignore_whitespace { collapse_whitespace(&contracted) } else { contracted }
    };
    normalize(target_line) == normalize(hunk_line)
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out
}

fn overlaps(matched_line: u32, original_length: u32, accepted: &[(u32, u32)]) -> bool {
    let start = matched_line;
    let end = matched_line + original_length;
    accepted.iter().any(|&(a_start, a_end)| start < a_end && a_start < end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::hunk::HunkLine;

    fn lines(s: &[&str]) -> Vec<String> {
        s.iter().map(|l| l.to_string()).collect()
    }

    fn hunk(original_start: u32, lines: Vec<HunkLine>) -> Hunk {
        let original_length = lines
            .iter()
            .filter(|l| !matches!(l, HunkLine::Added(_)))
            .count() as u32;
        let modified_length = lines
            .iter()
            .filter(|l| !matches!(l, HunkLine::Removed(_)))
            .count() as u32;
        Hunk { original_start, original_length, modified_start: original_start, modified_length, lines }
    }

    #[test]
    fn exact_match_at_declared_position() {
        let target = lines(&["a", "b", "c", "d"]);
        let h = hunk(2, vec![HunkLine::Context("b".into()), HunkLine::Removed("c".into()), HunkLine::Added("C".into())]);
        let placement = place_hunk(&target, &h, false, None, true, &[]).unwrap();
        assert_eq!(placement.matched_line, 2);
        assert_eq!(placement.fuzz, 0);
    }

    #[test]
    fn shifted_match_found_by_scanning() {
        let target = lines(&["x", "a", "b", "c", "d"]);
        // hunk declares original_start=1 (pre-insertion file) but the
        // actual content now starts one line later.
        let h = hunk(1, vec![HunkLine::Context("a".into()), HunkLine::Removed("b".into()), HunkLine::Added("B".into())]);
        let placement = place_hunk(&target, &h, false, None, true, &[]).unwrap();
        assert_eq!(placement.matched_line, 2);
    }

    #[test]
    fn no_match_returns_none() {
        let target = lines(&["a", "b", "c"]);
        let h = hunk(1, vec![HunkLine::Context("zzz".into())]);
        assert!(place_hunk(&target, &h, false, None, true, &[]).is_none());
    }

    #[test]
    fn overlapping_candidate_is_rejected() {
        let target = lines(&["a", "b", "c", "d"]);
        let h = hunk(2, vec![HunkLine::Context("b".into())]);
        // an already-accepted hunk occupies lines [1, 3)
        let placement = place_hunk(&target, &h, false, None, true, &[(1, 3)]);
        assert!(placement.is_none());
    }

    #[test]
    fn creation_hunk_matches_only_when_target_absent() {
        let h = hunk(0, vec![HunkLine::Added("new".into())]);
        assert!(place_hunk(&[], &h, false, None, false, &[]).is_some());
        assert!(place_hunk(&[], &h, false, None, true, &[]).is_none());
    }

    #[test]
    fn ignore_whitespace_collapses_runs() {
        let target = lines(&["a   b", "c"]);
        let h = hunk(1, vec![HunkLine::Context("a b".into())]);
        assert!(place_hunk(&target, &h, true, None, true, &[]).is_some());
        assert!(place_hunk(&target, &h, false, None, true, &[]).is_none());
    }
}
