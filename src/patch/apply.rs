//! Applies a sequence of placed hunks to a target's line array, producing
//! the patched content and any reject text. Output composition follows
//! the virtual-cursor procedure: the fuzz-matched leading/trailing
//! context of each hunk is copied verbatim from the target (preserving
//! whatever local variation let it match at this fuzz level); only the
//! strictly-verified middle is replaced by the hunk's modified body.

use super::hunk::Hunk;
use super::place::Placement;

pub struct ApplyResult {
    pub patched_lines: Vec<String>,
    pub rejected: Vec<usize>,
    /// The target ran out of lines before a placed hunk's declared
    /// region was fully consumed.
    pub short_read: bool,
}

/// `placements[i]` is the placement for `hunks[i]`, or `None` if it was
/// rejected at every fuzz level.
pub fn apply_hunks(target_lines: &[String], hunks: &[Hunk], placements: &[Option<Placement>]) -> ApplyResult {
    let mut out = Vec::with_capacity(target_lines.len());
    let mut cursor = 0usize;
    let mut rejected = Vec::new();
    let mut short_read = false;

    for (idx, hunk) in hunks.iter().enumerate() {
        let Some(placement) = placements[idx] else {
            rejected.push(idx);
            continue;
        };
        let f = placement.fuzz as usize;
        let leading_copy_end = (placement.matched_line as usize - 1) + f;

        if leading_copy_end > target_lines.len() || cursor > leading_copy_end {
            short_read = true;
            rejected.push(idx);
            continue;
        }
        out.extend(target_lines[cursor..leading_copy_end].iter().cloned());

        let verified_len = hunk.original_length as usize - 2 * f;
        let skip_end = leading_copy_end + verified_len;
        if skip_end > target_lines.len() {
            short_read = true;
            rejected.push(idx);
            out.truncate(out.len() - (leading_copy_end - cursor));
            continue;
        }

        let modified = hunk.modified_lines();
        let body = if modified.len() >= 2 * f { &modified[f..modified.len() - f] } else { &[] };
        out.extend(body.iter().map(|s| s.to_string()));

        cursor = skip_end;
    }

    out.extend(target_lines[cursor.min(target_lines.len())..].iter().cloned());
    ApplyResult { patched_lines: out, rejected, short_read }
}

/// Raw, untranslated reject text: one `--- .../+++ ...` header followed by
/// each rejected hunk's original unified-diff text, verbatim.
pub fn reject_text(old_filename: &str, new_filename: &str, hunks: &[Hunk], rejected: &[usize]) -> String {
    let mut out = format!("--- {old_filename}\n+++ {new_filename}\n");
    for &idx in rejected {
        let hunk = &hunks[idx];
        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            hunk.original_start, hunk.original_length, hunk.modified_start, hunk.modified_length
        ));
        for line in &hunk.lines {
            match line {
                super::hunk::HunkLine::Context(s) => out.push_str(&format!(" {s}\n")),
                super::hunk::HunkLine::Removed(s) => out.push_str(&format!("-{s}\n")),
                super::hunk::HunkLine::Added(s) => out.push_str(&format!("+{s}\n")),
            }
        }
    }
    out
}
