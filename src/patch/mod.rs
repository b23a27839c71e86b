//! Fuzzy patch-application engine: resolves unified-diff targets inside a
//! working copy, places each hunk with progressively relaxed context
//! matching, applies or rejects it, and classifies the net effect on the
//! WCDB node.

pub mod apply;
pub mod engine;
pub mod hunk;
pub mod parse;
pub mod place;
pub mod target;

pub use engine::{apply_patch_to_target, cleanup_empty_ancestors, Cancellation, NeverCancelled, PatchOptions, TargetOutcome};
pub use hunk::{Hunk, HunkLine};
pub use parse::{parse, ParseError, ParsedPatch};
pub use place::{place_hunk, Placement, MAX_FUZZ};
pub use target::{resolve_target, ResolvedTarget, SkipReason, TargetResolution};

/// Splits a multi-file unified-diff document into per-file chunks, each
/// starting at a `--- ` header. A document with no `--- ` header at all
/// yields a single chunk (the caller's `parse` will then report a useful
/// error rather than this function silently dropping content).
pub fn split_document(document: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in document.split_inclusive('\n') {
        if line.starts_with("--- ") && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_two_file_diff_into_two_chunks() {
        let doc = "--- a/one\n+++ b/one\n@@ -1,1 +1,1 @@\n-x\n+X\n--- a/two\n+++ b/two\n@@ -1,1 +1,1 @@\n-y\n+Y\n";
        let chunks = split_document(doc);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("a/one"));
        assert!(chunks[1].contains("a/two"));
    }

    #[test]
    fn single_file_document_yields_one_chunk() {
        let doc = "--- a/one\n+++ b/one\n@@ -1,1 +1,1 @@\n-x\n+X\n";
        assert_eq!(split_document(doc).len(), 1);
    }
}
