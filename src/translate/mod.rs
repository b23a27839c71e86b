//! Translation filter: EOL normalization and keyword expansion/contraction,
//! both directions.

use std::collections::HashMap;

use crate::error::{ErrorKind, Result, WcError};
use crate::stream::Eol;

/// Declared end-of-line handling for a versioned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EolStyle {
    None,
    Native,
    FixedLf,
    FixedCr,
    FixedCrLf,
}

impl EolStyle {
    fn target_eol(self) -> Option<Eol> {
        match self {
            EolStyle::None => None,
            EolStyle::Native => Some(Eol::native()),
            EolStyle::FixedLf => Some(Eol::Lf),
            EolStyle::FixedCr => Some(Eol::Cr),
            EolStyle::FixedCrLf => Some(Eol::CrLf),
        }
    }
}

/// Recognized keyword names drawn from a node's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Revision,
    Author,
    Date,
    Url,
    Id,
}

impl Keyword {
    fn name(self) -> &'static str {
        match self {
            Keyword::Revision => "Revision",
            Keyword::Author => "Author",
            Keyword::Date => "Date",
            Keyword::Url => "URL",
            Keyword::Id => "Id",
        }
    }

    fn all() -> &'static [Keyword] {
        &[Keyword::Revision, Keyword::Author, Keyword::Date, Keyword::Url, Keyword::Id]
    }
}

/// Node metadata used to fill in keyword values.
#[derive(Debug, Clone, Default)]
pub struct KeywordValues(pub HashMap<&'static str, String>);

impl KeywordValues {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn set(&mut self, kw: Keyword, value: impl Into<String>) -> &mut Self {
        self.0.insert(kw.name(), value.into());
        self
    }
}

const MAX_KEYWORD_BYTES: usize = 255;

/// Normalizes the EOL of every line in `text` to `style`. When a contrary
/// EOL is encountered and `repair` is false, returns `io-unknown-eol`;
/// when `repair` is true, the contrary EOL is silently converted.
pub fn normalize_eol(text: &[u8], style: EolStyle, repair: bool) -> Result<Vec<u8>> {
    let Some(target) = style.target_eol() else {
        return Ok(text.to_vec());
    };
    let mut out = Vec::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let start = i;
        while i < text.len() && text[i] != b'\n' && text[i] != b'\r' {
            i += 1;
        }
        out.extend_from_slice(&text[start..i]);
        if i >= text.len() {
            break; // final line, no trailing newline: never add one
        }
        let found = if text[i] == b'\r' {
            if text.get(i + 1) == Some(&b'\n') {
                i += 2;
                Eol::CrLf
            } else {
                i += 1;
                Eol::Cr
            }
        } else {
            i += 1;
            Eol::Lf
        };
        if found != target && !repair {
            return Err(WcError::new(
                ErrorKind::IoUnknownEol,
                format!("encountered {found:?} while expecting {target:?}"),
            ));
        }
        out.extend_from_slice(target.as_bytes());
    }
    Ok(out)
}

/// Expands `$Keyword$` and `$Keyword: ... $` occurrences to
/// `$Keyword: value $`, line-bounded and capped at [`MAX_KEYWORD_BYTES`].
pub fn expand_keywords(text: &str, values: &KeywordValues) -> String {
    let mut out = String::with_capacity(text.len());
    for line in split_keep_newline(text) {
        out.push_str(&expand_keywords_in_line(line, values));
    }
    out
}

/// Contracts either `$Keyword$` or `$Keyword: ... $` back to `$Keyword$`.
pub fn contract_keywords(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in split_keep_newline(text) {
        out.push_str(&contract_keywords_in_line(line));
    }
    out
}

fn split_keep_newline(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == b'\n' {
            out.push(&text[start..=i]);
            start = i + 1;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn expand_keywords_in_line(line: &str, values: &KeywordValues) -> String {
    let mut result = String::with_capacity(line.len());
    let mut rest = line;
    'outer: while let Some(dollar) = rest.find('$') {
        result.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        for kw in Keyword::all() {
            let name = kw.name();
            if let Some(tail) = after.strip_prefix(name) {
                if let Some(tail2) = tail.strip_prefix('$') {
                    if let Some(value) = values.0.get(name) {
                        let mut rep = format!("${name}: {value} $");
                        if rep.len() > MAX_KEYWORD_BYTES {
                            rep.truncate(MAX_KEYWORD_BYTES);
                        }
                        result.push_str(&rep);
                    } else {
                        result.push('$');
                        result.push_str(name);
                        result.push('$');
                    }
                    rest = tail2;
                    continue 'outer;
                }
                if let Some(tail2) = tail.strip_prefix(": ") {
                    if let Some(close) = tail2.find(" $") {
                        if let Some(value) = values.0.get(name) {
                            let mut rep = format!("${name}: {value} $");
                            if rep.len() > MAX_KEYWORD_BYTES {
                                rep.truncate(MAX_KEYWORD_BYTES);
                            }
                            result.push_str(&rep);
                        } else {
                            result.push('$');
                            result.push_str(name);
                            result.push_str(": ");
                            result.push_str(&tail2[..close]);
                            result.push_str(" $");
                        }
                        rest = &tail2[close + 2..];
                        continue 'outer;
                    }
                }
            }
        }
        result.push('$');
        rest = after;
    }
    result.push_str(rest);
    result
}

fn contract_keywords_in_line(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut rest = line;
    'outer: while let Some(dollar) = rest.find('$') {
        result.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];
        for kw in Keyword::all() {
            let name = kw.name();
            if let Some(tail) = after.strip_prefix(name) {
                if let Some(tail2) = tail.strip_prefix('$') {
                    result.push('$');
                    result.push_str(name);
                    result.push('$');
                    rest = tail2;
                    continue 'outer;
                }
                if let Some(tail2) = tail.strip_prefix(": ") {
                    if let Some(close) = tail2.find(" $") {
                        result.push('$');
                        result.push_str(name);
                        result.push('$');
                        rest = &tail2[close + 2..];
                        continue 'outer;
                    }
                }
            }
        }
        result.push('$');
        rest = after;
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eol_round_trip() {
        let original = b"a\r\nb\r\nc".to_vec();
        let normalized = normalize_eol(&original, EolStyle::FixedLf, true).unwrap();
        assert_eq!(normalized, b"a\nb\nc");
    }

    #[test]
    fn unknown_eol_is_an_error_without_repair() {
        let err = normalize_eol(b"a\r\nb", EolStyle::FixedLf, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoUnknownEol);
    }

    #[test]
    fn keyword_expand_then_contract_round_trips() {
        let mut values = KeywordValues::new();
        values.set(Keyword::Revision, "42");
        let expanded = expand_keywords("line $Revision$ here\n", &values);
        assert_eq!(expanded, "line $Revision: 42 $ here\n");
        let contracted = contract_keywords(&expanded);
        assert_eq!(contracted, "line $Revision$ here\n");
    }

    #[test]
    fn keyword_with_existing_expansion_is_refreshed() {
        let mut values = KeywordValues::new();
        values.set(Keyword::Author, "alice");
        let text = "by $Author: bob $\n";
        assert_eq!(expand_keywords(text, &values), "by $Author: alice $\n");
    }

    #[test]
    fn unset_keyword_passes_through_unexpanded() {
        let values = KeywordValues::new();
        assert_eq!(expand_keywords("$Id$\n", &values), "$Id$\n");
    }
}
