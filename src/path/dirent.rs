//! A canonical local-filesystem path. Canonicalization collapses `./`,
//! duplicate separators, and trailing separators, normalizes a
//! case-insensitive root's drive/server component to a fixed case, and uses
//! forward slashes internally.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dirent(String);

impl Dirent {
    pub fn canonicalize(raw: &str) -> Self {
        let normalized = raw.replace('\\', "/");
        let mut prefix = String::new();
        let mut rest = normalized.as_str();

        // Case-insensitive Windows drive/server prefix, e.g. "X:" -> "x:".
        if let Some(colon) = rest.find(':') {
            if colon == 1 && rest.as_bytes()[0].is_ascii_alphabetic() {
                prefix = rest[..colon].to_ascii_lowercase();
                rest = &rest[colon + 1..];
            }
        }

        let mut parts: Vec<&str> = Vec::new();
        let absolute = rest.starts_with('/');
        for part in rest.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }

        let mut out = String::new();
        if !prefix.is_empty() {
            out.push_str(&prefix);
            out.push(':');
        }
        if !prefix.is_empty() || absolute {
            out.push('/');
        }
        out.push_str(&parts.join("/"));
        if out.is_empty() {
            out.push('.');
        }
        Dirent(out)
    }

    pub fn is_canonical(raw: &str) -> bool {
        Dirent::canonicalize(raw).0 == raw
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn basename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn dirname(&self) -> Dirent {
        match self.0.rfind('/') {
            Some(0) => Dirent("/".to_string()),
            Some(idx) => Dirent(self.0[..idx].to_string()),
            None => Dirent(".".to_string()),
        }
    }

    pub fn split(&self) -> (Dirent, &str) {
        (self.dirname(), self.basename())
    }

    pub fn join(&self, child: &str) -> Dirent {
        if self.0.ends_with('/') {
            Dirent::canonicalize(&format!("{}{}", self.0, child))
        } else {
            Dirent::canonicalize(&format!("{}/{}", self.0, child))
        }
    }

    pub fn is_ancestor(&self, other: &Dirent) -> bool {
        other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'/')
    }

    pub fn skip_ancestor(&self, other: &Dirent) -> Option<&str> {
        if self.is_ancestor(other) {
            Some(&other.0[self.0.len() + 1..])
        } else {
            None
        }
    }

    pub fn get_longest_ancestor(a: &Dirent, b: &Dirent) -> Dirent {
        let a_parts: Vec<&str> = a.0.split('/').collect();
        let b_parts: Vec<&str> = b.0.split('/').collect();
        let mut common = Vec::new();
        for (x, y) in a_parts.iter().zip(b_parts.iter()) {
            if x == y {
                common.push(*x);
            } else {
                break;
            }
        }
        Dirent(common.join("/"))
    }
}

impl From<&Path> for Dirent {
    fn from(p: &Path) -> Self {
        Dirent::canonicalize(&p.to_string_lossy())
    }
}

impl From<PathBuf> for Dirent {
    fn from(p: PathBuf) -> Self {
        Dirent::from(p.as_path())
    }
}

impl fmt::Display for Dirent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_collapses_dots() {
        assert_eq!(Dirent::canonicalize("/a/./b//c/").as_str(), "/a/b/c");
    }

    #[test]
    fn canonicalize_lowercases_drive() {
        assert_eq!(Dirent::canonicalize("X:\\").as_str(), "x:/");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = Dirent::canonicalize("/a/./b//c/");
        let twice = Dirent::canonicalize(once.as_str());
        assert_eq!(once, twice);
    }
}
