//! A canonical, unrooted, slash-separated path: never starts with a
//! separator, and `.`/`..` components are disallowed after canonicalization.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Relpath(String);

impl Relpath {
    /// Canonicalizes `raw`: collapses duplicate `/`, strips a leading and
    /// trailing `/`, and rejects `.`/`..` components.
    pub fn canonicalize(raw: &str) -> Option<Self> {
        let mut parts = Vec::new();
        for part in raw.split('/') {
            if part.is_empty() {
                continue;
            }
            if part == "." || part == ".." {
                return None;
            }
            parts.push(part);
        }
        Some(Relpath(parts.join("/")))
    }

    pub fn root() -> Self {
        Relpath(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_canonical(raw: &str) -> bool {
        matches!(Relpath::canonicalize(raw), Some(r) if r.0 == raw)
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    pub fn basename(&self) -> &str {
        self.components().next_back().unwrap_or("")
    }

    /// Parent relpath, or `None` at the root.
    pub fn dirname(&self) -> Option<Relpath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(Relpath(self.0[..idx].to_string())),
            None => Some(Relpath::root()),
        }
    }

    pub fn split(&self) -> (Option<Relpath>, &str) {
        (self.dirname(), self.basename())
    }

    pub fn join(&self, child: &str) -> Relpath {
        if self.is_root() {
            Relpath(child.to_string())
        } else {
            Relpath(format!("{}/{}", self.0, child))
        }
    }

    /// Whether `self` is an ancestor of (strictly above) `other`.
    pub fn is_ancestor(&self, other: &Relpath) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'/')
    }

    /// Strips `self` as a prefix of `other`, returning the remainder, or
    /// `None` if `self` is not an ancestor of `other`.
    pub fn skip_ancestor(&self, other: &Relpath) -> Option<Relpath> {
        if !self.is_ancestor(other) {
            return None;
        }
        Some(Relpath(other.0[self.0.len() + 1..].to_string()))
    }

    pub fn get_longest_ancestor(a: &Relpath, b: &Relpath) -> Relpath {
        let a_parts: Vec<&str> = a.components().collect();
        let b_parts: Vec<&str> = b.components().collect();
        let mut common = Vec::new();
        for (x, y) in a_parts.iter().zip(b_parts.iter()) {
            if x == y {
                common.push(*x);
            } else {
                break;
            }
        }
        Relpath(common.join("/"))
    }
}

impl fmt::Display for Relpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Relpath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relpath::canonicalize(s).ok_or_else(|| format!("not a canonical relpath: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_collapses_and_trims() {
        assert_eq!(
            Relpath::canonicalize("/a/./b//c/").unwrap().as_str(),
            "a/b/c"
        );
    }

    #[test]
    fn canonicalize_rejects_dotdot() {
        assert!(Relpath::canonicalize("a/../b").is_none());
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = Relpath::canonicalize("/a/./b//c/").unwrap();
        let twice = Relpath::canonicalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn split_and_join_round_trip() {
        let p = Relpath::canonicalize("a/b/c").unwrap();
        let (dir, base) = p.split();
        assert_eq!(base, "c");
        assert_eq!(dir.unwrap().join(base), p);
    }

    #[test]
    fn ancestor_and_skip() {
        let root = Relpath::canonicalize("a").unwrap();
        let child = Relpath::canonicalize("a/b/c").unwrap();
        assert!(root.is_ancestor(&child));
        assert_eq!(root.skip_ancestor(&child).unwrap().as_str(), "b/c");
        assert!(!child.is_ancestor(&root));
    }

    #[test]
    fn longest_ancestor() {
        let a = Relpath::canonicalize("a/b/c").unwrap();
        let b = Relpath::canonicalize("a/b/d").unwrap();
        assert_eq!(Relpath::get_longest_ancestor(&a, &b).as_str(), "a/b");
    }
}
