//! An absolute URI with a scheme; the path component is canonical in the
//! [`super::Relpath`] sense and percent-encoding is normalized to uppercase
//! hex escapes.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Uri {
    scheme: String,
    authority: String,
    path: String,
}

impl Uri {
    pub fn canonicalize(raw: &str) -> Option<Self> {
        let (scheme, rest) = raw.split_once("://")?;
        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        let path = normalize_percent_encoding(path);
        let path = path.trim_end_matches('/');
        Some(Uri {
            scheme: scheme.to_ascii_lowercase(),
            authority: authority.to_string(),
            path: path.to_string(),
        })
    }

    pub fn is_canonical(raw: &str) -> bool {
        matches!(Uri::canonicalize(raw), Some(u) if u.to_string() == raw)
    }

    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    pub fn dirname(&self) -> Uri {
        let mut u = self.clone();
        match self.path.rfind('/') {
            Some(idx) => u.path.truncate(idx),
            None => u.path.clear(),
        }
        u
    }

    pub fn split(&self) -> (Uri, &str) {
        (self.dirname(), self.basename())
    }

    pub fn join(&self, child: &str) -> Uri {
        let mut u = self.clone();
        u.path.push('/');
        u.path.push_str(child.trim_start_matches('/'));
        u
    }

    pub fn is_ancestor(&self, other: &Uri) -> bool {
        self.scheme == other.scheme
            && self.authority == other.authority
            && other.path.starts_with(&self.path)
            && other.path.as_bytes().get(self.path.len()) == Some(&b'/')
    }

    pub fn skip_ancestor(&self, other: &Uri) -> Option<&str> {
        if self.is_ancestor(other) {
            Some(&other.path[self.path.len() + 1..])
        } else {
            None
        }
    }

    pub fn get_longest_ancestor(a: &Uri, b: &Uri) -> Option<Uri> {
        if a.scheme != b.scheme || a.authority != b.authority {
            return None;
        }
        let a_parts: Vec<&str> = a.path.split('/').collect();
        let b_parts: Vec<&str> = b.path.split('/').collect();
        let mut common = Vec::new();
        for (x, y) in a_parts.iter().zip(b_parts.iter()) {
            if x == y {
                common.push(*x);
            } else {
                break;
            }
        }
        Some(Uri {
            scheme: a.scheme.clone(),
            authority: a.authority.clone(),
            path: common.join("/"),
        })
    }
}

fn normalize_percent_encoding(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push('%');
                    out.push_str(&format!("{byte:02X}"));
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)
    }
}
