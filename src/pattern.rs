//! Path patterns.
//!
//! A pattern is compiled once, at registration time, from a template string
//! and is matched against concrete, already percent-decoded request paths.
//!
//! | Template       | Matches                                  |
//! |----------------|------------------------------------------|
//! | `/`            | `/` only                                 |
//! | `/orders/#id`  | `/orders/42` → params `["42"]`           |
//! | `/files/>`     | `/files`, `/files/a`, `/files/a/b`       |
//!
//! Parameter names exist for the reader of the template only. Values are
//! bound by position, in declaration order.
//!
//! Matching is a single left-to-right scan. A parameter always extends to the
//! next `/`, so no backtracking is ever needed.

use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::PatternError;

const SLASH: u8 = b'/';
const MARKER: u8 = b'#';
const PREFIX: &str = ">";

/// Path parameters bound by a successful match, in declaration order.
pub type Params = SmallVec<[String; 4]>;

/// A compiled path template.
///
/// Internally a pattern is a compacted skeleton in which every parameter
/// segment is replaced by a single `#`, plus the parameter count and a
/// prefix flag. The skeleton never ends in `/` unless it is the root pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    skeleton: Box<str>,
    params: usize,
    prefix: bool,
}

impl Pattern {
    /// Compiles `template`.
    ///
    /// ```
    /// use arrowroute::Pattern;
    ///
    /// let pattern = Pattern::compile("/orders/#id").unwrap();
    /// assert_eq!(pattern.matches("/orders/42").unwrap().as_slice(), ["42"]);
    /// assert!(Pattern::compile("/orders/..").is_err());
    /// ```
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let fail = |reason| Err(PatternError::new(template, reason));

        let Some(body) = template.strip_prefix('/') else {
            return fail("pattern must start with '/'");
        };
        if body.is_empty() {
            return Ok(Self::root());
        }

        let trimmed = body.strip_suffix('/').unwrap_or(body);
        let mut segments: SmallVec<[&str; 8]> = trimmed.split('/').collect();

        let prefix = segments.last() == Some(&PREFIX);
        if prefix {
            if trimmed.len() != body.len() {
                return fail("'>' must be the final segment");
            }
            segments.pop();
        }

        let mut skeleton = String::with_capacity(trimmed.len());
        let mut params = 0;

        for segment in segments {
            skeleton.push('/');
            match segment {
                "" => return fail("empty segment"),
                "." | ".." => return fail("relative segments are not allowed"),
                _ => {}
            }
            if let Some(name) = segment.strip_prefix('#') {
                if name.is_empty() {
                    return fail("parameter name can not be empty");
                }
                check_literal(template, name)?;
                skeleton.push(MARKER as char);
                params += 1;
            } else {
                check_literal(template, segment)?;
                skeleton.push_str(segment);
            }
        }

        Ok(Self {
            skeleton: skeleton.into_boxed_str(),
            params,
            prefix,
        })
    }

    /// The pattern compiled from `/`.
    pub fn root() -> Self {
        Self {
            skeleton: "/".into(),
            params: 0,
            prefix: false,
        }
    }

    pub fn is_root(&self) -> bool {
        &*self.skeleton == "/"
    }

    pub fn is_prefix(&self) -> bool {
        self.prefix
    }

    pub fn param_count(&self) -> usize {
        self.params
    }

    /// The compacted skeleton, with each parameter shown as `#`.
    pub fn skeleton(&self) -> &str {
        &self.skeleton
    }

    /// Matches `path`, returning the bound parameters on success.
    ///
    /// One trailing `/` of `path` is ignored, except for the root path.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let path = trim_trailing_slash(path);
        let skeleton = self.skeleton.as_bytes();
        let bytes = path.as_bytes();

        if self.params == 0 {
            let hit = if self.prefix {
                bytes.starts_with(skeleton) && at_boundary(bytes, skeleton.len())
            } else {
                bytes == skeleton
            };
            return hit.then(Params::new);
        }

        let mut params = Params::new();
        let (mut i, mut j) = (0, 0);

        loop {
            match (skeleton.get(i), bytes.get(j)) {
                (None, None) => break,
                (None, Some(_)) if self.prefix && at_boundary(bytes, j) => break,
                (None, Some(_)) => return None,
                (Some(&MARKER), _) => {
                    let end = bytes[j..]
                        .iter()
                        .position(|&b| b == SLASH)
                        .map_or(bytes.len(), |n| j + n);
                    params.push(path[j..end].to_owned());
                    i += 1;
                    j = end;
                }
                (Some(a), Some(b)) if a == b => {
                    i += 1;
                    j += 1;
                }
                _ => return None,
            }
        }

        (params.len() == self.params).then_some(params)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.matches(path).is_some()
    }

    /// Reports whether some concrete path could match both `self` and `other`.
    ///
    /// Segments are compared pairwise; a parameter is compatible with any
    /// segment. When one pattern runs out of segments first, the two can only
    /// overlap if the shorter one is a prefix pattern.
    pub fn intersects(&self, other: &Pattern) -> bool {
        let mut lhs = self.segments();
        let mut rhs = other.segments();
        loop {
            match (lhs.next(), rhs.next()) {
                (None, None) => return true,
                (Some(_), None) => return other.prefix,
                (None, Some(_)) => return self.prefix,
                (Some(a), Some(b)) => {
                    if a != "#" && b != "#" && a != b {
                        return false;
                    }
                }
            }
        }
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.skeleton.split('/').skip(1)
    }
}

/// Specificity: the more specific pattern sorts first.
///
/// Longer skeletons come first, then fewer parameters, then non-prefix
/// patterns, and finally the skeletons are compared lexically.
impl Ord for Pattern {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = |p: &Self| (Reverse(p.skeleton.len()), p.params, p.prefix);
        key(self)
            .cmp(&key(other))
            .then_with(|| self.skeleton.cmp(&other.skeleton))
    }
}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.skeleton)?;
        if self.prefix {
            f.write_str("/>")?;
        }
        Ok(())
    }
}

fn check_literal(template: &str, segment: &str) -> Result<(), PatternError> {
    for b in segment.bytes() {
        let reason = match b {
            b'%' => "percent-encoded octets are not allowed",
            b'#' => "'#' may only start a segment",
            b'>' => "'>' may only appear as the entire final segment",
            _ if is_path_char(b) => continue,
            _ => "invalid character",
        };
        return Err(PatternError::new(template, reason));
    }
    Ok(())
}

/// RFC 3986 `pchar`, minus percent-encoding.
fn is_path_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.'
                | b'_'
                | b'~'
                | b'!'
                | b'$'
                | b'&'
                | b'\''
                | b'('
                | b')'
                | b'*'
                | b'+'
                | b','
                | b';'
                | b'='
                | b':'
                | b'@'
        )
}

#[inline]
fn trim_trailing_slash(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    }
}

#[inline]
fn at_boundary(bytes: &[u8], at: usize) -> bool {
    bytes.get(at).is_none_or(|&b| b == SLASH)
}
