//! Element paths: `/HTML[1]/BODY[1]/DIV[2]`
//!
//! One segment per ancestor, root first. Each segment is the element's DOM
//! tag name followed by its 1-based position among the preceding element
//! siblings sharing that tag name. Text, comment and other non-element
//! siblings never contribute to the index.
//!
//! Server and client both produce this format, so an [`ElementPath`] is
//! only ever constructed from well-formed segments.
//!
//! A tag name may not contain `/`, `[`, `]` or whitespace, since those
//! delimit segments. HTML parsers accept `<a[b>`; such an element and
//! everything inside it has no path, and both encoders report
//! [`PathError::Malformed`] for it instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, Result};

/// DOM node type of an element.
pub const ELEMENT_NODE: u16 = 1;

/// One `/{TAG}[{n}]` step of an element path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub tag: String,
    /// 1-based index among same-tag element siblings.
    pub index: usize,
}

impl PathSegment {
    pub fn new(tag: impl Into<String>, index: usize) -> Self {
        Self {
            tag: tag.into(),
            index,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}[{}]", self.tag, self.index)
    }
}

/// A validated element path. Equality is string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementPath(String);

impl ElementPath {
    /// Joins segments into a path. At least one segment is required.
    pub fn from_segments<'a, I>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a PathSegment>,
    {
        let mut path = String::new();
        for segment in segments {
            if segment.index == 0 {
                return Err(malformed(&path, "segment index must be at least 1"));
            }
            if !is_valid_tag(&segment.tag) {
                return Err(malformed(&path, "invalid tag name"));
            }
            path.push_str(&segment.to_string());
        }
        if path.is_empty() {
            return Err(malformed(&path, "path has no segments"));
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the path back into its segments.
    pub fn segments(&self) -> Vec<PathSegment> {
        // Validated on construction.
        parse_segments(&self.0).unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    pub fn last_segment(&self) -> Option<PathSegment> {
        self.segments().pop()
    }

    /// The path of the parent element, if any.
    pub fn parent(&self) -> Option<ElementPath> {
        let segments = self.segments();
        let (_, ancestors) = segments.split_last()?;
        ElementPath::from_segments(ancestors).ok()
    }
}

fn malformed(path: &str, reason: &'static str) -> PathError {
    PathError::Malformed {
        path: path.to_string(),
        reason,
    }
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && !tag.contains(['/', '[', ']']) && !tag.contains(char::is_whitespace)
}

fn parse_segments(path: &str) -> Result<Vec<PathSegment>> {
    if path.is_empty() {
        return Err(malformed(path, "path has no segments"));
    }

    let mut segments = Vec::new();
    let mut rest = path;
    while !rest.is_empty() {
        let Some(step) = rest.strip_prefix('/') else {
            return Err(malformed(path, "expected '/' before segment"));
        };
        let open = step
            .find('[')
            .ok_or_else(|| malformed(path, "missing '[' after tag name"))?;
        let tag = &step[..open];
        if !is_valid_tag(tag) {
            return Err(malformed(path, "invalid tag name"));
        }

        let after_open = &step[open + 1..];
        let close = after_open
            .find(']')
            .ok_or_else(|| malformed(path, "missing ']' after index"))?;
        let digits = &after_open[..close];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(path, "index is not a number"));
        }
        let index: usize = digits
            .parse()
            .map_err(|_| malformed(path, "index out of range"))?;
        if index == 0 {
            return Err(malformed(path, "segment index must be at least 1"));
        }

        segments.push(PathSegment::new(tag, index));
        rest = &after_open[close + 1..];
    }
    Ok(segments)
}

impl FromStr for ElementPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        parse_segments(s)?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for ElementPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self> {
        parse_segments(&value)?;
        Ok(Self(value))
    }
}

impl From<ElementPath> for String {
    fn from(path: ElementPath) -> Self {
        path.0
    }
}

impl AsRef<str> for ElementPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ElementPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ElementPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
