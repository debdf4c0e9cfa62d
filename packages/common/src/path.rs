//! # Path Addressing
//!
//! Simplified hierarchical paths of the form `/type[ordinal]/type[ordinal]/...`.
//!
//! A path is an addressing token, not a stable identifier: the ordinal of a
//! segment shifts as soon as a same-typed sibling is inserted before it.
//! A missing ordinal means ordinal 1.
//!
//! All functions are pure string transforms. Syntactically invalid input
//! (empty segments, unmatched brackets, zero or non-numeric ordinals) is
//! reported as [`MalformedPath`].

use crate::error::MalformedPath;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SEPARATOR: char = '/';

/// One `type[ordinal]` step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub element_type: String,

    /// Explicit ordinal, `None` when the segment was written without brackets
    pub ordinal: Option<usize>,
}

impl Segment {
    /// Segment without an explicit ordinal
    pub fn new(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            ordinal: None,
        }
    }

    /// Segment with an explicit ordinal
    pub fn with_ordinal(element_type: impl Into<String>, ordinal: usize) -> Self {
        Self {
            element_type: element_type.into(),
            ordinal: Some(ordinal),
        }
    }

    /// Effective 1-based ordinal
    pub fn ordinal(&self) -> usize {
        self.ordinal.unwrap_or(1)
    }

    /// Whether both segments address the same element (`a` and `a[1]` do)
    pub fn addresses_same(&self, other: &Segment) -> bool {
        self.element_type == other.element_type && self.ordinal() == other.ordinal()
    }

    /// Parse a single segment. The ordinal suffix is read from the end.
    pub fn parse(raw: &str) -> Result<Self, MalformedPath> {
        Self::parse_in(raw, raw)
    }

    fn parse_in(raw: &str, full: &str) -> Result<Self, MalformedPath> {
        if raw.is_empty() {
            return Err(MalformedPath::new(full, "empty segment"));
        }

        let (element_type, ordinal) = match raw.rfind('[') {
            Some(open) => {
                if !raw.ends_with(']') {
                    return Err(MalformedPath::new(full, format!("unmatched '[' in '{}'", raw)));
                }
                let digits = &raw[open + 1..raw.len() - 1];
                let ordinal: usize = digits.parse().map_err(|_| {
                    MalformedPath::new(full, format!("invalid ordinal '{}'", digits))
                })?;
                if ordinal == 0 {
                    return Err(MalformedPath::new(full, "ordinals start at 1"));
                }
                (&raw[..open], Some(ordinal))
            }
            None => (raw, None),
        };

        if element_type.is_empty() {
            return Err(MalformedPath::new(full, format!("missing element type in '{}'", raw)));
        }
        if element_type.contains(['[', ']']) {
            return Err(MalformedPath::new(full, format!("unmatched bracket in '{}'", raw)));
        }
        if element_type.chars().any(char::is_whitespace) {
            return Err(MalformedPath::new(full, format!("whitespace in '{}'", raw)));
        }

        Ok(Self {
            element_type: element_type.to_string(),
            ordinal,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ordinal {
            Some(n) => write!(f, "{}[{}]", self.element_type, n),
            None => write!(f, "{}", self.element_type),
        }
    }
}

/// Parsed absolute path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn parse(raw: &str) -> Result<Self, MalformedPath> {
        let segments = split(raw)?
            .into_iter()
            .map(|s| Segment::parse_in(s, raw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Path with `segment` appended
    pub fn join(&self, segment: Segment) -> Self {
        let mut joined = self.clone();
        joined.push(segment);
        joined
    }

    /// Path without its last segment, `None` for the empty path
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Whether both paths address the same element, ignoring explicit `[1]`
    pub fn addresses_same(&self, other: &Path) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.addresses_same(b))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "{}", SEPARATOR);
        }
        for segment in &self.segments {
            write!(f, "{}{}", SEPARATOR, segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Path {
    type Err = MalformedPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

/// Strip trailing separators, keeping a lone `/`
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() && !path.is_empty() {
        &path[..1]
    } else {
        trimmed
    }
}

/// Split into raw segments, rejecting empty input and empty segments
fn split(path: &str) -> Result<Vec<&str>, MalformedPath> {
    let normalized = normalize(path);
    let body = normalized.strip_prefix(SEPARATOR).unwrap_or(normalized);
    if body.is_empty() {
        return Err(MalformedPath::new(path, "path has no segments"));
    }
    let segments: Vec<&str> = body.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MalformedPath::new(path, "empty segment"));
    }
    Ok(segments)
}

fn first_segment(path: &str) -> Result<Segment, MalformedPath> {
    let segments = split(path)?;
    Segment::parse_in(segments[0], path)
}

fn last_segment(path: &str) -> Result<Segment, MalformedPath> {
    let segments = split(path)?;
    Segment::parse_in(segments[segments.len() - 1], path)
}

fn render(leading: bool, segments: &[&str]) -> String {
    if segments.is_empty() {
        return String::new();
    }
    let body = segments.join("/");
    if leading {
        format!("{}{}", SEPARATOR, body)
    } else {
        body
    }
}

/// Element type of the first segment: `/a/b[2]` → `a`
pub fn first_segment_type(path: &str) -> Result<String, MalformedPath> {
    Ok(first_segment(path)?.element_type)
}

/// Element type of the last segment: `/a/b[2]` → `b`
pub fn last_segment_type(path: &str) -> Result<String, MalformedPath> {
    Ok(last_segment(path)?.element_type)
}

/// Ordinal of the last segment, 1 when none is written
pub fn last_segment_ordinal(path: &str) -> Result<usize, MalformedPath> {
    Ok(last_segment(path)?.ordinal())
}

/// Join `segment` onto `base_path` with exactly one separator between them
pub fn append(base_path: &str, segment: &str) -> String {
    let base = base_path.trim_end_matches(SEPARATOR);
    let tail = segment.trim_start_matches(SEPARATOR);
    format!("{}{}{}", base, SEPARATOR, tail)
}

/// Remove the first segment: `/a/b/c` → `/b/c`, `/a` → empty string
pub fn drop_first_segment(path: &str) -> Result<String, MalformedPath> {
    let segments = split(path)?;
    for raw in &segments {
        Segment::parse_in(raw, path)?;
    }
    Ok(render(path.starts_with(SEPARATOR), &segments[1..]))
}

/// Remove the last segment: `/a/b/c` → `/a/b`, `/a` → empty string
pub fn drop_last_segment(path: &str) -> Result<String, MalformedPath> {
    let segments = split(path)?;
    for raw in &segments {
        Segment::parse_in(raw, path)?;
    }
    Ok(render(path.starts_with(SEPARATOR), &segments[..segments.len() - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_types() {
        assert_eq!(first_segment_type("/cpacs/vehicles/aircraft").unwrap(), "cpacs");
        assert_eq!(last_segment_type("/cpacs/vehicles/aircraft").unwrap(), "aircraft");
        assert_eq!(last_segment_type("/a/wing[3]").unwrap(), "wing");
        assert_eq!(first_segment_type("model[2]/wings").unwrap(), "model");
    }

    #[test]
    fn test_last_segment_ordinal_defaults_to_one() {
        assert_eq!(last_segment_ordinal("/a/b").unwrap(), 1);
        assert_eq!(last_segment_ordinal("/a/b[12]").unwrap(), 12);
        assert_eq!(last_segment_ordinal("/a[4]/b").unwrap(), 1);
    }

    #[test]
    fn test_trailing_separator_is_normalized() {
        assert_eq!(last_segment_type("/a/b/").unwrap(), "b");
        assert_eq!(last_segment_ordinal("/a/b[2]//").unwrap(), 2);
        assert_eq!(drop_last_segment("/a/b/c/").unwrap(), "/a/b");
    }

    #[test]
    fn test_append_normalizes_separator() {
        assert_eq!(append("/a/b", "c"), "/a/b/c");
        assert_eq!(append("/a/b/", "c"), "/a/b/c");
        assert_eq!(append("/a/b/", "/c[2]"), "/a/b/c[2]");
        assert_eq!(append("", "c"), "/c");
    }

    #[test]
    fn test_drop_segments() {
        assert_eq!(drop_first_segment("/a/b[2]/c").unwrap(), "/b[2]/c");
        assert_eq!(drop_last_segment("/a/b[2]/c").unwrap(), "/a/b[2]");
        assert_eq!(drop_first_segment("/a").unwrap(), "");
        assert_eq!(drop_last_segment("/a").unwrap(), "");
    }

    #[test]
    fn test_malformed_paths_are_errors() {
        assert!(last_segment_type("/a/b[2").is_err());
        assert!(last_segment_type("/a/b2]").is_err());
        assert!(last_segment_ordinal("/a/b[x]").is_err());
        assert!(last_segment_ordinal("/a/b[0]").is_err());
        assert!(last_segment_type("/a/[2]").is_err());
        assert!(first_segment_type("/a//b").is_err());
        assert!(first_segment_type("").is_err());
        assert!(first_segment_type("/").is_err());
        assert!(drop_last_segment("/a[/b").is_err());
        assert!(Path::parse("/a/b]c").is_err());
    }

    #[test]
    fn test_malformed_error_mentions_path() {
        let err = last_segment_ordinal("/cpacs/wing[abc]").unwrap_err();
        assert_eq!(err.path, "/cpacs/wing[abc]");
        assert!(err.to_string().contains("invalid ordinal"));
    }

    #[test]
    fn test_path_display_preserves_explicit_ordinals() {
        let path = Path::parse("/cpacs/vehicles/wing[2]/sections").unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.to_string(), "/cpacs/vehicles/wing[2]/sections");
        assert_eq!(path.parent().unwrap().to_string(), "/cpacs/vehicles/wing[2]");
    }

    #[test]
    fn test_addresses_same_ignores_explicit_first_ordinal() {
        let a = Path::parse("/a/b[1]/c").unwrap();
        let b = Path::parse("/a/b/c[1]").unwrap();
        let c = Path::parse("/a/b[2]/c").unwrap();
        assert!(a.addresses_same(&b));
        assert!(!a.addresses_same(&c));
    }

    #[test]
    fn test_join_builds_child_paths() {
        let root = Path::parse("/cpacs").unwrap();
        let child = root.join(Segment::with_ordinal("wing", 3));
        assert_eq!(child.to_string(), "/cpacs/wing[3]");
        assert_eq!(child.last().unwrap().ordinal(), 3);
    }
}
