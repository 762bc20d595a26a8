//! Path pattern compilation and segment matching.
//!
//! A pattern such as `/users/{user_id}/posts/{post_id}` compiles into a list of
//! literal and placeholder segments. Matching is a segment-by-segment
//! comparison: equal segment counts, literals compared exactly, placeholders
//! capturing the incoming segment verbatim.

use super::core::ParamVec;
use crate::error::RegistrationError;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// One compiled segment of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Arc<str>),
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

/// Drop a trailing `/` (except for the root path).
pub(crate) fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Split a normalized path into its `/`-delimited segments. The root path has none.
pub(crate) fn split_segments(path: &str) -> SmallVec<[&str; 8]> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        SmallVec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn is_valid_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl PathPattern {
    /// Compile `raw` into segments.
    ///
    /// # Errors
    ///
    /// Fails when the pattern does not start with `/`, a segment holds a brace
    /// outside a well-formed `{name}` placeholder, or a placeholder name repeats.
    pub fn parse(raw: &str) -> Result<Self, RegistrationError> {
        let invalid = |reason: &str| RegistrationError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("pattern must start with '/'"));
        }

        let normalized = normalize_path(raw);
        let mut segments = Vec::new();
        let mut seen = HashSet::new();

        for segment in split_segments(normalized) {
            if let Some(name) = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                if !is_valid_placeholder_name(name) {
                    return Err(invalid(&format!(
                        "placeholder '{segment}' must be '{{name}}' with a name of letters, digits or '_'"
                    )));
                }
                if !seen.insert(name.to_string()) {
                    return Err(RegistrationError::DuplicatePlaceholder {
                        pattern: raw.to_string(),
                        name: name.to_string(),
                    });
                }
                segments.push(Segment::Placeholder(Arc::from(name)));
            } else if segment.contains('{') || segment.contains('}') {
                return Err(invalid(&format!(
                    "segment '{segment}' mixes literal text and braces"
                )));
            } else {
                segments.push(Segment::Literal(segment.to_string()));
            }
        }

        Ok(Self {
            raw: normalized.to_string(),
            segments,
        })
    }

    /// The normalized pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in the order they appear.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_ref()),
            Segment::Literal(_) => None,
        })
    }

    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// Match pre-split request segments, returning the captured placeholder values.
    pub(crate) fn match_segments(&self, segments: &[&str]) -> Option<ParamVec> {
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut params = ParamVec::new();
        for (pattern_segment, value) in self.segments.iter().zip(segments) {
            match pattern_segment {
                Segment::Literal(lit) if lit == value => {}
                Segment::Literal(_) => return None,
                Segment::Placeholder(name) => {
                    params.push((Arc::clone(name), (*value).to_string()));
                }
            }
        }
        Some(params)
    }

    /// Match a request path (without query string).
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        let segments = split_segments(normalize_path(path));
        self.match_segments(&segments)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_and_placeholders() {
        let p = PathPattern::parse("/users/{user_id}/posts/{post_id}").unwrap();
        assert_eq!(
            p.placeholders().collect::<Vec<_>>(),
            vec!["user_id", "post_id"]
        );
        assert_eq!(p.segments().len(), 4);
        assert_eq!(p.segments()[0], Segment::Literal("users".to_string()));
    }

    #[test]
    fn test_root_pattern_has_no_segments() {
        let p = PathPattern::parse("/").unwrap();
        assert!(p.segments().is_empty());
        assert!(p.match_path("/").is_some());
        assert!(p.match_path("/x").is_none());
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let p = PathPattern::parse("/items/").unwrap();
        assert_eq!(p.as_str(), "/items");
        assert!(p.match_path("/items").is_some());
        assert!(p.match_path("/items/").is_some());
    }

    #[test]
    fn test_match_captures_verbatim_text() {
        let p = PathPattern::parse("/items/{id}").unwrap();
        let params = p.match_path("/items/42").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0.as_ref(), "id");
        assert_eq!(params[0].1, "42");

        let params = p.match_path("/items/%20x").unwrap();
        assert_eq!(params[0].1, "%20x");
    }

    #[test]
    fn test_segment_count_must_match() {
        let p = PathPattern::parse("/items/{id}").unwrap();
        assert!(p.match_path("/items").is_none());
        assert!(p.match_path("/items/1/extra").is_none());
        assert!(p.match_path("/other/1").is_none());
    }

    #[test]
    fn test_rejects_malformed_patterns() {
        assert!(matches!(
            PathPattern::parse("items"),
            Err(RegistrationError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/items/{}"),
            Err(RegistrationError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/items/id-{id}"),
            Err(RegistrationError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/items/{id"),
            Err(RegistrationError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_placeholders() {
        let err = PathPattern::parse("/org/{id}/user/{id}").unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicatePlaceholder {
                pattern: "/org/{id}/user/{id}".to_string(),
                name: "id".to_string(),
            }
        );
    }
}
