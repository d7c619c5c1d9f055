//! Route pattern parsing
//!
//! Patterns are `/`-separated segments; a segment starting with `:` is a named
//! parameter. Empty segments are ignored, so leading, trailing and repeated
//! slashes carry no meaning in patterns or in request paths.

use crate::error::RegistrationError;

const PARAM_SIGIL: char = ':';

/// One component of a route pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

/// Parse a registration pattern into segments
pub fn parse_pattern(pattern: &str) -> Result<Vec<Segment<'_>>, RegistrationError> {
    if pattern.is_empty() {
        return Err(RegistrationError::EmptyPath);
    }
    if !pattern.starts_with('/') {
        return Err(RegistrationError::MissingLeadingSlash(pattern.to_string()));
    }

    split_path(pattern)
        .map(|seg| match seg.strip_prefix(PARAM_SIGIL) {
            Some("") => Err(RegistrationError::EmptyParamName(pattern.to_string())),
            Some(name) => Ok(Segment::Param(name)),
            None => Ok(Segment::Literal(seg)),
        })
        .collect()
}

/// Split a concrete request path into its non-empty segments
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Render segments back into canonical pattern form (`/a/:b`, or `/` for root)
pub fn render(segments: &[Segment<'_>]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments
        .iter()
        .map(|seg| match seg {
            Segment::Literal(text) => format!("/{text}"),
            Segment::Param(name) => format!("/{PARAM_SIGIL}{name}"),
        })
        .collect()
}
