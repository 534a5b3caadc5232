//! Route pattern parsing.
//!
//! # Grammar
//! ```text
//! scheme://host/seg/seg   scheme and host case-insensitive, "*" matches any
//! /seg/seg                path-only, any scheme and host
//! activity:<type>         continuation type identifier, exact match
//!
//! seg := literal | "*" | ":name" | "**" (last segment only)
//! ```
//!
//! # Design Decisions
//! - Patterns are parsed once when a configuration is validated
//! - Canonical text (`Display`) is what duplicate detection compares
//! - Empty path segments are dropped, so `/a/b/` and `/a/b` are the same
//! - Literals are percent-decoded, matching the decoded segments of a link
//! - `*://*/a` and `/a` are the same pattern
//! - Ports, queries and fragments are rejected: links never match on them

use std::fmt;

use percent_encoding::percent_decode_str;

const ACTIVITY_PREFIX: &str = "activity:";

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Case-sensitive literal.
    Literal(String),
    /// `*`: exactly one segment, captured positionally.
    Wildcard,
    /// `:name`: exactly one segment, captured under `name`.
    Named(String),
    /// `**`: the remaining zero or more segments.
    Rest,
}

impl Segment {
    fn is_wildcard(&self) -> bool {
        !matches!(self, Segment::Literal(_))
    }
}

/// Scheme or host constraint of a URL pattern. `None` matches anything.
pub type Component = Option<String>;

/// URL shaped pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPattern {
    pub scheme: Component,
    pub host: Component,
    pub segments: Vec<Segment>,
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    Url(UrlPattern),
    Activity(String),
}

/// Ordering key for route selection: lower sorts first.
///
/// Fewest wildcard segments, then most leading literal segments, then
/// fewest unconstrained scheme/host parts. Declaration order is the
/// caller's final tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    wildcards: usize,
    literal_prefix_deficit: usize,
    unconstrained: usize,
}

impl RoutePattern {
    /// Parse a pattern string.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("pattern is empty".to_string());
        }

        if let Some(activity_type) = raw.strip_prefix(ACTIVITY_PREFIX) {
            if activity_type.is_empty() {
                return Err("activity type is empty".to_string());
            }
            if activity_type.contains('*') {
                return Err("activity patterns do not support wildcards".to_string());
            }
            return Ok(RoutePattern::Activity(activity_type.to_string()));
        }

        let (scheme, host, path) = if let Some((scheme, rest)) = raw.split_once("://") {
            if scheme.is_empty() {
                return Err("scheme is empty".to_string());
            }
            if scheme != "*" && !is_valid_scheme(scheme) {
                return Err(format!("invalid scheme '{}'", scheme));
            }
            let (host, path) = match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx..]),
                None => (rest, ""),
            };
            if host.contains(':') && !host.starts_with('[') {
                return Err(format!("host '{}' has a port; ports are not matched", host));
            }
            if host.contains(['?', '#']) {
                return Err("queries and fragments are not matched".to_string());
            }
            (component(scheme), component(host), path)
        } else if raw.starts_with('/') {
            (None, None, raw)
        } else {
            return Err("expected 'scheme://host/path', '/path' or 'activity:<type>'".to_string());
        };

        let segments = parse_segments(path)?;
        Ok(RoutePattern::Url(UrlPattern {
            scheme,
            host,
            segments,
        }))
    }

    /// Selection key; activity patterns are always fully specific.
    pub fn specificity(&self) -> Specificity {
        match self {
            RoutePattern::Activity(_) => Specificity {
                wildcards: 0,
                literal_prefix_deficit: 0,
                unconstrained: 0,
            },
            RoutePattern::Url(url) => {
                let wildcards = url.segments.iter().filter(|s| s.is_wildcard()).count();
                let literal_prefix = url
                    .segments
                    .iter()
                    .take_while(|s| !s.is_wildcard())
                    .count();
                let unconstrained =
                    usize::from(url.scheme.is_none()) + usize::from(url.host.is_none());
                Specificity {
                    wildcards,
                    literal_prefix_deficit: usize::MAX - literal_prefix,
                    unconstrained,
                }
            }
        }
    }
}

fn component(raw: &str) -> Component {
    if raw == "*" {
        None
    } else {
        Some(raw.to_ascii_lowercase())
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn parse_segments(path: &str) -> Result<Vec<Segment>, String> {
    if path.contains(['?', '#']) {
        return Err("queries and fragments are not matched".to_string());
    }
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(parts.len());
    let mut names: Vec<&str> = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        let segment = match *part {
            "*" => Segment::Wildcard,
            "**" => {
                if i + 1 != parts.len() {
                    return Err("'**' is only allowed as the last segment".to_string());
                }
                Segment::Rest
            }
            named if named.starts_with(':') => {
                let name = &named[1..];
                if name.is_empty() {
                    return Err("parameter name is empty".to_string());
                }
                if names.contains(&name) {
                    return Err(format!("parameter ':{}' appears twice", name));
                }
                names.push(name);
                Segment::Named(name.to_string())
            }
            literal if literal.contains('*') => {
                return Err(format!("'{}' mixes literal text and wildcard", literal));
            }
            literal => Segment::Literal(percent_decode_str(literal).decode_utf8_lossy().into_owned()),
        };
        segments.push(segment);
    }
    Ok(segments)
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(s) => f.write_str(s),
            Segment::Wildcard => f.write_str("*"),
            Segment::Named(name) => write!(f, ":{}", name),
            Segment::Rest => f.write_str("**"),
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePattern::Activity(activity_type) => {
                write!(f, "{}{}", ACTIVITY_PREFIX, activity_type)
            }
            RoutePattern::Url(url) => {
                if url.scheme.is_some() || url.host.is_some() {
                    write!(
                        f,
                        "{}://{}",
                        url.scheme.as_deref().unwrap_or("*"),
                        url.host.as_deref().unwrap_or("*")
                    )?;
                }
                if url.segments.is_empty() {
                    return f.write_str("/");
                }
                for segment in &url.segments {
                    write!(f, "/{}", segment)?;
                }
                Ok(())
            }
        }
    }
}
