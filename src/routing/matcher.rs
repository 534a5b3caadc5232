//! Route matching logic.
//!
//! # Responsibilities
//! - Match scheme and host (exact, case-insensitive, `*` = any)
//! - Match path segments (case-sensitive, with wildcards)
//! - Match continuation events on their type identifier
//! - Pick the most specific route, fall back to the default handler
//!
//! # Design Decisions
//! - Pure function over an immutable snapshot: safe from any thread
//! - No regex, O(routes × segments)
//! - Deterministic: specificity, then declaration order

use std::collections::BTreeMap;

use crate::routing::pattern::{RoutePattern, Segment, UrlPattern};
use crate::routing::types::{Configuration, LinkEvent, LinkUrl, MatchResult, MatchedRoute, Route};

/// Key under which a trailing `**` capture is stored.
pub const REST_PARAM: &str = "rest";

/// Map a link to at most one route of `config`.
pub fn match_link(event: &LinkEvent, config: &Configuration) -> MatchResult {
    let best = match event {
        LinkEvent::Activity(activity) if activity.webpage_url.is_none() => config
            .routes
            .iter()
            .find(|route| {
                matches!(&route.pattern, RoutePattern::Activity(t) if *t == activity.activity_type)
            })
            .map(|route| matched(route, BTreeMap::new(), Vec::new())),
        _ => match event.url() {
            Some(url) => best_url_match(url, &config.routes),
            None => None,
        },
    };

    match best {
        Some(m) => MatchResult::Matched(m),
        None => match &config.default_handler {
            Some(handler) => MatchResult::Matched(MatchedRoute {
                handler: handler.clone(),
                pattern: None,
                params: BTreeMap::new(),
                query: Vec::new(),
            }),
            None => MatchResult::Unmatched,
        },
    }
}

fn best_url_match(url: &LinkUrl, routes: &[Route]) -> Option<MatchedRoute> {
    let segments: Vec<&str> = url.segments().collect();
    let mut best: Option<(&Route, BTreeMap<String, String>)> = None;

    for route in routes {
        let RoutePattern::Url(pattern) = &route.pattern else {
            continue;
        };
        let Some(params) = match_url(pattern, url, &segments) else {
            continue;
        };
        // Strictly-better only, so the earlier declaration wins ties.
        let better = match &best {
            Some((current, _)) => route.pattern.specificity() < current.pattern.specificity(),
            None => true,
        };
        if better {
            best = Some((route, params));
        }
    }

    best.map(|(route, params)| matched(route, params, url.query().to_vec()))
}

fn matched(
    route: &Route,
    params: BTreeMap<String, String>,
    query: Vec<(String, String)>,
) -> MatchedRoute {
    MatchedRoute {
        handler: route.handler.clone(),
        pattern: Some(route.pattern.to_string()),
        params,
        query,
    }
}

fn component_matches(expected: &Option<String>, actual: &str) -> bool {
    match expected {
        None => true,
        Some(expected) => expected.eq_ignore_ascii_case(actual),
    }
}

/// Returns the captured parameters when `pattern` accepts the link.
fn match_url(
    pattern: &UrlPattern,
    url: &LinkUrl,
    segments: &[&str],
) -> Option<BTreeMap<String, String>> {
    if !component_matches(&pattern.scheme, url.scheme()) {
        return None;
    }
    if !component_matches(&pattern.host, url.host()) {
        return None;
    }

    let mut params = BTreeMap::new();
    let mut anonymous = 0usize;

    for (i, segment) in pattern.segments.iter().enumerate() {
        match segment {
            Segment::Rest => {
                params.insert(REST_PARAM.to_string(), segments[i.min(segments.len())..].join("/"));
                return Some(params);
            }
            Segment::Literal(literal) => {
                if segments.get(i) != Some(&literal.as_str()) {
                    return None;
                }
            }
            Segment::Wildcard => {
                let value = segments.get(i)?;
                params.insert(format!("segment{}", anonymous), (*value).to_string());
                anonymous += 1;
            }
            Segment::Named(name) => {
                let value = segments.get(i)?;
                params.insert(name.clone(), (*value).to_string());
            }
        }
    }

    (segments.len() == pattern.segments.len()).then_some(params)
}
