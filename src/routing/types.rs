//! Link events, routes and configuration snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde::Serialize;
use url::Url;

use crate::error::LinkError;
use crate::routing::pattern::RoutePattern;

/// A URL decomposed into the parts routing looks at.
///
/// Scheme and host are stored lowercased. Path segment case is kept.
/// Segments are held percent-decoded, so a parsed URL and one built from
/// decoded parts route the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkUrl {
    scheme: String,
    host: String,
    path: String,
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl LinkUrl {
    /// Build from already separated, already decoded parts.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let segments = split_path(&path).map(str::to_string).collect();
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into().to_ascii_lowercase(),
            path,
            segments,
            query: Vec::new(),
        }
    }

    /// Append a query pair. Repeated keys are kept in order.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Parse a URL string such as `https://app.example/product/42?ref=mail`
    /// or `myapp://product/42`.
    pub fn parse(raw: &str) -> Result<Self, LinkError> {
        let url = Url::parse(raw).map_err(|source| LinkError::Parse {
            url: raw.to_string(),
            source,
        })?;
        if url.scheme().is_empty() {
            return Err(LinkError::MissingScheme(raw.to_string()));
        }
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        // Decode per segment so an encoded `/` stays inside its segment.
        let segments = split_path(url.path())
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
            .collect();
        Ok(Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host: url.host_str().unwrap_or_default().to_ascii_lowercase(),
            path: url.path().to_string(),
            segments,
            query,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path as given; percent-encoded when the link was parsed.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Non-empty, decoded path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// A platform continuation ("user activity").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActivity {
    pub activity_type: String,
    pub payload: BTreeMap<String, String>,
    /// Set for browsing-web continuations; such activities route by URL.
    pub webpage_url: Option<LinkUrl>,
}

impl UserActivity {
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            payload: BTreeMap::new(),
            webpage_url: None,
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_webpage_url(mut self, url: LinkUrl) -> Self {
        self.webpage_url = Some(url);
        self
    }
}

/// One incoming activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// URL-scheme or universal-link activation.
    Url(LinkUrl),
    /// Continuation activation.
    Activity(UserActivity),
}

impl LinkEvent {
    /// Parse a URL string into a URL event.
    pub fn from_url(raw: &str) -> Result<Self, LinkError> {
        LinkUrl::parse(raw).map(LinkEvent::Url)
    }

    /// The URL this event routes by, if it has one.
    pub fn url(&self) -> Option<&LinkUrl> {
        match self {
            LinkEvent::Url(url) => Some(url),
            LinkEvent::Activity(activity) => activity.webpage_url.as_ref(),
        }
    }
}

/// A pattern bound to a handler identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub pattern: RoutePattern,
    pub handler: String,
}

/// An immutable, versioned routing configuration.
///
/// Never mutated after publication; updates build a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub version: u64,
    /// Routes in declaration order.
    pub routes: Vec<Route>,
    pub default_handler: Option<String>,
    pub features: BTreeMap<String, bool>,
}

impl Configuration {
    /// Configuration with no routes, published when bootstrap has no payload.
    pub fn empty() -> Self {
        Self {
            version: 0,
            routes: Vec::new(),
            default_handler: None,
            features: BTreeMap::new(),
        }
    }

    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRoute {
    pub handler: String,
    /// Canonical pattern text; `None` for the default handler.
    pub pattern: Option<String>,
    pub params: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
}

/// Outcome of matching one link against one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchResult {
    Matched(MatchedRoute),
    Unmatched,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched(_))
    }

    pub fn handler(&self) -> Option<&str> {
        match self {
            MatchResult::Matched(m) => Some(&m.handler),
            MatchResult::Unmatched => None,
        }
    }
}

/// Shared handle to a published snapshot.
pub type Snapshot = Arc<Configuration>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_universal_link() {
        let url = LinkUrl::parse("HTTPS://App.Example/Product/42?ref=mail&tag=a&tag=b").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "app.example");
        assert_eq!(url.path(), "/Product/42");
        assert_eq!(url.segments().collect::<Vec<_>>(), vec!["Product", "42"]);
        assert_eq!(
            url.query(),
            &[
                ("ref".to_string(), "mail".to_string()),
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_custom_scheme() {
        let url = LinkUrl::parse("myapp://product/42").unwrap();
        assert_eq!(url.scheme(), "myapp");
        assert_eq!(url.host(), "product");
        assert_eq!(url.segments().collect::<Vec<_>>(), vec!["42"]);
    }

    #[test]
    fn test_parse_decodes_segments() {
        let url = LinkUrl::parse("https://app.example/caf%C3%A9/a%20b/x%2Fy").unwrap();
        assert_eq!(url.path(), "/caf%C3%A9/a%20b/x%2Fy");
        assert_eq!(url.segments().collect::<Vec<_>>(), vec!["café", "a b", "x/y"]);

        let unencoded = LinkUrl::parse("https://app.example/café").unwrap();
        assert_eq!(
            unencoded.segments().collect::<Vec<_>>(),
            LinkUrl::new("https", "app.example", "/café").segments().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_parse_rejects_relative() {
        assert!(LinkEvent::from_url("/product/42").is_err());
        assert!(LinkEvent::from_url("").is_err());
    }

    #[test]
    fn test_activity_url() {
        let plain = LinkEvent::Activity(UserActivity::new("com.example.view"));
        assert!(plain.url().is_none());

        let web = LinkEvent::Activity(
            UserActivity::new("NSUserActivityTypeBrowsingWeb")
                .with_webpage_url(LinkUrl::new("https", "app.example", "/a")),
        );
        assert_eq!(web.url().map(LinkUrl::path), Some("/a"));
    }

    #[test]
    fn test_feature_flags() {
        let mut config = Configuration::empty();
        config.features.insert("universal_links".into(), true);
        config.features.insert("clipboard".into(), false);
        assert!(config.feature_enabled("universal_links"));
        assert!(!config.feature_enabled("clipboard"));
        assert!(!config.feature_enabled("unknown"));
    }
}
