//! The record of one navigation attempt.
//!
//! A [`NavigationContext`] is built once per navigation (explicit call,
//! intercepted link, history pop-state replay) from the raw target URL and is
//! owned by the dispatch call that created it. Middleware receives it mutably
//! so earlier stages can leave data for later ones; redirects never touch it
//! and build a fresh context for the new target instead.

use crate::{QueryParams, RouteParams};
use std::collections::HashMap;

/// Parsed navigation target plus dispatch state.
///
/// # Example
///
/// ```
/// use dispatch_navigator::NavigationContext;
///
/// let ctx = NavigationContext::new("https://app.test/users/7?tab=posts", None);
/// assert_eq!(ctx.protocol.as_deref(), Some("https"));
/// assert_eq!(ctx.domain.as_deref(), Some("app.test"));
/// assert_eq!(ctx.path, "/users/7");
/// assert_eq!(ctx.search_params.get("tab"), Some("posts"));
/// assert!(ctx.params.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationContext {
    /// The original input string
    pub url: String,

    /// Scheme, present only when `url` contained `://`
    pub protocol: Option<String>,

    /// Host part, present only when `url` contained `://`
    pub domain: Option<String>,

    /// Path before any `?`; empty when the url had none
    pub path: String,

    /// Raw query string without the `?`
    pub search: String,

    /// Naive `key=value` map built from `search`
    pub search_params: QueryParams,

    /// Parameters bound by the matching route; `None` until a route matched
    pub params: Option<RouteParams>,

    /// Prefix stripped before matching, assigned by the router at evaluation time
    pub base_path: String,

    /// Id of the router that created this context
    pub router_id: Option<String>,

    /// Free-form values middleware hands to later stages
    pub locals: HashMap<String, String>,

    recorded: bool,
}

impl NavigationContext {
    /// Parse `url` into a fresh, unrecorded context.
    pub fn new(url: impl Into<String>, router_id: Option<String>) -> Self {
        let url = url.into();

        let (protocol, domain, full_path) = match url.split_once("://") {
            Some((protocol, rest)) => {
                let (domain, path) = match rest.find('/') {
                    Some(slash) => rest.split_at(slash),
                    None => (rest, ""),
                };
                (Some(protocol.to_string()), Some(domain.to_string()), path)
            }
            None => (None, None, url.as_str()),
        };

        let (path, search) = full_path.split_once('?').unwrap_or((full_path, ""));

        Self {
            protocol,
            domain,
            path: path.to_string(),
            search: search.to_string(),
            search_params: QueryParams::parse(search),
            params: None,
            base_path: String::new(),
            router_id,
            locals: HashMap::new(),
            recorded: false,
            url,
        }
    }

    /// Bound parameter by name; `None` before matching or when unbound.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.as_ref()?.get(name)
    }

    /// Mutable access to the bound parameters, creating the map if absent.
    pub fn params_mut(&mut self) -> &mut RouteParams {
        self.params.get_or_insert_with(RouteParams::new)
    }

    /// Store a value for later middleware.
    pub fn set_local(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.locals.insert(key.into(), value.into());
    }

    /// Read a value stored by earlier middleware.
    pub fn local(&self, key: &str) -> Option<&str> {
        self.locals.get(key).map(String::as_str)
    }

    /// `?search` when a query string is present, otherwise empty.
    pub fn query_suffix(&self) -> String {
        if self.search.is_empty() {
            String::new()
        } else {
            format!("?{}", self.search)
        }
    }

    /// Whether this navigation has been committed to history.
    pub fn is_recorded(&self) -> bool {
        self.recorded
    }

    /// Mark the context recorded. Returns `false` if it already was.
    pub(crate) fn mark_recorded(&mut self) -> bool {
        !std::mem::replace(&mut self.recorded, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let ctx = NavigationContext::new("/about", Some("r1".to_string()));
        assert_eq!(ctx.path, "/about");
        assert!(ctx.protocol.is_none());
        assert!(ctx.domain.is_none());
        assert_eq!(ctx.search, "");
        assert!(ctx.search_params.is_empty());
        assert_eq!(ctx.router_id.as_deref(), Some("r1"));
        assert!(!ctx.is_recorded());
    }

    #[test]
    fn test_full_url() {
        let ctx = NavigationContext::new("http://localhost:8080/page/2?sort=asc&x", None);
        assert_eq!(ctx.protocol.as_deref(), Some("http"));
        assert_eq!(ctx.domain.as_deref(), Some("localhost:8080"));
        assert_eq!(ctx.path, "/page/2");
        assert_eq!(ctx.search, "sort=asc&x");
        assert_eq!(ctx.search_params.get("sort"), Some("asc"));
        assert_eq!(ctx.query_suffix(), "?sort=asc&x");
    }

    #[test]
    fn test_url_without_path() {
        let ctx = NavigationContext::new("https://example.com", None);
        assert_eq!(ctx.domain.as_deref(), Some("example.com"));
        assert_eq!(ctx.path, "");
    }

    #[test]
    fn test_query_only() {
        let ctx = NavigationContext::new("?a=1", None);
        assert_eq!(ctx.path, "");
        assert_eq!(ctx.search_params.get("a"), Some("1"));
    }

    #[test]
    fn test_path_never_contains_query_delimiter() {
        for url in ["/a?b=c", "/a?", "https://h/x?y?z"] {
            let ctx = NavigationContext::new(url, None);
            assert!(!ctx.path.contains('?'), "{url}");
        }
    }

    #[test]
    fn test_params_absent_until_written() {
        let mut ctx = NavigationContext::new("/", None);
        assert!(ctx.params.is_none());
        assert_eq!(ctx.param("id"), None);

        ctx.params_mut().insert("id", "9");
        assert_eq!(ctx.param("id"), Some("9"));
    }

    #[test]
    fn test_recorded_once() {
        let mut ctx = NavigationContext::new("/", None);
        assert!(ctx.mark_recorded());
        assert!(!ctx.mark_recorded());
        assert!(ctx.is_recorded());
    }

    #[test]
    fn test_locals() {
        let mut ctx = NavigationContext::new("/", None);
        ctx.set_local("logged", "true");
        assert_eq!(ctx.local("logged"), Some("true"));
        assert_eq!(ctx.local("missing"), None);
    }
}
