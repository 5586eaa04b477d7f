//! Route table entries.
//!
//! A [`RouteEntry`] pairs a matcher with an ordered action list. Two matcher
//! variants exist: a compiled path pattern ([`TokenizedPath`]) or a raw
//! regular expression tested against the whole path. Both see the path with
//! the router's base path removed.
//!
//! Testing an entry never runs its actions: on success the entry binds
//! `context.params` and hands back a [`MiddlewareChain`] for the router to
//! sequence after the global middleware.

use crate::error::NavigationError;
use crate::matching::{split_sections, TokenizedPath};
use crate::middleware::{Action, ChainOutcome, MiddlewareChain, MiddlewareRef};
use crate::subpath::{has_derived, RedirectPlan};
use crate::{trace_log, NavigationContext, RouteParams};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// What a route is registered with: a path pattern or a raw expression.
#[derive(Debug, Clone)]
pub enum PatternSource {
    /// `/`-delimited route pattern
    Path(String),
    /// Expression tested against the base-stripped path
    Expression(Regex),
}

impl From<&str> for PatternSource {
    fn from(pattern: &str) -> Self {
        PatternSource::Path(pattern.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(pattern: String) -> Self {
        PatternSource::Path(pattern)
    }
}

impl From<Regex> for PatternSource {
    fn from(expression: Regex) -> Self {
        PatternSource::Expression(expression)
    }
}

/// Compiled matcher of an entry.
#[derive(Debug, Clone)]
pub enum RoutePattern {
    Tokenized(TokenizedPath),
    Expression(Regex),
}

/// A matcher and the actions it runs.
///
/// # Example
///
/// ```
/// use dispatch_navigator::{handler_fn, NavigationContext, RouteEntry};
///
/// let entry = RouteEntry::new("/user/:id", vec![handler_fn(|_ctx| {})]).unwrap();
///
/// let mut ctx = NavigationContext::new("/user/7", None);
/// assert!(entry.matches(&mut ctx).is_some());
/// assert_eq!(ctx.param("id"), Some("7"));
/// ```
#[derive(Clone)]
pub struct RouteEntry {
    source: String,
    pattern: RoutePattern,
    actions: Vec<Action>,
}

impl RouteEntry {
    /// Build an entry from a pattern and its middleware, last usually the handler.
    ///
    /// Optional sections are compiled in their present form; registering the
    /// entry on a router expands them (and any derived sections) as
    /// [`Router::route`](crate::Router::route) does.
    pub fn new(
        pattern: impl Into<PatternSource>,
        actions: Vec<MiddlewareRef>,
    ) -> Result<Self, NavigationError> {
        let actions = actions.into_iter().map(Action::from).collect();
        match pattern.into() {
            PatternSource::Path(path) => Self::with_actions(&path, actions),
            PatternSource::Expression(regex) => Ok(Self::expression(regex, actions)),
        }
    }

    pub(crate) fn with_actions(pattern: &str, actions: Vec<Action>) -> Result<Self, NavigationError> {
        let compiled = match expand_optional(pattern) {
            Some((_, present)) => TokenizedPath::parse(&present)?,
            None => TokenizedPath::parse(pattern)?,
        };
        Ok(Self {
            source: pattern.to_string(),
            pattern: RoutePattern::Tokenized(compiled),
            actions,
        })
    }

    pub(crate) fn expression(regex: Regex, actions: Vec<Action>) -> Self {
        Self {
            source: regex.as_str().to_string(),
            pattern: RoutePattern::Expression(regex),
            actions,
        }
    }

    pub(crate) fn redirect(pattern: &str, plan: RedirectPlan) -> Result<Self, NavigationError> {
        Self::with_actions(pattern, vec![Action::Redirect(Arc::new(plan))])
    }

    /// Pattern text (or expression source) this entry was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled matcher.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Actions in run order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Whether this entry carries a derived subpath redirect.
    pub fn is_redirect(&self) -> bool {
        self.actions
            .iter()
            .any(|action| matches!(action, Action::Redirect(_)))
    }

    /// Whether registering this entry rewrites it into several table entries.
    pub(crate) fn needs_expansion(&self) -> bool {
        matches!(self.pattern, RoutePattern::Tokenized(_))
            && (expand_optional(&self.source).is_some() || has_derived(&self.source))
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Action>) {
        (self.source, self.actions)
    }

    /// Test `path` with `base_path` removed. No side effects.
    pub fn test(&self, path: &str, base_path: &str) -> Option<RouteParams> {
        let relative = strip_base_path(path, base_path)?;
        match &self.pattern {
            RoutePattern::Tokenized(tokenized) => tokenized.matches(relative),
            RoutePattern::Expression(regex) => regex.is_match(relative).then(RouteParams::new),
        }
    }

    /// Test the context. On success bind `context.params` and return the
    /// not-yet-run action chain.
    pub fn matches(&self, context: &mut NavigationContext) -> Option<MiddlewareChain<'_>> {
        let params = self.test(&context.path, &context.base_path)?;
        trace_log!("'{}' matched '{}' -> {:?}", self.source, context.path, params);
        context.params = Some(params);
        Some(MiddlewareChain::new(&self.actions))
    }

    /// Run this entry's actions against `context` until they complete, halt
    /// or reach a redirect.
    pub fn fire_actions(&self, context: &mut NavigationContext) -> ChainOutcome<'_> {
        MiddlewareChain::new(&self.actions).run(context)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("source", &self.source)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Remove `base_path` from the front of `path`.
///
/// The base must end at a section boundary. A path outside the base yields
/// `None`; an empty base accepts every path unchanged.
///
/// ```
/// use dispatch_navigator::route::strip_base_path;
///
/// assert_eq!(strip_base_path("/mount/foo", "/mount"), Some("/foo"));
/// assert_eq!(strip_base_path("/mountain", "/mount"), None);
/// assert_eq!(strip_base_path("/foo", ""), Some("/foo"));
/// ```
pub fn strip_base_path<'a>(path: &'a str, base_path: &str) -> Option<&'a str> {
    if base_path.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(base_path)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// Split a pattern with optional sections (`name?`) into its omitted and
/// present forms. `None` when no section is optional.
///
/// ```
/// use dispatch_navigator::route::expand_optional;
///
/// let (omitted, present) = expand_optional("/about/:person?").unwrap();
/// assert_eq!(omitted, "/about");
/// assert_eq!(present, "/about/:person");
/// ```
pub fn expand_optional(pattern: &str) -> Option<(String, String)> {
    let sections = split_sections(pattern);
    if !sections.iter().any(|section| section.ends_with('?')) {
        return None;
    }

    let mut omitted = Vec::new();
    let mut present = Vec::new();
    for section in sections {
        match section.strip_suffix('?') {
            Some(required) => present.push(required),
            None => {
                omitted.push(section);
                present.push(section);
            }
        }
    }
    Some((
        format!("/{}", omitted.join("/")),
        format!("/{}", present.join("/")),
    ))
}
