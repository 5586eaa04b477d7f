//! Path tokenizing and pattern matching.
//!
//! A route pattern is compiled once into a [`TokenizedPath`]: one [`Segment`]
//! per `/`-delimited section, plus an optional full-path expression when the
//! pattern ends in `*`.
//!
//! # Pattern syntax
//!
//! | Section        | Segment                    | Accepts                         |
//! |----------------|----------------------------|---------------------------------|
//! | `users`        | [`Segment::Literal`]       | exactly `users`                 |
//! | `:id`          | [`Segment::Param`]         | any non-empty section           |
//! | `:tab(a\|b)`   | [`Segment::Constrained`]   | sections matching `^(?:a\|b)$`  |
//! | `*`            | [`Segment::Wildcard`]      | any section, even empty         |
//! | `home*` (last) | [`Segment::Prefix`]        | sections starting with `home`   |
//!
//! A `*` closing the last section (`home*`, `:page*`) also gives the pattern a
//! wildcard tail.
//!
//! A derived marker (`$:name`) is read as a plain `:name`; derived routes are
//! rewritten at registration time (see [`subpath`](crate::subpath)).
//!
//! # Matching
//!
//! The candidate loses one trailing `/` and is split into sections. When the
//! pattern has a wildcard tail and its full-path expression accepts the
//! candidate, the match succeeds and parameters are bound wherever sections
//! line up. Otherwise section counts must agree and every segment must accept
//! its section.

use crate::error::NavigationError;
use crate::RouteParams;
use regex::Regex;

/// One compiled section of a route pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Exact text
    Literal(String),
    /// Named, any non-empty value
    Param { name: String },
    /// Named, value must match `regex` (anchored)
    Constrained {
        name: String,
        source: String,
        regex: Regex,
    },
    /// Bare `*` section
    Wildcard,
    /// Trailing `text*` section
    Prefix(String),
}

impl Segment {
    /// Parse a single section. `last` enables the `text*` prefix form.
    pub fn parse(section: &str, last: bool, pattern: &str) -> Result<Self, NavigationError> {
        let section = section.strip_prefix('$').filter(|s| s.starts_with(':')).unwrap_or(section);

        if section == "*" {
            return Ok(Segment::Wildcard);
        }
        if last {
            if let Some(stripped) = section.strip_suffix('*') {
                return match stripped.strip_prefix(':') {
                    Some(rest) => Self::parse_param(rest, pattern),
                    None => Ok(Segment::Prefix(stripped.to_string())),
                };
            }
        }
        if let Some(rest) = section.strip_prefix(':') {
            return Self::parse_param(rest, pattern);
        }
        Ok(Segment::Literal(section.to_string()))
    }

    fn parse_param(rest: &str, pattern: &str) -> Result<Self, NavigationError> {
        let (name, constraint) = match rest.find('(') {
            Some(open) => {
                let expr = rest[open + 1..].strip_suffix(')').ok_or_else(|| {
                    NavigationError::malformed(pattern, format!("unclosed constraint in ':{}'", rest))
                })?;
                (&rest[..open], Some(expr))
            }
            None => (rest, None),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(NavigationError::malformed(
                pattern,
                format!("invalid parameter name '{}'", name),
            ));
        }

        match constraint {
            None => Ok(Segment::Param {
                name: name.to_string(),
            }),
            Some(expr) => {
                let regex = Regex::new(&format!("^(?:{})$", expr)).map_err(|err| {
                    NavigationError::malformed(pattern, format!("constraint for '{}': {}", name, err))
                })?;
                Ok(Segment::Constrained {
                    name: name.to_string(),
                    source: expr.to_string(),
                    regex,
                })
            }
        }
    }

    /// Whether this segment accepts `section`.
    pub fn accepts(&self, section: &str) -> bool {
        match self {
            Segment::Literal(text) => text == section,
            Segment::Param { .. } => !section.is_empty(),
            Segment::Constrained { regex, .. } => regex.is_match(section),
            Segment::Wildcard => true,
            Segment::Prefix(prefix) => section.starts_with(prefix.as_str()),
        }
    }

    /// Parameter name bound by this segment, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Param { name } | Segment::Constrained { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A compiled route pattern.
///
/// # Example
///
/// ```
/// use dispatch_navigator::matching::TokenizedPath;
///
/// let path = TokenizedPath::parse("/user/:section(info|settings)").unwrap();
/// let params = path.matches("/user/info").unwrap();
/// assert_eq!(params.get("section"), Some("info"));
/// assert!(path.matches("/user/other").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct TokenizedPath {
    pattern: String,
    segments: Vec<Segment>,
    tail: Option<Regex>,
}

impl TokenizedPath {
    /// Compile a pattern, failing fast on malformed syntax.
    pub fn parse(pattern: &str) -> Result<Self, NavigationError> {
        let sections = split_sections(pattern);
        let last = sections.len() - 1;
        let segments = sections
            .iter()
            .enumerate()
            .map(|(i, section)| Segment::parse(section, i == last, pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let tail = if pattern.ends_with('*') {
            Some(Self::tail_regex(pattern, &segments)?)
        } else {
            None
        };

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            tail,
        })
    }

    /// Full-path expression for a `*`-terminated pattern: the first parameter
    /// becomes `.*`, the remaining literal text must follow.
    fn tail_regex(pattern: &str, segments: &[Segment]) -> Result<Regex, NavigationError> {
        let mut first_param = true;
        let parts: Vec<String> = segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) | Segment::Prefix(text) => regex::escape(text),
                Segment::Wildcard => String::new(),
                Segment::Param { .. } | Segment::Constrained { .. } if first_param => {
                    first_param = false;
                    ".*".to_string()
                }
                Segment::Param { .. } => "[^/]+".to_string(),
                Segment::Constrained { source, .. } => format!("(?:{})", source),
            })
            .collect();

        let source = format!("^/{}.*$", parts.join("/"));
        Regex::new(&source).map_err(|err| NavigationError::malformed(pattern, err.to_string()))
    }

    /// Pattern text this path was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pattern ends with a wildcard tail.
    pub fn has_tail(&self) -> bool {
        self.tail.is_some()
    }

    /// Match a candidate path, returning the bound parameters.
    pub fn matches(&self, candidate: &str) -> Option<RouteParams> {
        let path = candidate.strip_suffix('/').unwrap_or(candidate);
        let parts: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();

        let tail_accepts = self.tail.as_ref().is_some_and(|tail| {
            let rooted = format!("/{}", candidate.strip_prefix('/').unwrap_or(candidate));
            tail.is_match(&rooted)
        });

        if !tail_accepts && parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (part, segment) in parts.iter().zip(&self.segments) {
            if segment.accepts(part) {
                if let Some(name) = segment.name() {
                    params.insert(name, *part);
                }
            } else if !tail_accepts {
                return None;
            }
        }
        Some(params)
    }
}

/// Split a pattern or path into sections after dropping one leading `/`.
///
/// ```
/// use dispatch_navigator::matching::split_sections;
///
/// assert_eq!(split_sections("/users/123"), vec!["users", "123"]);
/// assert_eq!(split_sections("/"), vec![""]);
/// ```
pub fn split_sections(path: &str) -> Vec<&str> {
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}
