//! Derived subpaths: path sections computed at dispatch time.
//!
//! A pattern section written `$:name` is not supplied by the incoming path;
//! its value comes from the resolver registered under `name`. Such routes are
//! rewritten when they are registered, never at match time:
//!
//! For each derived section, left to right:
//!
//! 1. An **append** redirect is registered for the sections before it. A
//!    navigation landing exactly on that prefix resolves the value and
//!    redirects to `<current path>/<value>/<rest>`, where the sections after
//!    the derived one are filled like a rebuild.
//! 2. If anything follows the derived section, a **rebuild** redirect is
//!    registered for the pattern with that section removed. It resolves the
//!    value and redirects to the full pattern with named sections filled from
//!    the bound parameters and later derived sections resolved in turn.
//!
//! Append redirects come first in table order, rebuild redirects follow from
//! the innermost outwards, and the route itself (every `$:` read as `:`) comes
//! last. Every hop re-evaluates with history replacement, so the chain of
//! redirects collapses into one back-button stop. The query string is carried
//! along unchanged.
//!
//! # Example
//!
//! ```
//! use dispatch_navigator::subpath::{rewrite_derived, DerivedSubpath};
//!
//! let team = DerivedSubpath::sync("team", |_ctx| "core".to_string());
//! assert_eq!(team.name(), "team");
//!
//! let redirects = rewrite_derived("/org/$:team/:page").unwrap();
//! let patterns: Vec<&str> = redirects.iter().map(|(p, _)| p.as_str()).collect();
//! assert_eq!(patterns, vec!["/org", "/org/:page"]);
//! ```

use crate::error::NavigationError;
use crate::matching::{split_sections, Segment};
use crate::{trace_log, NavigationContext};
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Marker that turns a named section into a derived one.
pub const DERIVED_MARKER: &str = "$:";

/// Future produced by a resolver.
pub type ResolveFuture = LocalBoxFuture<'static, Result<String, NavigationError>>;

/// Function from context to the value of a derived section.
pub type Resolver = Arc<dyn Fn(&NavigationContext) -> ResolveFuture + Send + Sync>;

// ============================================================================
// DerivedSubpath
// ============================================================================

/// A named resolver for a derived section.
#[derive(Clone)]
pub struct DerivedSubpath {
    name: String,
    resolver: Resolver,
}

impl DerivedSubpath {
    /// Create from an async resolver. Its error is reported as
    /// [`NavigationError::Resolution`].
    ///
    /// The resolver gets the context by reference and must copy whatever it
    /// needs into the returned future.
    pub fn new<F, Fut, E>(name: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&NavigationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, E>> + 'static,
        E: fmt::Display,
    {
        let name = name.into();
        let subpath = name.clone();
        let resolver: Resolver = Arc::new(move |context: &NavigationContext| {
            let subpath = subpath.clone();
            resolve(context)
                .map(move |result| {
                    result.map_err(|err| NavigationError::Resolution {
                        subpath,
                        message: err.to_string(),
                    })
                })
                .boxed_local()
        });
        Self { name, resolver }
    }

    /// Create from a synchronous resolver that cannot fail.
    pub fn sync<F>(name: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&NavigationContext) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            resolver: Arc::new(move |context: &NavigationContext| {
                future::ready(Ok::<_, NavigationError>(resolve(context))).boxed_local()
            }),
        }
    }

    /// Name referenced by `$:name` sections.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for DerivedSubpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSubpath")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Name → resolver map. Registering a name twice replaces the resolver.
#[derive(Clone, Default)]
pub struct DerivedSubpathRegistry {
    resolvers: HashMap<String, Resolver>,
}

impl DerivedSubpathRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver. Returns `true` if it replaced an earlier one.
    pub fn register(&mut self, subpath: DerivedSubpath) -> bool {
        self.resolvers
            .insert(subpath.name, subpath.resolver)
            .is_some()
    }

    /// Whether a resolver is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// Number of registered resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether no resolver is registered.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolve `name` against `context`. A missing resolver fails with
    /// [`NavigationError::UnknownSubpath`].
    pub fn resolve(&self, name: &str, context: &NavigationContext) -> ResolveFuture {
        match self.resolvers.get(name) {
            Some(resolver) => resolver(context),
            None => future::ready(Err(NavigationError::UnknownSubpath {
                name: name.to_string(),
            }))
            .boxed_local(),
        }
    }
}

impl fmt::Debug for DerivedSubpathRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resolvers.keys()).finish()
    }
}

// ============================================================================
// Redirect plans
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    /// Bound parameter; the raw section text stands in when unbound
    Param { name: String, raw: String },
    Derived(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PlanKind {
    /// `rest` holds the sections following the derived one
    Append { subpath: String, rest: Vec<TemplatePart> },
    Rebuild { template: Vec<TemplatePart> },
}

/// Where a derived-subpath redirect sends the navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPlan {
    kind: PlanKind,
}

impl RedirectPlan {
    /// Name of the derived section this redirect fills in.
    pub fn subpath(&self) -> &str {
        match &self.kind {
            PlanKind::Append { subpath, .. } => subpath,
            PlanKind::Rebuild { template } => template
                .iter()
                .find_map(|part| match part {
                    TemplatePart::Derived(name) => Some(name.as_str()),
                    _ => None,
                })
                .unwrap_or_default(),
        }
    }

    /// Resolve the redirect target for a matched context.
    pub async fn target(
        &self,
        registry: &DerivedSubpathRegistry,
        context: &NavigationContext,
    ) -> Result<String, NavigationError> {
        let query = context.query_suffix();
        match &self.kind {
            PlanKind::Append { subpath, rest } => {
                let mut sections = vec![registry.resolve(subpath, context).await?];
                sections.extend(fill(rest, registry, context).await?);
                let base = context.path.strip_suffix('/').unwrap_or(&context.path);
                Ok(format!("{}/{}{}", base, sections.join("/"), query))
            }
            PlanKind::Rebuild { template } => {
                let sections = fill(template, registry, context).await?;
                Ok(format!("{}/{}{}", context.base_path, sections.join("/"), query))
            }
        }
    }
}

/// Render template parts in order, resolving derived parts one at a time.
async fn fill(
    template: &[TemplatePart],
    registry: &DerivedSubpathRegistry,
    context: &NavigationContext,
) -> Result<Vec<String>, NavigationError> {
    let mut sections = Vec::with_capacity(template.len());
    for part in template {
        let section = match part {
            TemplatePart::Literal(text) => text.clone(),
            TemplatePart::Param { name, raw } => context.param(name).unwrap_or(raw.as_str()).to_string(),
            TemplatePart::Derived(name) => registry.resolve(name, context).await?,
        };
        sections.push(section);
    }
    Ok(sections)
}

// ============================================================================
// Pattern rewrite
// ============================================================================

/// Whether any section of `pattern` is derived.
pub fn has_derived(pattern: &str) -> bool {
    split_sections(pattern)
        .iter()
        .any(|section| section.starts_with(DERIVED_MARKER))
}

/// Names of the derived sections of `pattern`, in order.
pub fn derived_names(pattern: &str) -> Vec<&str> {
    split_sections(pattern)
        .into_iter()
        .filter_map(|section| section.strip_prefix(DERIVED_MARKER))
        .map(|rest| rest.split('(').next().unwrap_or(rest))
        .collect()
}

fn join_pattern<'a>(sections: impl IntoIterator<Item = &'a str>) -> String {
    let joined: Vec<&str> = sections.into_iter().collect();
    format!("/{}", joined.join("/"))
}

/// Compute the redirect entries a derived pattern expands into, in table
/// order. The route itself is not included.
pub fn rewrite_derived(pattern: &str) -> Result<Vec<(String, RedirectPlan)>, NavigationError> {
    let sections = split_sections(pattern);
    let last = sections.len() - 1;

    let mut parts = Vec::with_capacity(sections.len());
    for (i, section) in sections.iter().enumerate() {
        let segment = Segment::parse(section, i == last, pattern)?;
        let part = match segment.name() {
            Some(name) if section.starts_with(DERIVED_MARKER) => TemplatePart::Derived(name.to_string()),
            Some(name) => TemplatePart::Param {
                name: name.to_string(),
                raw: (*section).to_string(),
            },
            None => TemplatePart::Literal((*section).to_string()),
        };
        parts.push(part);
    }

    let derived: Vec<usize> = parts
        .iter()
        .enumerate()
        .filter(|(_, part)| matches!(part, TemplatePart::Derived(_)))
        .map(|(i, _)| i)
        .collect();

    let mut appends = Vec::new();
    let mut rebuilds = Vec::new();

    for &idx in &derived {
        let TemplatePart::Derived(subpath) = &parts[idx] else {
            continue;
        };

        let prefix = join_pattern(sections[..idx].iter().copied());
        trace_log!("'{}': append redirect on '{}' for '{}'", pattern, prefix, subpath);
        appends.push((
            prefix,
            RedirectPlan {
                kind: PlanKind::Append {
                    subpath: subpath.clone(),
                    rest: parts[idx + 1..].to_vec(),
                },
            },
        ));

        if idx == last {
            continue;
        }

        // Earlier derived sections already carry their value in the path.
        let template = parts
            .iter()
            .enumerate()
            .map(|(i, part)| match part {
                TemplatePart::Derived(name) if i < idx => TemplatePart::Param {
                    name: name.clone(),
                    raw: sections[i].to_string(),
                },
                other => other.clone(),
            })
            .collect();
        let without = join_pattern(
            sections
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, section)| *section),
        );
        trace_log!("'{}': rebuild redirect on '{}' for '{}'", pattern, without, subpath);
        rebuilds.push((
            without,
            RedirectPlan {
                kind: PlanKind::Rebuild { template },
            },
        ));
    }

    rebuilds.reverse();
    appends.extend(rebuilds);
    Ok(appends)
}
