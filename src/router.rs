//! The router: route table construction and dispatch.
//!
//! A [`Router`] owns an ordered route table, the global middleware list, the
//! derived subpath resolvers and an optional binding to a [`HostWindow`].
//!
//! # Dispatch
//!
//! [`Router::evaluate`] takes one [`NavigationContext`] through these steps:
//!
//! 1. A context whose domain differs from the bound domain escapes to a full
//!    page load without matching.
//! 2. The router's base path is assigned to the context.
//! 3. The table is scanned in registration order; the first matching entry
//!    wins. There is no specificity ranking, so register `/page/:num` before
//!    `/page*`.
//! 4. Global middleware runs, then the entry's actions, on the same context.
//!    A halted global chain does not skip the route actions.
//! 5. The navigation is committed to host history once.
//! 6. When nothing matches, the not-found handler runs and the page is sent
//!    to the original url.
//!
//! An entry that ends in a derived subpath redirect awaits its resolver,
//! commits the current context and re-evaluates the target with history
//! replacement. A failed resolver is handed to the error handler and returned
//! as an error; nothing is committed for that attempt.
//!
//! The table must not change while a navigation is in flight. Registration
//! needs `&mut Router` and every pending [`evaluate`](Router::evaluate)
//! future borrows the router, so the borrow checker rules this out.
//!
//! # Example
//!
//! ```
//! use dispatch_navigator::{handler_fn, Router};
//!
//! let mut router = Router::new();
//! router
//!     .route("/user/:id", vec![handler_fn(|ctx| {
//!         assert_eq!(ctx.param("id"), Some("7"));
//!     })])
//!     .unwrap();
//!
//! let outcome = pollster::block_on(router.navigate("/user/7")).unwrap();
//! assert_eq!(outcome.path(), Some("/user/7"));
//! ```

use crate::error::{ErrorHandlers, NavigationError, NavigationOutcome};
use crate::host::HostWindow;
use crate::middleware::{Action, ChainOutcome, DebugLog, MiddlewareChain, MiddlewareRef};
use crate::route::{expand_optional, PatternSource, RouteEntry};
use crate::subpath::{derived_names, has_derived, rewrite_derived, DerivedSubpath, DerivedSubpathRegistry};
use crate::{debug_log, error_log, info_log, trace_log, warn_log, NavigationContext};
use futures::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, MatchCache};
#[cfg(feature = "cache")]
use std::cell::RefCell;
#[cfg(feature = "cache")]
use std::num::NonZeroUsize;

static NEXT_ROUTER: AtomicUsize = AtomicUsize::new(1);

fn next_router_id() -> String {
    format!("router-{}", NEXT_ROUTER.fetch_add(1, Ordering::Relaxed))
}

fn normalize_base_path(base_path: &str) -> String {
    base_path.trim_end_matches('/').to_string()
}

// ============================================================================
// RouterOptions
// ============================================================================

/// Construction options for a [`Router`].
///
/// ```
/// use dispatch_navigator::{Router, RouterOptions};
///
/// let router = Router::with_options(
///     RouterOptions::new().router_id("main").base_path("/app/").debug(true),
/// );
/// assert_eq!(router.id(), "main");
/// assert_eq!(router.base_path(), "/app");
/// ```
#[derive(Clone)]
pub struct RouterOptions {
    router_id: Option<String>,
    base_path: String,
    debug: bool,
    error_handlers: ErrorHandlers,
    #[cfg(feature = "cache")]
    cache_capacity: usize,
}

impl RouterOptions {
    #[cfg(feature = "cache")]
    const DEFAULT_CACHE_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::default()
    }

    /// Id recorded on every context this router creates. Defaults to a
    /// process-unique `router-N`.
    pub fn router_id(mut self, id: impl Into<String>) -> Self {
        self.router_id = Some(id.into());
        self
    }

    /// Prefix stripped from paths before matching. `""` and `"/"` both mean none.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Log every matched context through a leading global middleware.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn error_handlers(mut self, handlers: ErrorHandlers) -> Self {
        self.error_handlers = handlers;
        self
    }

    /// Number of resolved paths to remember. Zero disables the cache.
    #[cfg(feature = "cache")]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            router_id: None,
            base_path: String::new(),
            debug: false,
            error_handlers: ErrorHandlers::default(),
            #[cfg(feature = "cache")]
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("router_id", &self.router_id)
            .field("base_path", &self.base_path)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registration
// ============================================================================

/// One item of a [`Router::batch`] registration.
pub enum Registration {
    /// Pattern plus its middleware, as [`Router::route`]
    Route {
        pattern: PatternSource,
        actions: Vec<MiddlewareRef>,
    },
    /// Pre-built entry, as [`Router::route_entry`]
    Entry(RouteEntry),
    /// Resolver, as [`Router::derived_subpath`]
    Subpath(DerivedSubpath),
    /// Global middleware, as [`Router::middleware`]
    Middleware(MiddlewareRef),
    /// Nested collection, expanded in order
    Batch(Vec<Registration>),
}

impl Registration {
    pub fn route(pattern: impl Into<PatternSource>, actions: Vec<MiddlewareRef>) -> Self {
        Registration::Route {
            pattern: pattern.into(),
            actions,
        }
    }
}

impl From<RouteEntry> for Registration {
    fn from(entry: RouteEntry) -> Self {
        Registration::Entry(entry)
    }
}

impl From<DerivedSubpath> for Registration {
    fn from(subpath: DerivedSubpath) -> Self {
        Registration::Subpath(subpath)
    }
}

impl From<MiddlewareRef> for Registration {
    fn from(middleware: MiddlewareRef) -> Self {
        Registration::Middleware(middleware)
    }
}

impl From<Vec<Registration>> for Registration {
    fn from(items: Vec<Registration>) -> Self {
        Registration::Batch(items)
    }
}

// ============================================================================
// Router
// ============================================================================

struct HostBinding {
    host: Rc<dyn HostWindow>,
    domain: Option<String>,
}

/// Route table plus dispatch.
pub struct Router {
    id: String,
    base_path: String,
    routes: Vec<RouteEntry>,
    global_actions: Vec<Action>,
    subpaths: DerivedSubpathRegistry,
    error_handlers: ErrorHandlers,
    binding: Option<HostBinding>,
    #[cfg(feature = "cache")]
    cache: Option<RefCell<MatchCache>>,
}

impl Router {
    /// Router with default options.
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        let id = options.router_id.unwrap_or_else(next_router_id);
        let mut global_actions = Vec::new();
        if options.debug {
            global_actions.push(Action::Middleware(Arc::new(DebugLog)));
        }

        info_log!("Router {{#{}}} created (base path '{}')", id, options.base_path);

        Self {
            id,
            base_path: normalize_base_path(&options.base_path),
            routes: Vec::new(),
            global_actions,
            subpaths: DerivedSubpathRegistry::new(),
            error_handlers: options.error_handlers,
            binding: None,
            #[cfg(feature = "cache")]
            cache: NonZeroUsize::new(options.cache_capacity).map(|cap| RefCell::new(MatchCache::new(cap))),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Normalised base path; empty when none.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Route table in match-priority order.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Whether the router is registered on a host.
    pub fn is_active(&self) -> bool {
        self.binding.is_some()
    }

    /// Domain captured at activation.
    pub fn domain(&self) -> Option<&str> {
        self.binding.as_ref()?.domain.as_deref()
    }

    /// Statistics of the match cache, if enabled.
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.borrow().stats().clone())
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register a pattern with its middleware; the last is usually the
    /// terminal handler.
    ///
    /// Optional sections register two entries. Derived sections register
    /// their redirects ahead of the route and need every resolver they name
    /// to be registered first.
    pub fn route(
        &mut self,
        pattern: impl Into<PatternSource>,
        actions: Vec<MiddlewareRef>,
    ) -> Result<&mut Self, NavigationError> {
        let actions: Vec<Action> = actions.into_iter().map(Action::from).collect();
        match pattern.into() {
            PatternSource::Path(pattern) => {
                let entries = self.compile_path(&pattern, actions)?;
                entries.into_iter().for_each(|entry| self.push_entry(entry));
            }
            PatternSource::Expression(regex) => self.push_entry(RouteEntry::expression(regex, actions)),
        }
        Ok(self)
    }

    /// Register a pre-built entry, expanding it like [`route`](Self::route).
    pub fn route_entry(&mut self, entry: RouteEntry) -> Result<&mut Self, NavigationError> {
        if entry.needs_expansion() {
            let (source, actions) = entry.into_parts();
            let entries = self.compile_path(&source, actions)?;
            entries.into_iter().for_each(|entry| self.push_entry(entry));
        } else {
            self.push_entry(entry);
        }
        Ok(self)
    }

    /// Register a resolver, replacing any with the same name.
    pub fn derived_subpath(&mut self, subpath: DerivedSubpath) -> &mut Self {
        let name = subpath.name().to_string();
        if self.subpaths.register(subpath) {
            debug_log!("Router {{#{}}} replaced derived subpath '{}'", self.id, name);
        } else {
            debug_log!("Router {{#{}}} registered derived subpath '{}'", self.id, name);
        }
        self
    }

    /// Register global middleware, run before route actions on every match.
    pub fn middleware(&mut self, middleware: MiddlewareRef) -> &mut Self {
        debug_log!("Router {{#{}}} added global middleware '{}'", self.id, middleware.name());
        self.global_actions.push(Action::Middleware(middleware));
        self
    }

    /// Register a collection in order. Stops at the first failure; earlier
    /// items stay registered.
    pub fn batch(
        &mut self,
        items: impl IntoIterator<Item = Registration>,
    ) -> Result<&mut Self, NavigationError> {
        for item in items {
            match item {
                Registration::Route { pattern, actions } => {
                    self.route(pattern, actions)?;
                }
                Registration::Entry(entry) => {
                    self.route_entry(entry)?;
                }
                Registration::Subpath(subpath) => {
                    self.derived_subpath(subpath);
                }
                Registration::Middleware(middleware) => {
                    self.middleware(middleware);
                }
                Registration::Batch(nested) => {
                    self.batch(nested)?;
                }
            }
        }
        Ok(self)
    }

    /// Compile a path pattern into the entries it registers, in table order.
    fn compile_path(&self, pattern: &str, actions: Vec<Action>) -> Result<Vec<RouteEntry>, NavigationError> {
        if let Some((omitted, present)) = expand_optional(pattern) {
            debug_log!("Expanding optional '{}' into '{}' and '{}'", pattern, omitted, present);
            let mut entries = self.compile_path(&omitted, actions.clone())?;
            entries.extend(self.compile_path(&present, actions)?);
            return Ok(entries);
        }

        if !has_derived(pattern) {
            return Ok(vec![RouteEntry::with_actions(pattern, actions)?]);
        }

        if let Some(name) = derived_names(pattern)
            .into_iter()
            .find(|name| !self.subpaths.contains(name))
        {
            return Err(NavigationError::UnknownSubpath {
                name: name.to_string(),
            });
        }

        let mut entries = rewrite_derived(pattern)?
            .into_iter()
            .map(|(redirect, plan)| RouteEntry::redirect(&redirect, plan))
            .collect::<Result<Vec<_>, _>>()?;
        debug_log!("Rewrote derived '{}' into {} redirect(s)", pattern, entries.len());
        entries.push(RouteEntry::with_actions(pattern, actions)?);
        Ok(entries)
    }

    fn push_entry(&mut self, entry: RouteEntry) {
        info_log!(
            "Router {{#{}}} registered route #{} '{}'",
            self.id,
            self.routes.len(),
            entry.source()
        );
        self.routes.push(entry);
        #[cfg(feature = "cache")]
        if let Some(cache) = &self.cache {
            cache.borrow_mut().clear();
        }
    }

    // ------------------------------------------------------------------------
    // Activation
    // ------------------------------------------------------------------------

    /// Bind to `host` and capture its current domain.
    ///
    /// Fails with [`NavigationError::AlreadyActive`] when this router is
    /// already bound or the host holds another router. The binding lasts
    /// until [`unregister`](Self::unregister) or drop.
    pub fn register_on(&mut self, host: Rc<dyn HostWindow>) -> Result<&mut Self, NavigationError> {
        if self.binding.is_some() {
            return Err(NavigationError::AlreadyActive {
                router_id: self.id.clone(),
            });
        }
        host.attach(&self.id)
            .map_err(|router_id| NavigationError::AlreadyActive { router_id })?;

        let domain = NavigationContext::new(host.location_href(), None).domain;
        info_log!("Router {{#{}}} registered on host (domain {:?})", self.id, domain);
        self.binding = Some(HostBinding { host, domain });
        Ok(self)
    }

    /// Release the host. Does nothing when not bound; routes are kept.
    pub fn unregister(&mut self) -> &mut Self {
        if let Some(binding) = self.binding.take() {
            binding.host.detach(&self.id);
            info_log!("Router {{#{}}} unregistered", self.id);
        }
        self
    }

    fn host(&self) -> Result<&Rc<dyn HostWindow>, NavigationError> {
        self.binding
            .as_ref()
            .map(|binding| &binding.host)
            .ok_or(NavigationError::NotActive)
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Navigate to `url` as a new history entry.
    pub async fn navigate(&self, url: &str) -> Result<NavigationOutcome, NavigationError> {
        self.evaluate(self.context(url), false).await
    }

    /// Navigate to `url`, replacing the current history entry.
    pub async fn redirect(&self, url: &str) -> Result<NavigationOutcome, NavigationError> {
        self.evaluate(self.context(url), true).await
    }

    /// Evaluate the host's current location.
    pub async fn start(&self) -> Result<NavigationOutcome, NavigationError> {
        let href = self.host()?.location_href();
        self.evaluate(self.context(&href), false).await
    }

    /// Replay a history entry. Entries recorded by other routers, or without
    /// state, are ignored.
    pub async fn handle_pop_state(
        &self,
        state: Option<NavigationContext>,
    ) -> Result<Option<NavigationOutcome>, NavigationError> {
        match state {
            Some(context) if context.router_id.as_deref() == Some(self.id.as_str()) => {
                trace_log!("Router {{#{}}} replaying '{}'", self.id, context.path);
                self.evaluate(context, false).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn back(&self) -> Result<(), NavigationError> {
        self.host()?.back();
        Ok(())
    }

    pub fn forward(&self) -> Result<(), NavigationError> {
        self.host()?.forward();
        Ok(())
    }

    fn context(&self, url: &str) -> NavigationContext {
        NavigationContext::new(url, Some(self.id.clone()))
    }

    /// Dispatch one navigation. `replace` selects history replacement over a
    /// new entry when the navigation is committed.
    pub fn evaluate(
        &self,
        mut context: NavigationContext,
        replace: bool,
    ) -> LocalBoxFuture<'_, Result<NavigationOutcome, NavigationError>> {
        async move {
            if context.domain.is_some() && context.domain.as_deref() != self.domain() {
                debug_log!(
                    "Router {{#{}}} leaving for foreign domain {:?}",
                    self.id,
                    context.domain
                );
                return Ok(self.escape(&context));
            }

            context.base_path.clone_from(&self.base_path);

            let Some((index, entry, chain)) = self.find_route(&mut context) else {
                self.error_handlers.report_not_found(&context);
                return Ok(self.escape(&context));
            };
            debug_log!(
                "Router {{#{}}} matched '{}' with route #{} '{}'",
                self.id,
                context.path,
                index,
                entry.source()
            );

            if let Some(at) = MiddlewareChain::new(&self.global_actions)
                .run(&mut context)
                .halted_at()
            {
                debug_log!("Global middleware halted at position {}", at);
            }

            match chain.run(&mut context) {
                ChainOutcome::Redirect(plan) => {
                    let target = match plan.target(&self.subpaths, &context).await {
                        Ok(target) => target,
                        Err(err) => {
                            error_log!("Router {{#{}}} redirect from '{}' failed: {}", self.id, context.path, err);
                            self.error_handlers.report_error(&context, &err);
                            return Err(err);
                        }
                    };
                    self.commit(&mut context, replace);
                    debug_log!("Router {{#{}}} redirecting '{}' -> '{}'", self.id, context.path, target);
                    self.evaluate(self.context(&target), true).await
                }
                ChainOutcome::Completed | ChainOutcome::Halted { .. } => {
                    self.commit(&mut context, replace);
                    Ok(NavigationOutcome::Handled {
                        path: context.path,
                        params: context.params.unwrap_or_default(),
                    })
                }
            }
        }
        .boxed_local()
    }

    /// First matching entry and its unrun action chain; binds `context.params`.
    fn find_route(
        &self,
        context: &mut NavigationContext,
    ) -> Option<(usize, &RouteEntry, MiddlewareChain<'_>)> {
        #[cfg(feature = "cache")]
        if let Some(cache) = &self.cache {
            let hit = cache.borrow_mut().get(&context.path);
            if let Some(hit) = hit {
                if let Some(entry) = self.routes.get(hit.index) {
                    context.params = Some(hit.params);
                    return Some((hit.index, entry, MiddlewareChain::new(entry.actions())));
                }
            }
        }

        let (index, entry, chain) = self
            .routes
            .iter()
            .enumerate()
            .find_map(|(index, entry)| entry.matches(context).map(|chain| (index, entry, chain)))?;

        #[cfg(feature = "cache")]
        if let (Some(cache), Some(params)) = (&self.cache, &context.params) {
            cache
                .borrow_mut()
                .insert(context.path.clone(), index, params.clone());
        }

        Some((index, entry, chain))
    }

    fn commit(&self, context: &mut NavigationContext, replace: bool) {
        if !context.mark_recorded() {
            return;
        }
        match &self.binding {
            Some(binding) => {
                trace_log!(
                    "Router {{#{}}} recording '{}' (replace: {})",
                    self.id,
                    context.path,
                    replace
                );
                binding.host.record(&*context, &context.path, replace);
            }
            None => trace_log!("Router {{#{}}} has no host; '{}' not recorded", self.id, context.path),
        }
    }

    fn escape(&self, context: &NavigationContext) -> NavigationOutcome {
        info_log!("Router {{#{}}} escaping to '{}'", self.id, context.url);
        match &self.binding {
            Some(binding) => binding.host.assign_location(&context.url),
            None => warn_log!("Router {{#{}}} has no host to load '{}'", self.id, context.url),
        }
        NavigationOutcome::Escaped {
            url: context.url.clone(),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("id", &self.id)
            .field("base_path", &self.base_path)
            .field("routes", &self.routes)
            .field("global_actions", &self.global_actions)
            .field("subpaths", &self.subpaths.len())
            .field("active", &self.is_active())
            .finish()
    }
}
