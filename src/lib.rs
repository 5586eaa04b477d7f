//! # dispatch-navigator
//!
//! Client-side route dispatch: match a navigation target against an ordered
//! route table, bind its parameters, and run global and route middleware in
//! order before committing the navigation to host history.
//!
//! # Features
//!
//! - Path patterns with literal, `:param`, `:param(regex)`, `*`, trailing
//!   `name*` and optional `name?` sections, plus raw [`regex::Regex`] routes
//! - Explicit [`Flow::Continue`] / [`Flow::Halt`] middleware chains
//! - Global middleware run before every matched route
//! - Derived subpaths (`$:name`): sections filled by async resolvers through
//!   history-replacing redirects
//! - Base path mounting and external-domain escape
//! - Optional LRU match cache (`cache` feature)
//! - Logging through `log` or `tracing`
//!
//! # Quick Start
//!
//! ```
//! use dispatch_navigator::{guard_fn, handler_fn, middleware_fn, Flow, Router};
//!
//! let mut router = Router::new();
//! router
//!     .middleware(middleware_fn(|ctx| {
//!         ctx.set_local("session", "guest");
//!         Flow::Continue
//!     }))
//!     .route(
//!         "/users/:id(\\d+)",
//!         vec![
//!             guard_fn(|ctx| ctx.local("session").is_some()),
//!             handler_fn(|ctx| println!("user {}", ctx.param("id").unwrap_or_default())),
//!         ],
//!     )
//!     .unwrap();
//!
//! let outcome = pollster::block_on(router.navigate("/users/42")).unwrap();
//! assert!(outcome.is_handled());
//! assert_eq!(outcome.params().and_then(|p| p.get("id")), Some("42"));
//!
//! // Nothing matches: the page would be sent to the url instead.
//! let outcome = pollster::block_on(router.navigate("/users/abc")).unwrap();
//! assert!(outcome.is_escaped());
//! ```
//!
//! # Derived subpaths
//!
//! ```
//! use dispatch_navigator::{handler_fn, DerivedSubpath, Router};
//!
//! let mut router = Router::new();
//! router
//!     .derived_subpath(DerivedSubpath::sync("team", |_ctx| "core".to_string()))
//!     .route("/team/$:team/:page", vec![handler_fn(|_ctx| {})])
//!     .unwrap();
//!
//! let outcome = pollster::block_on(router.navigate("/team/roadmap")).unwrap();
//! assert_eq!(outcome.path(), Some("/team/core/roadmap"));
//! ```

mod logging;

pub mod context;
pub mod error;
pub mod host;
pub mod matching;
pub mod middleware;
pub mod params;
pub mod route;
pub mod router;
pub mod subpath;

#[cfg(feature = "cache")]
pub mod cache;

pub use context::NavigationContext;
pub use error::{ErrorHandlers, NavigationError, NavigationOutcome};
pub use host::HostWindow;
pub use middleware::{
    guard_fn, handler_fn, middleware_fn, Action, ChainOutcome, Flow, Middleware, MiddlewareChain,
    MiddlewareRef, Step,
};
pub use params::{QueryParams, RouteParams};
pub use route::{PatternSource, RouteEntry};
pub use router::{Registration, Router, RouterOptions};
pub use subpath::{DerivedSubpath, DerivedSubpathRegistry};
