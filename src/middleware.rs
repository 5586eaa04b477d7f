//! Middleware and the action chain runner.
//!
//! Every matched navigation runs two chains over the same
//! [`NavigationContext`]: the router's global middleware first, then the
//! matched route's actions. A chain is a slice of [`Action`]s plus a cursor.
//! Each middleware answers with a [`Flow`]: `Continue` advances the cursor,
//! `Halt` ends the chain at that action (an authorization check that declines
//! to proceed, for example).
//!
//! Actions run strictly in registration order and never overlap. All
//! middleware is **synchronous**; the only suspension point in a navigation
//! is a derived subpath redirect, which ends its chain and is awaited by the
//! router.
//!
//! # Creating middleware
//!
//! | Approach                 | When to use                                   |
//! |--------------------------|-----------------------------------------------|
//! | Implement [`Middleware`] | Named middleware with its own state           |
//! | [`middleware_fn`]        | Closure that decides whether to continue      |
//! | [`handler_fn`]           | Terminal handler, always continues            |
//! | [`guard_fn`]             | Predicate; a `false` halts the chain          |
//!
//! # Example
//!
//! ```
//! use dispatch_navigator::{middleware_fn, Flow, MiddlewareChain, Action, NavigationContext};
//!
//! let actions = vec![
//!     Action::from(middleware_fn(|ctx| {
//!         ctx.set_local("seen", "yes");
//!         Flow::Continue
//!     })),
//!     Action::from(middleware_fn(|_ctx| Flow::Halt)),
//! ];
//!
//! let mut ctx = NavigationContext::new("/", None);
//! let outcome = MiddlewareChain::new(&actions).run(&mut ctx);
//! assert_eq!(outcome.halted_at(), Some(1));
//! assert_eq!(ctx.local("seen"), Some("yes"));
//! ```

use crate::subpath::RedirectPlan;
use crate::{debug_log, trace_log, NavigationContext};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Middleware trait
// ============================================================================

/// What the chain does after a middleware returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next action
    Continue,
    /// Stop the chain here
    Halt,
}

/// A step in a navigation's action chain.
///
/// # Example
///
/// ```
/// use dispatch_navigator::{Middleware, Flow, NavigationContext};
///
/// struct RequireLogin {
///     logged_in: bool,
/// }
///
/// impl Middleware for RequireLogin {
///     fn handle(&self, _context: &mut NavigationContext) -> Flow {
///         if self.logged_in { Flow::Continue } else { Flow::Halt }
///     }
///
///     fn name(&self) -> &'static str {
///         "RequireLogin"
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Run against the context and decide whether the chain continues.
    fn handle(&self, context: &mut NavigationContext) -> Flow;

    /// Middleware name for debugging.
    fn name(&self) -> &'static str {
        "Middleware"
    }
}

/// Shared handle to a middleware, as stored in route entries.
pub type MiddlewareRef = Arc<dyn Middleware>;

// ============================================================================
// Closure helpers
// ============================================================================

/// Create middleware from a closure returning [`Flow`].
pub fn middleware_fn<F>(f: F) -> MiddlewareRef
where
    F: Fn(&mut NavigationContext) -> Flow + Send + Sync + 'static,
{
    Arc::new(FnMiddleware { f })
}

/// Create a terminal handler from a closure. The chain always continues.
pub fn handler_fn<F>(f: F) -> MiddlewareRef
where
    F: Fn(&mut NavigationContext) + Send + Sync + 'static,
{
    Arc::new(FnHandler { f })
}

/// Create a guard from a predicate. Returning `false` halts the chain.
///
/// ```
/// use dispatch_navigator::{guard_fn, Flow, Middleware, NavigationContext};
///
/// let guard = guard_fn(|ctx| ctx.local("user").is_some());
/// let mut ctx = NavigationContext::new("/admin", None);
/// assert_eq!(guard.handle(&mut ctx), Flow::Halt);
/// ```
pub fn guard_fn<F>(f: F) -> MiddlewareRef
where
    F: Fn(&NavigationContext) -> bool + Send + Sync + 'static,
{
    Arc::new(FnGuard { f })
}

struct FnMiddleware<F> {
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut NavigationContext) -> Flow + Send + Sync + 'static,
{
    fn handle(&self, context: &mut NavigationContext) -> Flow {
        (self.f)(context)
    }
}

struct FnHandler<F> {
    f: F,
}

impl<F> Middleware for FnHandler<F>
where
    F: Fn(&mut NavigationContext) + Send + Sync + 'static,
{
    fn handle(&self, context: &mut NavigationContext) -> Flow {
        (self.f)(context);
        Flow::Continue
    }

    fn name(&self) -> &'static str {
        "Handler"
    }
}

struct FnGuard<F> {
    f: F,
}

impl<F> Middleware for FnGuard<F>
where
    F: Fn(&NavigationContext) -> bool + Send + Sync + 'static,
{
    fn handle(&self, context: &mut NavigationContext) -> Flow {
        if (self.f)(context) {
            Flow::Continue
        } else {
            Flow::Halt
        }
    }

    fn name(&self) -> &'static str {
        "Guard"
    }
}

/// Logs every context it sees; installed first when a router runs with `debug`.
pub(crate) struct DebugLog;

impl Middleware for DebugLog {
    fn handle(&self, context: &mut NavigationContext) -> Flow {
        crate::info_log!(
            "Router {{{}}} dispatching '{}' params={:?} query='{}'",
            context.router_id.as_deref().unwrap_or("?"),
            context.path,
            context.params,
            context.search
        );
        Flow::Continue
    }

    fn name(&self) -> &'static str {
        "DebugLog"
    }
}

// ============================================================================
// Actions and the chain runner
// ============================================================================

/// One entry in an action list.
#[derive(Clone)]
pub enum Action {
    /// Synchronous middleware or terminal handler
    Middleware(MiddlewareRef),
    /// Derived subpath redirect; ends the chain and is awaited by the router
    Redirect(Arc<RedirectPlan>),
}

impl From<MiddlewareRef> for Action {
    fn from(middleware: MiddlewareRef) -> Self {
        Action::Middleware(middleware)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Middleware(middleware) => write!(f, "Middleware({})", middleware.name()),
            Action::Redirect(plan) => write!(f, "Redirect({:?})", plan),
        }
    }
}

/// How a chain run ended.
#[derive(Debug, Clone, Copy)]
pub enum ChainOutcome<'a> {
    /// Every action continued
    Completed,
    /// The action at `at` returned [`Flow::Halt`]
    Halted { at: usize },
    /// A redirect action was reached
    Redirect(&'a RedirectPlan),
}

impl ChainOutcome<'_> {
    /// Index of the halting action, if the chain halted.
    pub fn halted_at(&self) -> Option<usize> {
        match self {
            ChainOutcome::Halted { at } => Some(*at),
            _ => None,
        }
    }
}

/// Result of advancing a chain by one action.
pub enum Step<'a> {
    /// The action continued; keep advancing with the returned chain
    Next(MiddlewareChain<'a>),
    /// The chain is finished
    Done(ChainOutcome<'a>),
}

/// An action list with a cursor, advanced by value.
#[derive(Debug, Clone, Copy)]
pub struct MiddlewareChain<'a> {
    actions: &'a [Action],
    cursor: usize,
}

impl<'a> MiddlewareChain<'a> {
    /// Start a chain at its first action.
    pub fn new(actions: &'a [Action]) -> Self {
        Self { actions, cursor: 0 }
    }

    /// Index of the next action to run.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Run the action under the cursor.
    pub fn advance(self, context: &mut NavigationContext) -> Step<'a> {
        let Some(action) = self.actions.get(self.cursor) else {
            return Step::Done(ChainOutcome::Completed);
        };

        match action {
            Action::Middleware(middleware) => {
                trace_log!("Running '{}' at position {}", middleware.name(), self.cursor);
                match middleware.handle(context) {
                    Flow::Continue => Step::Next(Self {
                        cursor: self.cursor + 1,
                        ..self
                    }),
                    Flow::Halt => {
                        debug_log!(
                            "Chain halted by '{}' at position {} for '{}'",
                            middleware.name(),
                            self.cursor,
                            context.path
                        );
                        Step::Done(ChainOutcome::Halted { at: self.cursor })
                    }
                }
            }
            Action::Redirect(plan) => Step::Done(ChainOutcome::Redirect(plan)),
        }
    }

    /// Advance until the chain completes, halts or reaches a redirect.
    pub fn run(self, context: &mut NavigationContext) -> ChainOutcome<'a> {
        let mut chain = self;
        loop {
            match chain.advance(context) {
                Step::Next(next) => chain = next,
                Step::Done(outcome) => return outcome,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
