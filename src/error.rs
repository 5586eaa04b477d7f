//! Error handling for the router.
//!
//! This module defines the types returned when registering routes or
//! dispatching a navigation:
//!
//! - [`NavigationOutcome`]: the terminal state of one navigation
//!   (`Handled` or `Escaped`).
//! - [`NavigationError`]: configuration failures raised at registration or
//!   activation time, and resolution failures raised while a derived subpath
//!   redirect is pending.
//! - [`ErrorHandlers`]: a builder for caller-supplied hooks that observe
//!   failed resolutions and unroutable paths.
//!
//! A path that matches no route is *not* an error: the router falls back to a
//! full page navigation and reports [`NavigationOutcome::Escaped`].
//!
//! # Examples
//!
//! ```
//! use dispatch_navigator::error::{NavigationError, NavigationOutcome};
//!
//! let outcome = NavigationOutcome::Escaped { url: "https://elsewhere.test/".into() };
//! assert!(outcome.is_escaped());
//!
//! let err = NavigationError::UnknownSubpath { name: "team".into() };
//! assert!(err.is_configuration());
//! ```

use crate::{NavigationContext, RouteParams};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Navigation Outcome
// ============================================================================

/// Terminal state of a single navigation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// A route matched, its actions ran and the navigation was committed to history.
    Handled { path: String, params: RouteParams },
    /// No route applied; the whole page was sent to `url`.
    Escaped { url: String },
}

impl NavigationOutcome {
    /// Check if the router handled the navigation in-app
    pub fn is_handled(&self) -> bool {
        matches!(self, NavigationOutcome::Handled { .. })
    }

    /// Check if the navigation fell back to a full page load
    pub fn is_escaped(&self) -> bool {
        matches!(self, NavigationOutcome::Escaped { .. })
    }

    /// Path committed to history, if handled
    pub fn path(&self) -> Option<&str> {
        match self {
            NavigationOutcome::Handled { path, .. } => Some(path),
            NavigationOutcome::Escaped { .. } => None,
        }
    }

    /// Parameters bound by the matching route, if handled
    pub fn params(&self) -> Option<&RouteParams> {
        match self {
            NavigationOutcome::Handled { params, .. } => Some(params),
            NavigationOutcome::Escaped { .. } => None,
        }
    }
}

// ============================================================================
// Navigation Error
// ============================================================================

/// Failures surfaced by registration, activation and redirect resolution.
///
/// Implements [`std::error::Error`] and [`Display`](std::fmt::Display).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// A route pattern could not be compiled
    MalformedPattern { pattern: String, reason: String },

    /// A derived segment references a subpath with no registered resolver
    UnknownSubpath { name: String },

    /// A router is already active on the host
    AlreadyActive { router_id: String },

    /// The operation needs a host but the router was never registered on one
    NotActive,

    /// A derived subpath resolver failed
    Resolution { subpath: String, message: String },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::MalformedPattern { pattern, reason } => {
                write!(f, "Malformed route pattern '{}': {}", pattern, reason)
            }
            NavigationError::UnknownSubpath { name } => {
                write!(f, "No resolver registered for derived subpath '{}'", name)
            }
            NavigationError::AlreadyActive { router_id } => {
                write!(f, "A router is already attached: Router {{#{}}}", router_id)
            }
            NavigationError::NotActive => {
                write!(f, "Router is not registered on a host")
            }
            NavigationError::Resolution { subpath, message } => {
                write!(f, "Failed to resolve derived subpath '{}': {}", subpath, message)
            }
        }
    }
}

impl std::error::Error for NavigationError {}

impl NavigationError {
    /// Check if this is a configuration error (raised at registration/activation time)
    pub fn is_configuration(&self) -> bool {
        !matches!(self, NavigationError::Resolution { .. })
    }

    /// Build a `MalformedPattern` error.
    pub(crate) fn malformed(pattern: &str, reason: impl Into<String>) -> Self {
        NavigationError::MalformedPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Error Handlers
// ============================================================================

/// Hook invoked when a navigation fails with an error
pub type ErrorHandler = Arc<dyn Fn(&NavigationContext, &NavigationError) + Send + Sync>;

/// Hook invoked before an unroutable path escapes to a full navigation
pub type NotFoundHandler = Arc<dyn Fn(&NavigationContext) + Send + Sync>;

/// Builder for caller-supplied failure hooks.
///
/// Handlers observe; they never change the outcome. An error still propagates
/// out of [`Router::evaluate`](crate::Router::evaluate) after `on_error` ran.
///
/// # Examples
///
/// ```
/// use dispatch_navigator::error::ErrorHandlers;
///
/// let handlers = ErrorHandlers::new()
///     .on_not_found(|ctx| eprintln!("404: {}", ctx.path))
///     .on_error(|ctx, err| eprintln!("{} failed: {}", ctx.path, err));
/// assert!(handlers.error.is_some());
/// ```
#[derive(Clone, Default)]
pub struct ErrorHandlers {
    /// Handler for paths no route accepts
    pub not_found: Option<NotFoundHandler>,

    /// Handler for resolution failures
    pub error: Option<ErrorHandler>,
}

impl ErrorHandlers {
    /// Create new empty error handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the not-found handler
    pub fn on_not_found<F>(mut self, handler: F) -> Self
    where
        F: Fn(&NavigationContext) + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Set the error handler
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&NavigationContext, &NavigationError) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(handler));
        self
    }

    pub(crate) fn report_not_found(&self, context: &NavigationContext) {
        if let Some(handler) = &self.not_found {
            handler(context);
        }
    }

    pub(crate) fn report_error(&self, context: &NavigationContext, error: &NavigationError) {
        if let Some(handler) = &self.error {
            handler(context, error);
        }
    }
}

impl fmt::Debug for ErrorHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlers")
            .field("not_found", &self.not_found.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
