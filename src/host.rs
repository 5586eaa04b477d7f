//! The host environment a router runs in.
//!
//! The router never touches a real window. Everything it needs from its
//! surroundings goes through [`HostWindow`]: reading the current location,
//! sending the whole page elsewhere, writing session history, and the
//! one-router-per-host activation handshake.
//!
//! Listening for link activation and history pop events stays with the host;
//! it forwards them to [`Router::navigate`](crate::Router::navigate) and
//! [`Router::handle_pop_state`](crate::Router::handle_pop_state).

use crate::NavigationContext;

/// Operations a router consumes from its host window.
pub trait HostWindow {
    /// Current full location (`protocol://domain/path?query`).
    fn location_href(&self) -> String;

    /// Navigate the whole page to `url`, leaving the app.
    fn assign_location(&self, url: &str);

    /// Write a session history entry for `path`, replacing the current one
    /// when `replace` is set. `context` is the state later handed back on
    /// pop.
    fn record(&self, context: &NavigationContext, path: &str, replace: bool);

    /// Step back in session history.
    fn back(&self);

    /// Step forward in session history.
    fn forward(&self);

    /// Claim the host for `router_id`. Fails with the id of the router that
    /// already holds it.
    fn attach(&self, router_id: &str) -> Result<(), String>;

    /// Release the host if `router_id` holds it.
    fn detach(&self, router_id: &str);
}
