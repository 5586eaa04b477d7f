//! Logging abstraction layer.
//!
//! Provides macros that dispatch to either the [`log`](https://docs.rs/log)
//! or [`tracing`](https://docs.rs/tracing) crate depending on which feature
//! is enabled. The two features are **mutually exclusive**: enable at most one.
//! With neither enabled, the arguments are still type-checked but nothing is
//! emitted.
//!
//! | Feature    | Backend         | Default |
//! |------------|-----------------|---------|
//! | `log`      | `log` crate     | yes     |
//! | `tracing`  | `tracing` crate | no      |
//!
//! # Available macros
//!
//! - `trace_log!`: finest-grained diagnostic output.
//! - `debug_log!`: information useful for debugging.
//! - `info_log!`: general informational messages.
//! - `warn_log!`: potentially harmful situations.
//! - `error_log!`: error events that might still allow the app to continue.
//!
//! All macros accept `format!`-style arguments:
//!
//! ```ignore
//! use dispatch_navigator::{trace_log, debug_log, info_log, warn_log, error_log};
//!
//! trace_log!("Testing '{}' against entry {}", path, index);
//! debug_log!("Route matched: {}", pattern);
//! info_log!("Escaping to '{}'", url);
//! warn_log!("No host bound, history not recorded");
//! error_log!("Derived subpath failed: {}", err);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __dispatch_log {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::$level!($($arg)*);
        #[cfg(feature = "log")]
        ::log::$level!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "tracing")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

/// Emit a **trace**-level log message.
///
/// Used for per-entry matching detail and cache lookups.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => { $crate::__dispatch_log!(trace, $($arg)*) };
}

/// Emit a **debug**-level log message.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => { $crate::__dispatch_log!(debug, $($arg)*) };
}

/// Emit an **info**-level log message.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => { $crate::__dispatch_log!(info, $($arg)*) };
}

/// Emit a **warn**-level log message.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => { $crate::__dispatch_log!(warn, $($arg)*) };
}

/// Emit an **error**-level log message.
///
/// Resolver failures are reported here before they propagate.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => { $crate::__dispatch_log!(error, $($arg)*) };
}
