//! Test utilities for router integration tests
//!
//! Provides an in-memory host window, a call recorder, and assertion helpers.

#![allow(dead_code)]

use dispatch_navigator::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// One history write made by the router.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub path: String,
    pub replace: bool,
    pub context: NavigationContext,
}

/// In-memory host window.
#[derive(Debug, Default)]
pub struct MemoryHost {
    pub href: RefCell<String>,
    pub records: RefCell<Vec<Recorded>>,
    pub assigned: RefCell<Vec<String>>,
    pub attached: RefCell<Option<String>>,
    pub backs: RefCell<usize>,
    pub forwards: RefCell<usize>,
}

impl MemoryHost {
    /// Host whose current location is `href`.
    pub fn at(href: &str) -> Rc<Self> {
        let host = Self::default();
        *host.href.borrow_mut() = href.to_string();
        Rc::new(host)
    }

    pub fn record_paths(&self) -> Vec<(String, bool)> {
        self.records
            .borrow()
            .iter()
            .map(|r| (r.path.clone(), r.replace))
            .collect()
    }

    pub fn last_record(&self) -> Option<Recorded> {
        self.records.borrow().last().cloned()
    }

    pub fn assigned(&self) -> Vec<String> {
        self.assigned.borrow().clone()
    }
}

impl HostWindow for MemoryHost {
    fn location_href(&self) -> String {
        self.href.borrow().clone()
    }

    fn assign_location(&self, url: &str) {
        self.assigned.borrow_mut().push(url.to_string());
    }

    fn record(&self, context: &NavigationContext, path: &str, replace: bool) {
        self.records.borrow_mut().push(Recorded {
            path: path.to_string(),
            replace,
            context: context.clone(),
        });
    }

    fn back(&self) {
        *self.backs.borrow_mut() += 1;
    }

    fn forward(&self) {
        *self.forwards.borrow_mut() += 1;
    }

    fn attach(&self, router_id: &str) -> Result<(), String> {
        let mut attached = self.attached.borrow_mut();
        match attached.as_ref() {
            Some(existing) => Err(existing.clone()),
            None => {
                *attached = Some(router_id.to_string());
                Ok(())
            }
        }
    }

    fn detach(&self, router_id: &str) {
        let mut attached = self.attached.borrow_mut();
        if attached.as_deref() == Some(router_id) {
            *attached = None;
        }
    }
}

/// Shared, thread-safe list of labels pushed by middleware.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Middleware that records `label` and continues.
    pub fn mark(&self, label: &str) -> MiddlewareRef {
        let calls = self.clone();
        let label = label.to_string();
        handler_fn(move |_ctx| calls.push(&label))
    }

    pub fn push(&self, label: &str) {
        self.0.lock().unwrap().push(label.to_string());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

/// Router bound to a fresh host at `https://app.test/`.
pub fn active_router(options: RouterOptions) -> (Router, Rc<MemoryHost>) {
    let host = MemoryHost::at("https://app.test/");
    let mut router = Router::with_options(options);
    router.register_on(host.clone()).unwrap();
    (router, host)
}

/// Assert that route parameters contain expected key-value pair
pub fn assert_param_equals(params: &RouteParams, key: &str, expected: &str) {
    let value = params.get(key);
    assert!(value.is_some(), "Parameter '{}' not found in RouteParams", key);
    assert_eq!(value.unwrap(), expected, "Parameter '{}' has wrong value", key);
}

/// Assert that route parameters do NOT contain a key
pub fn assert_param_not_present(params: &RouteParams, key: &str) {
    assert!(
        params.get(key).is_none(),
        "Parameter '{}' should not be present",
        key
    );
}

/// Initialise test logging once; repeated calls are ignored.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
