//! # uniflow Testing
//!
//! Testing utilities and fixtures for the uniflow state container.
//!
//! This crate provides:
//! - [`RecordingSink`]: a [`DiagnosticSink`] that captures shape warnings
//! - [`CallLog`] and [`recording_middleware`]: labelled call-order recording
//!   for pipeline tests
//! - [`counter_reducer`]: a canned slice reducer for end-to-end scenarios
//!
//! ## Example
//!
//! ```
//! use uniflow_core::{combine, Action, CombinedState, ReducerMap};
//! use uniflow_runtime::create_store;
//! use uniflow_testing::counter_reducer;
//!
//! let map = ReducerMap::new().with("count", counter_reducer());
//! let store = create_store(combine(map), None).unwrap();
//! store.dispatch(Action::new("INC")).unwrap();
//!
//! let state = store.state_as::<CombinedState>().unwrap();
//! assert_eq!(state.get_as::<i64>("count"), Some(&1));
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use uniflow_core::{value, Action, DiagnosticSink, SliceValue};
use uniflow_runtime::{middleware, Dispatch, Middleware};

/// Diagnostic sink that records every warning for later assertions.
///
/// Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything warned so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether nothing has been warned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}

/// Shared, ordered log of labels, for asserting middleware call order.
///
/// Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry.
    pub fn push(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Everything logged so far, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discard all entries.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Middleware that logs `label` each time an action passes through it, then
/// forwards to `next` unchanged.
#[must_use]
pub fn recording_middleware(log: &CallLog, label: impl Into<String>) -> Middleware {
    let log = log.clone();
    let label = label.into();
    middleware(move |_api| {
        let log = log.clone();
        let label = label.clone();
        Box::new(move |next: Dispatch| -> Dispatch {
            Arc::new(move |action: Action| {
                log.push(label.clone());
                next(action)
            })
        })
    })
}

/// Canned counter slice reducer: counts `"INC"` actions from zero and echoes
/// its previous state (same allocation) for anything else.
#[must_use]
pub fn counter_reducer()
-> impl Fn(Option<SliceValue>, &Action) -> Option<SliceValue> + Send + Sync + 'static {
    |state: Option<SliceValue>, action: &Action| {
        let count = state
            .as_ref()
            .and_then(|s| s.downcast_ref::<i64>())
            .copied()
            .unwrap_or(0);
        match action.kind() {
            "INC" => Some(value(count + 1)),
            _ => Some(state.unwrap_or_else(|| value(0_i64))),
        }
    }
}
