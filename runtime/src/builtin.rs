//! Stock middleware.
//!
//! Two ready-made middleware cover the common cases: [`logger`] traces every
//! action flowing through the chain, and [`thunk`] intercepts
//! function-valued actions and runs them against the shared API instead of
//! forwarding them, so they never reach the transition function.

use std::sync::Arc;

use uniflow_core::Action;

use crate::error::StoreError;
use crate::middleware::{middleware, Middleware, MiddlewareApi};
use crate::store::Dispatch;

/// The payload type intercepted by [`thunk`].
///
/// A thunk receives the shared API, so it can read state and dispatch any
/// number of derived actions — each a fresh traversal from the top of the
/// chain.
pub type Thunk = Arc<dyn Fn(&MiddlewareApi) -> Result<(), StoreError> + Send + Sync>;

/// Build an action whose payload is a thunk.
///
/// Without the [`thunk`] middleware installed, such an action flows through
/// like any other unknown action.
#[must_use]
pub fn thunk_action<F>(kind: &'static str, run: F) -> Action
where
    F: Fn(&MiddlewareApi) -> Result<(), StoreError> + Send + Sync + 'static,
{
    let run: Thunk = Arc::new(run);
    Action::with_payload(kind, run)
}

/// Middleware that traces every dispatched action.
///
/// Emits an event before forwarding and another if the rest of the chain
/// failed. Observation only; the action passes through unmodified.
#[must_use]
pub fn logger() -> Middleware {
    middleware(|_api| {
        Box::new(|next: Dispatch| -> Dispatch {
            Arc::new(move |action: Action| {
                tracing::info!(target: "uniflow", kind = action.kind(), "dispatch");
                let result = next(action);
                if let Err(error) = &result {
                    tracing::error!(target: "uniflow", %error, "dispatch failed");
                }
                result
            })
        })
    })
}

/// Middleware that intercepts function-valued actions.
///
/// An action carrying a [`Thunk`] payload is not forwarded; the thunk runs
/// with the shared API and the action itself is returned to the caller.
/// Everything else goes to `next` untouched.
#[must_use]
pub fn thunk() -> Middleware {
    middleware(|api: MiddlewareApi| {
        Box::new(move |next: Dispatch| -> Dispatch {
            Arc::new(move |action: Action| {
                let run = action.payload::<Thunk>().cloned();
                match run {
                    Some(run) => {
                        run(&api)?;
                        Ok(action)
                    },
                    None => next(action),
                }
            })
        })
    })
}
