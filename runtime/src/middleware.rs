//! The middleware dispatch pipeline.
//!
//! A middleware is a constructor in two stages: given the shared
//! [`MiddlewareApi`] it returns a [`DispatchTransform`], and applying that
//! transform to the "next" dispatch yields a new dispatch. [`apply_middleware`]
//! instantiates an ordered list of middleware and composes the transforms
//! right-to-left around the base dispatch, so `middlewares[0]` runs
//! outermost and the last middleware's `next` is the store's base dispatch.
//!
//! The API object's `dispatch` never refers to an intermediate stage of the
//! chain. It reads through a [`DispatchCell`], a single-writer indirection
//! cell that is published exactly once with the final composed dispatch, so
//! a middleware that re-dispatches observes the same semantics as an
//! external caller — a fresh traversal from the top. Reading the cell before
//! the pipeline is built is a hard error rather than a stale dispatch.

use std::fmt;
use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;
use uniflow_core::{compose, Action, StateValue, Transition};

use crate::error::StoreError;
use crate::store::{Dispatch, StateAccessor, Store};

/// A wrapper from "next dispatch" to a new dispatch.
///
/// Consumed exactly once while the pipeline is composed.
pub type DispatchTransform = Box<dyn FnOnce(Dispatch) -> Dispatch + Send>;

/// A middleware constructor: shared API in, dispatch wrapper out.
///
/// Construction must be pure; the dispatch it produces may have arbitrary
/// side effects when invoked.
pub type Middleware = Arc<dyn Fn(MiddlewareApi) -> DispatchTransform + Send + Sync>;

/// Wrap a closure as a [`Middleware`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use uniflow_runtime::{middleware, Dispatch, Middleware};
///
/// // Pass-through middleware that tags nothing and forwards everything.
/// let passthrough: Middleware = middleware(|_api| {
///     Box::new(|next: Dispatch| -> Dispatch {
///         Arc::new(move |action| next(action))
///     })
/// });
/// ```
#[must_use]
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(MiddlewareApi) -> DispatchTransform + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Single-writer, multiple-reader cell holding the final composed dispatch.
///
/// Clones share the same slot. The pipeline publishes into the cell exactly
/// once, after composition; every read before that is
/// [`StoreError::DispatchBeforeReady`].
#[derive(Clone, Default)]
pub struct DispatchCell {
    slot: Arc<OnceLock<Dispatch>>,
}

impl DispatchCell {
    fn new() -> Self {
        Self::default()
    }

    /// Dispatch through the published final dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DispatchBeforeReady`] if the pipeline has not
    /// been published yet; otherwise whatever the composed dispatch returns.
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        match self.slot.get() {
            Some(dispatch) => dispatch(action),
            None => Err(StoreError::DispatchBeforeReady),
        }
    }

    fn publish(&self, dispatch: Dispatch) -> Result<(), StoreError> {
        self.slot
            .set(dispatch)
            .map_err(|_| StoreError::PipelineAlreadyBuilt)
    }
}

impl fmt::Debug for DispatchCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchCell")
            .field("ready", &self.slot.get().is_some())
            .finish()
    }
}

/// The shared API handed to every middleware constructor.
///
/// `state` forwards to the base store; `dispatch` always resolves to the
/// final composed dispatch, never an intermediate one, even when captured at
/// construction time and invoked much later.
#[derive(Clone)]
pub struct MiddlewareApi {
    get_state: StateAccessor,
    dispatch: DispatchCell,
}

impl MiddlewareApi {
    /// The store's current whole-state value.
    #[must_use]
    pub fn state(&self) -> StateValue {
        (self.get_state)()
    }

    /// The store's current whole-state value, downcast to a concrete type.
    #[must_use]
    pub fn state_as<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.state().downcast::<T>().ok()
    }

    /// Dispatch an action from the top of the chain.
    ///
    /// This is a fresh traversal through the full composed pipeline, used
    /// for actions derived from other actions.
    ///
    /// # Errors
    ///
    /// [`StoreError::DispatchBeforeReady`] if invoked before the store is
    /// built; otherwise whatever the composed dispatch returns.
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        self.dispatch.dispatch(action)
    }

    /// The full-chain dispatch as a first-class value.
    ///
    /// Resolves through the shared cell on every call, so it is safe to
    /// capture at construction time.
    #[must_use]
    pub fn dispatch_fn(&self) -> Dispatch {
        let cell = self.dispatch.clone();
        Arc::new(move |action| cell.dispatch(action))
    }
}

impl fmt::Debug for MiddlewareApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareApi")
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

/// A store constructor: the shape both sides of an enhancer share.
pub type StoreCreator =
    Box<dyn FnOnce(Transition, Option<StateValue>) -> Result<Store, StoreError>>;

/// Wraps a store constructor to add cross-cutting behavior while preserving
/// its external contract.
pub struct Enhancer {
    apply: Box<dyn FnOnce(StoreCreator) -> StoreCreator>,
}

impl Enhancer {
    /// Build an enhancer from a constructor-wrapping function.
    #[must_use]
    pub fn new<F>(apply: F) -> Self
    where
        F: FnOnce(StoreCreator) -> StoreCreator + 'static,
    {
        Self {
            apply: Box::new(apply),
        }
    }

    /// Apply this enhancer to a store constructor.
    #[must_use]
    pub fn enhance(self, create: StoreCreator) -> StoreCreator {
        (self.apply)(create)
    }
}

impl fmt::Debug for Enhancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enhancer").finish_non_exhaustive()
    }
}

/// Build an enhancer that threads dispatch through `middlewares`.
///
/// The augmented constructor builds the inner store, instantiates each
/// middleware against the shared API in list order, composes the resulting
/// wrappers right-to-left around the inner store's dispatch, publishes the
/// composed dispatch into the shared cell, and returns the inner store with
/// only its dispatch replaced.
///
/// When an action is later dispatched, `middlewares[0]` runs first and
/// decides whether and when to invoke its `next`; the last middleware's
/// `next` is the inner store's dispatch. Any middleware may skip `next` to
/// short-circuit the chain, or call the API's dispatch to restart a new
/// traversal from the top.
#[must_use]
pub fn apply_middleware<I>(middlewares: I) -> Enhancer
where
    I: IntoIterator<Item = Middleware> + 'static,
{
    let middlewares: Vec<Middleware> = middlewares.into_iter().collect();

    Enhancer::new(move |create: StoreCreator| -> StoreCreator {
        Box::new(move |transition, preloaded| {
            let store = create(transition, preloaded)?;

            let cell = DispatchCell::new();
            let api = MiddlewareApi {
                get_state: store.state_fn(),
                dispatch: cell.clone(),
            };

            let chain: SmallVec<[DispatchTransform; 4]> = middlewares
                .iter()
                .map(|middleware| middleware(api.clone()))
                .collect();

            tracing::debug!(
                target: "uniflow",
                middleware = chain.len(),
                "composing dispatch pipeline"
            );

            let dispatch = compose(chain)(store.dispatch_fn());
            cell.publish(dispatch.clone())?;

            Ok(store.with_dispatch(dispatch))
        })
    })
}
