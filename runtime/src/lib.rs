//! # uniflow Runtime
//!
//! Runtime for the uniflow state container.
//!
//! This crate provides the [`Store`] that holds current state and notifies
//! subscribers, and the middleware pipeline that augments its dispatch path:
//!
//! - **[`Store`]**: state behind a mutex, a subscriber list, and a
//!   first-class `dispatch` value
//! - **[`apply_middleware`]**: builds an [`Enhancer`] that wraps a store
//!   constructor, composing an ordered middleware chain right-to-left around
//!   the base dispatch
//! - **[`builtin`]**: stock middleware (a tracing logger and a thunk
//!   interceptor)
//!
//! Execution is synchronous and single-threaded-cooperative: every dispatch
//! runs on the caller's stack, through the middleware chain, into the
//! transition function and the subscriber notifications, with no internal
//! scheduler or queue. Middleware may re-dispatch before the outer call
//! returns; that simply starts a fresh traversal from the top of the chain.
//!
//! ## Example
//!
//! ```
//! use uniflow_core::{combine, value, Action, CombinedState, ReducerMap};
//! use uniflow_runtime::{apply_middleware, builtin, create_store_with};
//!
//! let map = ReducerMap::new().with("count", |state, action| {
//!     let count = state
//!         .as_ref()
//!         .and_then(|s| s.downcast_ref::<i64>())
//!         .copied()
//!         .unwrap_or(0);
//!     match action.kind() {
//!         "INC" => Some(value(count + 1)),
//!         _ => Some(state.unwrap_or_else(|| value(0_i64))),
//!     }
//! });
//!
//! let store = create_store_with(
//!     combine(map),
//!     None,
//!     apply_middleware(vec![builtin::logger(), builtin::thunk()]),
//! )
//! .unwrap();
//!
//! store.dispatch(Action::new("INC")).unwrap();
//! let state = store.state_as::<CombinedState>().unwrap();
//! assert_eq!(state.get_as::<i64>("count"), Some(&1));
//! ```

/// Stock middleware: tracing logger and thunk interceptor
pub mod builtin;

/// The middleware dispatch pipeline
pub mod middleware;

/// The store: current state, subscribers, and base dispatch
pub mod store;

/// Error types for the store runtime
pub mod error {
    use thiserror::Error;
    use uniflow_core::TransitionError;

    /// Errors that can occur while building a store or dispatching through
    /// it.
    ///
    /// All errors propagate synchronously to the direct caller; the runtime
    /// performs no retry or suppression.
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// The transition function rejected the dispatch.
        #[error(transparent)]
        Transition(#[from] TransitionError),

        /// `dispatch` was called while a transition was already running.
        ///
        /// Reducers are pure functions and may not dispatch actions.
        #[error("dispatch called while a transition is in progress; reducers may not dispatch actions")]
        NestedDispatch,

        /// A middleware dispatched through the shared API before the
        /// pipeline finished composing.
        ///
        /// Middleware may capture the API's dispatch at construction time,
        /// but must not invoke it until the store is built.
        #[error("middleware dispatched before the pipeline was fully built; do not dispatch while the store is being constructed")]
        DispatchBeforeReady,

        /// The composed dispatch was published into the pipeline's shared
        /// cell twice. The cell is single-writer; this indicates a broken
        /// enhancer.
        #[error("the dispatch pipeline was already built; the composed dispatch may only be published once")]
        PipelineAlreadyBuilt,
    }
}

pub use error::StoreError;
pub use middleware::{
    apply_middleware, middleware, DispatchCell, DispatchTransform, Enhancer, Middleware,
    MiddlewareApi, StoreCreator,
};
pub use store::{create_store, create_store_with, Dispatch, StateAccessor, Store, Subscription};
