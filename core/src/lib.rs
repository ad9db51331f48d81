//! # uniflow Core
//!
//! Core combinators for the uniflow state container.
//!
//! uniflow models application state as a single immutable value. Transitions
//! are produced by pure per-slice reducers in response to discrete [`Action`]
//! messages, and this crate provides the machinery that composes many small
//! pieces into one coherent whole:
//!
//! - **[`compose`]**: generic right-to-left function composition
//! - **[`combine`]**: turns a [`ReducerMap`] of per-slice reducers into one
//!   whole-state transition function with the reducer invariants enforced
//! - **[`Action`]**: opaque message with a `kind` discriminator and an
//!   optional type-erased payload
//! - **[`DiagnosticSink`]**: injectable destination for non-fatal shape
//!   warnings
//!
//! ## Core invariants
//!
//! - A slice reducer must never return an absent (`None`) state, including
//!   on its very first call where the incoming slice state is absent: it must
//!   then return a deterministic initial value.
//! - If no slice changed (by [`Arc::ptr_eq`](std::sync::Arc::ptr_eq)
//!   identity), the combined transition returns the *same* whole-state value
//!   it was given, so consumers can use identity comparison as an O(1)
//!   change check.
//! - Action kinds under the `@@uniflow/` namespace are reserved for internal
//!   probe and init actions; reducers must treat any other kind as "possibly
//!   unknown" and echo their current state back.
//!
//! ## Example
//!
//! ```
//! use uniflow_core::{combine, value, Action, CombinedState, ReducerMap};
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
//! let transition = combine(map);
//! let state = transition(None, &Action::new("INC")).unwrap();
//! let combined = state.downcast_ref::<CombinedState>().unwrap();
//! assert_eq!(combined.get_as::<i64>("count"), Some(&1));
//! ```

/// Action values and the reserved action-kind namespace
pub mod action;

/// Reducer combination: `ReducerMap`, `CombinedState`, and `combine`
pub mod combine;

/// Right-to-left function composition
pub mod compose;

/// Injectable sink for non-fatal diagnostics
pub mod diagnostics;

/// Error types for state transitions
pub mod error;

/// Type-erased state values and the functional interfaces built on them
pub mod value;

pub use action::Action;
pub use combine::{combine, combine_with_sink, CombinedState, ReducerMap};
pub use compose::compose;
pub use diagnostics::{DiagnosticSink, NullSink, TracingSink};
pub use error::TransitionError;
pub use value::{same_value, slice_reducer, value, SliceReducer, SliceValue, StateValue, Transition};
