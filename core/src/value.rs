//! Type-erased state values and the functional interfaces built on them.
//!
//! State in uniflow is an opaque value of any shape: a [`StateValue`] is an
//! `Arc<dyn Any + Send + Sync>`, and "absent" state is modeled as
//! `Option::None`. Change detection is reference identity only
//! ([`same_value`], an [`Arc::ptr_eq`] check), which keeps the contract O(1)
//! per slice; no structural diffing is ever performed.
//!
//! Two functional interfaces are built on these values:
//!
//! - [`SliceReducer`]: `(Option<SliceValue>, &Action) -> Option<SliceValue>`,
//!   a pure per-slice transition function. Returning `None` violates the
//!   reducer contract and is surfaced as a [`TransitionError`].
//! - [`Transition`]: `(Option<StateValue>, &Action) -> Result<StateValue,
//!   TransitionError>`, the whole-state transition function produced by
//!   [`combine`](crate::combine::combine) and consumed by a store.

use std::any::Any;
use std::sync::Arc;

use crate::action::Action;
use crate::error::TransitionError;

/// A whole-state value: type-erased, immutable, cheaply shareable.
pub type StateValue = Arc<dyn Any + Send + Sync>;

/// One slice's state value. Same representation as [`StateValue`]; the alias
/// marks which role a value plays.
pub type SliceValue = StateValue;

/// A pure per-slice transition function.
///
/// Must be total: for every input, including an absent incoming state, it
/// must return `Some` next state. An absent incoming state means "first
/// call"; the reducer must then return its deterministic initial value.
pub type SliceReducer =
    Arc<dyn Fn(Option<SliceValue>, &Action) -> Option<SliceValue> + Send + Sync>;

/// A whole-state transition function, usable directly as the transition
/// argument of a store constructor.
pub type Transition =
    Arc<dyn Fn(Option<StateValue>, &Action) -> Result<StateValue, TransitionError> + Send + Sync>;

/// Wrap a concrete value as a [`StateValue`].
///
/// ```
/// use uniflow_core::{same_value, value};
///
/// let a = value(1_i64);
/// let b = a.clone();
/// assert!(same_value(&a, &b));
/// assert_eq!(a.downcast_ref::<i64>(), Some(&1));
/// ```
#[must_use]
pub fn value<T: Any + Send + Sync>(inner: T) -> StateValue {
    Arc::new(inner)
}

/// Identity comparison between two state values.
///
/// True only when both refer to the same allocation. Structurally equal but
/// separately allocated values compare as different; that is the intended
/// contract, since reducers signal "unchanged" by returning the value they
/// were given.
#[must_use]
pub fn same_value(a: &StateValue, b: &StateValue) -> bool {
    Arc::ptr_eq(a, b)
}

/// Wrap a closure as a [`SliceReducer`].
#[must_use]
pub fn slice_reducer<F>(f: F) -> SliceReducer
where
    F: Fn(Option<SliceValue>, &Action) -> Option<SliceValue> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_is_identity_not_equality() {
        let a = value(7_i64);
        let b = value(7_i64);
        assert!(same_value(&a, &a.clone()));
        assert!(!same_value(&a, &b));
    }

    #[test]
    fn slice_reducer_echoes_previous_state_by_identity() {
        let reducer = slice_reducer(|state, _action| Some(state.unwrap_or_else(|| value(0_i64))));
        let first = reducer(None, &Action::new("NOOP"));
        let Some(first) = first else {
            unreachable!("reducer is total");
        };
        let Some(second) = reducer(Some(first.clone()), &Action::new("NOOP")) else {
            unreachable!("reducer is total");
        };
        assert!(same_value(&first, &second));
    }
}
