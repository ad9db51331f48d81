//! The store: current state, subscribers, and the base dispatch.
//!
//! A [`Store`] pairs a whole-state transition function with the current
//! state value and a subscriber list. Dispatching an action runs the
//! transition on the caller's stack, swaps the state, and then notifies
//! subscribers. The store assumes a single logical writer: each dispatch
//! completes (including the state swap) before the next begins, and
//! dispatching from inside a transition is rejected.
//!
//! The `dispatch` entry point is a first-class value ([`Dispatch`]) so that
//! enhancers can capture the base dispatch and replace it with a composed
//! one while every other part of the store passes through unchanged.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use uniflow_core::{Action, StateValue, Transition};

use crate::error::StoreError;
use crate::middleware::Enhancer;

/// A first-class dispatch function.
///
/// Returns the dispatched action on success, matching the convention that
/// `dispatch` hands back what it was given so call sites can chain on it.
pub type Dispatch = Arc<dyn Fn(Action) -> Result<Action, StoreError> + Send + Sync>;

/// A first-class accessor for the store's current state.
pub type StateAccessor = Arc<dyn Fn() -> StateValue + Send + Sync>;

type SubscriberFn = Arc<dyn Fn() + Send + Sync>;

/// Shared interior of a store.
///
/// Enhanced stores share this allocation and differ only in their `dispatch`
/// field, which is the explicit rendition of "copy every field, override
/// dispatch".
struct StoreInner {
    transition: Transition,
    state: Mutex<StateValue>,
    subscribers: Mutex<Vec<(u64, SubscriberFn)>>,
    next_subscriber_id: AtomicU64,
    in_transition: AtomicBool,
}

impl StoreInner {
    fn current_state(&self) -> StateValue {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the transition and swap the state, holding the state lock for the
    /// duration so the previous state observed is the one replaced.
    fn apply(&self, action: &Action) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = (self.transition)(Some(state.clone()), action)?;
        *state = next;
        Ok(())
    }

    fn notify(&self) {
        let subscribers: Vec<SubscriberFn> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();

        // Run outside the lock so subscribers may subscribe, unsubscribe,
        // or dispatch.
        for subscriber in subscribers {
            subscriber();
        }
    }
}

/// The store: current state, a subscriber list, and a dispatch function.
///
/// Cloning is cheap and yields a handle to the same store.
///
/// # Example
///
/// ```
/// use uniflow_core::{combine, value, Action, CombinedState, ReducerMap};
/// use uniflow_runtime::create_store;
///
/// let map = ReducerMap::new().with("count", |state, action| {
///     let count = state
///         .as_ref()
///         .and_then(|s| s.downcast_ref::<i64>())
///         .copied()
///         .unwrap_or(0);
///     match action.kind() {
///         "INC" => Some(value(count + 1)),
///         _ => Some(state.unwrap_or_else(|| value(0_i64))),
///     }
/// });
///
/// let store = create_store(combine(map), None).unwrap();
/// store.dispatch(Action::new("INC")).unwrap();
/// let state = store.state_as::<CombinedState>().unwrap();
/// assert_eq!(state.get_as::<i64>("count"), Some(&1));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
    dispatch: Dispatch,
}

impl Store {
    /// Dispatch an action through this store's dispatch function.
    ///
    /// On an enhanced store this is the composed middleware pipeline; on a
    /// base store it runs the transition directly.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transition`] if the transition function rejects
    /// the action and [`StoreError::NestedDispatch`] if called while a
    /// transition is already running. Errors from middleware propagate
    /// unchanged.
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        (self.dispatch)(action)
    }

    /// The current whole-state value.
    #[must_use]
    pub fn state(&self) -> StateValue {
        self.inner.current_state()
    }

    /// The current whole-state value, downcast to a concrete type.
    #[must_use]
    pub fn state_as<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.state().downcast::<T>().ok()
    }

    /// Register a subscriber invoked after every completed dispatch.
    ///
    /// Subscribers run after the state swap, outside the transition, and may
    /// themselves dispatch or unsubscribe.
    pub fn subscribe(&self, subscriber: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(subscriber)));

        Subscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// This store's dispatch as a first-class value.
    #[must_use]
    pub fn dispatch_fn(&self) -> Dispatch {
        Arc::clone(&self.dispatch)
    }

    /// A first-class accessor forwarding to this store's current state.
    #[must_use]
    pub fn state_fn(&self) -> StateAccessor {
        let inner = Arc::clone(&self.inner);
        Arc::new(move || inner.current_state())
    }

    /// A copy of this store with only the dispatch function replaced.
    ///
    /// Every other field is shared with `self`, which is the pass-through
    /// contract enhancers must honor.
    #[must_use]
    pub fn with_dispatch(&self, dispatch: Dispatch) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            dispatch,
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Store")
            .field("subscribers", &subscribers)
            .finish_non_exhaustive()
    }
}

/// Handle for removing a subscriber.
#[derive(Debug)]
pub struct Subscription {
    inner: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    /// Remove the subscriber. A no-op if the store is already gone.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for StoreInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreInner").finish_non_exhaustive()
    }
}

/// Create a base store from a transition function and optional preloaded
/// state.
///
/// The init action is run through the transition during construction to
/// materialize the initial state, so a store is never observable in an
/// uninitialized form.
///
/// # Errors
///
/// Returns [`StoreError::Transition`] if the transition rejects the init
/// action, e.g. a combined transition whose sanity check captured a
/// configuration error.
pub fn create_store(
    transition: Transition,
    preloaded: Option<StateValue>,
) -> Result<Store, StoreError> {
    let initial = transition(preloaded, &Action::init())?;

    let inner = Arc::new(StoreInner {
        transition,
        state: Mutex::new(initial),
        subscribers: Mutex::new(Vec::new()),
        next_subscriber_id: AtomicU64::new(0),
        in_transition: AtomicBool::new(false),
    });

    let dispatch = base_dispatch(&inner);
    tracing::debug!(target: "uniflow", "store created");

    Ok(Store { inner, dispatch })
}

/// Create a store through an enhancer.
///
/// The enhancer receives the base constructor and returns an augmented
/// constructor with the same signature; this invokes the augmented one.
///
/// # Errors
///
/// Propagates any error from the enhanced constructor, including base
/// construction failures and pipeline build failures.
pub fn create_store_with(
    transition: Transition,
    preloaded: Option<StateValue>,
    enhancer: Enhancer,
) -> Result<Store, StoreError> {
    (enhancer.enhance(Box::new(create_store)))(transition, preloaded)
}

/// The base dispatch: guard re-entry, run the transition, swap state,
/// notify.
fn base_dispatch(inner: &Arc<StoreInner>) -> Dispatch {
    let inner = Arc::clone(inner);
    Arc::new(move |action: Action| -> Result<Action, StoreError> {
        if inner.in_transition.swap(true, Ordering::Acquire) {
            return Err(StoreError::NestedDispatch);
        }
        let applied = inner.apply(&action);
        inner.in_transition.store(false, Ordering::Release);
        applied?;

        tracing::trace!(target: "uniflow", kind = action.kind(), "transition applied");
        inner.notify();
        Ok(action)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use uniflow_core::{combine, value, CombinedState, ReducerMap, TransitionError};

    fn counter_map() -> ReducerMap {
        ReducerMap::new().with("count", |state, action| {
            let count = state
                .as_ref()
                .and_then(|s| s.downcast_ref::<i64>())
                .copied()
                .unwrap_or(0);
            match action.kind() {
                "INC" => Some(value(count + 1)),
                _ => Some(state.unwrap_or_else(|| value(0_i64))),
            }
        })
    }

    fn count_of(store: &Store) -> i64 {
        *store
            .state_as::<CombinedState>()
            .unwrap()
            .get_as::<i64>("count")
            .unwrap()
    }

    #[test]
    fn construction_materializes_initial_state() {
        let store = create_store(combine(counter_map()), None).unwrap();
        assert_eq!(count_of(&store), 0);
    }

    #[test]
    fn dispatch_returns_the_action_and_updates_state() {
        let store = create_store(combine(counter_map()), None).unwrap();
        let returned = store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(returned.kind(), "INC");
        assert_eq!(count_of(&store), 1);
    }

    #[test]
    fn preloaded_state_carries_over() {
        let first = create_store(combine(counter_map()), None).unwrap();
        first.dispatch(Action::new("INC")).unwrap();
        first.dispatch(Action::new("INC")).unwrap();

        let second = create_store(combine(counter_map()), Some(first.state())).unwrap();
        assert_eq!(count_of(&second), 2);
    }

    #[test]
    fn construction_surfaces_captured_sanity_errors() {
        let broken = counter_map().with("broken", |state, _action| state);
        let error = create_store(combine(broken), None).unwrap_err();
        assert!(matches!(
            error,
            StoreError::Transition(TransitionError::NoInitialState { .. })
        ));
    }

    #[test]
    fn subscribers_are_notified_per_dispatch() {
        let store = create_store(combine(counter_map()), None).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let observed = Arc::clone(&calls);
        let subscription = store.subscribe(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(Action::new("INC")).unwrap();
        store.dispatch(Action::new("NOOP")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        subscription.unsubscribe();
        store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn subscribers_may_dispatch() {
        let store = create_store(combine(counter_map()), None).unwrap();

        let chained = store.clone();
        let fired = Arc::new(AtomicBool::new(false));
        let fired_once = Arc::clone(&fired);
        let _subscription = store.subscribe(move || {
            // Dispatch a follow-up exactly once; the notification runs after
            // the transition finished, so this is a fresh dispatch.
            if !fired_once.swap(true, Ordering::SeqCst) {
                chained.dispatch(Action::new("INC")).unwrap();
            }
        });

        store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(count_of(&store), 2);
    }

    #[test]
    fn dispatching_from_a_transition_is_rejected() {
        use std::sync::OnceLock;

        static SEEN: OnceLock<String> = OnceLock::new();
        let dispatch_slot: Arc<OnceLock<Dispatch>> = Arc::new(OnceLock::new());

        let slot = Arc::clone(&dispatch_slot);
        let transition: Transition = Arc::new(move |previous, action| {
            if action.kind() == "EVIL" {
                if let Some(dispatch) = slot.get() {
                    let error = dispatch(Action::new("INNER")).unwrap_err();
                    let _ = SEEN.set(error.to_string());
                }
            }
            Ok(previous.unwrap_or_else(|| value(0_i64)))
        });

        let store = create_store(transition, None).unwrap();
        let _ = dispatch_slot.set(store.dispatch_fn());

        store.dispatch(Action::new("EVIL")).unwrap();
        assert!(SEEN.get().unwrap().contains("reducers may not dispatch"));
    }

    #[test]
    fn identity_is_preserved_across_noop_dispatches() {
        let store = create_store(combine(counter_map()), None).unwrap();
        store.dispatch(Action::new("INC")).unwrap();

        let before = store.state();
        store.dispatch(Action::new("NOOP")).unwrap();
        let after = store.state();
        assert!(uniflow_core::same_value(&before, &after));
    }
}
