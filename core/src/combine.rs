//! Reducer combination.
//!
//! [`combine`] turns a [`ReducerMap`] of independent per-slice reducers into
//! one whole-state [`Transition`] function. The combined state is a
//! [`CombinedState`] mapping each slice key to that slice's current value.
//!
//! Two invariants are enforced here:
//!
//! - **Totality**: a reducer must never return absent state. Each reducer is
//!   probed once at combination time (with the init action and with a
//!   reserved unknown-action sentinel); a probe failure is captured and then
//!   returned from every invocation of the combined transition, so
//!   configuration can finish while the error still surfaces the moment
//!   transitions are attempted. A reducer that passes the probes but returns
//!   absent state for a real action fails that dispatch with
//!   [`TransitionError::AbsentSliceState`].
//! - **Identity preservation**: if no slice's next value differs by identity
//!   from its previous value, the combined transition returns the *same*
//!   whole-state value it was given, so callers can use
//!   [`same_value`](crate::value::same_value) as an O(1) change check.
//!
//! Shape mismatches (empty map, state of an unexpected type, keys with no
//! owning reducer) are advisory only and go to the configured
//! [`DiagnosticSink`]; they never affect the returned value.

use std::fmt;
use std::sync::Arc;

use crate::action::{Action, INIT};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::TransitionError;
use crate::value::{same_value, SliceReducer, SliceValue, StateValue, Transition};

/// An insertion-ordered mapping from slice key to reducer.
///
/// Iteration order is the insertion order, which makes combined transitions
/// deterministic across runs with identical input. Inserting an existing key
/// replaces the reducer in place without moving the key.
///
/// # Example
///
/// ```
/// use uniflow_core::{value, ReducerMap};
///
/// let map = ReducerMap::new()
///     .with("count", |state, _action| {
///         Some(state.unwrap_or_else(|| value(0_i64)))
///     })
///     .with("name", |state, _action| {
///         Some(state.unwrap_or_else(|| value(String::new())))
///     });
/// assert_eq!(map.keys().collect::<Vec<_>>(), ["count", "name"]);
/// ```
#[derive(Clone, Default)]
pub struct ReducerMap {
    entries: Vec<(String, SliceReducer)>,
}

impl ReducerMap {
    /// Create an empty reducer map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with<F>(mut self, key: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(Option<SliceValue>, &Action) -> Option<SliceValue> + Send + Sync + 'static,
    {
        self.insert(key, reducer);
        self
    }

    /// Insert a reducer for a slice key.
    ///
    /// If the key already exists its reducer is replaced and the key keeps
    /// its original position.
    pub fn insert<F>(&mut self, key: impl Into<String>, reducer: F)
    where
        F: Fn(Option<SliceValue>, &Action) -> Option<SliceValue> + Send + Sync + 'static,
    {
        let key = key.into();
        let reducer: SliceReducer = Arc::new(reducer);
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = reducer;
        } else {
            self.entries.push((key, reducer));
        }
    }

    /// Number of slices in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slice keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }
}

impl fmt::Debug for ReducerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerMap")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The whole-state value produced by a combined transition.
///
/// A mapping with exactly the reducer map's keys, each holding that slice's
/// current value, in the reducer map's insertion order. Constructed only by
/// the combined transition; consumers read it via [`CombinedState::get`] or
/// the downcasting [`CombinedState::get_as`].
#[derive(Default)]
pub struct CombinedState {
    slices: Vec<(String, SliceValue)>,
}

impl CombinedState {
    /// The value for a slice key, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SliceValue> {
        self.slices.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The value for a slice key, downcast to a concrete type.
    #[must_use]
    pub fn get_as<T: 'static>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(|v| v.downcast_ref())
    }

    /// Slice keys in reducer-map order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.iter().map(|(k, _)| k.as_str())
    }

    /// Number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether there are no slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl fmt::Debug for CombinedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedState")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Combine a map of per-slice reducers into one whole-state transition
/// function, with warnings going to the default [`TracingSink`].
///
/// See [`combine_with_sink`] for the full contract.
#[must_use]
pub fn combine(map: ReducerMap) -> Transition {
    combine_with_sink(map, TracingSink)
}

/// Combine a map of per-slice reducers into one whole-state transition
/// function, with shape warnings delivered to `sink`.
///
/// Each reducer is sanity-probed once, here at combination time: once with
/// the init action and once with a reserved unknown-action sentinel, both
/// against absent state. A reducer returning absent state for either probe
/// captures a [`TransitionError`]; the returned transition still works as a
/// value but yields that error on every invocation, so the failure surfaces
/// at the first attempted transition rather than during configuration.
///
/// The returned transition iterates slices in map insertion order, feeding
/// each reducer its previous slice value (absent for a new key or an absent
/// whole state) and the action. If no slice changed by identity, the
/// incoming whole-state value is returned as-is.
#[must_use]
pub fn combine_with_sink<D>(map: ReducerMap, sink: D) -> Transition
where
    D: DiagnosticSink + 'static,
{
    let sanity_error = assert_reducer_sanity(&map).err();

    Arc::new(
        move |previous: Option<StateValue>, action: &Action| -> Result<StateValue, TransitionError> {
            if let Some(error) = &sanity_error {
                return Err(error.clone());
            }

            let previous_combined = previous
                .as_ref()
                .and_then(|state| state.downcast_ref::<CombinedState>());

            let mut has_changed = false;
            let mut next_slices: Vec<(String, SliceValue)> = Vec::with_capacity(map.len());

            for (key, reducer) in &map.entries {
                let previous_slice = previous_combined.and_then(|c| c.get(key)).cloned();
                let next_slice = reducer(previous_slice.clone(), action).ok_or_else(|| {
                    TransitionError::AbsentSliceState {
                        slice: key.clone(),
                        action_kind: action.kind().to_owned(),
                    }
                })?;

                has_changed = has_changed
                    || previous_slice
                        .as_ref()
                        .is_none_or(|prev| !same_value(prev, &next_slice));

                next_slices.push((key.clone(), next_slice));
            }

            if sink.enabled() {
                if let Some(message) = shape_warning(&map, previous.as_ref(), action) {
                    sink.warn(&message);
                }
            }

            match previous {
                Some(previous) if !has_changed => Ok(previous),
                _ => Ok(Arc::new(CombinedState {
                    slices: next_slices,
                })),
            }
        },
    )
}

/// Probe every reducer with synthetic inputs to verify totality.
///
/// Two probes per slice, both against absent state: the init action (the
/// reducer must produce its initial value) and the reserved unknown-action
/// sentinel (the reducer must echo some defined state rather than treating
/// the reserved namespace as its own).
fn assert_reducer_sanity(map: &ReducerMap) -> Result<(), TransitionError> {
    for (key, reducer) in &map.entries {
        if reducer(None, &Action::init()).is_none() {
            return Err(TransitionError::NoInitialState { slice: key.clone() });
        }

        if reducer(None, &Action::probe_unknown()).is_none() {
            return Err(TransitionError::ProbeReturnedAbsent { slice: key.clone() });
        }
    }
    Ok(())
}

/// Advisory shape check comparing the incoming state to the reducer map.
///
/// Returns a warning message for: an unusable (empty) reducer map, incoming
/// state that is not a [`CombinedState`], or incoming keys with no owning
/// reducer. Never affects the transition result.
fn shape_warning(map: &ReducerMap, previous: Option<&StateValue>, action: &Action) -> Option<String> {
    if map.is_empty() {
        return Some(
            "store does not have a valid reducer: combine was given an empty \
             reducer map"
                .to_owned(),
        );
    }

    // Absent state is the default before the first transition, not a mismatch.
    let previous = previous?;

    let argument = if action.kind() == INIT {
        "preloaded state passed to the store"
    } else {
        "previous state received by the reducer"
    };

    let known: Vec<&str> = map.keys().collect();

    let Some(combined) = previous.downcast_ref::<CombinedState>() else {
        return Some(format!(
            "the {argument} is not a combined state; expected a mapping with \
             the following keys: {known:?}"
        ));
    };

    let unexpected: Vec<&str> = combined
        .keys()
        .filter(|key| !map.contains_key(key))
        .collect();

    if unexpected.is_empty() {
        None
    } else {
        Some(format!(
            "unexpected keys {unexpected:?} found in the {argument}; expected \
             one of the known reducer keys {known:?}; unexpected keys will be \
             ignored"
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::value::value;
    use std::sync::Mutex;

    /// Counter slice: counts "INC", echoes previous state otherwise.
    fn counter() -> ReducerMap {
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

    fn with_name(map: ReducerMap) -> ReducerMap {
        map.with("name", |state, action| match action.kind() {
            "RENAME" => Some(value("renamed".to_string())),
            _ => Some(state.unwrap_or_else(|| value(String::new()))),
        })
    }

    struct VecSink(Mutex<Vec<String>>);

    impl VecSink {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl DiagnosticSink for Arc<VecSink> {
        fn warn(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_owned());
        }
    }

    fn combined(state: &StateValue) -> &CombinedState {
        state.downcast_ref::<CombinedState>().unwrap()
    }

    #[test]
    fn init_materializes_every_slice() {
        let transition = combine(with_name(counter()));
        let state = transition(None, &Action::init()).unwrap();
        let state = combined(&state);
        assert_eq!(state.keys().collect::<Vec<_>>(), ["count", "name"]);
        assert_eq!(state.get_as::<i64>("count"), Some(&0));
        assert_eq!(state.get_as::<String>("name"), Some(&String::new()));
    }

    #[test]
    fn unchanged_slices_preserve_whole_state_identity() {
        let transition = combine(with_name(counter()));
        let state = transition(None, &Action::init()).unwrap();
        let next = transition(Some(state.clone()), &Action::new("NOOP")).unwrap();
        assert!(same_value(&state, &next));
    }

    #[test]
    fn a_single_changed_slice_rebuilds_only_that_entry() {
        let transition = combine(with_name(counter()));
        let state = transition(None, &Action::init()).unwrap();
        let next = transition(Some(state.clone()), &Action::new("INC")).unwrap();

        assert!(!same_value(&state, &next));
        assert_eq!(combined(&next).get_as::<i64>("count"), Some(&1));

        // The untouched slice keeps its identity.
        let name_before = combined(&state).get("name").unwrap();
        let name_after = combined(&next).get("name").unwrap();
        assert!(same_value(name_before, name_after));
    }

    #[test]
    fn counting_twice_reaches_two() {
        let transition = combine(counter());
        let one = transition(None, &Action::new("INC")).unwrap();
        let two = transition(Some(one), &Action::new("INC")).unwrap();
        assert_eq!(combined(&two).get_as::<i64>("count"), Some(&2));
    }

    #[test]
    fn total_reducers_never_fail() {
        let transition = combine(with_name(counter()));
        let mut state = transition(None, &Action::init()).unwrap();
        for kind in ["INC", "RENAME", "NOOP", "INC", "whatever"] {
            state = transition(Some(state), &Action::new(kind)).unwrap();
        }
        assert_eq!(combined(&state).get_as::<i64>("count"), Some(&2));
    }

    #[test]
    fn reducer_without_initial_state_fails_deferred() {
        // Returns its input unchanged, so the init probe sees absent state.
        let map = counter().with("broken", |state, _action| state);
        let transition = combine(map);

        let error = transition(None, &Action::init()).unwrap_err();
        assert_eq!(
            error,
            TransitionError::NoInitialState {
                slice: "broken".to_owned()
            }
        );
        // Every subsequent invocation reports the same captured error.
        let error = transition(None, &Action::new("INC")).unwrap_err();
        assert!(matches!(error, TransitionError::NoInitialState { .. }));
    }

    #[test]
    fn reducer_handling_the_reserved_namespace_fails_deferred() {
        // Initializes on INIT but returns absent for anything unknown.
        let map = counter().with("greedy", |state, action| match action.kind() {
            crate::action::INIT => Some(state.unwrap_or_else(|| value(0_i64))),
            "SET" => Some(value(1_i64)),
            _ => None,
        });
        let transition = combine(map);

        let error = transition(None, &Action::init()).unwrap_err();
        assert_eq!(
            error,
            TransitionError::ProbeReturnedAbsent {
                slice: "greedy".to_owned()
            }
        );
    }

    #[test]
    fn absent_state_for_a_real_action_names_slice_and_kind() {
        // Total under both probes, absent only for one specific real action.
        let map = counter().with("fragile", |state, action| match action.kind() {
            "BOOM" => None,
            _ => Some(state.unwrap_or_else(|| value(0_i64))),
        });
        let transition = combine(map);

        let state = transition(None, &Action::init()).unwrap();
        let error = transition(Some(state), &Action::new("BOOM")).unwrap_err();
        assert_eq!(
            error,
            TransitionError::AbsentSliceState {
                slice: "fragile".to_owned(),
                action_kind: "BOOM".to_owned(),
            }
        );
    }

    #[test]
    fn empty_map_draws_a_diagnostic_but_still_transitions() {
        let sink = VecSink::new();
        let transition = combine_with_sink(ReducerMap::new(), Arc::clone(&sink));

        let state = transition(None, &Action::init()).unwrap();
        assert!(combined(&state).is_empty());
        assert_eq!(sink.messages().len(), 1);
        assert!(sink.messages()[0].contains("empty reducer map"));
    }

    #[test]
    fn unexpected_keys_are_reported_and_ignored() {
        let sink = VecSink::new();
        // State built with two slices, then fed to a combiner that only
        // knows about one of them.
        let full = combine(with_name(counter()));
        let state = full(None, &Action::init()).unwrap();

        let narrow = combine_with_sink(counter(), Arc::clone(&sink));
        let next = narrow(Some(state), &Action::new("INC")).unwrap();

        assert_eq!(combined(&next).get_as::<i64>("count"), Some(&1));
        assert!(combined(&next).get("name").is_none());
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("\"name\""));
        assert!(messages[0].contains("previous state received by the reducer"));
    }

    #[test]
    fn foreign_state_type_draws_a_diagnostic() {
        let sink = VecSink::new();
        let transition = combine_with_sink(counter(), Arc::clone(&sink));

        let next = transition(Some(value(5_i64)), &Action::init()).unwrap();

        // The foreign state contributes nothing; slices start fresh.
        assert_eq!(combined(&next).get_as::<i64>("count"), Some(&0));
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("not a combined state"));
        assert!(messages[0].contains("preloaded state passed to the store"));
    }

    #[test]
    fn disabled_sink_skips_shape_checks() {
        let transition = combine_with_sink(ReducerMap::new(), crate::diagnostics::NullSink);
        // Would warn about the empty map if the sink were enabled.
        assert!(transition(None, &Action::init()).is_ok());
    }

    #[test]
    fn insertion_order_is_stable_and_replacement_keeps_position() {
        let mut map = with_name(counter());
        map.insert("count", |_state, _action| Some(value(99_i64)));
        assert_eq!(map.keys().collect::<Vec<_>>(), ["count", "name"]);

        let transition = combine(map);
        let state = transition(None, &Action::init()).unwrap();
        assert_eq!(combined(&state).get_as::<i64>("count"), Some(&99));
    }
}
