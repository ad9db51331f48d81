//! Error types for state transitions.

use thiserror::Error;

/// Errors produced by a combined whole-state transition function.
///
/// All variants are programming errors in the reducer configuration, not
/// transient conditions: there is no retry anywhere in this core, and a
/// configuration error makes the container unusable until the offending
/// reducer is fixed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// A reducer returned absent state during the construction-time init
    /// probe.
    ///
    /// Captured when `combine` runs its sanity check and surfaced on every
    /// invocation of the combined transition function.
    #[error(
        "reducer for slice \"{slice}\" returned absent state during initialization; \
         if the state passed to the reducer is absent, you must explicitly return \
         the initial state, and the initial state may not be absent"
    )]
    NoInitialState {
        /// Key of the offending slice.
        slice: String,
    },

    /// A reducer returned absent state for the unknown-action probe.
    ///
    /// Reducers must not handle `@@uniflow/INIT` or any other action in the
    /// reserved `@@uniflow/` namespace; those are private. For any unknown
    /// action they must return the current state, or the initial state if the
    /// current state is absent.
    #[error(
        "reducer for slice \"{slice}\" returned absent state when probed with an \
         unknown action; do not handle actions in the reserved \"@@uniflow/\" \
         namespace, and return the current state for any unknown action"
    )]
    ProbeReturnedAbsent {
        /// Key of the offending slice.
        slice: String,
    },

    /// A reducer returned absent state while handling a real dispatched
    /// action.
    ///
    /// This violates the core reducer invariant and fails the dispatch that
    /// triggered it.
    #[error(
        "reducer for slice \"{slice}\" returned absent state handling \
         \"{action_kind}\"; to ignore an action, you must explicitly return \
         the previous state"
    )]
    AbsentSliceState {
        /// Key of the offending slice.
        slice: String,
        /// Discriminator of the action being handled.
        action_kind: String,
    },
}
