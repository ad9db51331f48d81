//! Action values and the reserved action-kind namespace.
//!
//! An [`Action`] is an opaque message describing an intended state
//! transition. The combinator machinery never inspects it beyond the `kind`
//! discriminator, which is used for diagnostics and for the reserved
//! namespace check; everything else is passed through unmodified.
//!
//! Kinds under [`RESERVED_PREFIX`] are private to uniflow. The store
//! dispatches [`INIT`] once at construction to materialize initial state,
//! and [`combine`](crate::combine::combine) probes each reducer with
//! [`PROBE_UNKNOWN`] to verify it tolerates actions it does not recognize.
//! Application reducers must never handle these kinds specially.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Prefix reserved for internally generated actions.
///
/// Reducers must treat any kind outside this namespace as "possibly unknown"
/// and must never return absent state for it.
pub const RESERVED_PREFIX: &str = "@@uniflow/";

/// Kind of the init action dispatched when a store is constructed.
pub const INIT: &str = "@@uniflow/INIT";

/// Kind of the sanity-probe action used by `combine`.
///
/// A deterministic sentinel rather than a random string: uniqueness relative
/// to real action kinds comes from the reserved namespace, which keeps the
/// sanity check reproducible.
pub const PROBE_UNKNOWN: &str = "@@uniflow/PROBE_UNKNOWN_ACTION";

/// An opaque message describing an intended state transition.
///
/// Carries a `kind` discriminator plus an optional type-erased payload.
/// Cloning is cheap: the payload is shared behind an [`Arc`].
///
/// # Example
///
/// ```
/// use uniflow_core::Action;
///
/// let plain = Action::new("INC");
/// assert_eq!(plain.kind(), "INC");
/// assert!(plain.payload::<u32>().is_none());
///
/// let tagged = Action::with_payload("SET_NAME", "Alice".to_string());
/// assert_eq!(tagged.payload::<String>().map(String::as_str), Some("Alice"));
/// ```
#[derive(Clone)]
pub struct Action {
    kind: Cow<'static, str>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Action {
    /// Create an action with the given kind and no payload.
    #[must_use]
    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    /// Create an action carrying a payload value.
    ///
    /// The payload is type-erased; retrieve it with [`Action::payload`].
    #[must_use]
    pub fn with_payload<T>(kind: impl Into<Cow<'static, str>>, payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            kind: kind.into(),
            payload: Some(Arc::new(payload)),
        }
    }

    /// The discriminator for this action.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Downcast the payload to a concrete type, if one of that type is present.
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref())
    }

    /// Whether this action's kind lives in the reserved `@@uniflow/` namespace.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.kind.starts_with(RESERVED_PREFIX)
    }

    /// The init action dispatched once at store construction.
    #[must_use]
    pub fn init() -> Self {
        Self::new(INIT)
    }

    /// The sanity-probe action used to simulate an unknown action kind.
    #[must_use]
    pub fn probe_unknown() -> Self {
        Self::new(PROBE_UNKNOWN)
    }
}

// Manual Debug implementation since the payload is type-erased
impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_preserved() {
        assert_eq!(Action::new("INC").kind(), "INC");
        assert_eq!(Action::new(String::from("owned")).kind(), "owned");
    }

    #[test]
    fn payload_downcasts_by_type() {
        let action = Action::with_payload("SET", 42_i64);
        assert_eq!(action.payload::<i64>(), Some(&42));
        assert!(action.payload::<String>().is_none());
        assert!(Action::new("SET").payload::<i64>().is_none());
    }

    #[test]
    fn reserved_namespace_covers_internal_actions() {
        assert!(Action::init().is_reserved());
        assert!(Action::probe_unknown().is_reserved());
        assert!(!Action::new("INC").is_reserved());
        // A kind merely mentioning the prefix elsewhere is not reserved
        assert!(!Action::new("app/@@uniflow/").is_reserved());
    }

    #[test]
    fn clones_share_the_payload() {
        let action = Action::with_payload("SET", vec![1_u8, 2, 3]);
        let clone = action.clone();
        assert_eq!(clone.payload::<Vec<u8>>(), action.payload::<Vec<u8>>());
    }
}
