//! Injectable sink for non-fatal diagnostics.
//!
//! The combined transition function performs shape checks (empty reducer
//! map, state of an unexpected type, keys with no owning reducer) that are
//! advisory only: they never affect the returned state. Where those warnings
//! go is injected via [`DiagnosticSink`] rather than tied to a build-mode
//! flag. [`TracingSink`] is the default; [`NullSink`] disables the checks
//! entirely for production-style operation.

/// Destination for non-fatal shape warnings.
pub trait DiagnosticSink: Send + Sync {
    /// Whether this sink wants diagnostics at all.
    ///
    /// When false, callers skip computing warning messages entirely, so a
    /// disabled sink has zero per-dispatch cost beyond this check.
    fn enabled(&self) -> bool {
        true
    }

    /// Emit one warning message.
    fn warn(&self, message: &str);
}

/// Default sink: forwards warnings to [`tracing::warn!`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "uniflow", "{message}");
    }
}

/// Sink that discards everything and reports itself disabled, skipping the
/// shape checks altogether.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn enabled(&self) -> bool {
        false
    }

    fn warn(&self, _message: &str) {}
}
