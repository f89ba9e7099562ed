#![forbid(unsafe_code)]

//! Per-observable configuration.

/// What to do when a binding contract violation is detected.
///
/// Violations are only reachable by tampering with binding state outside
/// the public API. They are always logged at `error` level first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViolationPolicy {
    /// Panic after logging.
    #[default]
    Panic,
    /// Log and continue with partial recovery.
    Log,
}

/// Configuration for an [`Observable`](super::Observable).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservableConfig {
    /// Name attached to log events emitted for this observable.
    pub label: Option<String>,
    /// Handling of contract violations detected by this observable.
    pub violation_policy: ViolationPolicy,
}

impl ObservableConfig {
    /// Create the default configuration (no label, panic on violation).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diagnostic label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the contract violation policy.
    #[must_use]
    pub fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.violation_policy = policy;
        self
    }

    /// Label for log events, `"-"` when unset.
    #[must_use]
    pub fn label_or_default(&self) -> &str {
        self.label.as_deref().unwrap_or("-")
    }
}
