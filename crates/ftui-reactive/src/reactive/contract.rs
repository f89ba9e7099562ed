#![forbid(unsafe_code)]

//! Binding errors and contract violation reporting.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Already bound | `bind` on a bound observable | `BindError`, `bind` returns `false` |
//! | Not bound / mismatched | `unbind` on the wrong pair | `UnbindError`, `unbind` returns `false` |
//! | Absent old value | A `WillOnly` dispatch reached a binding callback | `ContractViolation`, per policy |
//! | Asymmetric binding | One side bound, the other not | `ContractViolation`, per policy |
//! | Peer destroyed | Binding callback's weak ref is dead | Silent no-op |

use std::fmt;

use super::config::{ObservableConfig, ViolationPolicy};

/// Why [`Observable::try_bind`](super::Observable::try_bind) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// The receiver is already bound.
    AlreadyBound,
    /// The other observable is already bound to a third one.
    PeerAlreadyBound,
    /// Both handles refer to the same observable.
    SelfBinding,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBound => write!(f, "observable is already bound"),
            Self::PeerAlreadyBound => write!(f, "peer observable is already bound"),
            Self::SelfBinding => write!(f, "cannot bind an observable to itself"),
        }
    }
}

impl std::error::Error for BindError {}

/// Why [`Observable::try_unbind`](super::Observable::try_unbind) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnbindError {
    /// At least one side is not bound.
    NotBound,
    /// Both sides are bound, but not to each other.
    Mismatched,
    /// The binding state was inconsistent; see [`ContractViolation`].
    Violation(ContractViolation),
}

impl fmt::Display for UnbindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBound => write!(f, "observables are not bound"),
            Self::Mismatched => write!(f, "observables are bound to different peers"),
            Self::Violation(v) => write!(f, "binding contract violated: {v}"),
        }
    }
}

impl std::error::Error for UnbindError {}

/// A broken binding invariant. Indicates a programming error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolation {
    /// A binding callback (registered `DidOnly`) was called without an old value.
    AbsentOldValue,
    /// The receiver's subscription to its peer could not be removed.
    AsymmetricBinding,
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbsentOldValue => write!(f, "binding callback received no old value"),
            Self::AsymmetricBinding => {
                write!(f, "binding is one-sided: peer holds no matching subscription")
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

/// Log a violation and apply the configured policy.
///
/// # Panics
///
/// Panics under [`ViolationPolicy::Panic`].
pub(crate) fn report_violation(config: &ObservableConfig, violation: ContractViolation) {
    tracing::error!(
        label = config.label_or_default(),
        ?violation,
        "reactive contract violation: {violation}"
    );
    if config.violation_policy == ViolationPolicy::Panic {
        panic!("reactive contract violation: {violation}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(BindError::AlreadyBound.to_string(), "observable is already bound");
        assert_eq!(UnbindError::NotBound.to_string(), "observables are not bound");
        let nested = UnbindError::Violation(ContractViolation::AsymmetricBinding);
        assert!(nested.to_string().starts_with("binding contract violated"));
    }

    #[test]
    fn log_policy_does_not_panic() {
        let config = ObservableConfig::new().with_violation_policy(ViolationPolicy::Log);
        report_violation(&config, ContractViolation::AbsentOldValue);
    }

    #[test]
    #[should_panic(expected = "reactive contract violation")]
    fn panic_policy_panics() {
        report_violation(&ObservableConfig::new(), ContractViolation::AbsentOldValue);
    }
}
