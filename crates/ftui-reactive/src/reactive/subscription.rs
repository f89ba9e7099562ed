#![forbid(unsafe_code)]

//! Subscription records and their caller-facing handles.
//!
//! A record is pure state: an [`Activation`] and a one-way `retired` latch.
//! The observable's subscription list and the [`SubscriptionHandle`] returned
//! to the caller share the same record, so switching activation through the
//! handle takes effect on the very next dispatch.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Which phase(s) of a mutation a subscription receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Activation {
    /// Receives nothing.
    Disabled,
    /// Called before the value is stored, with no old value.
    WillOnly,
    /// Called after the value is stored, with the previous value.
    #[default]
    DidOnly,
    /// Called in both phases.
    Both,
}

impl Activation {
    /// Whether this kind receives the pre-mutation call.
    #[must_use]
    pub const fn fires_will(self) -> bool {
        matches!(self, Self::WillOnly | Self::Both)
    }

    /// Whether this kind receives the post-mutation call.
    #[must_use]
    pub const fn fires_did(self) -> bool {
        matches!(self, Self::DidOnly | Self::Both)
    }
}

struct SubscriptionRecord {
    activation: Cell<Activation>,
    retired: Cell<bool>,
}

/// Handle on a single subscription.
///
/// Cloning a handle yields another handle to the **same** record; equality is
/// record identity. Dropping a handle does not unsubscribe. Use
/// [`Observable::remove`](super::Observable::remove) or [`retire`](Self::retire).
///
/// # Invariants
///
/// 1. `retired` only ever goes from `false` to `true`.
/// 2. Once retired, [`activation`](Self::activation) is `Disabled` and
///    [`set_activation`](Self::set_activation) is ignored.
#[derive(Clone)]
pub struct SubscriptionHandle {
    record: Rc<SubscriptionRecord>,
}

impl SubscriptionHandle {
    pub(crate) fn new(activation: Activation) -> Self {
        Self {
            record: Rc::new(SubscriptionRecord {
                activation: Cell::new(activation),
                retired: Cell::new(false),
            }),
        }
    }

    /// Current activation kind (`Disabled` once retired).
    #[must_use]
    pub fn activation(&self) -> Activation {
        if self.record.retired.get() {
            Activation::Disabled
        } else {
            self.record.activation.get()
        }
    }

    /// Switch the activation kind. No-op on a retired handle.
    pub fn set_activation(&self, activation: Activation) {
        if !self.record.retired.get() {
            self.record.activation.set(activation);
        }
    }

    /// Whether the callback will be invoked on the next dispatch.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.activation() != Activation::Disabled
    }

    /// Whether the handle has been retired.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.record.retired.get()
    }

    /// Permanently deactivate the subscription.
    ///
    /// The owning observable drops the entry the next time it compacts its
    /// list. Idempotent.
    pub fn retire(&self) {
        self.record.retired.set(true);
    }
}

impl PartialEq for SubscriptionHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
    }
}

impl Eq for SubscriptionHandle {}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("activation", &self.activation())
            .field("retired", &self.record.retired.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handle_is_active() {
        let h = SubscriptionHandle::new(Activation::DidOnly);
        assert!(h.is_active());
        assert!(!h.is_retired());
        assert_eq!(h.activation(), Activation::DidOnly);
    }

    #[test]
    fn disabled_is_inactive() {
        let h = SubscriptionHandle::new(Activation::Disabled);
        assert!(!h.is_active());

        h.set_activation(Activation::WillOnly);
        assert!(h.is_active());
        assert_eq!(h.activation(), Activation::WillOnly);
    }

    #[test]
    fn retire_is_permanent() {
        let h = SubscriptionHandle::new(Activation::Both);
        h.retire();
        assert!(h.is_retired());
        assert!(!h.is_active());
        assert_eq!(h.activation(), Activation::Disabled);

        h.set_activation(Activation::DidOnly);
        assert!(!h.is_active());
        assert_eq!(h.activation(), Activation::Disabled);

        // Idempotent.
        h.retire();
        assert!(h.is_retired());
    }

    #[test]
    fn clones_share_record() {
        let a = SubscriptionHandle::new(Activation::DidOnly);
        let b = a.clone();
        b.set_activation(Activation::WillOnly);
        assert_eq!(a.activation(), Activation::WillOnly);
        assert_eq!(a, b);

        a.retire();
        assert!(b.is_retired());
    }

    #[test]
    fn distinct_records_are_not_equal() {
        let a = SubscriptionHandle::new(Activation::DidOnly);
        let b = SubscriptionHandle::new(Activation::DidOnly);
        assert_ne!(a, b);
    }

    #[test]
    fn phase_helpers() {
        assert!(!Activation::Disabled.fires_will());
        assert!(!Activation::Disabled.fires_did());
        assert!(Activation::WillOnly.fires_will());
        assert!(!Activation::WillOnly.fires_did());
        assert!(!Activation::DidOnly.fires_will());
        assert!(Activation::DidOnly.fires_did());
        assert!(Activation::Both.fires_will());
        assert!(Activation::Both.fires_did());
    }

    #[test]
    fn debug_format() {
        let h = SubscriptionHandle::new(Activation::Both);
        let dbg = format!("{h:?}");
        assert!(dbg.contains("SubscriptionHandle"));
        assert!(dbg.contains("Both"));
    }

    #[test]
    fn debug_shows_retired_as_disabled() {
        let h = SubscriptionHandle::new(Activation::Both);
        h.retire();
        let dbg = format!("{h:?}");
        assert!(dbg.contains("Disabled"));
        assert!(!dbg.contains("Both"));
        assert!(dbg.contains("retired: true"));
    }
}
