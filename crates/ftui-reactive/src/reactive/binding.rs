#![forbid(unsafe_code)]

//! Two-way bindings between observables.
//!
//! # Design
//!
//! Binding `a` to `b` installs two `DidOnly` subscriptions:
//!
//! ```text
//!   a.subscriptions                     b.subscriptions
//!   ┌──────────────────────────┐        ┌──────────────────────────┐
//!   │ [b's interest] ─Weak(b)─ │ ─────▶ │                          │
//!   │                          │ ◀───── │ ─Weak(a)─ [a's interest] │
//!   └──────────────────────────┘        └──────────────────────────┘
//!   a.binding_in  = b's interest        b.binding_in  = a's interest
//!   a.binding_out = a's interest        b.binding_out = b's interest
//! ```
//!
//! Callbacks hold only `Weak` references, so a bound pair never keeps
//! itself alive. Dropping one side retires its `binding_out` record, which
//! lives in the survivor's list.
//!
//! # Echo suppression
//!
//! When `b` changes, a's-interest callback writes the value into `a`. If `a`
//! has other active subscribers, the write goes through [`Observable::set`]
//! with b's-interest record temporarily disabled, so the change is not sent
//! back to `b`. Otherwise the value is stored directly and nothing fires.

use std::cell::RefCell;
use std::rc::Weak;

use super::contract::{BindError, ContractViolation, UnbindError, report_violation};
use super::observable::{Observable, ObservableInner};
use super::subscription::{Activation, SubscriptionHandle};

/// Callback installed on the source side of a binding; writes into `target`.
fn propagate_to<T: Clone + 'static>(
    target: Weak<RefCell<ObservableInner<T>>>,
) -> impl Fn(&T, Option<&T>) + 'static {
    move |value, old| match target.upgrade() {
        Some(inner) => Observable::from_inner(inner).receive_from_peer(value, old),
        None => tracing::trace!("binding peer dropped; skipping propagation"),
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Bind this observable to `other` so that each mirrors the other's
    /// changes. Returns `false` if either side is already bound, or if both
    /// handles refer to the same observable.
    ///
    /// Values are not synchronised at bind time; the first `set` on either
    /// side does that.
    pub fn bind(&self, other: &Self) -> bool {
        self.try_bind(other).is_ok()
    }

    /// [`bind`](Self::bind) with the reason for failure.
    pub fn try_bind(&self, other: &Self) -> Result<(), BindError> {
        if self.ptr_eq(other) {
            return Err(BindError::SelfBinding);
        }
        self.reclaim_stale_binding();
        other.reclaim_stale_binding();
        if self.inner.borrow().binding_out.is_some() {
            return Err(BindError::AlreadyBound);
        }
        if other.inner.borrow().binding_out.is_some() {
            return Err(BindError::PeerAlreadyBound);
        }

        let ours = other.observe(Activation::DidOnly, propagate_to(self.downgrade()));
        self.inner.borrow_mut().binding_out = Some(ours.clone());
        other.inner.borrow_mut().binding_in = Some(ours);

        let theirs = self.observe(Activation::DidOnly, propagate_to(other.downgrade()));
        other.inner.borrow_mut().binding_out = Some(theirs.clone());
        self.inner.borrow_mut().binding_in = Some(theirs);

        tracing::debug!(
            label = self.inner.borrow().config.label_or_default(),
            peer = other.inner.borrow().config.label_or_default(),
            "observables bound"
        );
        Ok(())
    }

    /// Dissolve the binding between this observable and `other`.
    ///
    /// Returns `false` if the two are not bound to each other. Commutative:
    /// `a.unbind(&b)` and `b.unbind(&a)` leave the same state.
    pub fn unbind(&self, other: &Self) -> bool {
        self.try_unbind(other).is_ok()
    }

    /// [`unbind`](Self::unbind) with the reason for failure.
    ///
    /// # Panics
    ///
    /// Panics if the binding turns out to be one-sided and this observable's
    /// [`ViolationPolicy`](super::ViolationPolicy) is `Panic`.
    pub fn try_unbind(&self, other: &Self) -> Result<(), UnbindError> {
        let (ours, theirs) = {
            let a = self.inner.borrow();
            let b = other.inner.borrow();
            let (Some(ours), Some(theirs)) = (&a.binding_out, &b.binding_out) else {
                return Err(UnbindError::NotBound);
            };
            if b.binding_in.as_ref() != Some(ours) || a.binding_in.as_ref() != Some(theirs) {
                return Err(UnbindError::Mismatched);
            }
            (ours.clone(), theirs.clone())
        };

        if !other.remove(&ours) {
            return Err(self.asymmetric());
        }
        {
            let mut a = self.inner.borrow_mut();
            a.binding_out = None;
            a.binding_in = None;
        }
        other.inner.borrow_mut().binding_in = None;

        // `other` keeps its binding_out on failure; it is reclaimed as stale
        // by its next bind.
        if !self.remove(&theirs) {
            return Err(self.asymmetric());
        }
        other.inner.borrow_mut().binding_out = None;

        tracing::debug!(
            label = self.inner.borrow().config.label_or_default(),
            peer = other.inner.borrow().config.label_or_default(),
            "observables unbound"
        );
        Ok(())
    }

    /// Whether this observable is currently bound to a live peer.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        let inner = self.inner.borrow();
        inner.binding_out.is_some()
            && inner
                .binding_in
                .as_ref()
                .is_some_and(|reverse| !reverse.is_retired())
    }

    /// Whether this observable and `other` are bound to each other.
    #[must_use]
    pub fn is_bound_to(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return false;
        }
        let a = self.inner.borrow();
        let b = other.inner.borrow();
        match (&a.binding_out, &b.binding_out) {
            (Some(ours), Some(theirs)) => {
                b.binding_in.as_ref() == Some(ours) && a.binding_in.as_ref() == Some(theirs)
            }
            _ => false,
        }
    }

    /// Apply a value coming from the bound peer.
    fn receive_from_peer(&self, value: &T, old: Option<&T>) {
        let reverse = {
            let inner = self.inner.borrow();
            match (&inner.binding_out, &inner.binding_in) {
                (Some(_), Some(reverse)) => reverse.clone(),
                _ => {
                    tracing::trace!(
                        label = inner.config.label_or_default(),
                        "binding torn down; skipping propagation"
                    );
                    return;
                }
            }
        };
        if old.is_none() {
            report_violation(&self.inner.borrow().config, ContractViolation::AbsentOldValue);
            return;
        }

        if self.has_other_active(&reverse) {
            // An outer propagation may already hold `reverse` disabled.
            let prior = reverse.activation();
            reverse.set_activation(Activation::Disabled);
            self.set(value.clone());
            reverse.set_activation(prior);
        } else {
            self.store(value.clone());
        }
    }

    fn has_other_active(&self, reverse: &SubscriptionHandle) -> bool {
        self.inner
            .borrow()
            .subscriptions
            .iter()
            .any(|entry| entry.handle != *reverse && entry.handle.is_active())
    }

    /// Clear binding fields left behind by a destroyed or one-sided peer.
    fn reclaim_stale_binding(&self) {
        let stale = {
            let mut inner = self.inner.borrow_mut();
            let dangling = inner.binding_out.is_some()
                && inner
                    .binding_in
                    .as_ref()
                    .is_none_or(SubscriptionHandle::is_retired);
            if dangling {
                let out = inner.binding_out.take();
                let reverse = inner.binding_in.take();
                out.into_iter().chain(reverse).for_each(|h| h.retire());
            }
            dangling
        };
        if stale {
            tracing::debug!(
                label = self.inner.borrow().config.label_or_default(),
                "reclaimed stale binding"
            );
            self.cleanse();
        }
    }

    fn asymmetric(&self) -> UnbindError {
        let violation = ContractViolation::AsymmetricBinding;
        report_violation(&self.inner.borrow().config, violation);
        UnbindError::Violation(violation)
    }
}
