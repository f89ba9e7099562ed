#![forbid(unsafe_code)]

//! Observable values, will/did subscriptions, and two-way bindings.
//!
//! This module provides the change-notification primitives:
//!
//! - [`Observable`]: a shared value wrapper that notifies subscribers before
//!   and/or after each mutation.
//! - [`SubscriptionHandle`]: the caller's handle on one subscription; its
//!   [`Activation`] can be switched at any time and it can be retired.
//! - [`Observable::bind`]: links two observables so their values stay equal.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscriptions are `(record, callback)` pairs. Retiring a record only flips
//! a latch; the entry is dropped from the list lazily, the next time
//! `observe`, `remove` or `cleanse` scans it.
//!
//! A binding is a pair of `DidOnly` subscriptions, one on each side, whose
//! callbacks capture a `Weak` reference to the opposite observable. Dropping
//! the last handle to a bound observable retires the record it owns in its
//! peer's list.
//!
//! # Invariants
//!
//! 1. A retired record reads as [`Activation::Disabled`] forever.
//! 2. Every `set` stores the new value, even when it equals the old one.
//! 3. `WillOnly` callbacks never see an old value; `DidOnly` callbacks always
//!    do; `Both` callbacks are called once of each kind per `set`.
//! 4. An observable takes part in at most one binding at a time.
//! 5. Propagation across a binding never echoes back to its origin.
//!
//! # Ordering
//!
//! Without retirements, dispatch follows registration order. Compaction may
//! reuse a retired slot for a new subscription, after which the order of
//! later registrations is unspecified.

pub mod binding;
pub mod config;
pub mod contract;
pub mod observable;
pub mod subscription;

pub use config::{ObservableConfig, ViolationPolicy};
pub use contract::{BindError, ContractViolation, UnbindError};
pub use observable::Observable;
pub use subscription::{Activation, SubscriptionHandle};
