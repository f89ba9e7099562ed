#![forbid(unsafe_code)]

//! Reactive value containers for FrankenTUI.
//!
//! # Role in FrankenTUI
//! `ftui-reactive` is the change-notification layer widgets and models use to
//! share state. An [`Observable`] holds a value and calls its subscribers
//! before ("will") and/or after ("did") every mutation. Two observables can be
//! bound so that a change on either side is mirrored onto the other.
//!
//! # Primary responsibilities
//! - **Observable**: value storage plus two-pass will/did dispatch.
//! - **SubscriptionHandle**: per-subscription activation switch with a
//!   one-way retirement latch; retired entries are compacted lazily.
//! - **Binding**: one two-way link per observable, built on weak references
//!   so bound pairs never keep each other alive.
//!
//! # Threading
//! Everything here is single-threaded. The types are built on `Rc`, `Cell`
//! and `RefCell` and are therefore neither `Send` nor `Sync`. Re-entrant use
//! from inside callbacks is supported; concurrent use is not.

pub mod reactive;

pub use reactive::{
    Activation, BindError, ContractViolation, Observable, ObservableConfig, SubscriptionHandle,
    UnbindError, ViolationPolicy,
};
