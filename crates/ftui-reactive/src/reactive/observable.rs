#![forbid(unsafe_code)]

//! Observable value wrapper with will/did change notification.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). Every [`set`](Observable::set) runs two
//! passes over the subscription list: `WillOnly`/`Both` subscribers are
//! called before the value is stored (with no old value), `DidOnly`/`Both`
//! subscribers after it (with the previous value).
//!
//! # Performance
//!
//! | Operation     | Complexity                     |
//! |---------------|--------------------------------|
//! | `get()`       | O(1) + clone of `T`            |
//! | `set()`       | O(S) where S = subscriptions   |
//! | `observe()`   | O(S) (compaction scan)         |
//! | `remove()`    | O(S) (compaction scan)         |
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: calling `set()` from a callback runs a nested
//!   dispatch immediately. Each dispatch walks a snapshot of the list taken
//!   when it started, so nested registration or removal never disturbs an
//!   outer walk. A callback that keeps setting its own observable recurses
//!   without bound.
//! - **Subscriber leak**: retired subscriptions stay in the list until the
//!   next `observe`, `remove` or `cleanse`. They are skipped by dispatch.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::config::ObservableConfig;
use super::subscription::{Activation, SubscriptionHandle};

/// Subscriber callback: `(new_value, old_value)`. `old_value` is `None` for
/// the pre-mutation call.
pub(crate) type Callback<T> = Rc<dyn Fn(&T, Option<&T>)>;

/// One `(record, callback)` pair in the subscription list.
pub(crate) struct Entry<T> {
    pub(crate) handle: SubscriptionHandle,
    pub(crate) callback: Callback<T>,
}

// Manual Clone: `T` itself need not be Clone to copy the Rc pair.
impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            callback: Rc::clone(&self.callback),
        }
    }
}

/// Shared interior for [`Observable<T>`].
pub(crate) struct ObservableInner<T> {
    pub(crate) value: T,
    pub(crate) version: u64,
    pub(crate) subscriptions: Vec<Entry<T>>,
    /// Our interest in the peer; the record lives in the peer's list.
    pub(crate) binding_out: Option<SubscriptionHandle>,
    /// The peer's interest in us; the record lives in `subscriptions`.
    pub(crate) binding_in: Option<SubscriptionHandle>,
    pub(crate) config: ObservableConfig,
}

impl<T> ObservableInner<T> {
    /// Insert `entry`, reusing the first retired slot found scanning from the
    /// back. Further retired entries seen during the scan are dropped.
    fn insert(&mut self, entry: Entry<T>) {
        let mut pending = Some(entry);
        let mut dropped = 0usize;
        for idx in (0..self.subscriptions.len()).rev() {
            if !self.subscriptions[idx].handle.is_retired() {
                continue;
            }
            match pending.take() {
                Some(entry) => self.subscriptions[idx] = entry,
                None => {
                    self.subscriptions.remove(idx);
                    dropped += 1;
                }
            }
        }
        if let Some(entry) = pending {
            self.subscriptions.push(entry);
        }
        if dropped > 0 {
            tracing::trace!(
                label = self.config.label_or_default(),
                dropped,
                "compacted retired subscriptions on observe"
            );
        }
    }

    /// Drop every retired entry. Returns whether `handle` was among them.
    fn compact(&mut self, handle: &SubscriptionHandle) -> bool {
        let mut found = false;
        let mut dropped = 0usize;
        for idx in (0..self.subscriptions.len()).rev() {
            if self.subscriptions[idx].handle.is_retired() {
                let entry = self.subscriptions.remove(idx);
                found |= entry.handle == *handle;
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::trace!(
                label = self.config.label_or_default(),
                dropped,
                "compacted retired subscriptions"
            );
        }
        found
    }
}

impl<T> Drop for ObservableInner<T> {
    fn drop(&mut self) {
        // The peer must stop calling back into a container that is gone.
        if let Some(out) = self.binding_out.take() {
            out.retire();
            tracing::debug!(
                label = self.config.label_or_default(),
                "bound observable dropped; retired its peer subscription"
            );
        }
    }
}

/// A shared value with will/did change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state:
/// both handles see the same value, share subscribers and share the binding.
/// The inner state is destroyed when the last handle is dropped.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each stored mutation.
/// 2. `set(v)` always stores and dispatches, even if `v` equals the current
///    value.
/// 3. Without prior retirements, subscribers are notified in registration
///    order.
/// 4. Retired subscriptions are never called, and are compacted lazily.
pub struct Observable<T> {
    pub(crate) inner: Rc<RefCell<ObservableInner<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("label", &inner.config.label)
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscriptions.len())
            .field("bound", &inner.binding_out.is_some())
            .finish()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    ///
    /// The initial version is 0 and no subscribers are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_config(value, ObservableConfig::default())
    }

    /// Create a new observable with an explicit configuration.
    #[must_use]
    pub fn with_config(value: T, config: ObservableConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscriptions: Vec::new(),
                binding_out: None,
                binding_in: None,
                config,
            })),
        }
    }

    pub(crate) fn from_inner(inner: Rc<RefCell<ObservableInner<T>>>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<ObservableInner<T>>> {
        Rc::downgrade(&self.inner)
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// The closure must not mutate this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Store a new value and notify subscribers.
    ///
    /// `WillOnly`/`Both` subscribers run first with `(value, None)`, then the
    /// value is stored, then `DidOnly`/`Both` subscribers run with
    /// `(value, Some(old))`. A single `Both` subscriber is therefore called
    /// twice.
    pub fn set(&self, value: T) {
        // Snapshot so callbacks may observe/remove/set re-entrantly.
        let snapshot: Vec<Entry<T>> = self.inner.borrow().subscriptions.clone();
        match snapshot.as_slice() {
            [] => {
                self.store(value);
            }
            [only] => self.dispatch_single(only, value),
            entries => self.dispatch_all(entries, value),
        }
    }

    /// Modify a copy of the value via a closure, then [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Register `callback` for the phases selected by `activation`.
    ///
    /// Retired entries are compacted first; the new subscription may take
    /// the slot of one of them, so its position in dispatch order is only
    /// guaranteed to be last when nothing had been retired.
    pub fn observe(
        &self,
        activation: Activation,
        callback: impl Fn(&T, Option<&T>) + 'static,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new(activation);
        self.inner.borrow_mut().insert(Entry {
            handle: handle.clone(),
            callback: Rc::new(callback),
        });
        handle
    }

    /// Shorthand for `observe(Activation::DidOnly, ..)` with a non-optional
    /// old value.
    ///
    /// `callback` only ever runs in the did phase. Switching the returned
    /// handle to `WillOnly` silences it (while the handle still reports
    /// active), and `Both` behaves like `DidOnly`.
    pub fn observe_did(&self, callback: impl Fn(&T, &T) + 'static) -> SubscriptionHandle {
        self.observe(Activation::DidOnly, move |new, old| {
            if let Some(old) = old {
                callback(new, old);
            }
        })
    }

    /// Retire `handle` and compact the list.
    ///
    /// Returns `true` only if `handle` was in this observable's list. Any
    /// other retired entries are dropped too. The handle is retired even if
    /// it belongs elsewhere, unless this list is empty.
    pub fn remove(&self, handle: &SubscriptionHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.subscriptions.is_empty() {
            return false;
        }
        handle.retire();
        inner.compact(handle)
    }

    /// Drop all retired entries without touching live ones.
    pub fn cleanse(&self) {
        let throwaway = SubscriptionHandle::new(Activation::Disabled);
        let _ = self.remove(&throwaway);
    }

    /// Current version number. Increments by 1 on each stored mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of entries in the subscription list, including retired ones
    /// not yet compacted.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    /// Number of subscriptions that would be called on the next `set`.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner
            .borrow()
            .subscriptions
            .iter()
            .filter(|entry| entry.handle.is_active())
            .count()
    }

    /// A copy of this observable's configuration.
    #[must_use]
    pub fn config(&self) -> ObservableConfig {
        self.inner.borrow().config.clone()
    }

    /// Whether both handles refer to the same observable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Replace the stored value without dispatch. Returns the old value.
    pub(crate) fn store(&self, value: T) -> T {
        let mut inner = self.inner.borrow_mut();
        inner.version += 1;
        std::mem::replace(&mut inner.value, value)
    }

    fn dispatch_single(&self, entry: &Entry<T>, value: T) {
        let kind = entry.handle.activation();
        if kind == Activation::Disabled {
            self.store(value);
            return;
        }
        if kind != Activation::DidOnly {
            (entry.callback)(&value, None);
        }
        if kind == Activation::WillOnly {
            self.store(value);
        } else {
            let old = self.store(value.clone());
            (entry.callback)(&value, Some(&old));
        }
    }

    fn dispatch_all(&self, entries: &[Entry<T>], value: T) {
        for entry in entries {
            if entry.handle.activation().fires_will() {
                (entry.callback)(&value, None);
            }
        }
        let old = self.store(value.clone());
        for entry in entries {
            if entry.handle.activation().fires_did() {
                (entry.callback)(&value, Some(&old));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
