//! A current value plus change notification.
//!
//! # Design
//! `Observable<T>` holds exactly one value, readable at any time with `get`.
//! Every `set` replaces the value and calls every callback registered at that
//! moment, even if the new value equals the old one. Callbacks run after the
//! internal lock is released, on the thread that called `set`, against a
//! snapshot of the value and of the observer list. That makes it safe to
//! subscribe, unsubscribe, or read the value from inside a callback or from
//! another thread while a notification is in flight.
//!
//! Writers are expected to be serialized by the caller; the view-model does
//! that by funnelling every write through one dispatcher.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    value: T,
    observers: Vec<(u64, Callback<T>)>,
    next_id: u64,
}

fn lock<T>(shared: &Mutex<Shared<T>>) -> MutexGuard<'_, Shared<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Observable<T> {
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Default + Clone + Send + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                value,
                observers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn get(&self) -> T {
        lock(&self.shared).value.clone()
    }

    /// Borrow the current value without cloning it. `f` runs under the lock
    /// and must not call back into this observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&lock(&self.shared).value)
    }

    /// Replace the value and notify every registered observer.
    pub fn set(&self, value: T) {
        let (snapshot, observers) = {
            let mut shared = lock(&self.shared);
            shared.value = value;
            let observers: Vec<Callback<T>> = shared.observers.iter().map(|(_, cb)| Arc::clone(cb)).collect();
            (shared.value.clone(), observers)
        };
        tracing::trace!(observers = observers.len(), "notifying observers");
        for observer in observers {
            observer(&snapshot);
        }
    }

    /// Register `f` to be called on every subsequent `set`. The current value
    /// is not replayed. The callback stays registered until the returned
    /// `Subscription` is cancelled or dropped.
    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut shared = lock(&self.shared);
            let id = shared.next_id;
            shared.next_id += 1;
            shared.observers.push((id, Arc::new(f)));
            id
        };
        let weak: Weak<Mutex<Shared<T>>> = Arc::downgrade(&self.shared);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    lock(&shared).observers.retain(|(observer, _)| *observer != id);
                }
            })),
        }
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.shared).observers.len()
    }
}

/// Read and subscribe access to an `Observable` owned by someone else.
///
/// Handed out by the view-model so observers cannot write the value:
///
/// ```compile_fail
/// use countries_core::{CountriesViewModel, FetchCountries};
///
/// fn overwrite<S: FetchCountries + 'static>(vm: &CountriesViewModel<S>) {
///     vm.countries().set(Vec::new());
/// }
/// ```
pub struct ObservableRef<'a, T> {
    inner: &'a Observable<T>,
}

impl<T> Clone for ObservableRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ObservableRef<'_, T> {}

impl<'a, T: Clone + Send + 'static> ObservableRef<'a, T> {
    pub fn get(&self) -> T {
        self.inner.get()
    }

    /// See `Observable::with`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    /// See `Observable::subscribe`.
    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.inner.subscribe(f)
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observer_count()
    }
}

impl<'a, T> From<&'a Observable<T>> for ObservableRef<'a, T> {
    fn from(inner: &'a Observable<T>) -> Self {
        Self { inner }
    }
}

/// Keeps a callback registered on an `Observable`. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
