//! Observable state bridging the fetch service to a presentation layer.
//!
//! # Design
//! The view-model owns two observable values, `countries` and `last_error`,
//! and one operation, `refresh_countries`. Each refresh is an independent
//! Tokio task with no lock shared between refreshes and no cancellation.
//! When a fetch completes, its outcome is posted to the dispatcher, which
//! applies it to exactly one of the two values. Outcomes reach the dispatcher
//! in completion order, so the most recently completed refresh wins
//! regardless of which one was started first.
//!
//! A successful refresh replaces `countries` and leaves `last_error` alone: an
//! earlier error stays visible until another failure overwrites it.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::dispatch::{Dispatcher, SerialDispatcher};
use crate::error::ServiceError;
use crate::filter::filter_countries;
use crate::observable::{Observable, ObservableRef};
use crate::service::FetchCountries;
use crate::types::Country;

pub struct CountriesViewModel<S> {
    service: Arc<S>,
    runtime: Handle,
    dispatcher: Arc<dyn Dispatcher>,
    countries: Observable<Vec<Country>>,
    last_error: Observable<Option<ServiceError>>,
}

impl<S: FetchCountries + 'static> CountriesViewModel<S> {
    /// Build a view-model on the current Tokio runtime, publishing through a
    /// fresh `SerialDispatcher`.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn new(service: S) -> Self {
        Self::with_runtime(service, Handle::current())
    }

    /// Build a view-model whose refreshes run on `runtime`. Every write is
    /// published through a `SerialDispatcher` spawned there.
    pub fn with_runtime(service: S, runtime: Handle) -> Self {
        let dispatcher = Arc::new(SerialDispatcher::new(&runtime));
        Self {
            service: Arc::new(service),
            runtime,
            dispatcher,
            countries: Observable::new(Vec::new()),
            last_error: Observable::new(None),
        }
    }

    /// Read-only view of the published list. Only completed refreshes write it.
    pub fn countries(&self) -> ObservableRef<'_, Vec<Country>> {
        ObservableRef::from(&self.countries)
    }

    /// Read-only view of the most recent refresh failure.
    pub fn last_error(&self) -> ObservableRef<'_, Option<ServiceError>> {
        ObservableRef::from(&self.last_error)
    }

    /// Current countries narrowed by `search`; see `filter_countries`.
    pub fn filtered(&self, search: &str) -> Vec<Country> {
        self.countries.with(|countries| filter_countries(countries, search))
    }

    /// Start a refresh and return immediately. The outcome is observed through
    /// `countries` or `last_error`.
    pub fn refresh_countries(&self) {
        let service = Arc::clone(&self.service);
        let dispatcher = Arc::clone(&self.dispatcher);
        let countries = self.countries.clone();
        let last_error = self.last_error.clone();

        debug!("refresh requested");
        self.runtime.spawn(async move {
            let outcome = service.fetch_countries().await;
            dispatcher.dispatch(Box::new(move || match outcome {
                Ok(list) => {
                    debug!(count = list.len(), "publishing countries");
                    countries.set(list);
                }
                Err(err) => {
                    warn!(error = %err, "publishing refresh failure");
                    last_error.set(Some(err));
                }
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::sync::{mpsc, oneshot};
    use tokio::time::timeout;

    use crate::observable::Subscription;
    use crate::types::fixtures;

    type Outcome = Result<Vec<Country>, ServiceError>;

    const WAIT: Duration = Duration::from_secs(2);

    /// Returns a fixed outcome on every call.
    struct FixedService(Outcome);

    impl FetchCountries for FixedService {
        fn fetch_countries(&self) -> impl Future<Output = Outcome> + Send {
            let outcome = self.0.clone();
            async move { outcome }
        }
    }

    /// Each call parks on its own gate; the test decides when and how each
    /// call completes.
    #[derive(Default)]
    struct GatedService {
        gates: Mutex<VecDeque<oneshot::Receiver<Outcome>>>,
        started: AtomicUsize,
    }

    impl GatedService {
        fn with_gates(n: usize) -> (Self, Vec<oneshot::Sender<Outcome>>) {
            let (senders, receivers): (Vec<_>, VecDeque<_>) = (0..n).map(|_| oneshot::channel()).unzip();
            let service = GatedService {
                gates: Mutex::new(receivers),
                started: AtomicUsize::new(0),
            };
            (service, senders)
        }
    }

    impl FetchCountries for GatedService {
        fn fetch_countries(&self) -> impl Future<Output = Outcome> + Send {
            let gate = self.gates.lock().unwrap().pop_front();
            self.started.fetch_add(1, Ordering::SeqCst);
            async move {
                match gate {
                    Some(gate) => gate.await.unwrap_or(Err(ServiceError::InvalidData)),
                    None => Err(ServiceError::InvalidData),
                }
            }
        }
    }

    fn watch<T: Clone + Send + 'static>(observable: ObservableRef<'_, T>) -> (Subscription, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = observable.subscribe(move |value: &T| {
            let _ = tx.send(value.clone());
        });
        (sub, rx)
    }

    async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        timeout(WAIT, rx.recv()).await.expect("timed out waiting for publication").expect("channel closed")
    }

    async fn wait_started(vm: &CountriesViewModel<GatedService>, n: usize) {
        timeout(WAIT, async {
            while vm.service.started.load(Ordering::SeqCst) < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("refresh never reached the service");
    }

    #[tokio::test]
    async fn initial_state_is_empty_without_error() {
        let vm = CountriesViewModel::new(FixedService(Ok(vec![fixtures::germany()])));
        assert!(vm.countries().get().is_empty());
        assert!(vm.last_error().get().is_none());
    }

    #[tokio::test]
    async fn successful_refresh_publishes_countries_only() {
        let vm = CountriesViewModel::new(FixedService(Ok(vec![fixtures::germany()])));
        let (_sub, mut rx) = watch(vm.countries());
        let errors = Arc::new(AtomicUsize::new(0));
        let error_count = Arc::clone(&errors);
        let _err_sub = vm.last_error().subscribe(move |_| {
            error_count.fetch_add(1, Ordering::SeqCst);
        });

        vm.refresh_countries();

        let published = next(&mut rx).await;
        assert_eq!(published, vec![fixtures::germany()]);
        assert_eq!(vm.countries().get(), vec![fixtures::germany()]);
        assert!(vm.last_error().get().is_none());
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_refresh_publishes_error_only() {
        let vm = CountriesViewModel::new(FixedService(Err(ServiceError::InvalidData)));
        let (_sub, mut rx) = watch(vm.last_error());
        let writes = Arc::new(AtomicUsize::new(0));
        let write_count = Arc::clone(&writes);
        let _countries_sub = vm.countries().subscribe(move |_| {
            write_count.fetch_add(1, Ordering::SeqCst);
        });

        vm.refresh_countries();

        let published = next(&mut rx).await;
        assert!(matches!(published, Some(ServiceError::InvalidData)));
        assert!(vm.countries().get().is_empty());
        assert_eq!(writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_does_not_clear_previous_error() {
        let (service, mut gates) = GatedService::with_gates(2);
        let vm = CountriesViewModel::new(service);
        let (_esub, mut errors) = watch(vm.last_error());
        let (_csub, mut countries) = watch(vm.countries());

        vm.refresh_countries();
        gates.remove(0).send(Err(ServiceError::EmptyResponse)).unwrap();
        next(&mut errors).await;

        vm.refresh_countries();
        gates.remove(0).send(Ok(vec![fixtures::france()])).unwrap();
        next(&mut countries).await;

        assert_eq!(vm.countries().get(), vec![fixtures::france()]);
        assert!(matches!(vm.last_error().get(), Some(ServiceError::EmptyResponse)));
    }

    #[tokio::test]
    async fn refresh_replaces_list_wholesale() {
        let (service, mut gates) = GatedService::with_gates(2);
        let vm = CountriesViewModel::new(service);
        let (_sub, mut rx) = watch(vm.countries());

        vm.refresh_countries();
        gates.remove(0).send(Ok(vec![fixtures::germany(), fixtures::france()])).unwrap();
        next(&mut rx).await;

        vm.refresh_countries();
        gates.remove(0).send(Ok(vec![fixtures::france()])).unwrap();
        next(&mut rx).await;

        assert_eq!(vm.countries().get(), vec![fixtures::france()]);
    }

    #[tokio::test]
    async fn last_completed_refresh_wins() {
        let (service, mut gates) = GatedService::with_gates(2);
        let vm = CountriesViewModel::new(service);
        let (_sub, mut rx) = watch(vm.countries());

        vm.refresh_countries();
        wait_started(&vm, 1).await;
        vm.refresh_countries();
        wait_started(&vm, 2).await;
        let first = gates.remove(0);
        let second = gates.remove(0);

        // Second-issued completes first.
        second.send(Ok(vec![fixtures::france()])).unwrap();
        assert_eq!(next(&mut rx).await, vec![fixtures::france()]);

        first.send(Ok(vec![fixtures::germany()])).unwrap();
        assert_eq!(next(&mut rx).await, vec![fixtures::germany()]);

        assert_eq!(vm.countries().get(), vec![fixtures::germany()]);
    }

    #[tokio::test]
    async fn late_failure_does_not_touch_countries() {
        let (service, mut gates) = GatedService::with_gates(2);
        let vm = CountriesViewModel::new(service);
        let (_csub, mut countries) = watch(vm.countries());
        let (_esub, mut errors) = watch(vm.last_error());

        vm.refresh_countries();
        wait_started(&vm, 1).await;
        vm.refresh_countries();
        wait_started(&vm, 2).await;
        let first = gates.remove(0);
        let second = gates.remove(0);

        second.send(Ok(vec![fixtures::france()])).unwrap();
        next(&mut countries).await;
        first.send(Err(ServiceError::failure("connection reset"))).unwrap();
        next(&mut errors).await;

        assert_eq!(vm.countries().get(), vec![fixtures::france()]);
        assert_eq!(
            vm.last_error().get().map(|e| e.to_string()),
            Some("Network error: connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn repeated_refresh_notifies_on_every_write() {
        let vm = CountriesViewModel::new(FixedService(Ok(vec![fixtures::germany()])));
        let (_sub, mut rx) = watch(vm.countries());

        for _ in 0..3 {
            vm.refresh_countries();
        }
        for _ in 0..3 {
            assert_eq!(next(&mut rx).await, vec![fixtures::germany()]);
        }
    }

    #[tokio::test]
    async fn observers_see_only_refresh_writes() {
        let vm = CountriesViewModel::new(FixedService(Ok(vec![fixtures::germany()])));
        let countries = vm.countries();
        let (_sub, mut rx) = watch(countries);
        assert_eq!(countries.observer_count(), 1);
        assert!(countries.get().is_empty());

        vm.refresh_countries();

        assert_eq!(next(&mut rx).await, vec![fixtures::germany()]);
        assert_eq!(countries.with(Vec::len), 1);
        assert!(vm.last_error().get().is_none());
    }

    #[tokio::test]
    async fn filtered_reads_current_countries() {
        let vm = CountriesViewModel::new(FixedService(Ok(vec![fixtures::germany(), fixtures::france()])));
        let (_sub, mut rx) = watch(vm.countries());
        vm.refresh_countries();
        next(&mut rx).await;

        assert_eq!(vm.filtered("ger"), vec![fixtures::germany()]);
        assert_eq!(vm.filtered(""), vec![fixtures::germany(), fixtures::france()]);
    }
}
