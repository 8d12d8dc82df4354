//! C-ABI wrapper around `countries-core`.
//!
//! # Overview
//! Lets a native presentation layer (an iOS app, typically) own a countries
//! view-model: trigger refreshes, subscribe to the published list and error,
//! and read or filter the current list, without linking to Rust's async
//! runtime or serde directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Each view-model handle owns its own Tokio runtime; refreshes run there
//!   and callbacks fire on the view-model's notification task, never on the
//!   caller's thread. Hosts hop to their UI thread inside the callback.
//! - Values handed to callbacks are borrowed for the duration of the call.
//!   Values returned from functions are owned by the caller and must be
//!   released with the matching `countries_free_*` function.

pub mod types;

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use countries_core::{
    CountriesService, CountriesViewModel, Country, JsonCountriesParser, ServiceConfig, ServiceError,
};
use tracing_subscriber::EnvFilter;

use types::*;

/// Read an optional C string. Null or invalid UTF-8 yields `None`.
fn opt_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

fn config_for(endpoint: *const c_char) -> ServiceConfig {
    match opt_str(endpoint) {
        Some(endpoint) => ServiceConfig::new(endpoint),
        None => ServiceConfig::from_env(),
    }
}

fn build_view_model(service: FfiService) -> *mut FfiCountriesViewModel {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("countries-ffi")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to start runtime");
            return std::ptr::null_mut();
        }
    };
    let inner = CountriesViewModel::with_runtime(service, runtime.handle().clone());
    Box::into_raw(Box::new(FfiCountriesViewModel {
        inner,
        runtime: Some(runtime),
    }))
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install a `tracing` subscriber writing to stderr, filtered by `RUST_LOG`
/// (default `info`). Returns false if a subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn countries_init_logging() -> bool {
    catch_unwind(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// View-model lifecycle
// ---------------------------------------------------------------------------

/// Create a view-model fetching from `endpoint` over the network.
///
/// A null `endpoint` uses `COUNTRIES_ENDPOINT` or the built-in default. An
/// invalid endpoint is accepted here and reported as an `InvalidUrl` error on
/// the first refresh. Returns null if the runtime cannot start or on panic.
/// The caller must free the returned pointer with `countries_view_model_free`.
#[unsafe(no_mangle)]
pub extern "C" fn countries_view_model_new(endpoint: *const c_char) -> *mut FfiCountriesViewModel {
    catch_unwind(|| {
        let config = config_for(endpoint);
        build_view_model(FfiService::Live(CountriesService::from_config(&config)))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a view-model whose refreshes replay a canned scenario instead of
/// touching the network. `scenario` is an `FfiScenario` discriminant.
///
/// Returns null for an unknown scenario or on panic.
#[unsafe(no_mangle)]
pub extern "C" fn countries_view_model_new_scripted(
    endpoint: *const c_char,
    scenario: u32,
) -> *mut FfiCountriesViewModel {
    catch_unwind(|| {
        let Ok(scenario) = FfiScenario::try_from(scenario) else {
            return std::ptr::null_mut();
        };
        let config = config_for(endpoint);
        let service = CountriesService::new(&config.endpoint, scenario.transport(), JsonCountriesParser);
        build_view_model(FfiService::Scripted(service))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a view-model. In-flight refreshes are abandoned without waiting for
/// them, so a hung request never blocks the caller. Safe to call with null.
/// Must not be called from inside a callback.
#[unsafe(no_mangle)]
pub extern "C" fn countries_view_model_free(vm: *mut FfiCountriesViewModel) {
    if !vm.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(vm) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

/// Start a refresh and return immediately. The outcome arrives through the
/// subscribed callbacks. Returns false if `vm` is null.
#[unsafe(no_mangle)]
pub extern "C" fn countries_refresh(vm: *const FfiCountriesViewModel) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if vm.is_null() {
            return false;
        }
        let vm = unsafe { &*vm };
        vm.inner.refresh_countries();
        true
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Call `callback` with every list published to `countries`.
///
/// `context` is passed back untouched and must stay valid until the returned
/// subscription is freed with `countries_subscription_free`. Returns null if
/// `vm` or `callback` is null.
#[unsafe(no_mangle)]
pub extern "C" fn countries_subscribe_countries(
    vm: *const FfiCountriesViewModel,
    callback: Option<FfiCountriesCallback>,
    context: *mut c_void,
) -> *mut FfiSubscription {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(callback) = callback else {
            return std::ptr::null_mut();
        };
        if vm.is_null() {
            return std::ptr::null_mut();
        }
        let vm = unsafe { &*vm };
        let context = CallbackContext(context);
        let subscription = vm.inner.countries().subscribe(move |countries: &Vec<Country>| {
            let context = context;
            let list = FfiCountryList::from_core(countries);
            callback(list, context.0);
            FfiCountryList::free(list);
        });
        Box::into_raw(Box::new(FfiSubscription { _inner: subscription }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Call `callback` with every error published to `last_error`.
///
/// Same ownership rules as `countries_subscribe_countries`.
#[unsafe(no_mangle)]
pub extern "C" fn countries_subscribe_error(
    vm: *const FfiCountriesViewModel,
    callback: Option<FfiErrorCallback>,
    context: *mut c_void,
) -> *mut FfiSubscription {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(callback) = callback else {
            return std::ptr::null_mut();
        };
        if vm.is_null() {
            return std::ptr::null_mut();
        }
        let vm = unsafe { &*vm };
        let context = CallbackContext(context);
        let subscription = vm.inner.last_error().subscribe(move |err: &Option<ServiceError>| {
            let context = context;
            let ffi_err = FfiError::from_core(err.as_ref());
            callback(&ffi_err, context.0);
            ffi_err.free_message();
        });
        Box::into_raw(Box::new(FfiSubscription { _inner: subscription }))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Unregister a callback. Safe to call with null, and from inside a callback.
#[unsafe(no_mangle)]
pub extern "C" fn countries_subscription_free(subscription: *mut FfiSubscription) {
    if !subscription.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(subscription) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Copy of the current list. Returns null if `vm` is null.
/// The caller must free the result with `countries_free_list`.
#[unsafe(no_mangle)]
pub extern "C" fn countries_snapshot(vm: *const FfiCountriesViewModel) -> *mut FfiCountryList {
    catch_unwind(AssertUnwindSafe(|| {
        if vm.is_null() {
            return std::ptr::null_mut();
        }
        let vm = unsafe { &*vm };
        vm.inner.countries().with(|countries| FfiCountryList::from_core(countries))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Current countries whose name or capital contains `search`, ignoring case.
/// A null or empty `search` returns the whole list. Returns null if `vm` is
/// null. The caller must free the result with `countries_free_list`.
#[unsafe(no_mangle)]
pub extern "C" fn countries_filter(
    vm: *const FfiCountriesViewModel,
    search: *const c_char,
) -> *mut FfiCountryList {
    catch_unwind(AssertUnwindSafe(|| {
        if vm.is_null() {
            return std::ptr::null_mut();
        }
        let vm = unsafe { &*vm };
        let filtered = vm.inner.filtered(opt_str(search).unwrap_or(""));
        FfiCountryList::from_core(&filtered)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// The most recent error, or an error with code `Ok` if none was published.
/// Never returns null. The caller must free the result with
/// `countries_free_error`.
#[unsafe(no_mangle)]
pub extern "C" fn countries_last_error(vm: *const FfiCountriesViewModel) -> *mut FfiError {
    catch_unwind(AssertUnwindSafe(|| {
        if vm.is_null() {
            return FfiError::null_arg("vm");
        }
        let vm = unsafe { &*vm };
        vm.inner.last_error().with(|err| FfiError::from_core(err.as_ref())).into_raw()
    }))
    .unwrap_or_else(|_| FfiError::panic("panic in countries_last_error"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a list returned by `countries_snapshot` or `countries_filter`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn countries_free_list(list: *mut FfiCountryList) {
    let _ = catch_unwind(AssertUnwindSafe(|| FfiCountryList::free(list)));
}

/// Free an error returned by `countries_last_error`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn countries_free_error(err: *mut FfiError) {
    let _ = catch_unwind(AssertUnwindSafe(|| FfiError::free(err)));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
