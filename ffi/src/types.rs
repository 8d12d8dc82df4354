//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length instead of `Vec`,
//! and enums with explicit discriminants. Conversion and release helpers live
//! here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::future::Future;
use std::os::raw::c_char;

use countries_core::{
    CountriesService, CountriesViewModel, Country, FetchCountries, JsonCountriesParser,
    ScriptedTransport, ServiceError, UreqTransport,
};

/// Opaque handle to a view-model and the runtime it refreshes on.
pub struct FfiCountriesViewModel {
    pub(crate) inner: CountriesViewModel<FfiService>,
    pub(crate) runtime: Option<tokio::runtime::Runtime>,
}

impl Drop for FfiCountriesViewModel {
    /// Requests in flight on the blocking pool are left to finish on their
    /// own; the caller's thread does not wait for them.
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Opaque handle keeping a callback registered. Freeing it unsubscribes.
pub struct FfiSubscription {
    pub(crate) _inner: countries_core::Subscription,
}

/// The service behind an FFI view-model: the network, or a canned scenario
/// for native UI tests.
pub(crate) enum FfiService {
    Live(CountriesService<UreqTransport, JsonCountriesParser>),
    Scripted(CountriesService<ScriptedTransport, JsonCountriesParser>),
}

impl FetchCountries for FfiService {
    fn fetch_countries(&self) -> impl Future<Output = Result<Vec<Country>, ServiceError>> + Send {
        async move {
            match self {
                FfiService::Live(service) => service.fetch_countries().await,
                FfiService::Scripted(service) => service.fetch_countries().await,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Canned outcomes for `countries_view_model_new_scripted`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiScenario {
    /// Every refresh succeeds with an empty list.
    EmptyList = 0,
    /// Every refresh fails with `InvalidData`.
    Failure = 1,
    /// Every refresh fails with `EmptyResponse`.
    EmptyResponse = 2,
    /// Every refresh receives a body that is not JSON.
    MalformedPayload = 3,
}

impl TryFrom<u32> for FfiScenario {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FfiScenario::EmptyList),
            1 => Ok(FfiScenario::Failure),
            2 => Ok(FfiScenario::EmptyResponse),
            3 => Ok(FfiScenario::MalformedPayload),
            other => Err(other),
        }
    }
}

impl FfiScenario {
    pub(crate) fn transport(self) -> ScriptedTransport {
        use countries_core::Script;
        match self {
            FfiScenario::EmptyList => ScriptedTransport::body("[]"),
            FfiScenario::Failure => ScriptedTransport::new(Script::Reject(ServiceError::InvalidData)),
            FfiScenario::EmptyResponse => ScriptedTransport::new(Script::Reject(ServiceError::EmptyResponse)),
            FfiScenario::MalformedPayload => ScriptedTransport::body("invalid json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Countries
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct FfiCurrency {
    pub code: *mut c_char,
    pub name: *mut c_char,
    pub symbol: *mut c_char,
}

#[repr(C)]
pub struct FfiLanguage {
    pub code: *mut c_char,
    pub name: *mut c_char,
}

/// A single country exposed to C. Every string is NUL-terminated UTF-8.
#[repr(C)]
pub struct FfiCountry {
    pub name: *mut c_char,
    pub capital: *mut c_char,
    pub code: *mut c_char,
    pub region: *mut c_char,
    pub flag: *mut c_char,
    pub currency: FfiCurrency,
    pub language: FfiLanguage,
}

/// A list of countries exposed to C. `items` is null when `len` is 0.
#[repr(C)]
pub struct FfiCountryList {
    pub items: *mut FfiCountry,
    pub len: usize,
}

/// Copy `s` into a C string. Interior NULs cannot cross the boundary and are
/// dropped.
pub(crate) fn c_string(s: &str) -> *mut c_char {
    let owned = if s.contains('\0') { s.replace('\0', "") } else { s.to_string() };
    CString::new(owned).unwrap_or_default().into_raw()
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

impl FfiCountry {
    fn from_core(country: &Country) -> Self {
        FfiCountry {
            name: c_string(&country.name),
            capital: c_string(&country.capital),
            code: c_string(&country.code),
            region: c_string(&country.region),
            flag: c_string(&country.flag),
            currency: FfiCurrency {
                code: c_string(&country.currency.code),
                name: c_string(&country.currency.name),
                symbol: c_string(&country.currency.symbol),
            },
            language: FfiLanguage {
                code: c_string(&country.language.code),
                name: c_string(&country.language.name),
            },
        }
    }

    /// Free the C-string fields (but not the struct itself).
    fn free_fields(&self) {
        for s in [
            self.name,
            self.capital,
            self.code,
            self.region,
            self.flag,
            self.currency.code,
            self.currency.name,
            self.currency.symbol,
            self.language.code,
            self.language.name,
        ] {
            free_c_string(s);
        }
    }
}

impl FfiCountryList {
    /// Convert core countries into a heap-allocated `FfiCountryList`.
    pub(crate) fn from_core(countries: &[Country]) -> *mut Self {
        let len = countries.len();
        let items = if countries.is_empty() {
            std::ptr::null_mut()
        } else {
            let boxed: Box<[FfiCountry]> = countries.iter().map(FfiCountry::from_core).collect();
            Box::into_raw(boxed) as *mut FfiCountry
        };
        Box::into_raw(Box::new(FfiCountryList { items, len }))
    }

    /// Release a list produced by `from_core`. Safe to call with null.
    pub(crate) fn free(list: *mut Self) {
        if list.is_null() {
            return;
        }
        let list = unsafe { Box::from_raw(list) };
        if !list.items.is_null() && list.len > 0 {
            let items = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(list.items, list.len))
            };
            for item in items.iter() {
                item.free_fields();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error categories exposed to C. `Ok` means "no error".
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidUrl = 1,
    Network = 2,
    InvalidData = 3,
    DecodingFailure = 4,
    EmptyResponse = 5,
    NullArg = 6,
    Panic = 7,
}

/// An error exposed to C. `message` is null when `code` is `Ok`.
#[repr(C)]
pub struct FfiError {
    pub code: FfiErrorCode,
    pub message: *mut c_char,
}

impl FfiError {
    fn build(code: FfiErrorCode, message: Option<&str>) -> FfiError {
        FfiError {
            code,
            message: message.map(c_string).unwrap_or(std::ptr::null_mut()),
        }
    }

    pub(crate) fn from_core(err: Option<&ServiceError>) -> FfiError {
        let Some(err) = err else {
            return Self::build(FfiErrorCode::Ok, None);
        };
        let code = match err {
            ServiceError::InvalidUrl(_) => FfiErrorCode::InvalidUrl,
            ServiceError::Failure(_) => FfiErrorCode::Network,
            ServiceError::InvalidData => FfiErrorCode::InvalidData,
            ServiceError::DecodingFailure => FfiErrorCode::DecodingFailure,
            ServiceError::EmptyResponse => FfiErrorCode::EmptyResponse,
        };
        Self::build(code, Some(&err.to_string()))
    }

    pub(crate) fn into_raw(self) -> *mut FfiError {
        Box::into_raw(Box::new(self))
    }

    pub(crate) fn null_arg(name: &str) -> *mut FfiError {
        Self::build(FfiErrorCode::NullArg, Some(&format!("null argument: {name}"))).into_raw()
    }

    pub(crate) fn panic(msg: &str) -> *mut FfiError {
        Self::build(FfiErrorCode::Panic, Some(msg)).into_raw()
    }

    /// Release the message only; used for errors lent to callbacks by value.
    pub(crate) fn free_message(&self) {
        free_c_string(self.message);
    }

    /// Release an error produced by `into_raw`. Safe to call with null.
    pub(crate) fn free(err: *mut Self) {
        if err.is_null() {
            return;
        }
        let err = unsafe { Box::from_raw(err) };
        err.free_message();
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Called with the freshly published list. The list is only valid for the
/// duration of the call.
pub type FfiCountriesCallback = extern "C" fn(list: *const FfiCountryList, context: *mut c_void);

/// Called with the freshly published error. The error is only valid for the
/// duration of the call.
pub type FfiErrorCallback = extern "C" fn(error: *const FfiError, context: *mut c_void);

/// Caller-supplied context pointer handed back to callbacks untouched.
///
/// The caller guarantees it stays valid, and may be used from the
/// notification thread, until the subscription is freed.
#[derive(Clone, Copy)]
pub(crate) struct CallbackContext(pub(crate) *mut c_void);

unsafe impl Send for CallbackContext {}
unsafe impl Sync for CallbackContext {}
