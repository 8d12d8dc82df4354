//! Drive the C surface against the live mock server.
//!
//! Starts the mock server on a random port, then creates a view-model through
//! `countries_view_model_new` and observes refreshes through C callbacks,
//! exactly as a native host would.

use std::ffi::{c_void, CStr, CString};
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc::{channel, Sender};
use std::time::Duration;

use countries_ffi::types::{FfiCountriesViewModel, FfiCountryList, FfiError, FfiErrorCode};
use countries_ffi::*;

const WAIT: Duration = Duration::from_secs(5);

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn names_of(list: &FfiCountryList) -> Vec<String> {
    if list.items.is_null() {
        return Vec::new();
    }
    unsafe { std::slice::from_raw_parts(list.items, list.len) }
        .iter()
        .map(|c| unsafe { CStr::from_ptr(c.name) }.to_str().unwrap().to_string())
        .collect()
}

/// Collects the country names of each published list.
extern "C" fn on_countries(list: *const FfiCountryList, context: *mut c_void) {
    let tx = unsafe { &*(context as *const Sender<Vec<String>>) };
    let _ = tx.send(names_of(unsafe { &*list }));
}

extern "C" fn on_error(error: *const FfiError, context: *mut c_void) {
    let tx = unsafe { &*(context as *const Sender<FfiErrorCode>) };
    let _ = tx.send(unsafe { &*error }.code);
}

fn list_names(list: *mut FfiCountryList) -> Vec<String> {
    let names = names_of(unsafe { &*list });
    countries_free_list(list);
    names
}

#[test]
fn refresh_snapshot_and_filter() {
    let addr = start_server();
    let url = CString::new(format!("http://{addr}/countries.json")).unwrap();
    let vm = countries_view_model_new(url.as_ptr());
    assert!(!vm.is_null());

    let (tx, rx) = channel::<Vec<String>>();
    let sub = countries_subscribe_countries(vm, Some(on_countries), &tx as *const _ as *mut c_void);
    assert!(!sub.is_null());

    assert!(countries_refresh(vm));
    let names = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(names, ["Germany", "France", "Spain", "Italy"]);

    assert_eq!(list_names(countries_snapshot(vm)).len(), 4);

    let search = CString::new("PAR").unwrap();
    assert_eq!(list_names(countries_filter(vm, search.as_ptr())), ["France"]);
    assert_eq!(list_names(countries_filter(vm, std::ptr::null())).len(), 4);

    let err = countries_last_error(vm);
    assert_eq!(unsafe { &*err }.code, FfiErrorCode::Ok);
    countries_free_error(err);

    countries_subscription_free(sub);
    countries_view_model_free(vm);
}

#[test]
fn server_error_is_published_as_network_error() {
    let addr = start_server();
    let url = CString::new(format!("http://{addr}/unavailable")).unwrap();
    let vm = countries_view_model_new(url.as_ptr());

    let (tx, rx) = channel::<FfiErrorCode>();
    let sub = countries_subscribe_error(vm, Some(on_error), &tx as *const _ as *mut c_void);

    countries_refresh(vm);
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), FfiErrorCode::Network);
    assert_eq!(list_names(countries_snapshot(vm)).len(), 0);

    countries_subscription_free(sub);
    countries_view_model_free(vm);
}

/// Accepts connections and holds them open without ever answering.
fn start_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    addr
}

#[test]
fn free_does_not_wait_for_hung_request() {
    let addr = start_silent_server();
    let url = CString::new(format!("http://{addr}/countries.json")).unwrap();
    let vm = countries_view_model_new(url.as_ptr());
    assert!(!vm.is_null());

    assert!(countries_refresh(vm));
    std::thread::sleep(Duration::from_millis(300));

    let (tx, rx) = channel();
    let handle = vm as usize;
    std::thread::spawn(move || {
        countries_view_model_free(handle as *mut FfiCountriesViewModel);
        let _ = tx.send(());
    });
    assert!(rx.recv_timeout(WAIT).is_ok(), "free blocked on the in-flight request");
}
