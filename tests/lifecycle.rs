//! Shared transport lifecycle under concurrent handles.

mod common;

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use pooled_http::config::TransportConfig;
use pooled_http::{ClientError, Outcome, TransportManager};

#[test]
fn concurrent_acquire_then_release_initializes_and_closes_once() {
    const HANDLES: usize = 32;
    let manager = common::manager();
    let acquired = Arc::new(Barrier::new(HANDLES));
    let ids = Arc::new(Mutex::new(Vec::new()));

    let workers: Vec<_> = (0..HANDLES)
        .map(|_| {
            let (manager, acquired, ids) = (manager.clone(), acquired.clone(), ids.clone());
            thread::spawn(move || {
                let handle = manager.acquire();
                ids.lock().unwrap().push(handle.transport_id());
                acquired.wait();
                drop(handle);
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let ids = ids.lock().unwrap();
    assert_eq!(ids.len(), HANDLES);
    assert!(ids[0].is_some());
    assert!(ids.iter().all(|id| *id == ids[0]), "every handle saw the same transport");

    let stats = manager.stats();
    assert_eq!(stats.initializations, 1);
    assert_eq!(stats.teardowns, 1);
    assert_eq!(stats.live_handles, 0);
    assert!(!stats.initialized);
}

#[test]
fn churn_balances_initializations_and_teardowns() {
    let manager = common::manager();

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let handle = manager.acquire();
                    assert!(handle.is_available());
                    drop(handle);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = manager.stats();
    assert!(stats.initializations >= 1);
    assert_eq!(stats.initializations, stats.teardowns);
    assert_eq!(stats.live_handles, 0);
    assert!(!stats.initialized);
}

#[test]
fn outstanding_handle_pins_the_transport() {
    let manager = common::manager();
    let anchor = manager.acquire();
    let id = anchor.transport_id();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    let handle = manager.acquire();
                    assert_eq!(handle.transport_id(), id);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = manager.stats();
    assert_eq!(stats.initializations, 1);
    assert_eq!(stats.teardowns, 0);
    assert_eq!(stats.live_handles, 1);

    drop(anchor);
    assert_eq!(manager.stats().teardowns, 1);
}

#[test]
fn reacquire_after_teardown_builds_fresh_transport() {
    let manager = common::manager();

    let first = manager.acquire().transport_id();
    let second = manager.acquire().transport_id();

    assert_ne!(first, second);
    let stats = manager.stats();
    assert_eq!(stats.initializations, 2);
    assert_eq!(stats.teardowns, 2);
}

#[test]
fn global_manager_is_shared() {
    let a = TransportManager::global();
    let b = TransportManager::global();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn last_release_after_request_closes_transport() {
    let backend = common::MockBackend::start();
    let manager = common::manager();

    let handle = manager.acquire();
    let response = handle.blocking().get(&backend.url("/"), None, &[]).unwrap();
    assert_eq!(response.status().as_u16(), 200);
    drop(handle);

    assert!(!manager.stats().initialized);
    assert_eq!(backend.requests().len(), 1);
}

#[test]
fn failed_initialization_yields_unavailable_then_retries() {
    let backend = common::MockBackend::start();
    let manager = common::manager_with(TransportConfig {
        io_threads: 1,
        max_total: usize::MAX / 2,
        ..TransportConfig::default()
    });

    let broken = manager.acquire();
    assert!(!broken.is_available());
    assert_eq!(broken.transport_id(), None);
    assert!(matches!(
        broken.blocking().get(&backend.url("/"), None, &[]),
        Err(ClientError::Unavailable)
    ));
    let outcome = broken.nonblocking().get(&backend.url("/"), None, &[]).unwrap().wait();
    assert!(matches!(outcome, Outcome::Failed(ClientError::Unavailable)), "got {outcome:?}");

    let stats = manager.stats();
    assert_eq!(stats.init_failures, 1);
    assert_eq!(stats.initializations, 0);
    assert!(!stats.initialized);
    assert_eq!(stats.live_handles, 1);
    assert_eq!(backend.connections(), 0);

    // The next acquire retries with whatever configuration is current.
    manager.reconfigure(TransportConfig {
        io_threads: 1,
        ..TransportConfig::default()
    });
    let working = manager.acquire();
    assert!(working.is_available());
    assert_eq!(working.blocking().get(&backend.url("/"), None, &[]).unwrap().status().as_u16(), 200);

    drop(broken);
    drop(working);
    let stats = manager.stats();
    assert_eq!(stats.init_failures, 1);
    assert_eq!(stats.initializations, 1);
    assert_eq!(stats.teardowns, 1);
    assert_eq!(stats.live_handles, 0);
}
