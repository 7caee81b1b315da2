//! Concurrent access tests
//!
//! The container is shared across threads after bootstrap. These tests check
//! that the first concurrent resolution of a cold singleton constructs it
//! exactly once and that transients stay independent.

use crossbeam_utils::thread;
use roster_di::{Container, DiError, Implementation, RegisterOptions, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

const THREADS: usize = 16;

struct ConnectionPool {
    id: usize,
}

fn slow_pool_container(constructions: Arc<AtomicUsize>) -> Container {
    let container = Container::new();
    container.add_value("config", "postgres://localhost/roster").unwrap();
    container
        .add_singleton("pool", &["config"], move |_| {
            let id = constructions.fetch_add(1, Ordering::SeqCst);
            // Widen the window in which other threads see a cold cache
            std::thread::sleep(Duration::from_millis(20));
            Ok(ConnectionPool { id })
        })
        .unwrap();
    container
}

#[test]
fn test_cold_singleton_constructed_once() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let container = slow_pool_container(constructions.clone());
    let barrier = Barrier::new(THREADS);

    let pools: Vec<Arc<ConnectionPool>> = thread::scope(|s| {
        let (container, barrier) = (&container, &barrier);
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(move |_| {
                    barrier.wait();
                    container.get::<ConnectionPool>("pool").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    for pool in &pools {
        assert!(Arc::ptr_eq(pool, &pools[0]));
        assert_eq!(pool.id, 0);
    }
}

#[test]
fn test_concurrent_dependents_share_singleton() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let container = slow_pool_container(constructions.clone());
    container
        .add_transient("repository", &["pool"], |deps| deps.get::<ConnectionPool>(0))
        .unwrap();
    let barrier = Barrier::new(THREADS);

    let pools: Vec<Arc<Arc<ConnectionPool>>> = thread::scope(|s| {
        let (container, barrier) = (&container, &barrier);
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(move |_| {
                    barrier.wait();
                    container.get::<Arc<ConnectionPool>>("repository").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(pools.iter().all(|pool| Arc::ptr_eq(&**pool, &*pools[0])));
}

#[test]
fn test_concurrent_transients_are_distinct() {
    let container = Container::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let next = counter.clone();
    container
        .add_transient("request-id", &[], move |_| Ok(next.fetch_add(1, Ordering::SeqCst)))
        .unwrap();

    let mut ids: Vec<usize> = thread::scope(|s| {
        let container = &container;
        let handles: Vec<_> = (0..THREADS)
            .map(|_| s.spawn(move |_| *container.get::<usize>("request-id").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    ids.sort_unstable();
    assert_eq!(ids, (0..THREADS).collect::<Vec<_>>());
}

#[test]
fn test_concurrent_cycle_reports_error_without_deadlock() {
    let container = Container::new();
    container.add_singleton("A", &["B"], |_| Ok(())).unwrap();
    container.add_singleton("B", &["A"], |_| Ok(())).unwrap();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for i in 0..THREADS {
            let container = &container;
            let barrier = &barrier;
            s.spawn(move |_| {
                barrier.wait();
                let name = if i % 2 == 0 { "A" } else { "B" };
                assert!(matches!(container.resolve(name), Err(DiError::Circular(_))));
            });
        }
    })
    .unwrap();
}

#[test]
fn test_shared_container_behind_arc() {
    let container = Arc::new(Container::new());
    container.add_singleton("counter", &[], |_| Ok(AtomicUsize::new(0))).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let container = container.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    container.get::<AtomicUsize>("counter").unwrap().fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(container.get::<AtomicUsize>("counter").unwrap().load(Ordering::SeqCst), 400);
}

/// Registers `name` as a singleton over a transient `gate` whose constructor
/// parks until the main thread has changed the registration.
fn gated(container: &Container, name: &str, value: u16, entered: &Arc<Barrier>, release: &Arc<Barrier>) {
    let (entered, release) = (entered.clone(), release.clone());
    container
        .add_transient("gate", &[], move |_| {
            entered.wait();
            release.wait();
            Ok(())
        })
        .unwrap();
    container.add_singleton(name, &["gate"], move |_| Ok(value)).unwrap();
}

#[test]
fn test_clear_during_resolution_leaves_nothing_cached() {
    let container = Container::new();
    let (entered, release) = (Arc::new(Barrier::new(2)), Arc::new(Barrier::new(2)));
    gated(&container, "svc", 42, &entered, &release);

    let in_flight = thread::scope(|s| {
        let container = &container;
        let handle = s.spawn(move |_| container.get::<u16>("svc"));
        entered.wait();
        container.clear();
        release.wait();
        handle.join().unwrap()
    })
    .unwrap();

    // The call that started before the reset still completes
    assert_eq!(*in_flight.unwrap(), 42);
    assert!(!container.has("svc"));
    assert!(!container.is_cached("svc"));
    assert_eq!(container.cached_count(), 0);
    assert_eq!(container.resolve("svc").unwrap_err(), DiError::NotRegistered("svc".into()));
}

#[test]
fn test_replace_during_resolution_serves_new_registration() {
    let container = Container::new();
    let (entered, release) = (Arc::new(Barrier::new(2)), Arc::new(Barrier::new(2)));
    gated(&container, "port", 80, &entered, &release);

    let in_flight = thread::scope(|s| {
        let container = &container;
        let handle = s.spawn(move |_| container.get::<u16>("port"));
        entered.wait();
        container.replace_service("port", Implementation::value(8080u16), RegisterOptions::singleton_service());
        release.wait();
        handle.join().unwrap()
    })
    .unwrap();

    assert_eq!(*in_flight.unwrap(), 80);
    assert_eq!(*container.get::<u16>("port").unwrap(), 8080);
    assert_eq!(*container.get::<u16>("port").unwrap(), 8080);
}
