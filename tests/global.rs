//! Process-wide container tests.
//!
//! These share one global slot, so every test runs serially and resets it.

use ferrous_ioc::{global, module, scoped, single, ContainerOptions, DiError, OverrideStrategy, Resolver};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
#[serial]
fn test_start_and_inject() {
    global::reset_di();
    global::start_di(
        module![
            single::<String>().value("app".to_string()),
            single::<u16>().named("port").value(8080),
        ],
        ContainerOptions::default(),
    )
    .unwrap();

    assert_eq!(*global::inject::<String>().unwrap(), "app");
    assert_eq!(*global::inject_named::<u16>("port").unwrap(), 8080);
    assert!(Arc::ptr_eq(
        &global::inject::<String>().unwrap(),
        &global::container().get::<String>().unwrap()
    ));
    global::reset_di();
}

#[test]
#[serial]
fn test_failed_start_keeps_previous_container() {
    global::reset_di();
    global::start_di(module![single::<u8>().value(1)], ContainerOptions::default()).unwrap();

    let err = global::start_di(
        module![single::<u8>().value(2), single::<u8>().value(3)],
        ContainerOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DiError::OverrideConflict(_)));
    assert_eq!(*global::inject::<u8>().unwrap(), 1);
    global::reset_di();
}

#[test]
#[serial]
fn test_start_honors_override_policy() {
    global::reset_di();
    let options = ContainerOptions::new()
        .allow_override(true)
        .override_strategy(OverrideStrategy::LastWins);
    global::start_di(module![single::<u8>().value(2), single::<u8>().value(3)], options).unwrap();

    assert_eq!(*global::inject::<u8>().unwrap(), 3);
    global::reset_di();
}

#[test]
#[serial]
fn test_reset_clears_registrations() {
    global::reset_di();
    global::start_di(module![single::<u8>().value(1)], ContainerOptions::default()).unwrap();
    let previous = global::container();

    global::reset_di();
    assert!(matches!(global::inject::<u8>(), Err(DiError::MissingProvider(_))));
    assert!(previous.keys().is_empty());
    assert!(!previous.same_container(&global::container()));
}

#[test]
#[serial]
fn test_global_scopes_and_override() {
    global::reset_di();
    let next = Arc::new(AtomicUsize::new(0));
    global::start_di(
        module![scoped::<usize>().factory(move |_| Ok(next.fetch_add(1, Ordering::SeqCst)))],
        ContainerOptions::default(),
    )
    .unwrap();

    let a = global::begin_scope();
    let b = global::begin_scope();
    assert_ne!(*a.get::<usize>().unwrap(), *b.get::<usize>().unwrap());

    global::override_value(99usize, None);
    assert_eq!(*global::inject::<usize>().unwrap(), 99);
    assert_eq!(*global::begin_scope().get::<usize>().unwrap(), 99);
    global::reset_di();
}

#[tokio::test]
#[serial]
async fn test_inject_async_and_shutdown() {
    global::reset_di();
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = closed.clone();

    global::start_di(
        module![
            single::<String>()
                .async_factory(|_| async { Ok("pool".to_string()) })
                .on_close(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>(())
                }),
            single::<u16>().named("port").value(5432),
        ],
        ContainerOptions::default(),
    )
    .unwrap();

    assert!(matches!(global::inject::<String>(), Err(DiError::SyncAgainstAsync(_))));
    assert_eq!(*global::inject_async::<String>().await.unwrap(), "pool");
    assert_eq!(*global::inject_named_async::<u16>("port").await.unwrap(), 5432);

    let report = global::shutdown_di().await;
    assert_eq!(report.disposed, 1);
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    // Registrations survive shutdown
    assert_eq!(*global::inject_async::<String>().await.unwrap(), "pool");
    global::reset_di();
}
