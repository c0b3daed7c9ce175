use ferrous_ioc::{module, factory, scoped, single, Container, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct RequestId(usize);

fn counting_container() -> Container {
    let next = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    container
        .load(module![
            single::<String>().value("shared".to_string()),
            scoped::<RequestId>().factory(move |_| Ok(RequestId(next.fetch_add(1, Ordering::SeqCst)))),
        ])
        .unwrap();
    container
}

#[test]
fn test_scoped_is_shared_within_a_scope() {
    let container = counting_container();
    let scope = container.begin_scope();

    let a = scope.get::<RequestId>().unwrap();
    let b = scope.get::<RequestId>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_scoped_differs_between_scopes() {
    let container = counting_container();
    let scope1 = container.begin_scope();
    let scope2 = container.begin_scope();

    let a = scope1.get::<RequestId>().unwrap();
    let b = scope2.get::<RequestId>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.0, b.0);
}

#[test]
fn test_single_is_shared_across_scopes_and_root() {
    let container = counting_container();
    let scope1 = container.begin_scope();
    let scope2 = container.begin_scope();
    let nested = scope1.begin_scope();

    let from_scope1 = scope1.get::<String>().unwrap();
    let from_scope2 = scope2.get::<String>().unwrap();
    let from_nested = nested.get::<String>().unwrap();
    let from_root = container.get::<String>().unwrap();

    assert!(Arc::ptr_eq(&from_scope1, &from_scope2));
    assert!(Arc::ptr_eq(&from_scope1, &from_nested));
    assert!(Arc::ptr_eq(&from_scope1, &from_root));
}

#[test]
fn test_single_factory_built_in_scope_lives_at_root() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let container = Container::new();
    container
        .load(module![single::<u64>().factory(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(5)
        })])
        .unwrap();

    let scope = container.begin_scope();
    let in_scope = scope.get::<u64>().unwrap();
    drop(scope);

    let at_root = container.get::<u64>().unwrap();
    assert!(Arc::ptr_eq(&in_scope, &at_root));
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_nested_scope_has_its_own_scoped_cache() {
    let container = counting_container();
    let outer = container.begin_scope();
    let inner = outer.begin_scope();

    let a = outer.get::<RequestId>().unwrap();
    let b = inner.get::<RequestId>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_scope_local_provider_shadows_parent() {
    let container = Container::new();
    container.load(module![scoped::<u8>().value(1)]).unwrap();

    let scope = container.begin_scope();
    scope.load(module![scoped::<u8>().value(2)]).unwrap();

    assert_eq!(*scope.get::<u8>().unwrap(), 2);
    assert_eq!(*container.get::<u8>().unwrap(), 1);

    let sibling = container.begin_scope();
    assert_eq!(*sibling.get::<u8>().unwrap(), 1);
}

#[tokio::test]
async fn test_single_registered_in_scope_stays_in_scope() {
    let container = Container::new();
    container.load(module![single::<String>().value("root".to_string())]).unwrap();

    let scope = container.begin_scope();
    scope.load(module![single::<String>().factory(|_| Ok("scope".to_string()))]).unwrap();
    let nested = scope.begin_scope();
    let sibling = container.begin_scope();

    let in_scope = scope.get::<String>().unwrap();
    assert_eq!(*in_scope, "scope");
    assert!(Arc::ptr_eq(&in_scope, &nested.get::<String>().unwrap()));
    assert_eq!(*container.get::<String>().unwrap(), "root");
    assert_eq!(*sibling.get::<String>().unwrap(), "root");

    // Recorded and released by the scope that registered it
    assert_eq!(container.disposal_len(), 0);
    assert_eq!(scope.end().await.total(), 1);
    assert_eq!(*container.get::<String>().unwrap(), "root");
}

#[test]
fn test_factory_resolved_in_scope_sees_scoped_dependencies() {
    struct Handler {
        request: Arc<RequestId>,
    }

    let container = counting_container();
    container
        .load(module![factory::<Handler>().factory(|ctx| Ok(Handler { request: ctx.get::<RequestId>()? }))])
        .unwrap();

    let scope = container.begin_scope();
    let h1 = scope.get::<Handler>().unwrap();
    let h2 = scope.get::<Handler>().unwrap();
    assert!(!Arc::ptr_eq(&h1, &h2));
    assert!(Arc::ptr_eq(&h1.request, &h2.request));
}

#[tokio::test]
async fn test_scope_end_disposes_only_its_own_instances() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let scoped_log = log.clone();
    let single_log = log.clone();

    let container = Container::new();
    container
        .load(module![
            single::<String>()
                .value("root".to_string())
                .on_close(move |s: Arc<String>| {
                    single_log.lock().unwrap().push(format!("single:{s}"));
                    Ok::<_, std::io::Error>(())
                }),
            scoped::<RequestId>()
                .factory(|_| Ok(RequestId(0)))
                .on_close(move |r: Arc<RequestId>| {
                    scoped_log.lock().unwrap().push(format!("scoped:{}", r.0));
                    Ok::<_, std::io::Error>(())
                }),
        ])
        .unwrap();

    let scope = container.begin_scope();
    scope.get::<String>().unwrap();
    scope.get::<RequestId>().unwrap();
    assert_eq!(scope.disposal_len(), 1);

    let sibling = container.begin_scope();
    let sibling_request = sibling.get::<RequestId>().unwrap();

    let report = scope.end().await;
    assert_eq!(report.disposed, 1);
    assert_eq!(*log.lock().unwrap(), vec!["scoped:0".to_string()]);

    // Sibling cache untouched, root singleton still cached
    assert!(Arc::ptr_eq(&sibling_request, &sibling.get::<RequestId>().unwrap()));
    assert_eq!(container.disposal_len(), 1);

    sibling.end().await;
    container.shutdown().await;
    assert_eq!(
        *log.lock().unwrap(),
        vec!["scoped:0".to_string(), "scoped:0".to_string(), "single:root".to_string()]
    );
}

#[test]
fn test_scope_inherits_override_policy() {
    use ferrous_ioc::{ContainerOptions, OverrideStrategy};

    let container = Container::with_options(
        ContainerOptions::new()
            .allow_override(true)
            .override_strategy(OverrideStrategy::LastWins),
    );
    let scope = container.begin_scope();
    scope
        .load(module![scoped::<u8>().value(1), scoped::<u8>().value(2)])
        .unwrap();
    assert_eq!(*scope.get::<u8>().unwrap(), 2);
    assert!(scope.container().options().permits_replacement());
}
