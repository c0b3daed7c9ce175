use ferrous_ioc::{keys, module, factory, scoped, single, Args, Container, ContainerOptions, DiError, DiResult, Injectable, Resolver};
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
struct Alpha {
    _beta: Arc<Beta>,
}

#[derive(Debug)]
struct Beta {
    _alpha: Arc<Alpha>,
}

impl Injectable for Alpha {
    fn construct(args: &mut Args) -> DiResult<Self> {
        Ok(Alpha { _beta: args.take()? })
    }
}

impl Injectable for Beta {
    fn construct(args: &mut Args) -> DiResult<Self> {
        Ok(Beta { _alpha: args.take()? })
    }
}

fn assert_cycle(err: DiError, expected: &[&str]) {
    match err {
        DiError::Circular { path } => {
            assert_eq!(path.len(), expected.len(), "{path:?}");
            for (segment, suffix) in path.iter().zip(expected) {
                assert!(segment.ends_with(suffix), "{segment} does not end with {suffix}");
            }
        }
        other => panic!("expected Circular, got {other}"),
    }
}

#[test]
fn test_class_cycle_reports_path() {
    let container = Container::new();
    container
        .load(module![
            single::<Alpha>().class().deps(keys![Beta]),
            single::<Beta>().class().deps(keys![Alpha]),
        ])
        .unwrap();

    let err = container.get::<Alpha>().unwrap_err();
    assert_cycle(err, &["Alpha", "Beta", "Alpha"]);

    // Starting from the other end reports the rotated cycle
    let err = container.get::<Beta>().unwrap_err();
    assert_cycle(err, &["Beta", "Alpha", "Beta"]);
}

#[test]
fn test_factory_cycle_reports_path() {
    #[derive(Debug)]
    struct A;
    #[derive(Debug)]
    struct B;
    #[derive(Debug)]
    struct C;

    let container = Container::new();
    container
        .load(module![
            factory::<A>().factory(|ctx| {
                ctx.get::<B>()?;
                Ok(A)
            }),
            factory::<B>().factory(|ctx| {
                ctx.get::<C>()?;
                Ok(B)
            }),
            factory::<C>().factory(|ctx| {
                ctx.get::<B>()?;
                Ok(C)
            }),
        ])
        .unwrap();

    let err = container.get::<A>().unwrap_err();
    assert_cycle(err, &["B", "C", "B"]);
}

#[test]
fn test_self_dependency_is_a_cycle() {
    #[derive(Debug)]
    struct Node;

    let container = Container::new();
    container
        .load(module![single::<Node>().factory(|ctx| {
            ctx.get::<Node>()?;
            Ok(Node)
        })])
        .unwrap();

    let err = container.get::<Node>().unwrap_err();
    assert_cycle(err, &["Node", "Node"]);
}

#[test]
fn test_reentry_through_another_handle_is_a_cycle() {
    #[derive(Debug)]
    struct Node;
    static HANDLE: OnceLock<Container> = OnceLock::new();

    let container = HANDLE.get_or_init(Container::new);
    container
        .load(module![single::<Node>().factory(|_| {
            // Bypasses the resolution context
            let handle = HANDLE.get().ok_or_else(|| DiError::factory("Node", "container not set"))?;
            handle.get::<Node>()?;
            Ok(Node)
        })])
        .unwrap();

    let err = container.get::<Node>().unwrap_err();
    assert_cycle(err, &["Node", "Node"]);
    assert_eq!(container.disposal_len(), 0);
}

#[test]
fn test_reentry_from_scope_through_root_handle_is_a_cycle() {
    #[derive(Debug)]
    struct Node;

    let container = Container::new();
    let root = container.clone();
    container
        .load(module![scoped::<Node>().factory(move |_| {
            root.get::<Node>()?;
            Ok(Node)
        })])
        .unwrap();

    let scope = container.begin_scope();
    assert!(matches!(scope.get::<Node>(), Err(DiError::Circular { .. })));
}

#[test]
fn test_container_recovers_after_cycle() {
    let container = Container::new();
    container
        .load(module![
            single::<Alpha>().class().deps(keys![Beta]),
            single::<Beta>().class().deps(keys![Alpha]),
            single::<u8>().value(1),
        ])
        .unwrap();

    assert!(container.get::<Alpha>().is_err());
    assert_eq!(*container.get::<u8>().unwrap(), 1);
    assert!(matches!(container.get::<Alpha>(), Err(DiError::Circular { .. })));
}

#[test]
fn test_shared_dependency_is_not_a_cycle() {
    #[derive(Debug)]
    struct Shared;
    #[derive(Debug)]
    struct Left(#[allow(dead_code)] Arc<Shared>);
    #[derive(Debug)]
    struct Right(#[allow(dead_code)] Arc<Shared>);
    #[derive(Debug)]
    struct Top {
        left: Arc<Left>,
        right: Arc<Right>,
    }

    let container = Container::new();
    container
        .load(module![
            factory::<Shared>().factory(|_| Ok(Shared)),
            factory::<Left>().factory(|ctx| Ok(Left(ctx.get()?))),
            factory::<Right>().factory(|ctx| Ok(Right(ctx.get()?))),
            factory::<Top>().factory(|ctx| {
                Ok(Top {
                    left: ctx.get()?,
                    right: ctx.get()?,
                })
            }),
        ])
        .unwrap();

    let top = container.get::<Top>().unwrap();
    assert!(!Arc::ptr_eq(&top.left.0, &top.right.0));
}

#[test]
fn test_cycle_inside_scope() {
    #[derive(Debug)]
    struct Ping;
    #[derive(Debug)]
    struct Pong;

    let container = Container::new();
    container
        .load(module![
            scoped::<Ping>().factory(|ctx| {
                ctx.get::<Pong>()?;
                Ok(Ping)
            }),
            scoped::<Pong>().factory(|ctx| {
                ctx.get::<Ping>()?;
                Ok(Pong)
            }),
        ])
        .unwrap();

    let scope = container.begin_scope();
    let err = scope.get::<Ping>().unwrap_err();
    assert_cycle(err, &["Ping", "Pong", "Ping"]);
    assert_eq!(scope.disposal_len(), 0);
}

#[test]
fn test_depth_limit() {
    let container = Container::with_options(ContainerOptions::new().max_depth(2));
    container
        .load(module![
            factory::<u8>().factory(|ctx| Ok(*ctx.get::<u16>()? as u8)),
            factory::<u16>().factory(|ctx| Ok(*ctx.get::<u32>()? as u16)),
            factory::<u32>().factory(|_| Ok(3)),
        ])
        .unwrap();

    assert!(matches!(container.get::<u8>(), Err(DiError::DepthExceeded(2))));
    assert_eq!(*container.get::<u16>().unwrap(), 3);
}

#[tokio::test]
async fn test_async_cycle_reports_path() {
    let container = Container::new();
    container
        .load(module![
            single::<Alpha>().class().deps(keys![Beta]),
            single::<Beta>().class().deps(keys![Alpha]),
        ])
        .unwrap();

    let err = container.get_async::<Alpha>().await.unwrap_err();
    assert_cycle(err, &["Alpha", "Beta", "Alpha"]);
}

#[tokio::test]
async fn test_async_factory_cycle() {
    #[derive(Debug)]
    struct Left;
    #[derive(Debug)]
    struct Right;

    let container = Container::new();
    container
        .load(module![
            single::<Left>().async_factory(|ctx| async move {
                ctx.get_async::<Right>().await?;
                Ok(Left)
            }),
            single::<Right>().async_factory(|ctx| async move {
                ctx.get_async::<Left>().await?;
                Ok(Right)
            }),
        ])
        .unwrap();

    let err = container.get_async::<Left>().await.unwrap_err();
    assert_cycle(err, &["Left", "Right", "Left"]);
}

#[tokio::test]
async fn test_async_reentry_through_captured_handle_is_a_cycle() {
    #[derive(Debug)]
    struct Node;

    let container = Container::new();
    let handle = container.clone();
    container
        .load(module![single::<Node>().async_factory(move |_| {
            let handle = handle.clone();
            async move {
                handle.get_async::<Node>().await?;
                Ok(Node)
            }
        })])
        .unwrap();

    let err = container.get_async::<Node>().await.unwrap_err();
    assert_cycle(err, &["Node", "Node"]);
}
