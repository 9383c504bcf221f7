mod common;

use bodi::{
    Arguments, Component, ComponentBuilder, Constructor, Container, DiError, Factory, Parameter, ServiceType,
};
use common::{Clock, FrozenClock, Scheduler, SystemClock, Ticker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_resolve_is_idempotent() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(None).unwrap();

    let first = container.resolve::<dyn Clock>().unwrap();
    let second = container.resolve::<dyn Clock>().unwrap();

    assert_eq!(first.now(), 1_000);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_concrete_types_resolve_without_registration() {
    let container = Container::new();

    let clock = container.resolve::<SystemClock>().unwrap();
    let again = container.resolve::<SystemClock>().unwrap();

    assert!(Arc::ptr_eq(&clock, &again));
}

#[test]
fn test_dependencies_are_injected() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(None).unwrap();

    let scheduler = container.resolve::<Scheduler>().unwrap();
    let clock = container.resolve::<dyn Clock>().unwrap();

    assert!(Arc::ptr_eq(&scheduler.clock, &clock));
}

#[test]
fn test_register_after_resolve_fails() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(None).unwrap();
    container.resolve::<dyn Clock>().unwrap();

    let err = container.register_type_as::<FrozenClock, dyn Clock>(None).err().unwrap();
    assert!(matches!(err, DiError::AlreadyResolved(_)));
}

#[test]
fn test_last_registration_wins_before_resolution() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(None).unwrap();
    container.register_instance_as::<dyn Clock, _>(Arc::new(FrozenClock(5)), None, false).unwrap();

    assert_eq!(container.resolve::<dyn Clock>().unwrap().now(), 5);
}

#[test]
fn test_aliases_of_one_implementation_share_an_instance() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(None).unwrap();
    container.register_type_as::<SystemClock, dyn Ticker>(None).unwrap();

    let clock = container.resolve::<dyn Clock>().unwrap();
    let ticker = container.resolve::<dyn Ticker>().unwrap();
    let concrete = container.resolve::<SystemClock>().unwrap();

    assert_eq!(ticker.ticks(), 7);
    let clock_addr = Arc::as_ptr(&clock) as *const () as usize;
    let ticker_addr = Arc::as_ptr(&ticker) as *const () as usize;
    let concrete_addr = Arc::as_ptr(&concrete) as *const () as usize;
    assert_eq!(clock_addr, ticker_addr);
    assert_eq!(clock_addr, concrete_addr);
}

#[test]
fn test_invalid_mapping_is_rejected() {
    let container = Container::new();

    let err = container.register_type_as::<FrozenClock, dyn Ticker>(None).err().unwrap();
    assert!(matches!(err, DiError::InvalidTypeMapping { .. }));
    assert!(!container.is_registered::<dyn Ticker>(None).unwrap());
}

#[test]
fn test_unregistered_interface_cannot_be_resolved() {
    let container = Container::new();

    let err = container.resolve::<dyn Clock>().err().unwrap();
    assert!(matches!(err, DiError::InterfaceCannotBeResolved { .. }));
}

#[test]
fn test_missing_dependency_reports_resolution_path() {
    let container = Container::new();

    let err = container.resolve::<Scheduler>().err().unwrap();
    match &err {
        DiError::InterfaceCannotBeResolved { path, .. } => {
            assert_eq!(path, &vec![std::any::type_name::<Scheduler>().to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().ends_with(&format!("(resolution path: {})", std::any::type_name::<Scheduler>())));
}

#[test]
fn test_primitives_are_not_resolvable() {
    let container = Container::new();

    assert!(matches!(
        container.resolve::<u32>().err().unwrap(),
        DiError::PrimitiveTypeNotResolvable { .. }
    ));
    assert!(matches!(
        container.resolve::<String>().err().unwrap(),
        DiError::PrimitiveTypeNotResolvable { .. }
    ));
}

struct NeedsNumber;

impl Component for NeedsNumber {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([Parameter::service::<u16>()], |_| Ok(NeedsNumber)));
    }
}

#[test]
fn test_primitive_constructor_parameter_fails() {
    let container = Container::new();

    match container.resolve::<NeedsNumber>().err().unwrap() {
        DiError::PrimitiveTypeNotResolvable { type_name, path } => {
            assert_eq!(type_name, "u16");
            assert_eq!(path.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct TwoWays;

impl Component for TwoWays {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([Parameter::service::<SystemClock>()], |_| Ok(TwoWays)))
            .constructor(Constructor::new([Parameter::service::<FrozenClock>()], |_| Ok(TwoWays)));
    }
}

#[test]
fn test_ambiguous_constructor() {
    let container = Container::new();

    assert!(matches!(
        container.resolve::<TwoWays>().err().unwrap(),
        DiError::AmbiguousConstructor { .. }
    ));
}

struct Widest {
    picked: usize,
}

impl Component for Widest {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([], |_| Ok(Widest { picked: 0 })))
            .constructor(Constructor::new(
                [Parameter::service::<SystemClock>(), Parameter::service::<FrozenClock>()],
                |_| Ok(Widest { picked: 2 }),
            ))
            .constructor(Constructor::new([Parameter::service::<SystemClock>()], |_| Ok(Widest { picked: 1 })));
    }
}

#[test]
fn test_widest_constructor_is_selected() {
    let container = Container::new();

    assert_eq!(container.resolve::<Widest>().unwrap().picked, 2);
}

struct Hidden {
    public: bool,
}

impl Component for Hidden {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([Parameter::service::<SystemClock>()], |_| Ok(Hidden { public: false })).non_public())
            .constructor(Constructor::new([], |_| Ok(Hidden { public: true })));
    }
}

struct OnlyHidden;

impl Component for OnlyHidden {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([], |_| Ok(OnlyHidden)).non_public());
    }
}

struct Bare;

impl Component for Bare {
    fn describe(_: &mut ComponentBuilder<Self>) {}
}

#[test]
fn test_public_constructors_take_precedence() {
    let container = Container::new();

    assert!(container.resolve::<Hidden>().unwrap().public);
    assert!(container.resolve::<OnlyHidden>().is_ok());
    assert!(matches!(container.resolve::<Bare>().err().unwrap(), DiError::NoConstructor { .. }));
}

#[test]
fn test_factory_results_are_cached_but_not_pooled() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    let container = Container::new();
    let factory = || {
        Factory::<dyn Clock>::new([], |_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FrozenClock(9)) as Arc<dyn Clock>)
        })
    };
    container.register_factory(factory(), None).unwrap();
    container.register_factory(factory(), Some("backup")).unwrap();

    let first = container.resolve::<dyn Clock>().unwrap();
    let again = container.resolve::<dyn Clock>().unwrap();
    let backup = container.resolve_named::<dyn Clock>("backup").unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &backup));
    assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_factory_parameters_are_resolved() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(None).unwrap();
    container
        .register_factory(
            Factory::<Scheduler>::new([Parameter::service::<dyn Clock>()], |args: &Arguments| {
                Ok(Arc::new(Scheduler {
                    clock: args.service::<dyn Clock>(0)?,
                }))
            }),
            None,
        )
        .unwrap();

    let scheduler = container.resolve::<Scheduler>().unwrap();
    assert_eq!(scheduler.clock.now(), 1_000);
}

struct Labelled {
    label: Option<String>,
}

impl Component for Labelled {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([Parameter::RegisteredName], |args: &Arguments| {
            Ok(Labelled {
                label: args.registered_name(0)?.map(str::to_string),
            })
        }));
    }
}

#[test]
fn test_registered_name_is_injected() {
    let container = Container::new();
    container.register_type_as::<Labelled, Labelled>(Some("primary")).unwrap();

    let named = container.resolve_named::<Labelled>("primary").unwrap();
    let unnamed = container.resolve::<Labelled>().unwrap();

    assert_eq!(named.label.as_deref(), Some("primary"));
    assert_eq!(unnamed.label, None);
}

#[test]
fn test_container_parameter_is_the_resolving_container() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(None).unwrap();
    container
        .register_factory(
            Factory::<dyn Clock>::new([Parameter::Container], |args: &Arguments| {
                let inner = args.container(0)?;
                Ok(Arc::new(FrozenClock(inner.resolve::<SystemClock>()?.now())) as Arc<dyn Clock>)
            }),
            Some("derived"),
        )
        .unwrap();

    assert_eq!(container.resolve_named::<dyn Clock>("derived").unwrap().now(), 1_000);
}

#[test]
fn test_is_registered_checks_own_registry() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(Some("Main")).unwrap();

    assert!(container.is_registered::<dyn Clock>(Some("main")).unwrap());
    assert!(!container.is_registered::<dyn Clock>(None).unwrap());
    assert!(container.is_registered_type(&ServiceType::of::<SystemClock>(), None).is_ok());
    assert!(!container.create_child().is_registered::<dyn Clock>(Some("main")).unwrap());
}

#[test]
fn test_resolve_all_returns_every_registration_of_the_type() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(Some("system")).unwrap();
    container.register_instance_as::<dyn Clock, _>(Arc::new(FrozenClock(3)), Some("frozen"), false).unwrap();

    let clocks = container.resolve_all::<dyn Clock>().unwrap();
    let mut times: Vec<u64> = clocks.iter().map(|clock| clock.now()).collect();
    times.sort();

    assert_eq!(times, vec![3, 1_000]);
}

#[test]
fn test_display_lists_registrations() {
    let container = Container::new();
    container.register_type_as::<SystemClock, dyn Clock>(None).unwrap();
    container.register_instance_as::<dyn Clock, _>(Arc::new(FrozenClock(4)), Some("frozen"), false).unwrap();

    let text = container.to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        format!(
            "{} -> Type: {}",
            std::any::type_name::<dyn Clock>(),
            std::any::type_name::<SystemClock>()
        )
    );
    assert!(lines[1].ends_with("('frozen') -> Instance: FrozenClock(4)"));
}

struct Loud;

impl Component for Loud {
    fn describe(c: &mut ComponentBuilder<Self>) {
        c.constructor(Constructor::new([], |_| Ok(Loud)));
    }

    fn render(&self) -> String {
        panic!("boom")
    }
}

#[test]
fn test_display_survives_panicking_render() {
    let container = Container::new();
    container.register_instance(Arc::new(Loud)).unwrap();

    let text = container.to_string();
    assert_eq!(text.lines().count(), 1);
    assert!(text.trim_end().ends_with(" -> Instance: boom"));
    assert_eq!(container.to_string(), text);
    assert!(container.resolve::<Loud>().is_ok());
}
