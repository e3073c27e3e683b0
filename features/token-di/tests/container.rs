use std::{cell::Cell, rc::Rc};

use token_di::{
    consumer, container, container_token, dynamic_consumer, factory, implementation, inject,
    provide, token, token_with_default, Container, ContainerError, ContainerOptions,
    Dependencies, Injectable, ParentFallback, Token,
};

#[derive(Debug, PartialEq)]
struct ServiceA {
    value: u32,
}
impl ServiceA {
    fn foo(&self) -> u32 {
        self.value
    }
}

#[derive(Debug, PartialEq)]
struct ServiceB {
    bar: String,
}

struct Fixture {
    a: Token<ServiceA>,
    b: Token<ServiceB>,
}
impl Fixture {
    fn new() -> Self {
        Fixture {
            a: token("ServiceA"),
            b: token_with_default("ServiceB", ServiceB { bar: "666".into() }),
        }
    }

    fn a_impl(&self) -> Injectable<ServiceA> {
        factory(&self.a, || Ok(ServiceA { value: 111 }))
    }

    fn b_impl(&self) -> Injectable<ServiceB> {
        inject(Dependencies::new().add("serviceA", &self.a)).implements(&self.b, |ctx| {
            let a = ctx.get::<ServiceA>("serviceA")?;
            Ok(ServiceB {
                bar: format!("{:.2}", a.foo() as f64),
            })
        })
    }
}

#[test]
fn stateful_providers_are_lazy_singletons() {
    let fx = Fixture::new();
    let built = Rc::new(Cell::new(0));
    let counter = built.clone();
    let a_impl = factory(&fx.a, move || {
        counter.set(counter.get() + 1);
        Ok(ServiceA { value: 111 })
    });

    let ioc = container([provide::stateful(fx.b_impl()), provide::stateful(a_impl)]).unwrap();
    assert_eq!(built.get(), 0);

    let b1 = ioc.request(&fx.b).unwrap();
    let b2 = ioc.request(&fx.b).unwrap();
    assert!(Rc::ptr_eq(&b1, &b2));
    assert_eq!(b1.bar, "111.00");

    let a1 = ioc.request(&fx.a).unwrap();
    let a2 = ioc.request(&fx.a).unwrap();
    assert!(Rc::ptr_eq(&a1, &a2));
    assert_eq!(built.get(), 1);
}

#[test]
fn stateless_providers_build_every_time() {
    let fx = Fixture::new();
    let ioc = container([
        provide::stateless(fx.a_impl()),
        provide::stateless(fx.b_impl()),
    ])
    .unwrap();

    let a1 = ioc.request(&fx.a).unwrap();
    let a2 = ioc.request(&fx.a).unwrap();
    let b1 = ioc.request(&fx.b).unwrap();
    let b2 = ioc.request(&fx.b).unwrap();

    assert!(!Rc::ptr_eq(&a1, &a2));
    assert!(!Rc::ptr_eq(&b1, &b2));
    assert_eq!(b1, b2);
}

#[test]
fn falls_back_to_token_default() {
    let fx = Fixture::new();
    let ioc = Container::default();

    let b = ioc.request(&fx.b).unwrap();
    assert!(Rc::ptr_eq(&b, fx.b.default_value().unwrap()));
}

#[test]
fn fails_without_provider_or_default() {
    let fx = Fixture::new();
    let ioc = Container::default();

    let error = ioc.request(&fx.a).unwrap_err();
    assert!(matches!(&error, ContainerError::ProviderNotFound(name) if name == "ServiceA"));
    assert!(error.to_string().contains("Cannot find provider"));
}

#[test]
fn implementations_resolve_to_their_value() {
    let fx = Fixture::new();
    let direct = implementation(&fx.b, ServiceB { bar: "777".into() });
    let value = direct.value().clone();

    let ioc = container([provide::stateful(direct)]).unwrap();
    assert!(Rc::ptr_eq(&ioc.request(&fx.b).unwrap(), &value));
    assert!(Rc::ptr_eq(&ioc.request(&fx.b).unwrap(), &value));
}

#[test]
fn register_returns_a_new_container() {
    let fx = Fixture::new();
    let c1 = Container::default();
    let c2 = c1.register([provide::stateful(fx.a_impl())]).unwrap();

    assert!(!c1.ptr_eq(&c2));
    assert!(!c1.contains(&fx.a));
    assert!(c2.contains(&fx.a));
    assert!(c1.request(&fx.a).is_err());
    assert_eq!(c2.request(&fx.a).unwrap().foo(), 111);
}

#[test]
fn register_rejects_duplicates() {
    let fx = Fixture::new();
    let ioc = container([provide::stateful(fx.a_impl())]).unwrap();

    let error = ioc.register([provide::stateful(fx.a_impl())]).unwrap_err();
    assert!(matches!(&error, ContainerError::DuplicateRegistration(name) if name == "ServiceA"));
    assert!(error.to_string().contains("already registered"));
}

#[test]
fn construction_rejects_duplicates() {
    let fx = Fixture::new();
    let result = container([provide::stateful(fx.a_impl()), provide::stateless(fx.a_impl())]);

    assert!(matches!(result, Err(ContainerError::DuplicateRegistration(_))));
}

#[test]
fn override_replaces_existing_providers() {
    let fx = Fixture::new();
    let ioc = container([provide::stateful(fx.a_impl()), provide::stateful(fx.b_impl())]).unwrap();

    let overridden = ioc
        .override_with([provide::stateful(implementation(
            &fx.b,
            ServiceB { bar: "777".into() },
        ))])
        .unwrap();

    assert_eq!(overridden.request(&fx.b).unwrap().bar, "777");
    assert_eq!(ioc.request(&fx.b).unwrap().bar, "111.00");
}

#[test]
fn detects_circular_dependencies_on_construction() {
    let fx = Fixture::new();
    let ia = inject(Dependencies::new().add("a", &fx.a))
        .implements(&fx.b, |_| Ok(ServiceB { bar: "".into() }));
    let ib = inject(Dependencies::new().add("b", &fx.b))
        .implements(&fx.a, |_| Ok(ServiceA { value: 1 }));

    let error = container([provide::stateless(ia), provide::stateless(ib)]).unwrap_err();
    assert!(matches!(error, ContainerError::CircularDependency { .. }));
    assert!(error
        .to_string()
        .contains("[ServiceB] -> [ServiceA] -> [ServiceB]"));
}

#[test]
fn detects_circular_dependencies_on_register() {
    let ta = token::<u32>("A");
    let tb = token::<u32>("B");
    let ia = inject(Dependencies::new().add("b", &tb)).implements(&ta, |_| Ok(0));
    let ib = inject(Dependencies::new().add("a", &ta)).implements(&tb, |_| Ok(1));

    let ioc = container([provide::stateful(ia)]).unwrap();
    let error = ioc.register([provide::stateful(ib)]).unwrap_err();
    assert!(error.to_string().contains("[A] -> [B] -> [A]"));
}

#[test]
fn detects_circular_dependencies_on_override() {
    let ta = token::<u32>("A");
    let tb = token::<u32>("B");
    let ia = inject(Dependencies::new().add("b", &tb)).implements(&ta, |_| Ok(0));
    let ib = factory(&tb, || Ok(1));
    let ib_looping = inject(Dependencies::new().add("a", &ta)).implements(&tb, |_| Ok(2));

    let ioc = container([provide::stateful(ia), provide::stateful(ib)]).unwrap();
    let error = ioc.override_with([provide::stateful(ib_looping)]).unwrap_err();
    assert!(matches!(error, ContainerError::CircularDependency { .. }));
    assert!(error.to_string().contains("[A] -> [B] -> [A]"));

    assert_eq!(*ioc.request(&ta).unwrap(), 0);
}

#[test]
fn detects_circular_dependencies_on_fork() {
    let ta = token::<u32>("A");
    let tb = token::<u32>("B");
    let ia = inject(Dependencies::new().add("b", &tb)).implements(&ta, |_| Ok(0));
    let ib = inject(Dependencies::new().add("a", &ta)).implements(&tb, |_| Ok(1));

    let error = Container::default()
        .fork([provide::stateful(ia), provide::stateful(ib)])
        .unwrap_err();
    assert!(matches!(error, ContainerError::CircularDependency { .. }));
    assert!(error.to_string().contains("[A] -> [B] -> [A]"));
}

#[test]
fn cycles_across_parent_and_child_are_not_checked() {
    let ta = token::<u32>("a");
    let tb = token::<u32>("b");
    let ia = inject(Dependencies::new().add("ta", &ta)).implements(&tb, |_| Ok(0));
    let ib = inject(Dependencies::new().add("tb", &tb)).implements(&ta, |_| Ok(1));

    let father = container([provide::stateful(ia)]).unwrap();
    let child = father.fork([provide::stateful(ib)]).unwrap();

    // The parent can't build `b` without `a`, so the child falls through and finds no `b`
    let error = child.request(&ta).unwrap_err();
    assert!(matches!(error, ContainerError::ProviderNotFound(name) if name == "b"));
}

#[test]
fn fork_delegates_to_parent() {
    let fx = Fixture::new();
    let parent = container([provide::stateful(fx.a_impl())]).unwrap();
    let child = parent.fork([provide::stateful(fx.b_impl())]).unwrap();

    assert!(child.parent().unwrap().ptr_eq(&parent));
    assert_eq!(child.request(&fx.b).unwrap().bar, "111.00");

    // Parent owns the instance it built
    assert!(Rc::ptr_eq(
        &child.request(&fx.a).unwrap(),
        &parent.request(&fx.a).unwrap()
    ));
}

#[test]
fn fork_reports_the_requested_token_when_nobody_provides_it() {
    let fx = Fixture::new();
    let missing = token::<u32>("Missing");
    let parent = container([provide::stateful(fx.a_impl())]).unwrap();
    let child = parent.fork([]).unwrap();

    let error = child.request(&missing).unwrap_err();
    assert!(matches!(error, ContainerError::ProviderNotFound(name) if name == "Missing"));
}

#[test]
fn parent_failures_fall_through_by_default() {
    let config = token_with_default("Config", 1_u32);
    let broken = factory(&config, || Err("config file missing".into()));

    let parent = container([provide::stateful(broken)]).unwrap();
    let child = parent.fork([]).unwrap();

    assert!(matches!(
        parent.request(&config),
        Err(ContainerError::FactoryFailed { product, .. }) if product == "Config"
    ));
    assert_eq!(*child.request(&config).unwrap(), 1);
}

#[test]
fn parent_failures_propagate_when_configured() {
    let config = token_with_default("Config", 1_u32);
    let other = token::<u32>("Other");
    let broken = factory(&config, || Err("config file missing".into()));

    let options = ContainerOptions::new().parent_fallback(ParentFallback::NotFoundOnly);
    let parent = Container::with_options([provide::stateful(broken)], options).unwrap();
    let child = parent.fork([]).unwrap();

    assert_eq!(child.options().parent_fallback, ParentFallback::NotFoundOnly);
    assert!(matches!(
        child.request(&config),
        Err(ContainerError::FactoryFailed { .. })
    ));
    // A plain miss in the parent still falls through
    assert!(matches!(
        child.request(&other),
        Err(ContainerError::ProviderNotFound(name)) if name == "Other"
    ));
}

#[test]
fn missing_dependency_names_the_dependency() {
    let fx = Fixture::new();
    let ioc = container([provide::stateful(fx.b_impl())]).unwrap();

    // B itself is provided, its dependency A is not
    let error = ioc.request(&fx.b).unwrap_err();
    assert!(matches!(error, ContainerError::ProviderNotFound(name) if name == "ServiceA"));
}

#[test]
fn consume_runs_the_consumer_once() {
    let fx = Fixture::new();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let consumer = inject(Dependencies::new().add("serviceA", &fx.a)).consumer(move |ctx| {
        counter.set(counter.get() + 1);
        Ok(ctx.get::<ServiceA>("serviceA")?.foo())
    });

    let ioc = container([provide::stateful(fx.a_impl())]).unwrap();
    assert_eq!(ioc.consume(&consumer).unwrap(), 111);
    assert_eq!(calls.get(), 1);
}

#[test]
fn consumer_errors_are_reported() {
    let ioc = Container::default();
    let failing = consumer(Dependencies::new(), |_| -> Result<(), _> { Err("boom".into()) });

    let error = ioc.consume(&failing).unwrap_err();
    assert!(matches!(error, ContainerError::ConsumerFailed(_)));
    assert!(error.to_string().contains("boom"));
}

#[test]
fn dynamic_consumer_receives_the_container() {
    let ioc = Container::default();
    let expected = ioc.clone();

    let same = ioc
        .consume(&dynamic_consumer(move |resolving| Ok(resolving.ptr_eq(&expected))))
        .unwrap();
    assert!(same);
}

#[test]
fn implement_as_receives_the_resolving_container() {
    let fx = Fixture::new();
    let b_impl = fx.b.implement_as({
        let a = fx.a.clone();
        move |ioc| {
            Ok(ServiceB {
                bar: ioc.request(&a)?.foo().to_string(),
            })
        }
    });

    let parent = container([provide::stateful(fx.a_impl())]).unwrap();
    let child = parent.fork([provide::stateful(b_impl)]).unwrap();
    assert_eq!(child.request(&fx.b).unwrap().bar, "111");

    let handle = child.request(&container_token()).unwrap();
    assert!(handle.ptr_eq(&child));
}

#[test]
fn container_token_cannot_be_overridden() {
    let ioc = container([provide::stateful(factory(&container_token(), || {
        Ok(Container::default())
    }))])
    .unwrap();

    assert!(ioc.is_empty());
    assert!(ioc.request(&container_token()).unwrap().ptr_eq(&ioc));
}

#[test]
fn self_requests_at_runtime_are_detected() {
    let looping = token::<u32>("Looping");
    let looping_impl = looping.implement_as({
        let looping = looping.clone();
        move |ioc| Ok(*ioc.request(&looping)?)
    });

    let ioc = container([provide::stateful(looping_impl)]).unwrap();
    let error = ioc.request(&looping).unwrap_err();

    assert!(matches!(error, ContainerError::FactoryFailed { .. }));
    assert!(error.to_string().contains("[Looping] -> [Looping]"));

    // The guard is released again after the failure
    let error = ioc.request(&looping).unwrap_err();
    assert!(error.to_string().contains("[Looping] -> [Looping]"));
}

#[test]
fn debug_lists_registered_tokens() {
    let fx = Fixture::new();
    let ioc = container([provide::stateful(fx.a_impl())]).unwrap();
    assert!(format!("{ioc:?}").contains("ServiceA: \"lazy\""));

    ioc.request(&fx.a).unwrap();
    assert!(format!("{ioc:?}").contains("ServiceA: \"cached\""));
}
