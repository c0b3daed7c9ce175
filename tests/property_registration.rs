/// Property-based tests for provider registration
///
/// These tests use proptest to generate random inputs and verify invariants
/// that should hold for all valid registrations.
use ferrous_ioc::{
    factory, module, modules, scoped, single, Container, ContainerOptions, DiError, Module, OverrideStrategy,
    ProviderModule, Resolver,
};
use proptest::prelude::*;
use std::sync::Arc;

// Test data structures
#[derive(Debug, Clone)]
struct TestService {
    id: u32,
    name: String,
}

#[derive(Debug, Clone)]
struct ConfigService {
    value: i32,
}

fn last_wins() -> ContainerOptions {
    ContainerOptions::new()
        .allow_override(true)
        .override_strategy(OverrideStrategy::LastWins)
}

// Property: under lastWins, any sequence of registrations for one key resolves to the last one
proptest! {
    #[test]
    fn last_registration_wins(ids in prop::collection::vec(0u32..1000, 1..10)) {
        let container = Container::with_options(last_wins());

        // Spread the registrations over separate loads
        for id in &ids {
            container
                .load(module![single::<TestService>().value(TestService {
                    id: *id,
                    name: format!("service_{}", id),
                })])
                .unwrap();
        }

        let resolved = container.get_required::<TestService>();
        prop_assert_eq!(resolved.id, *ids.last().unwrap());
        prop_assert_eq!(&resolved.name, &format!("service_{}", ids.last().unwrap()));
        prop_assert_eq!(container.keys().len(), 1);
    }
}

// Property: without lastWins, every registration after the first is rejected
proptest! {
    #[test]
    fn duplicates_rejected_by_default(ids in prop::collection::vec(0u32..1000, 2..10), allow in any::<bool>()) {
        let container = Container::with_options(ContainerOptions::new().allow_override(allow));
        let module: Module = ids
            .iter()
            .map(|id| single::<TestService>().value(TestService { id: *id, name: String::new() }))
            .collect();

        let is_conflict = matches!(container.load(module), Err(DiError::OverrideConflict(_)));
        prop_assert!(is_conflict);
        prop_assert!(container.keys().is_empty());
    }
}

proptest! {
    #[test]
    fn single_factory_deterministic(seed in 0u32..1000) {
        let container = Container::new();
        container
            .load(module![single::<TestService>().factory(move |_| {
                Ok(TestService {
                    id: seed,
                    name: format!("factory_{}", seed),
                })
            })])
            .unwrap();

        // Multiple resolutions should return the same instance
        let service1 = container.get_required::<TestService>();
        let service2 = container.get_required::<TestService>();

        prop_assert!(Arc::ptr_eq(&service1, &service2));
        prop_assert_eq!(service1.id, seed);
    }
}

proptest! {
    #[test]
    fn scoped_isolated_across_scopes(value in 1i32..1000, scope_count in 2usize..6) {
        let container = Container::new();
        container
            .load(module![scoped::<ConfigService>().factory(move |_| Ok(ConfigService { value }))])
            .unwrap();

        let scopes: Vec<_> = (0..scope_count).map(|_| container.begin_scope()).collect();
        let instances: Vec<_> = scopes.iter().map(|s| s.get_required::<ConfigService>()).collect();

        for (scope, instance) in scopes.iter().zip(&instances) {
            // Same instance within scope
            prop_assert!(Arc::ptr_eq(instance, &scope.get_required::<ConfigService>()));
            prop_assert_eq!(instance.value, value);
        }
        // Different instances across scopes
        for i in 0..instances.len() {
            for j in (i + 1)..instances.len() {
                prop_assert!(!Arc::ptr_eq(&instances[i], &instances[j]));
            }
        }
    }
}

proptest! {
    #[test]
    fn factory_kind_always_new(count in 1usize..20) {
        let container = Container::new();
        container
            .load(module![factory::<TestService>().factory(|_| {
                use std::sync::atomic::{AtomicU32, Ordering};
                static COUNTER: AtomicU32 = AtomicU32::new(0);
                let id = COUNTER.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(TestService {
                    id,
                    name: format!("factory_{}", id),
                })
            })])
            .unwrap();

        let instances: Vec<_> = (0..count).map(|_| container.get_required::<TestService>()).collect();

        for i in 0..instances.len() {
            for j in (i + 1)..instances.len() {
                prop_assert!(!Arc::ptr_eq(&instances[i], &instances[j]));
                prop_assert_ne!(instances[i].id, instances[j].id);
            }
        }
        prop_assert_eq!(container.disposal_len(), 0);
    }
}

// Property: independent modules resolve the same regardless of merge order
proptest! {
    #[test]
    fn module_order_independence(service_id in 1u32..100, config_value in 1i32..100) {
        struct ServiceUnit {
            id: u32,
        }

        impl ProviderModule for ServiceUnit {
            fn register(self, module: &mut Module) {
                module.add(single::<TestService>().value(TestService {
                    id: self.id,
                    name: format!("unit_{}", self.id),
                }));
            }
        }

        struct ConfigUnit {
            value: i32,
        }

        impl ProviderModule for ConfigUnit {
            fn register(self, module: &mut Module) {
                module.add(single::<ConfigService>().value(ConfigService { value: self.value }));
            }
        }

        let forward = Container::new();
        forward
            .load(modules([
                Module::new().add_module(ServiceUnit { id: service_id }),
                Module::new().add_module(ConfigUnit { value: config_value }),
            ]))
            .unwrap();

        let backward = Container::new();
        backward
            .load(modules([
                Module::new().add_module(ConfigUnit { value: config_value }),
                Module::new().add_module(ServiceUnit { id: service_id }),
            ]))
            .unwrap();

        let test1 = forward.get_required::<TestService>();
        let test2 = backward.get_required::<TestService>();
        prop_assert_eq!(test1.id, test2.id);
        prop_assert_eq!(&test1.name, &test2.name);
        prop_assert_eq!(
            forward.get_required::<ConfigService>().value,
            backward.get_required::<ConfigService>().value
        );
    }
}

// Property: named registrations never collide with each other or with the unqualified key
proptest! {
    #[test]
    fn qualified_keys_are_independent(names in prop::collection::hash_set("[a-z]{1,8}", 1..8)) {
        let container = Container::new();
        let mut module = module![single::<String>().value("default".to_string())];
        for name in &names {
            module.add(single::<String>().named(name.clone()).value(name.clone()));
        }
        container.load(module).unwrap();

        prop_assert_eq!(container.keys().len(), names.len() + 1);
        let default_value = container.get_required::<String>();
        prop_assert_eq!(default_value.as_str(), "default");
        for name in &names {
            let named_value = container.get_named::<String>(name.clone()).unwrap();
            prop_assert_eq!(named_value.as_str(), name.as_str());
        }
    }
}
