//! Property-based tests for service resolution
//!
//! Singleton identity, transient freshness and positional injection must
//! hold whatever names, values and graph shapes are registered.

use proptest::prelude::*;
use roster_di::{Container, DiError, Resolver};
use std::sync::Arc;

fn service_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,15}"
}

// Property: a singleton resolves to the same instance no matter what is resolved in between
proptest! {
    #[test]
    fn singleton_identity(name in service_name(), value in any::<u64>(), noise in 0usize..20) {
        prop_assume!(name != "noise");
        let container = Container::new();
        container.add_singleton(name.clone(), &[], move |_| Ok(value)).unwrap();
        container.add_transient("noise", &[], |_| Ok(())).unwrap();

        let first = container.get::<u64>(&name).unwrap();
        for _ in 0..noise {
            container.resolve("noise").unwrap();
        }
        let second = container.get::<u64>(&name).unwrap();

        prop_assert_eq!(*first, value);
        prop_assert!(Arc::ptr_eq(&first, &second));
    }
}

// Property: transient constructors always produce distinct instances, even for equal values
proptest! {
    #[test]
    fn transient_freshness(value in any::<u32>(), resolutions in 2usize..10) {
        let container = Container::new();
        container.add_value("seed", value).unwrap();
        container.add_transient("copy", &["seed"], |deps| Ok(*deps.get::<u32>(0)?)).unwrap();

        let instances: Vec<Arc<u32>> =
            (0..resolutions).map(|_| container.get::<u32>("copy").unwrap()).collect();
        for i in 0..instances.len() {
            prop_assert_eq!(*instances[i], value);
            for j in (i + 1)..instances.len() {
                prop_assert!(!Arc::ptr_eq(&instances[i], &instances[j]));
            }
        }
    }
}

// Property: dependencies arrive positionally in declaration order
proptest! {
    #[test]
    fn injection_order(order in Just((0..8usize).collect::<Vec<_>>()).prop_shuffle()) {
        let container = Container::new();
        for i in 0..8usize {
            container.add_value(format!("dep{}", i), i).unwrap();
        }
        let names: Vec<String> = order.iter().map(|i| format!("dep{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        container
            .add_transient("consumer", &refs, |deps| {
                (0..deps.len()).map(|i| deps.get::<usize>(i).map(|v| *v)).collect::<Result<Vec<_>, _>>()
            })
            .unwrap();

        let received = container.get::<Vec<usize>>("consumer").unwrap();
        prop_assert_eq!(&*received, &order);
    }
}

// Property: a linear chain of singletons constructs every link exactly once
proptest! {
    #[test]
    fn dependency_chain_resolution(chain_length in 1usize..32) {
        let container = Container::new();
        container.add_value("link0", 0usize).unwrap();
        for i in 1..chain_length {
            let previous = format!("link{}", i - 1);
            container
                .add_singleton(format!("link{}", i), &[previous.as_str()], |deps| Ok(*deps.get::<usize>(0)? + 1))
                .unwrap();
        }

        let last = format!("link{}", chain_length - 1);
        prop_assert_eq!(*container.get::<usize>(&last).unwrap(), chain_length - 1);
        prop_assert_eq!(container.cached_count(), chain_length);
    }
}

// Property: unregistered names always fail and never populate the cache
proptest! {
    #[test]
    fn missing_service_never_resolves(name in service_name()) {
        let container = Container::new();
        container.add_value("present", ()).unwrap();
        prop_assume!(name != "present");

        prop_assert_eq!(container.resolve(&name).unwrap_err(), DiError::NotRegistered(name.clone()));
        prop_assert!(!container.has(&name));
        prop_assert_eq!(container.cached_count(), 0);
    }
}

// Property: after clear nothing previously registered is reachable
proptest! {
    #[test]
    fn reset_completeness(names in prop::collection::hash_set(service_name(), 1..10)) {
        let container = Container::new();
        for name in &names {
            container.add_value(name.clone(), ()).unwrap();
            container.resolve(name).unwrap();
        }
        container.clear();

        for name in &names {
            prop_assert!(!container.has(name));
            prop_assert_eq!(container.resolve(name).unwrap_err(), DiError::NotRegistered(name.clone()));
        }
    }
}
