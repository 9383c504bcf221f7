//! Property-based tests for registration and resolution invariants.

use bodi::{Component, ComponentBuilder, Container};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug)]
struct Counter(u32);

impl Component for Counter {
    fn describe(_: &mut ComponentBuilder<Self>) {}
}

proptest! {
    #[test]
    fn last_registration_wins(ids in prop::collection::vec(0u32..1000, 1..10)) {
        let container = Container::new();
        for id in &ids {
            container.register_instance(Arc::new(Counter(*id))).unwrap();
        }

        let resolved = container.resolve::<Counter>().unwrap();
        prop_assert_eq!(resolved.0, *ids.last().unwrap());
    }

    #[test]
    fn names_ignore_case(name in "[a-zA-Z]{1,12}", id in any::<u32>()) {
        let container = Container::new();
        container
            .register_instance_as::<Counter, Counter>(Arc::new(Counter(id)), Some(name.as_str()), false)
            .unwrap();

        let upper = container.resolve_named::<Counter>(&name.to_uppercase()).unwrap();
        let lower = container.resolve_named::<Counter>(&name.to_lowercase()).unwrap();

        prop_assert!(Arc::ptr_eq(&upper, &lower));
        prop_assert_eq!(upper.0, id);
        prop_assert!(container.is_registered::<Counter>(Some(name.to_uppercase().as_str())).unwrap());
    }

    #[test]
    fn repeated_resolution_is_stable(repeats in 1usize..20) {
        let container = Container::new();
        container.register_instance(Arc::new(Counter(1))).unwrap();

        let first = container.resolve::<Counter>().unwrap();
        for _ in 0..repeats {
            prop_assert!(Arc::ptr_eq(&first, &container.resolve::<Counter>().unwrap()));
        }
    }

    #[test]
    fn every_name_is_collected(names in prop::collection::hash_set("[a-z]{1,8}", 1..10)) {
        let container = Container::new();
        for (id, name) in names.iter().enumerate() {
            container
                .register_instance_as::<Counter, Counter>(Arc::new(Counter(id as u32)), Some(name.as_str()), false)
                .unwrap();
        }

        let all = container.resolve_all::<Counter>().unwrap();
        prop_assert_eq!(all.len(), names.len());
    }

    #[test]
    fn deep_children_share_root_instances(depth in 1usize..8) {
        let root = Container::new();
        root.register_instance(Arc::new(Counter(42))).unwrap();
        let expected = root.resolve::<Counter>().unwrap();

        let mut current = root.create_child();
        for _ in 1..depth {
            current = current.create_child();
        }

        let resolved = current.resolve::<Counter>().unwrap();
        prop_assert!(Arc::ptr_eq(&expected, &resolved));
    }
}
