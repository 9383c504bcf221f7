//! Per-container instance caches.

use std::collections::HashSet;
use std::sync::Arc;

use crate::descriptors::Instance;
use crate::key::{KeyMap, ServiceKey};

/// Disposal hook for a pooled instance.
pub(crate) type Disposer = Arc<dyn Fn(&Instance) + Send + Sync>;

struct CachedInstance {
    instance: Instance,
    disposer: Option<Disposer>,
    sequence: u64,
}

/// Instances keyed by [`ServiceKey`].
///
/// A container keeps two of these: the resolved-object cache, whose entries
/// are never disposed, and the object pool, which owns what it constructs.
#[derive(Default)]
pub(crate) struct InstanceCache {
    entries: KeyMap<CachedInstance>,
    // Disposables that lost their slot to an earlier entry.
    retained: Vec<CachedInstance>,
    next_sequence: u64,
}

impl InstanceCache {
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<Instance> {
        self.entries.get(key).map(|entry| entry.instance.clone())
    }

    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Stores `instance` unless the key is already present; returns the stored instance.
    pub(crate) fn get_or_insert(&mut self, key: ServiceKey, instance: Instance, disposer: Option<Disposer>) -> Instance {
        if let Some(existing) = self.entries.get(&key) {
            return existing.instance.clone();
        }
        self.insert(key, instance.clone(), disposer);
        instance
    }

    /// Stores `instance`, replacing any previous entry for the key.
    pub(crate) fn insert(&mut self, key: ServiceKey, instance: Instance, disposer: Option<Disposer>) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.remove(&key);
        self.entries.insert(
            key,
            CachedInstance {
                instance,
                disposer,
                sequence,
            },
        );
    }

    /// Stores `instance` unless the key is taken; returns whether it was stored.
    ///
    /// An existing entry is never evicted. A disposable instance that finds
    /// its slot taken is kept aside and still disposed with the cache.
    pub(crate) fn insert_or_retain(&mut self, key: ServiceKey, instance: Instance, disposer: Option<Disposer>) -> bool {
        if !self.entries.contains_key(&key) {
            self.insert(key, instance, disposer);
            return true;
        }
        if disposer.is_some() {
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            self.retained.push(CachedInstance {
                instance,
                disposer,
                sequence,
            });
        }
        false
    }

    pub(crate) fn has_disposables(&self) -> bool {
        !self.retained.is_empty() || self.entries.values().any(|entry| entry.disposer.is_some())
    }

    /// Consumes the cache and returns each disposable instance once, newest first.
    ///
    /// The same object pooled under several keys is reported a single time.
    pub(crate) fn into_disposables(self) -> Vec<(Instance, Disposer)> {
        let mut entries: Vec<CachedInstance> = self
            .entries
            .into_values()
            .chain(self.retained)
            .filter(|entry| entry.disposer.is_some())
            .collect();
        entries.sort_by(|a, b| b.sequence.cmp(&a.sequence));

        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter_map(|entry| {
                let address = Arc::as_ptr(&entry.instance) as *const () as usize;
                if !seen.insert(address) {
                    return None;
                }
                entry.disposer.map(|disposer| (entry.instance, disposer))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Marker;

    impl Component for Marker {
        fn describe(_: &mut ComponentBuilder<Self>) {}
    }

    fn counting_disposer(counter: Arc<AtomicUsize>) -> Disposer {
        Arc::new(move |_: &Instance| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn get_or_insert_keeps_first_instance() {
        let mut cache = InstanceCache::default();
        let first: Instance = Arc::new(Marker);
        let second: Instance = Arc::new(Marker);

        let stored = cache.get_or_insert(ServiceKey::of::<Marker>(), first.clone(), None);
        let again = cache.get_or_insert(ServiceKey::of::<Marker>(), second, None);

        assert!(Arc::ptr_eq(&stored, &first));
        assert!(Arc::ptr_eq(&again, &first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn shared_instance_is_disposed_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut cache = InstanceCache::default();
        let shared: Instance = Arc::new(Marker);

        cache.insert(ServiceKey::of::<Marker>(), shared.clone(), Some(counting_disposer(counter.clone())));
        cache.insert(ServiceKey::named::<Marker>("alias"), shared, Some(counting_disposer(counter.clone())));
        cache.insert(ServiceKey::named::<Marker>("plain"), Arc::new(Marker), None);

        for (instance, disposer) in cache.into_disposables() {
            disposer(&instance);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn taken_slot_keeps_first_and_retains_disposable() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut cache = InstanceCache::default();
        let first: Instance = Arc::new(Marker);
        let late: Instance = Arc::new(Marker);

        assert!(cache.insert_or_retain(ServiceKey::of::<Marker>(), first.clone(), Some(counting_disposer(counter.clone()))));
        assert!(!cache.insert_or_retain(ServiceKey::of::<Marker>(), late, Some(counting_disposer(counter.clone()))));
        assert!(!cache.insert_or_retain(ServiceKey::of::<Marker>(), Arc::new(Marker), None));

        assert!(Arc::ptr_eq(&cache.get(&ServiceKey::of::<Marker>()).unwrap(), &first));
        assert_eq!(cache.len(), 1);

        let disposables = cache.into_disposables();
        assert_eq!(disposables.len(), 2);
        for (instance, disposer) in disposables {
            disposer(&instance);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
