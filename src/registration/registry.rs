use std::rc::Rc;

use super::{NamedInstanceDictionaryRegistration, Registration};
use crate::descriptors::ServiceType;
use crate::key::{KeyMap, ServiceKey};

// Linear scans beat hashing for small registries.
const SMALL_THRESHOLD: usize = 16;

/// Registrations of one container, in registration order.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Rc<dyn Registration>>,
    index: Option<KeyMap<usize>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a registration, replacing any registration with an equal key.
    ///
    /// A named registration also gets the text-keyed dictionary registration
    /// for its service type, unless one is already present.
    pub(crate) fn add(&mut self, registration: Rc<dyn Registration>) {
        let dictionary = if registration.key().is_named() {
            registration.key().service_type().named_instances_type()
        } else {
            None
        };

        match self.remove(registration.key()) {
            Some((position, _)) => {
                self.entries.insert(position, registration);
                self.reindex();
            }
            None => {
                self.entries.push(registration);
                self.index_last();
            }
        }

        if let Some(dictionary) = dictionary {
            let key = ServiceKey::unnamed(dictionary);
            self.add_if_absent(Rc::new(NamedInstanceDictionaryRegistration::new(key)));
        }
    }

    /// Adds a registration unless one with an equal key exists; returns whether it was added.
    pub(crate) fn add_if_absent(&mut self, registration: Rc<dyn Registration>) -> bool {
        if self.contains(registration.key()) {
            return false;
        }
        self.add(registration);
        true
    }

    /// Removes the registration with an equal key, returning it with its former position.
    pub(crate) fn remove(&mut self, key: &ServiceKey) -> Option<(usize, Rc<dyn Registration>)> {
        let position = self.position(key)?;
        let removed = self.entries.remove(position);
        self.reindex();
        Some((position, removed))
    }

    pub(crate) fn get(&self, key: &ServiceKey) -> Option<Rc<dyn Registration>> {
        self.position(key).map(|position| self.entries[position].clone())
    }

    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.position(key).is_some()
    }

    pub(crate) fn all(&self) -> impl Iterator<Item = &Rc<dyn Registration>> {
        self.entries.iter()
    }

    /// Registrations whose key type is exactly `service_type`, in registration order.
    pub(crate) fn all_of(&self, service_type: &ServiceType) -> Vec<Rc<dyn Registration>> {
        self.entries
            .iter()
            .filter(|registration| registration.key().service_type() == service_type)
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }

    fn position(&self, key: &ServiceKey) -> Option<usize> {
        match &self.index {
            Some(index) => index.get(key).copied(),
            None => self.entries.iter().position(|registration| registration.key() == key),
        }
    }

    fn index_last(&mut self) {
        let position = self.entries.len() - 1;
        if let Some(index) = self.index.as_mut() {
            index.insert(self.entries[position].key().clone(), position);
        } else if self.entries.len() > SMALL_THRESHOLD {
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        if self.entries.len() <= SMALL_THRESHOLD {
            self.index = None;
            return;
        }
        let mut index = KeyMap::default();
        for (position, registration) in self.entries.iter().enumerate() {
            index.insert(registration.key().clone(), position);
        }
        self.index = Some(index);
    }
}
