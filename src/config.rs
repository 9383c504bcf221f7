//! Declarative registration sources.
//!
//! The container never reads configuration on its own. A
//! [`RegistrationProvider`] hands it a list of already-resolved type
//! mappings, and [`Container::register_from`](crate::Container::register_from)
//! feeds each one to `register_type`.
//!
//! With the `config` feature, [`SectionRegistrationProvider`] reads a
//! registrations section from JSON or YAML and resolves type names through a
//! [`TypeCatalog`]:
//!
//! ```json
//! { "registrations": [ { "type": "app::SmtpMailer", "as": "app::Mailer", "name": "smtp" } ] }
//! ```

use std::collections::HashMap;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::descriptors::{Service, ServiceType};
use crate::{DiError, DiResult};

/// One registration ready to be applied: `implementation` registered as `service`.
#[derive(Debug, Clone)]
pub struct TypeMapping {
    pub service: ServiceType,
    pub implementation: ServiceType,
    pub name: Option<String>,
}

impl TypeMapping {
    pub fn new(implementation: ServiceType, service: ServiceType, name: Option<&str>) -> Self {
        Self {
            service,
            implementation,
            name: name.map(str::to_string),
        }
    }
}

/// Source of registrations applied by [`Container::register_from`](crate::Container::register_from).
pub trait RegistrationProvider {
    /// Returns the mappings to register, in order.
    fn registrations(&self) -> DiResult<Vec<TypeMapping>>;
}

impl RegistrationProvider for Vec<TypeMapping> {
    fn registrations(&self) -> DiResult<Vec<TypeMapping>> {
        Ok(self.clone())
    }
}

/// Resolves configured type names to descriptors.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, ServiceType>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `S` known under `name`.
    pub fn with<S: Service + ?Sized>(mut self, name: &str) -> Self {
        self.insert(name, S::service_type());
        self
    }

    pub fn insert(&mut self, name: &str, service_type: ServiceType) {
        self.types.insert(name.to_string(), service_type);
    }

    pub fn lookup(&self, name: &str) -> DiResult<ServiceType> {
        self.types
            .get(name.trim())
            .cloned()
            .ok_or_else(|| DiError::UnknownType(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A single configured registration, by type name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct RegistrationEntry {
    /// Implementation type name.
    #[cfg_attr(feature = "config", serde(rename = "type"))]
    pub implementation: String,
    /// Service type name.
    #[cfg_attr(feature = "config", serde(rename = "as"))]
    pub service: String,
    /// Registration name; an empty name means unnamed.
    #[cfg_attr(feature = "config", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
}

impl RegistrationEntry {
    pub fn new(implementation: impl Into<String>, service: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            implementation: implementation.into(),
            service: service.into(),
            name: name.map(str::to_string),
        }
    }
}

/// The `registrations` section of a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct RegistrationSection {
    #[cfg_attr(feature = "config", serde(default))]
    pub registrations: Vec<RegistrationEntry>,
}

/// Provider backed by a registrations section and a type catalog.
#[derive(Debug, Clone)]
pub struct SectionRegistrationProvider {
    section: RegistrationSection,
    catalog: TypeCatalog,
}

impl SectionRegistrationProvider {
    pub fn new(section: RegistrationSection, catalog: TypeCatalog) -> Self {
        Self { section, catalog }
    }

    #[cfg(feature = "config")]
    pub fn from_json(text: &str, catalog: TypeCatalog) -> DiResult<Self> {
        let section: RegistrationSection =
            serde_json::from_str(text).map_err(|err| DiError::Configuration(err.to_string()))?;
        Ok(Self::new(section, catalog))
    }

    #[cfg(feature = "config")]
    pub fn from_yaml(text: &str, catalog: TypeCatalog) -> DiResult<Self> {
        let section: RegistrationSection =
            serde_yaml::from_str(text).map_err(|err| DiError::Configuration(err.to_string()))?;
        Ok(Self::new(section, catalog))
    }

    /// Reads a section from a `.json`, `.yaml` or `.yml` file.
    #[cfg(feature = "config")]
    pub fn from_file(path: impl AsRef<std::path::Path>, catalog: TypeCatalog) -> DiResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| DiError::Configuration(format!("{}: {err}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&text, catalog),
            _ => Self::from_json(&text, catalog),
        }
    }

    pub fn section(&self) -> &RegistrationSection {
        &self.section
    }
}

impl RegistrationProvider for SectionRegistrationProvider {
    fn registrations(&self) -> DiResult<Vec<TypeMapping>> {
        self.section
            .registrations
            .iter()
            .map(|entry| {
                let name = entry.name.as_deref().filter(|name| !name.is_empty());
                Ok(TypeMapping::new(
                    self.catalog.lookup(&entry.implementation)?,
                    self.catalog.lookup(&entry.service)?,
                    name,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentBuilder};

    struct Mailer;

    impl Component for Mailer {
        fn describe(_: &mut ComponentBuilder<Self>) {}
    }

    #[test]
    fn catalog_reports_unknown_names() {
        let catalog = TypeCatalog::new().with::<Mailer>("Mailer");
        assert_eq!(catalog.len(), 1);
        assert!(catalog.lookup("Mailer").is_ok());
        assert_eq!(catalog.lookup("Missing").unwrap_err(), DiError::UnknownType("Missing".into()));
    }

    #[test]
    fn empty_names_are_unnamed() {
        let section = RegistrationSection {
            registrations: vec![
                RegistrationEntry::new("Mailer", "Mailer", Some("")),
                RegistrationEntry::new("Mailer", "Mailer", Some("smtp")),
            ],
        };
        let provider = SectionRegistrationProvider::new(section, TypeCatalog::new().with::<Mailer>("Mailer"));

        let mappings = provider.registrations().unwrap();
        assert_eq!(mappings[0].name, None);
        assert_eq!(mappings[1].name.as_deref(), Some("smtp"));
    }
}
