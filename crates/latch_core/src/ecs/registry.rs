// registry.rs - GUID to factory table for component types
//
// The registry is built explicitly during startup and then shared read-only
// with every worker. Nothing registers itself as a load-time side effect.

use crate::ecs::{
    Component, ComponentFactory, ComponentTypeIdentifier, ComponentTypeKind, Guid,
    RegistrationError, TypedFactory,
};
use crate::storage::{IdentifierArray, IdentifierMask};
use std::any::TypeId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Maps component GUIDs to factories.
///
/// Each registered type also receives a dense [`ComponentTypeIdentifier`],
/// assigned in registration order, which indexes per-type storage.
pub struct ComponentRegistry {
    factories: IdentifierArray<Option<Box<dyn ComponentFactory>>, ComponentTypeKind>,
    guid_lookup: HashMap<Guid, ComponentTypeIdentifier>,
    type_lookup: HashMap<TypeId, ComponentTypeIdentifier>,
    registered: IdentifierMask<ComponentTypeKind>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            factories: IdentifierArray::new(),
            guid_lookup: HashMap::new(),
            type_lookup: HashMap::new(),
            registered: IdentifierMask::new(),
        }
    }

    /// Start a startup-time registration chain.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Register `T` under `T::TYPE_GUID`.
    ///
    /// Registering the same type twice returns the existing identifier.
    /// Registering a different type under a taken GUID fails and leaves the
    /// original mapping in place.
    pub fn register<T: Component>(&mut self) -> Result<ComponentTypeIdentifier, RegistrationError> {
        self.register_factory(Box::new(TypedFactory::<T>::new()))
    }

    /// Register a hand-written factory.
    pub fn register_factory(
        &mut self,
        factory: Box<dyn ComponentFactory>,
    ) -> Result<ComponentTypeIdentifier, RegistrationError> {
        let guid = factory.type_guid();
        let requested = factory.type_name();

        if !guid.is_valid() {
            tracing::error!(name = requested, "component type uses the nil GUID");
            return Err(RegistrationError::InvalidGuid { requested });
        }

        if let Some(existing_identifier) = self.find_identifier(&guid) {
            let existing = self.factory(existing_identifier);
            debug_assert!(existing.is_some(), "registered identifier without a factory");
            if existing.map(|f| f.component_type_id()) == Some(factory.component_type_id()) {
                return Ok(existing_identifier);
            }
            let existing = existing.map(|f| f.type_name()).unwrap_or("<unknown>");
            tracing::error!(%guid, existing, requested, "component GUID collision");
            return Err(RegistrationError::GuidCollision {
                guid,
                existing,
                requested,
                existing_identifier,
            });
        }

        let index = self.guid_lookup.len();
        if index >= ComponentTypeIdentifier::MAXIMUM_COUNT {
            tracing::error!(name = requested, "component type capacity exhausted");
            return Err(RegistrationError::CapacityExhausted {
                requested,
                capacity: ComponentTypeIdentifier::MAXIMUM_COUNT,
            });
        }

        let identifier = ComponentTypeIdentifier::make_from_valid_index(index);
        tracing::debug!(%guid, name = requested, %identifier, flags = ?factory.flags(), "registered component type");

        self.guid_lookup.insert(guid, identifier);
        // A Rust type keeps the identifier it was first registered under.
        let type_entry = self.type_lookup.entry(factory.component_type_id());
        if let Entry::Occupied(existing) = &type_entry {
            tracing::warn!(%guid, name = requested, existing = %existing.get(), "Rust type already registered under another GUID");
        }
        type_entry.or_insert(identifier);
        self.registered.set(identifier);
        self.factories[identifier] = Some(factory);
        Ok(identifier)
    }

    /// Look up the factory for `guid`. Unknown GUIDs return `None`; callers
    /// loading external data should skip the entry.
    pub fn find_factory(&self, guid: &Guid) -> Option<&dyn ComponentFactory> {
        let identifier = self.find_identifier(guid)?;
        self.factory(identifier)
    }

    pub fn find_identifier(&self, guid: &Guid) -> Option<ComponentTypeIdentifier> {
        self.guid_lookup.get(guid).copied()
    }

    pub fn factory(&self, identifier: ComponentTypeIdentifier) -> Option<&dyn ComponentFactory> {
        self.factories.get(identifier)?.as_deref()
    }

    /// Identifier of a registered Rust type.
    pub fn identifier_of<T: Component>(&self) -> Option<ComponentTypeIdentifier> {
        self.type_lookup.get(&TypeId::of::<T>()).copied()
    }

    pub fn contains(&self, guid: &Guid) -> bool {
        self.guid_lookup.contains_key(guid)
    }

    pub fn len(&self) -> usize {
        self.guid_lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guid_lookup.is_empty()
    }

    pub fn registered_types(&self) -> &IdentifierMask<ComponentTypeKind> {
        &self.registered
    }

    /// Iterate registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentTypeIdentifier, &dyn ComponentFactory)> {
        self.factories
            .iter_mask(&self.registered)
            .filter_map(|(identifier, factory)| Some((identifier, factory.as_deref()?)))
    }

    /// Types an editor may offer in its "add component" menu.
    pub fn user_instantiable_types(
        &self,
    ) -> impl Iterator<Item = (ComponentTypeIdentifier, &dyn ComponentFactory)> {
        self.iter()
            .filter(|(_, factory)| factory.is_user_interface_instantiable())
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(identifier, factory)| {
                (identifier, (factory.type_name(), factory.type_guid()))
            }))
            .finish()
    }
}

/// Collects registrations during startup and fails on the first error.
///
/// ```ignore
/// let registry = ComponentRegistry::builder()
///     .register::<Transform>()
///     .register::<Ammunition>()
///     .build()?;
/// ```
pub struct RegistryBuilder {
    registry: ComponentRegistry,
    error: Option<RegistrationError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: ComponentRegistry::new(),
            error: None,
        }
    }

    pub fn register<T: Component>(mut self) -> Self {
        if self.error.is_none() {
            if let Err(error) = self.registry.register::<T>() {
                self.error = Some(error);
            }
        }
        self
    }

    pub fn register_factory(mut self, factory: Box<dyn ComponentFactory>) -> Self {
        if self.error.is_none() {
            if let Err(error) = self.registry.register_factory(factory) {
                self.error = Some(error);
            }
        }
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> Result<ComponentRegistry, RegistrationError> {
        match self.error {
            Some(error) => Err(error),
            None => {
                tracing::info!(count = self.registry.len(), "component registry built");
                Ok(self.registry)
            }
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
