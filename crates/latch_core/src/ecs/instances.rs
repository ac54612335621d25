// instances.rs - Per-type component instance storage
//
// Instances live in identifier-indexed arrays; occupancy and stale-handle
// detection come from SaltedIdentifierStorage. Payloads are boxed so a slot
// that was never used costs one null pointer.

use crate::ecs::{
    BoxedComponent, Component, ComponentIdentifier, ComponentInstanceKind, ComponentRegistry,
    ComponentTypeIdentifier, ComponentTypeKind, FactoryError, Guid, InstanceHandle, Reader,
};
use crate::storage::{IdentifierArray, SaltedIdentifierStorage};
use std::any::Any;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("all {capacity} instance slots for '{type_name}' are in use")]
    Exhausted {
        type_name: &'static str,
        capacity: usize,
    },

    #[error("component type {guid} is not registered")]
    UnknownGuid { guid: Guid },

    #[error("component type {identifier} is not registered")]
    UnknownType { identifier: ComponentTypeIdentifier },

    #[error("instance {handle:?} does not exist")]
    StaleHandle { handle: InstanceHandle },

    #[error(transparent)]
    Factory(#[from] FactoryError),
}

/// Statically typed storage for one component type.
pub struct ComponentStorage<T: Component> {
    identifiers: SaltedIdentifierStorage<ComponentInstanceKind>,
    instances: IdentifierArray<Option<Box<T>>, ComponentInstanceKind>,
}

impl<T: Component> ComponentStorage<T> {
    pub fn new() -> Self {
        Self {
            identifiers: SaltedIdentifierStorage::new(),
            instances: IdentifierArray::zeroed(),
        }
    }

    pub fn insert(&mut self, component: T) -> Result<ComponentIdentifier, StorageError> {
        let identifier = self.identifiers.acquire().ok_or(StorageError::Exhausted {
            type_name: T::NAME,
            capacity: ComponentIdentifier::MAXIMUM_COUNT,
        })?;
        self.instances[identifier] = Some(Box::new(component));
        Ok(identifier)
    }

    /// Remove and return the instance. Stale or unknown identifiers return `None`.
    pub fn remove(&mut self, identifier: ComponentIdentifier) -> Option<T> {
        if !self.identifiers.release(identifier) {
            return None;
        }
        self.instances[identifier].take().map(|boxed| *boxed)
    }

    pub fn contains(&self, identifier: ComponentIdentifier) -> bool {
        self.identifiers.is_current(identifier)
    }

    pub fn get(&self, identifier: ComponentIdentifier) -> Option<&T> {
        if !self.identifiers.is_current(identifier) {
            return None;
        }
        self.instances[identifier].as_deref()
    }

    pub fn get_mut(&mut self, identifier: ComponentIdentifier) -> Option<&mut T> {
        if !self.identifiers.is_current(identifier) {
            return None;
        }
        self.instances[identifier].as_deref_mut()
    }

    /// Insert a copy of an existing instance.
    pub fn clone_instance(
        &mut self,
        identifier: ComponentIdentifier,
    ) -> Result<Option<ComponentIdentifier>, StorageError> {
        let Some(template) = self.get(identifier) else {
            return Ok(None);
        };
        let copy = template
            .clone_component()
            .ok_or(FactoryError::NotCloneable { type_name: T::NAME })?;
        self.insert(copy).map(Some)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Iterate live instances in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentIdentifier, &T)> {
        self.identifiers
            .valid_element_view(self.instances.as_slice())
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let identifier = self.identifiers.current_identifier(index)?;
                Some((identifier, slot.as_deref()?))
            })
    }
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased instances of one registered type.
struct InstanceSlots {
    identifiers: SaltedIdentifierStorage<ComponentInstanceKind>,
    instances: IdentifierArray<Option<BoxedComponent>, ComponentInstanceKind>,
}

impl InstanceSlots {
    fn new() -> Self {
        Self {
            identifiers: SaltedIdentifierStorage::new(),
            instances: IdentifierArray::new(),
        }
    }
}

/// Storage for instances created through registry factories, keyed by type
/// identifier. Type slots are allocated the first time a type is used.
pub struct DynamicComponentStorage {
    types: IdentifierArray<Option<Box<InstanceSlots>>, ComponentTypeKind>,
}

impl DynamicComponentStorage {
    pub fn new() -> Self {
        Self {
            types: IdentifierArray::zeroed(),
        }
    }

    fn slots_mut(&mut self, component_type: ComponentTypeIdentifier) -> &mut InstanceSlots {
        self.types[component_type].get_or_insert_with(|| Box::new(InstanceSlots::new()))
    }

    fn slots(&self, component_type: ComponentTypeIdentifier) -> Option<&InstanceSlots> {
        self.types.get(component_type)?.as_deref()
    }

    /// Store an already constructed instance of `component_type`.
    pub fn insert_boxed(
        &mut self,
        registry: &ComponentRegistry,
        component_type: ComponentTypeIdentifier,
        instance: BoxedComponent,
    ) -> Result<InstanceHandle, StorageError> {
        let factory = registry
            .factory(component_type)
            .ok_or(StorageError::UnknownType {
                identifier: component_type,
            })?;
        if (*instance).type_id() != factory.component_type_id() {
            return Err(FactoryError::TypeMismatch {
                type_name: factory.type_name(),
            }
            .into());
        }
        let slots = self.slots_mut(component_type);
        let identifier = slots.identifiers.acquire().ok_or(StorageError::Exhausted {
            type_name: factory.type_name(),
            capacity: ComponentIdentifier::MAXIMUM_COUNT,
        })?;
        slots.instances[identifier] = Some(instance);
        Ok(InstanceHandle {
            component_type,
            instance: identifier,
        })
    }

    /// Construct a default instance of the type registered under `guid`.
    pub fn instantiate(
        &mut self,
        registry: &ComponentRegistry,
        guid: &Guid,
    ) -> Result<InstanceHandle, StorageError> {
        let component_type = registry
            .find_identifier(guid)
            .ok_or(StorageError::UnknownGuid { guid: *guid })?;
        let factory = registry
            .factory(component_type)
            .ok_or(StorageError::UnknownGuid { guid: *guid })?;
        let instance = factory.create_default()?;
        self.insert_boxed(registry, component_type, instance)
    }

    /// Construct an instance of `component_type` from a document object.
    pub fn deserialize(
        &mut self,
        registry: &ComponentRegistry,
        component_type: ComponentTypeIdentifier,
        reader: &Reader<'_>,
    ) -> Result<InstanceHandle, StorageError> {
        let factory = registry
            .factory(component_type)
            .ok_or(StorageError::UnknownType {
                identifier: component_type,
            })?;
        let instance = factory.deserialize(reader)?;
        self.insert_boxed(registry, component_type, instance)
    }

    /// Insert a copy of an existing instance.
    pub fn clone_instance(
        &mut self,
        registry: &ComponentRegistry,
        handle: InstanceHandle,
    ) -> Result<InstanceHandle, StorageError> {
        let factory = registry
            .factory(handle.component_type)
            .ok_or(StorageError::UnknownType {
                identifier: handle.component_type,
            })?;
        let template = self
            .get_dyn(handle)
            .ok_or(StorageError::StaleHandle { handle })?;
        let copy = factory.clone_from_template(template)?;
        self.insert_boxed(registry, handle.component_type, copy)
    }

    pub fn contains(&self, handle: InstanceHandle) -> bool {
        self.slots(handle.component_type)
            .is_some_and(|slots| slots.identifiers.is_current(handle.instance))
    }

    pub fn get_dyn(&self, handle: InstanceHandle) -> Option<&(dyn Any + Send + Sync)> {
        let slots = self.slots(handle.component_type)?;
        if !slots.identifiers.is_current(handle.instance) {
            return None;
        }
        slots.instances[handle.instance].as_deref()
    }

    pub fn get<T: Component>(&self, handle: InstanceHandle) -> Option<&T> {
        self.get_dyn(handle)?.downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, handle: InstanceHandle) -> Option<&mut T> {
        let slots = self.types.get_mut(handle.component_type)?.as_deref_mut()?;
        if !slots.identifiers.is_current(handle.instance) {
            return None;
        }
        slots.instances[handle.instance]
            .as_deref_mut()?
            .downcast_mut::<T>()
    }

    pub fn remove(&mut self, handle: InstanceHandle) -> Option<BoxedComponent> {
        let slots = self.types.get_mut(handle.component_type)?.as_deref_mut()?;
        if !slots.identifiers.release(handle.instance) {
            return None;
        }
        slots.instances[handle.instance].take()
    }

    /// Live instances of one type, in slot order.
    pub fn live_instances(
        &self,
        component_type: ComponentTypeIdentifier,
    ) -> impl Iterator<Item = (InstanceHandle, &(dyn Any + Send + Sync))> {
        self.slots(component_type).into_iter().flat_map(move |slots| {
            let view = slots.identifiers.valid_element_view(slots.instances.as_slice());
            view.iter().enumerate().filter_map(move |(index, slot)| {
                let instance = slots.identifiers.current_identifier(index)?;
                let payload = slot.as_deref()?;
                Some((
                    InstanceHandle {
                        component_type,
                        instance,
                    },
                    payload,
                ))
            })
        })
    }

    /// Number of live instances of one type.
    pub fn count_of(&self, component_type: ComponentTypeIdentifier) -> usize {
        self.slots(component_type)
            .map_or(0, |slots| slots.identifiers.len())
    }

    /// Number of live instances across all types.
    pub fn len(&self) -> usize {
        self.types
            .as_slice()
            .iter()
            .flatten()
            .map(|slots| slots.identifiers.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DynamicComponentStorage {
    fn default() -> Self {
        Self::new()
    }
}
