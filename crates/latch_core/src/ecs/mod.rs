//! Component type registry and instance storage.
//!
//! Component types are identified by [`Guid`] so serialized documents stay
//! valid across builds. At startup the application registers every type it
//! knows with a [`RegistryBuilder`]; the resulting [`ComponentRegistry`] is
//! then read-only and shared with every worker. Unknown GUIDs in external
//! data are a recoverable condition, not an error.
//!
//! Per-type instances live in [`ComponentStorage`] (statically typed) or
//! [`DynamicComponentStorage`] (type-erased, created through factories),
//! both addressed by salted identifiers from [`crate::storage`].

mod component;
mod factory;
mod guid;
mod identifiers;
mod instances;
pub mod loader;
mod registration_error;
mod registry;
mod serialization;
mod type_flags;

pub use component::Component;
pub use factory::{BoxedComponent, ComponentFactory, FactoryError, SerializeOutcome, TypedFactory};
pub use guid::Guid;
pub use identifiers::{
    ComponentIdentifier, ComponentInstanceKind, ComponentTypeIdentifier, ComponentTypeKind,
    InstanceHandle,
};
pub use instances::{ComponentStorage, DynamicComponentStorage, StorageError};
pub use loader::{load_components, save_components, LoadError, LoadReport};
pub use registration_error::RegistrationError;
pub use registry::{ComponentRegistry, RegistryBuilder};
pub use serialization::{DeserializeError, Reader, SerializeError, Writer};
pub use type_flags::TypeFlags;
