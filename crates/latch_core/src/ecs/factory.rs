// factory.rs - Type-erased construction of registered components

use crate::ecs::{Component, DeserializeError, Guid, Reader, SerializeError, TypeFlags, Writer};
use std::any::{Any, TypeId};
use std::marker::PhantomData;
use thiserror::Error;

/// Type-erased component instance.
pub type BoxedComponent = Box<dyn Any + Send + Sync>;

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("component type '{type_name}' cannot be instantiated dynamically")]
    NotInstantiable { type_name: &'static str },

    #[error("component type '{type_name}' cannot be cloned dynamically")]
    NotCloneable { type_name: &'static str },

    #[error("component type '{type_name}' cannot be deserialized dynamically")]
    NotDeserializable { type_name: &'static str },

    #[error("instance passed to the '{type_name}' factory has a different type")]
    TypeMismatch { type_name: &'static str },

    #[error("failed to deserialize '{type_name}': {source}")]
    Deserialize {
        type_name: &'static str,
        #[source]
        source: DeserializeError,
    },

    #[error("failed to serialize '{type_name}': {source}")]
    Serialize {
        type_name: &'static str,
        #[source]
        source: SerializeError,
    },
}

/// Whether a serialize call produced output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeOutcome {
    Written,
    /// The type is flagged `DISABLE_WRITE_TO_DISK` and the writer targets disk.
    Skipped,
}

/// Runtime interface for one registered component type.
pub trait ComponentFactory: Send + Sync {
    fn type_guid(&self) -> Guid;
    fn type_name(&self) -> &'static str;
    fn component_type_id(&self) -> TypeId;
    fn flags(&self) -> TypeFlags;

    fn create_default(&self) -> Result<BoxedComponent, FactoryError>;
    fn deserialize(&self, reader: &Reader<'_>) -> Result<BoxedComponent, FactoryError>;
    fn clone_from_template(&self, template: &(dyn Any + Send + Sync)) -> Result<BoxedComponent, FactoryError>;
    fn serialize(
        &self,
        instance: &(dyn Any + Send + Sync),
        writer: &mut Writer,
    ) -> Result<SerializeOutcome, FactoryError>;

    fn is_dynamically_instantiable(&self) -> bool {
        !self.flags().contains(TypeFlags::DISABLE_DYNAMIC_INSTANTIATION)
    }

    fn is_cloneable(&self) -> bool {
        !self.flags().contains(TypeFlags::DISABLE_DYNAMIC_CLONING)
    }

    fn is_deserializable(&self) -> bool {
        !self.flags().contains(TypeFlags::DISABLE_DYNAMIC_DESERIALIZATION)
    }

    fn is_disk_writable(&self) -> bool {
        !self.flags().contains(TypeFlags::DISABLE_WRITE_TO_DISK)
    }

    fn is_user_interface_instantiable(&self) -> bool {
        self.is_dynamically_instantiable()
            && !self
                .flags()
                .contains(TypeFlags::DISABLE_USER_INTERFACE_INSTANTIATION)
    }
}

/// The factory registered for every `T: Component`.
pub struct TypedFactory<T: Component> {
    _type: PhantomData<fn() -> T>,
}

impl<T: Component> TypedFactory<T> {
    pub fn new() -> Self {
        Self { _type: PhantomData }
    }
}

impl<T: Component> Default for TypedFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentFactory for TypedFactory<T> {
    fn type_guid(&self) -> Guid {
        T::TYPE_GUID
    }

    fn type_name(&self) -> &'static str {
        T::NAME
    }

    fn component_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn flags(&self) -> TypeFlags {
        T::FLAGS
    }

    fn create_default(&self) -> Result<BoxedComponent, FactoryError> {
        let not_instantiable = FactoryError::NotInstantiable { type_name: T::NAME };
        if !self.is_dynamically_instantiable() {
            return Err(not_instantiable);
        }
        let instance = T::create_default().ok_or(not_instantiable)?;
        Ok(Box::new(instance))
    }

    fn deserialize(&self, reader: &Reader<'_>) -> Result<BoxedComponent, FactoryError> {
        if !self.is_deserializable() {
            return Err(FactoryError::NotDeserializable { type_name: T::NAME });
        }
        match T::deserialize(reader) {
            Ok(instance) => Ok(Box::new(instance)),
            Err(DeserializeError::Unsupported { .. }) => {
                Err(FactoryError::NotDeserializable { type_name: T::NAME })
            }
            Err(source) => Err(FactoryError::Deserialize {
                type_name: T::NAME,
                source,
            }),
        }
    }

    fn clone_from_template(&self, template: &(dyn Any + Send + Sync)) -> Result<BoxedComponent, FactoryError> {
        let not_cloneable = FactoryError::NotCloneable { type_name: T::NAME };
        if !self.is_cloneable() {
            return Err(not_cloneable);
        }
        let template = template
            .downcast_ref::<T>()
            .ok_or(FactoryError::TypeMismatch { type_name: T::NAME })?;
        let instance = template.clone_component().ok_or(not_cloneable)?;
        Ok(Box::new(instance))
    }

    fn serialize(
        &self,
        instance: &(dyn Any + Send + Sync),
        writer: &mut Writer,
    ) -> Result<SerializeOutcome, FactoryError> {
        if writer.is_writing_to_disk() && !self.is_disk_writable() {
            return Ok(SerializeOutcome::Skipped);
        }
        let instance = instance
            .downcast_ref::<T>()
            .ok_or(FactoryError::TypeMismatch { type_name: T::NAME })?;
        instance
            .serialize(writer)
            .map_err(|source| FactoryError::Serialize {
                type_name: T::NAME,
                source,
            })?;
        Ok(SerializeOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Ammunition {
        rounds: u32,
    }

    impl Component for Ammunition {
        const TYPE_GUID: Guid = Guid::from_u128(0xa0);
        const NAME: &'static str = "Ammunition";

        fn create_default() -> Option<Self> {
            Some(Self { rounds: 30 })
        }

        fn deserialize(reader: &Reader<'_>) -> Result<Self, DeserializeError> {
            Ok(Self {
                rounds: reader.field("rounds")?,
            })
        }

        fn serialize(&self, writer: &mut Writer) -> Result<(), SerializeError> {
            writer.write("rounds", &self.rounds)
        }

        fn clone_component(&self) -> Option<Self> {
            Some(self.clone())
        }
    }

    struct SessionState;

    impl Component for SessionState {
        const TYPE_GUID: Guid = Guid::from_u128(0xb0);
        const NAME: &'static str = "SessionState";
        const FLAGS: TypeFlags = TypeFlags::DISABLE_WRITE_TO_DISK
            .union(TypeFlags::DISABLE_DYNAMIC_CLONING)
            .union(TypeFlags::DISABLE_USER_INTERFACE_INSTANTIATION);

        fn create_default() -> Option<Self> {
            Some(Self)
        }

        fn clone_component(&self) -> Option<Self> {
            Some(Self)
        }
    }

    #[test]
    fn constructs_the_concrete_type() {
        let factory = TypedFactory::<Ammunition>::new();
        let instance = factory.create_default().unwrap();
        assert_eq!(instance.downcast_ref::<Ammunition>(), Some(&Ammunition { rounds: 30 }));

        let document = json!({ "rounds": 12 });
        let loaded = factory.deserialize(&Reader::new(&document).unwrap()).unwrap();
        assert_eq!(loaded.downcast_ref::<Ammunition>(), Some(&Ammunition { rounds: 12 }));

        let cloned = factory.clone_from_template(loaded.as_ref()).unwrap();
        assert_eq!(cloned.downcast_ref::<Ammunition>(), Some(&Ammunition { rounds: 12 }));
    }

    #[test]
    fn malformed_payload_fails_construction() {
        let factory = TypedFactory::<Ammunition>::new();
        let document = json!({ "rounds": -3 });
        assert!(matches!(
            factory.deserialize(&Reader::new(&document).unwrap()),
            Err(FactoryError::Deserialize { type_name: "Ammunition", .. })
        ));
    }

    #[test]
    fn flags_gate_operations() {
        let factory = TypedFactory::<SessionState>::new();
        assert!(factory.is_dynamically_instantiable());
        assert!(!factory.is_cloneable());
        assert!(!factory.is_disk_writable());
        assert!(!factory.is_user_interface_instantiable());

        let instance = factory.create_default().unwrap();
        assert!(matches!(
            factory.clone_from_template(instance.as_ref()),
            Err(FactoryError::NotCloneable { .. })
        ));
        assert!(matches!(
            factory.deserialize(&Reader::new(&json!({})).unwrap()),
            Err(FactoryError::NotDeserializable { .. })
        ));

        let mut disk = Writer::for_disk();
        assert_eq!(
            factory.serialize(instance.as_ref(), &mut disk).unwrap(),
            SerializeOutcome::Skipped
        );
        let mut memory = Writer::new();
        assert_eq!(
            factory.serialize(instance.as_ref(), &mut memory).unwrap(),
            SerializeOutcome::Written
        );
    }

    #[test]
    fn rejects_foreign_instances() {
        let factory = TypedFactory::<Ammunition>::new();
        let foreign: BoxedComponent = Box::new(SessionState);
        assert!(matches!(
            factory.clone_from_template(foreign.as_ref()),
            Err(FactoryError::TypeMismatch { .. })
        ));
    }
}
