// component.rs - Component type description
//
// Components are identified by GUIDs, not Rust TypeIds. The GUID is what
// gets written into scene documents, so it must stay stable across builds
// while TypeId does not.

use crate::ecs::{DeserializeError, Guid, Reader, SerializeError, TypeFlags, Writer};
use std::any::Any;

/// Trait for component types that can be registered with a
/// [`ComponentRegistry`](crate::ecs::ComponentRegistry).
///
/// Only `TYPE_GUID` and `NAME` are required. The remaining hooks default to
/// "unsupported", and `FLAGS` lets a type opt out of dynamic operations even
/// when it implements the hook.
pub trait Component: Any + Send + Sync + Sized {
    /// Globally unique, authoring-time type identity.
    const TYPE_GUID: Guid;

    /// Human-readable name for logs and editors.
    const NAME: &'static str;

    const FLAGS: TypeFlags = TypeFlags::empty();

    /// Construct a fresh instance with no serialized input.
    fn create_default() -> Option<Self> {
        None
    }

    /// Construct an instance from a document object.
    fn deserialize(reader: &Reader<'_>) -> Result<Self, DeserializeError> {
        let _ = reader;
        Err(DeserializeError::Unsupported {
            type_name: Self::NAME,
        })
    }

    fn serialize(&self, writer: &mut Writer) -> Result<(), SerializeError> {
        let _ = writer;
        Ok(())
    }

    /// Copy this instance for use as a new component.
    fn clone_component(&self) -> Option<Self> {
        None
    }
}

/// Implement [`Component`] for a type that is `Default + Clone` and whose
/// fields round-trip through serde.
///
/// The type must serialize to an object with named fields. Enums, tuple
/// structs and newtypes fail to save with [`SerializeError::NotAnObject`].
///
/// # Example
/// ```ignore
/// #[derive(Clone, Default, Serialize, Deserialize)]
/// struct Health { current: u32, max: u32 }
///
/// impl_component_via_serde!(Health, guid!("5d0f..."), "Health");
/// ```
#[macro_export]
macro_rules! impl_component_via_serde {
    ($ty:ty, $guid:expr, $name:expr) => {
        $crate::impl_component_via_serde!($ty, $guid, $name, $crate::ecs::TypeFlags::empty());
    };
    ($ty:ty, $guid:expr, $name:expr, $flags:expr) => {
        impl $crate::ecs::Component for $ty {
            const TYPE_GUID: $crate::ecs::Guid = $guid;
            const NAME: &'static str = $name;
            const FLAGS: $crate::ecs::TypeFlags = $flags;

            fn create_default() -> Option<Self> {
                Some(<$ty as ::std::default::Default>::default())
            }

            fn deserialize(
                reader: &$crate::ecs::Reader<'_>,
            ) -> Result<Self, $crate::ecs::DeserializeError> {
                reader.read_all($name)
            }

            fn serialize(
                &self,
                writer: &mut $crate::ecs::Writer,
            ) -> Result<(), $crate::ecs::SerializeError> {
                writer.write_all($name, self)
            }

            fn clone_component(&self) -> Option<Self> {
                Some(<$ty as ::std::clone::Clone>::clone(self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Health {
        current: u32,
        max: u32,
    }

    crate::impl_component_via_serde!(
        Health,
        crate::guid!("5d0f8a51-7f6e-4d2c-b1a4-0c9e3f2a6b78"),
        "Health"
    );

    struct Marker;

    impl Component for Marker {
        const TYPE_GUID: Guid = Guid::from_u128(0xfeed);
        const NAME: &'static str = "Marker";
    }

    #[test]
    fn serde_backed_component_round_trips_fields() {
        let document = json!({ "current": 40, "max": 100 });
        let health = <Health as Component>::deserialize(&Reader::new(&document).unwrap()).unwrap();
        assert_eq!(health, Health { current: 40, max: 100 });

        let mut writer = Writer::new();
        Component::serialize(&health, &mut writer).unwrap();
        assert_eq!(writer.into_value(), document);
        assert_eq!(health.clone_component(), Some(health));
        assert_eq!(Health::create_default(), Some(Health::default()));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let document = json!({ "current": "full" });
        assert!(<Health as Component>::deserialize(&Reader::new(&document).unwrap()).is_err());
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    enum Team {
        #[default]
        Red,
        Blue,
    }

    crate::impl_component_via_serde!(Team, Guid::from_u128(0x7ea3), "Team");

    #[test]
    fn non_object_components_fail_to_save() {
        let mut writer = Writer::new();
        let error = Component::serialize(&Team::Blue, &mut writer).unwrap_err();
        assert!(matches!(
            error,
            SerializeError::NotAnObject { type_name: "Team", found: "a string" }
        ));
        assert_eq!(writer.into_value(), json!({}));
        assert_eq!(Team::create_default(), Some(Team::Red));
    }

    #[test]
    fn read_errors_name_the_component() {
        let document = json!({ "current": "full", "max": 1 });
        let error = <Health as Component>::deserialize(&Reader::new(&document).unwrap()).unwrap_err();
        assert!(matches!(
            error,
            DeserializeError::InvalidComponent { type_name: "Health", .. }
        ));
        assert!(error.to_string().starts_with("'Health' could not be read"));
    }

    #[test]
    fn hooks_default_to_unsupported() {
        let document = json!({});
        assert!(Marker::create_default().is_none());
        assert!(Marker.clone_component().is_none());
        assert!(matches!(
            Marker::deserialize(&Reader::new(&document).unwrap()),
            Err(DeserializeError::Unsupported { type_name: "Marker" })
        ));
    }
}
