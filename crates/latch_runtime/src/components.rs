//! Gameplay component types known to this build

use latch_core::ecs::{
    Component, ComponentRegistry, DeserializeError, Guid, Reader, RegistrationError,
    SerializeError, TypeFlags, Writer,
};
use latch_core::{guid, impl_component_via_serde};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ammunition {
    pub rounds: u32,
    pub capacity: u32,
}

impl Default for Ammunition {
    fn default() -> Self {
        Self {
            rounds: 30,
            capacity: 30,
        }
    }
}

impl_component_via_serde!(Ammunition, guid!("72576fe4-4c3b-4d9a-9c1e-5a2b7e8f0d13"), "Ammunition");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self { current: 100, max: 100 }
    }
}

impl_component_via_serde!(Health, guid!("5d0f8a51-7f6e-4d2c-b1a4-0c9e3f2a6b78"), "Health");

/// Position and uniform scale. Stored on disk as
/// `{ "position": { "x", "y", "z" }, "scale" }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: [f32; 3],
    pub scale: f32,
}

impl Component for Transform {
    const TYPE_GUID: Guid = guid!("c3e1a9b2-6d4f-4e8a-9b7c-1f2e3d4c5b6a");
    const NAME: &'static str = "Transform";

    fn create_default() -> Option<Self> {
        Some(Self {
            position: [0.0; 3],
            scale: 1.0,
        })
    }

    fn deserialize(reader: &Reader<'_>) -> Result<Self, DeserializeError> {
        let position = reader.reader_for("position")?;
        Ok(Self {
            position: [
                position.field("x")?,
                position.field("y")?,
                position.field("z")?,
            ],
            scale: reader.optional_field("scale")?.unwrap_or(1.0),
        })
    }

    fn serialize(&self, writer: &mut Writer) -> Result<(), SerializeError> {
        let mut position = writer.child();
        let [x, y, z] = self.position;
        position.write("x", &x)?;
        position.write("y", &y)?;
        position.write("z", &z)?;
        writer.write_object("position", position);
        writer.write("scale", &self.scale)
    }

    fn clone_component(&self) -> Option<Self> {
        Some(self.clone())
    }
}

/// Per-connection state. Rebuilt on every connect, never saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub client: u32,
    pub latency_ms: u32,
}

impl_component_via_serde!(
    SessionState,
    guid!("e4b2f7c1-3a5d-4c69-8f0e-7d1b2a3c4e5f"),
    "SessionState",
    TypeFlags::DISABLE_WRITE_TO_DISK
        .union(TypeFlags::DISABLE_DYNAMIC_CLONING)
        .union(TypeFlags::DISABLE_USER_INTERFACE_INSTANTIATION)
);

/// Register every component type this build ships with.
pub fn build_registry() -> Result<ComponentRegistry, RegistrationError> {
    ComponentRegistry::builder()
        .register::<Transform>()
        .register::<Health>()
        .register::<Ammunition>()
        .register::<SessionState>()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use latch_core::ecs::{load_components, save_components, DynamicComponentStorage};
    use serde_json::json;

    #[test]
    fn registry_contains_every_type() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.len(), 4);
        for guid in [
            Transform::TYPE_GUID,
            Health::TYPE_GUID,
            Ammunition::TYPE_GUID,
            SessionState::TYPE_GUID,
        ] {
            assert!(registry.contains(&guid));
        }
    }

    #[test]
    fn transform_reads_nested_position() {
        let registry = build_registry().unwrap();
        let mut storage = DynamicComponentStorage::new();
        let scene = json!({ "components": [
            { "typeGuid": Transform::TYPE_GUID, "data": { "position": { "x": 1.0, "y": 2.0, "z": 3.0 } } },
        ] });
        let report = load_components(&registry, &scene, &mut storage).unwrap();
        let transform = storage.get::<Transform>(report.loaded[0]).unwrap();
        assert_eq!(transform.position, [1.0, 2.0, 3.0]);
        assert_eq!(transform.scale, 1.0);

        let saved = save_components(&registry, &storage, true);
        assert_eq!(
            saved["components"][0]["data"],
            json!({ "position": { "x": 1.0, "y": 2.0, "z": 3.0 }, "scale": 1.0 })
        );
    }

    #[test]
    fn session_state_is_not_saved_to_disk() {
        let registry = build_registry().unwrap();
        let mut storage = DynamicComponentStorage::new();
        storage
            .instantiate(&registry, &SessionState::TYPE_GUID)
            .unwrap();
        let saved = save_components(&registry, &storage, true);
        assert_eq!(saved, json!({ "components": [] }));
    }
}
