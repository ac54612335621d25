// loader.rs - Reading and writing component documents
//
// Document layout:
//
//   { "components": [ { "typeGuid": "<uuid>", "data": { ... } }, ... ] }
//
// Loading is best effort. Entries naming a type this build does not know are
// skipped so documents written by newer builds still load.

use crate::ecs::{
    ComponentRegistry, DynamicComponentStorage, FactoryError, Guid, InstanceHandle, Reader,
    SerializeOutcome, StorageError, Writer,
};
use serde_json::{json, Value};
use thiserror::Error;

const COMPONENTS: &str = "components";
const TYPE_GUID: &str = "typeGuid";
const DATA: &str = "data";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("document has no 'components' array")]
    MissingComponents,
}

/// Outcome of one [`load_components`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<InstanceHandle>,
    pub skipped: usize,
    pub failed: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.failed == 0
    }
}

/// Instantiate every entry of `document` into `storage`.
pub fn load_components(
    registry: &ComponentRegistry,
    document: &Value,
    storage: &mut DynamicComponentStorage,
) -> Result<LoadReport, LoadError> {
    let entries = document
        .get(COMPONENTS)
        .and_then(Value::as_array)
        .ok_or(LoadError::MissingComponents)?;

    let mut report = LoadReport::default();
    for (position, entry) in entries.iter().enumerate() {
        let Some(guid) = entry
            .get(TYPE_GUID)
            .and_then(Value::as_str)
            .and_then(|text| Guid::parse_str(text).ok())
        else {
            tracing::error!(position, "component entry has no valid type GUID");
            report.failed += 1;
            continue;
        };

        let Some(component_type) = registry.find_identifier(&guid) else {
            tracing::warn!(position, %guid, "skipping component of unknown type");
            report.skipped += 1;
            continue;
        };

        let empty = json!({});
        let data = entry.get(DATA).unwrap_or(&empty);
        let reader = match Reader::new(data) {
            Ok(reader) => reader,
            Err(error) => {
                tracing::error!(position, %guid, %error, "component data is malformed");
                report.failed += 1;
                continue;
            }
        };

        match storage.deserialize(registry, component_type, &reader) {
            Ok(handle) => report.loaded.push(handle),
            Err(StorageError::Factory(FactoryError::NotDeserializable { type_name })) => {
                tracing::warn!(position, %guid, name = type_name, "skipping component that cannot be deserialized");
                report.skipped += 1;
            }
            Err(error) => {
                tracing::error!(position, %guid, %error, "failed to load component");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        loaded = report.loaded.len(),
        skipped = report.skipped,
        failed = report.failed,
        "loaded component document"
    );
    Ok(report)
}

/// Write every live instance in `storage` as a document.
///
/// With `to_disk` set, types flagged `DISABLE_WRITE_TO_DISK` are left out.
/// Instances that fail to serialize are logged and left out.
pub fn save_components(
    registry: &ComponentRegistry,
    storage: &DynamicComponentStorage,
    to_disk: bool,
) -> Value {
    let mut entries = Vec::new();
    for (component_type, factory) in registry.iter() {
        for (handle, instance) in storage.live_instances(component_type) {
            let mut writer = if to_disk { Writer::for_disk() } else { Writer::new() };
            match factory.serialize(instance, &mut writer) {
                Ok(SerializeOutcome::Written) => entries.push(json!({
                    TYPE_GUID: factory.type_guid(),
                    DATA: writer.into_value(),
                })),
                Ok(SerializeOutcome::Skipped) => {}
                Err(error) => {
                    tracing::error!(?handle, %error, "failed to save component");
                }
            }
        }
    }
    json!({ COMPONENTS: entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Component, DeserializeError, SerializeError, TypeFlags};

    #[derive(Debug, PartialEq)]
    struct Score {
        points: i64,
    }

    impl Component for Score {
        const TYPE_GUID: Guid = Guid::from_u128(0x5c0e);
        const NAME: &'static str = "Score";

        fn deserialize(reader: &Reader<'_>) -> Result<Self, DeserializeError> {
            Ok(Self {
                points: reader.field("points")?,
            })
        }

        fn serialize(&self, writer: &mut Writer) -> Result<(), SerializeError> {
            writer.write("points", &self.points)
        }
    }

    struct Cursor {
        row: u32,
    }

    impl Component for Cursor {
        const TYPE_GUID: Guid = Guid::from_u128(0xc0);
        const NAME: &'static str = "Cursor";
        const FLAGS: TypeFlags = TypeFlags::DISABLE_WRITE_TO_DISK;

        fn deserialize(reader: &Reader<'_>) -> Result<Self, DeserializeError> {
            Ok(Self {
                row: reader.field("row")?,
            })
        }

        fn serialize(&self, writer: &mut Writer) -> Result<(), SerializeError> {
            writer.write("row", &self.row)
        }
    }

    struct Opaque;

    impl Component for Opaque {
        const TYPE_GUID: Guid = Guid::from_u128(0x0a);
        const NAME: &'static str = "Opaque";
    }

    fn registry() -> ComponentRegistry {
        ComponentRegistry::builder()
            .register::<Score>()
            .register::<Cursor>()
            .register::<Opaque>()
            .build()
            .unwrap()
    }

    #[test]
    fn loads_known_entries_and_skips_the_rest() {
        let registry = registry();
        let mut storage = DynamicComponentStorage::new();
        let document = json!({
            "components": [
                { "typeGuid": Score::TYPE_GUID, "data": { "points": 10 } },
                { "typeGuid": "00000000-0000-0000-0000-00000000ffff", "data": {} },
                { "typeGuid": Opaque::TYPE_GUID, "data": {} },
                { "typeGuid": Score::TYPE_GUID, "data": { "points": "many" } },
                { "typeGuid": Score::TYPE_GUID, "data": [1, 2] },
                { "data": {} },
                { "typeGuid": Cursor::TYPE_GUID, "data": { "row": 4 } },
            ]
        });

        let report = load_components(&registry, &document, &mut storage).unwrap();
        assert_eq!(report.loaded.len(), 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 3);
        assert!(!report.is_clean());
        assert_eq!(storage.get::<Score>(report.loaded[0]), Some(&Score { points: 10 }));
        assert_eq!(storage.get::<Cursor>(report.loaded[1]).map(|c| c.row), Some(4));
    }

    #[test]
    fn missing_components_array_is_an_error() {
        let registry = registry();
        let mut storage = DynamicComponentStorage::new();
        assert!(matches!(
            load_components(&registry, &json!({ "entities": [] }), &mut storage),
            Err(LoadError::MissingComponents)
        ));
    }

    #[test]
    fn disk_saves_omit_transient_types() {
        let registry = registry();
        let mut storage = DynamicComponentStorage::new();
        let document = json!({
            "components": [
                { "typeGuid": Cursor::TYPE_GUID, "data": { "row": 1 } },
                { "typeGuid": Score::TYPE_GUID, "data": { "points": 3 } },
            ]
        });
        assert!(load_components(&registry, &document, &mut storage).unwrap().is_clean());

        let on_disk = save_components(&registry, &storage, true);
        assert_eq!(
            on_disk,
            json!({ "components": [
                { "typeGuid": Score::TYPE_GUID, "data": { "points": 3 } },
            ] })
        );

        let in_memory = save_components(&registry, &storage, false);
        assert_eq!(in_memory["components"].as_array().map(Vec::len), Some(2));

        let mut reloaded = DynamicComponentStorage::new();
        let report = load_components(&registry, &on_disk, &mut reloaded).unwrap();
        assert_eq!(report.loaded.len(), 1);
        assert_eq!(reloaded.get::<Score>(report.loaded[0]), Some(&Score { points: 3 }));
    }
}
