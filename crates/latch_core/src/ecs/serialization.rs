// serialization.rs - Named-field access to structured documents
//
// Components read and write their fields through Reader/Writer rather than
// through serde directly, so a component can be deserialized from a document
// that carries extra or missing fields without failing the whole load.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("expected an object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("missing field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' is malformed: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{type_name} does not support deserialization")]
    Unsupported { type_name: &'static str },

    #[error("'{type_name}' could not be read: {source}")]
    InvalidComponent {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("field '{field}' could not be serialized: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{type_name}' could not be serialized: {source}")]
    InvalidComponent {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{type_name}' serializes to {found}, not an object with named fields")]
    NotAnObject {
        type_name: &'static str,
        found: &'static str,
    },
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Read-only view over one object in a document.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> Reader<'a> {
    pub fn new(value: &'a Value) -> Result<Self, DeserializeError> {
        match value {
            Value::Object(object) => Ok(Self { object }),
            other => Err(DeserializeError::NotAnObject {
                found: kind_of(other),
            }),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.object.contains_key(name)
    }

    /// Deserialize a required field.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T, DeserializeError> {
        self.optional_field(name)?
            .ok_or_else(|| DeserializeError::MissingField {
                field: name.to_string(),
            })
    }

    /// Deserialize a field if it is present. Explicit `null` counts as absent.
    pub fn optional_field<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, DeserializeError> {
        match self.object.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|source| DeserializeError::InvalidField {
                    field: name.to_string(),
                    source,
                }),
        }
    }

    /// Reader for a nested object field.
    pub fn reader_for(&self, name: &str) -> Result<Reader<'a>, DeserializeError> {
        let value = self
            .object
            .get(name)
            .ok_or_else(|| DeserializeError::MissingField {
                field: name.to_string(),
            })?;
        Reader::new(value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.object.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Deserialize the whole object as `T`.
    pub fn read_all<T: DeserializeOwned>(&self, type_name: &'static str) -> Result<T, DeserializeError> {
        serde_json::from_value(Value::Object(self.object.clone()))
            .map_err(|source| DeserializeError::InvalidComponent { type_name, source })
    }
}

/// Builds one object in a document.
#[derive(Debug, Default)]
pub struct Writer {
    object: Map<String, Value>,
    to_disk: bool,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer for output that will be persisted; types flagged
    /// `DISABLE_WRITE_TO_DISK` are skipped.
    pub fn for_disk() -> Self {
        Self {
            object: Map::new(),
            to_disk: true,
        }
    }

    pub fn is_writing_to_disk(&self) -> bool {
        self.to_disk
    }

    pub fn write<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<(), SerializeError> {
        let value = serde_json::to_value(value).map_err(|source| SerializeError::InvalidField {
            field: name.to_string(),
            source,
        })?;
        self.object.insert(name.to_string(), value);
        Ok(())
    }

    /// Write every field of `value`, which must serialize to an object.
    pub fn write_all<T: Serialize + ?Sized>(
        &mut self,
        type_name: &'static str,
        value: &T,
    ) -> Result<(), SerializeError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(object)) => {
                self.object.extend(object);
                Ok(())
            }
            Ok(other) => Err(SerializeError::NotAnObject {
                type_name,
                found: kind_of(&other),
            }),
            Err(source) => Err(SerializeError::InvalidComponent { type_name, source }),
        }
    }

    /// Child writer sharing this writer's disk context.
    pub fn child(&self) -> Writer {
        Writer {
            object: Map::new(),
            to_disk: self.to_disk,
        }
    }

    pub fn write_object(&mut self, name: &str, child: Writer) {
        self.object.insert(name.to_string(), Value::Object(child.object));
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_required_and_optional_fields() {
        let document = json!({ "count": 30, "caliber": null, "nested": { "x": 1.5 } });
        let reader = Reader::new(&document).unwrap();
        assert_eq!(reader.field::<u32>("count").unwrap(), 30);
        assert_eq!(reader.optional_field::<String>("caliber").unwrap(), None);
        assert!(matches!(
            reader.field::<String>("name"),
            Err(DeserializeError::MissingField { field }) if field == "name"
        ));
        let nested = reader.reader_for("nested").unwrap();
        assert_eq!(nested.field::<f32>("x").unwrap(), 1.5);
        assert!(reader.has_field("nested"));
    }

    #[test]
    fn reports_malformed_fields() {
        let document = json!({ "count": "many" });
        let reader = Reader::new(&document).unwrap();
        assert!(matches!(
            reader.field::<u32>("count"),
            Err(DeserializeError::InvalidField { .. })
        ));
        assert!(matches!(
            Reader::new(&json!([1, 2])),
            Err(DeserializeError::NotAnObject { found: "an array" })
        ));
    }

    #[test]
    fn writer_builds_object() {
        let mut writer = Writer::for_disk();
        writer.write("count", &12u32).unwrap();
        let mut child = writer.child();
        assert!(child.is_writing_to_disk());
        child.write("x", &2.0f32).unwrap();
        writer.write_object("offset", child);
        assert_eq!(writer.into_value(), json!({ "count": 12, "offset": { "x": 2.0 } }));
    }
}
