use crate::ecs::{ComponentTypeIdentifier, Guid};
use thiserror::Error;

/// Errors that can occur while registering a component type.
///
/// All of these indicate an authoring mistake in the build and are expected
/// to abort startup.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("component type '{requested}' uses the nil GUID")]
    InvalidGuid { requested: &'static str },

    #[error("GUID {guid} of '{requested}' is already registered to '{existing}'")]
    GuidCollision {
        guid: Guid,
        existing: &'static str,
        requested: &'static str,
        existing_identifier: ComponentTypeIdentifier,
    },

    #[error("cannot register '{requested}': all {capacity} component type slots are in use")]
    CapacityExhausted {
        requested: &'static str,
        capacity: usize,
    },
}
