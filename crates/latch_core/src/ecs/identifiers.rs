//! Identifier domains used by the component layer

use serde::{Deserialize, Serialize};

// 1023 component types, 6 reuse bits (unused: types are never unregistered).
crate::define_identifier!(pub ComponentTypeKind => ComponentTypeIdentifier, u16, 10);

// 65535 live instances per component type, 16 reuse bits.
crate::define_identifier!(pub ComponentInstanceKind => ComponentIdentifier, u32, 16);

/// Addresses one component instance across all types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceHandle {
    pub component_type: ComponentTypeIdentifier,
    pub instance: ComponentIdentifier,
}
