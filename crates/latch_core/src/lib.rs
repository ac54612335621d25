//! Latch Engine Core
//!
//! Contains the foundational data layer:
//! - Identifier-indexed storage (masks, arrays, salted allocation)
//! - Component type registry keyed by GUID
//! - Component instance storage and document loading

pub mod ecs;
pub mod storage;

pub use uuid;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
