// type_flags.rs - Capability flags gating dynamic use of a component type

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Restrictions a component type places on editor and loader operations.
///
/// An empty set means the type can be instantiated, cloned, deserialized and
/// written to disk dynamically.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeFlags(u8);

impl TypeFlags {
    /// Factories may not construct a default instance.
    pub const DISABLE_DYNAMIC_INSTANTIATION: Self = Self(1 << 0);
    /// Instances may not be cloned from a template.
    pub const DISABLE_DYNAMIC_CLONING: Self = Self(1 << 1);
    /// Instances may not be built from serialized data.
    pub const DISABLE_DYNAMIC_DESERIALIZATION: Self = Self(1 << 2);
    /// Instances are skipped when writing to disk.
    pub const DISABLE_WRITE_TO_DISK: Self = Self(1 << 3);
    /// Editors may not offer "add component" for this type.
    pub const DISABLE_USER_INTERFACE_INSTANTIATION: Self = Self(1 << 4);

    const NAMES: [(TypeFlags, &'static str); 5] = [
        (Self::DISABLE_DYNAMIC_INSTANTIATION, "DisableDynamicInstantiation"),
        (Self::DISABLE_DYNAMIC_CLONING, "DisableDynamicCloning"),
        (Self::DISABLE_DYNAMIC_DESERIALIZATION, "DisableDynamicDeserialization"),
        (Self::DISABLE_WRITE_TO_DISK, "DisableWriteToDisk"),
        (
            Self::DISABLE_USER_INTERFACE_INSTANTIATION,
            "DisableUserInterfaceInstantiation",
        ),
    ];

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Const-friendly union, for use in `Component::FLAGS`.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for TypeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for TypeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for TypeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_contains() {
        let flags = TypeFlags::DISABLE_DYNAMIC_CLONING | TypeFlags::DISABLE_WRITE_TO_DISK;
        assert!(flags.contains(TypeFlags::DISABLE_DYNAMIC_CLONING));
        assert!(flags.contains(TypeFlags::DISABLE_WRITE_TO_DISK));
        assert!(!flags.contains(TypeFlags::DISABLE_DYNAMIC_INSTANTIATION));
        assert!(TypeFlags::empty().is_empty());
        assert_eq!(
            format!("{flags:?}"),
            "{DisableDynamicCloning, DisableWriteToDisk}"
        );
    }
}
