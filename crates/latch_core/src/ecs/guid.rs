//! Stable 128-bit type identity
//!
//! GUIDs are assigned at authoring time and written into serialized data, so
//! they must never change once a component type ships.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(Uuid);

impl Guid {
    /// The never-registered all-zero GUID.
    pub const NIL: Guid = Guid(Uuid::nil());

    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse_str(input: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(input).map(Self)
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_nil()
    }
}

impl FromStr for Guid {
    type Err = uuid::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse_str(input)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self.0.hyphenated())
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Parse a GUID literal at compile time.
///
/// ```ignore
/// const TYPE_GUID: Guid = guid!("72576fe4-4c3b-4d9a-9c1e-5a2b7e8f0d13");
/// ```
#[macro_export]
macro_rules! guid {
    ($literal:literal) => {
        $crate::ecs::Guid::from_uuid($crate::uuid::uuid!($literal))
    };
}
