//! Identifier-indexed storage
//!
//! Building blocks shared by every engine subsystem that addresses data by
//! compact handle instead of by hash:
//! - [`Identifier`]: bit-width constrained handle with an index and reuse count
//! - [`IdentifierMask`] / [`AtomicIdentifierMask`]: presence bitsets
//! - [`IdentifierArray`]: dense per-identifier payload storage
//! - [`SaltedIdentifierStorage`]: lock-free identifier allocation
//! - [`DirtyFlag`]: atomic "needs saving" transition
//!
//! Only the atomic types are internally synchronized. `IdentifierMask` and
//! `IdentifierArray` follow the single-writer discipline of the job graph
//! that owns them.

mod array;
mod atomic_mask;
mod bits;
mod flag;
mod identifier;
mod mask;
mod salted;

pub use array::IdentifierArray;
pub use atomic_mask::AtomicIdentifierMask;
pub use bits::{BitWords, SetBitsIterator};
pub use flag::DirtyFlag;
pub use identifier::{Identifier, IdentifierKind, IdentifierStorage};
pub use mask::IdentifierMask;
pub use salted::SaltedIdentifierStorage;
