//! Typed handles into the registries of a [`Specification`](super::Specification).
//!
//! Handles are dense indices minted by the registries; they stay valid for
//! every specification derived from the one that created them.

use core::fmt;

use serde::{Deserialize, Serialize};

macro_rules! registry_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Position inside the owning registry.
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) const fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

registry_id!(
    /// Handle of a registered column.
    ColumnId,
    "column"
);
registry_id!(
    /// Handle of a registered coin.
    CoinId,
    "coin"
);
registry_id!(
    /// Handle of a registered query.
    QueryId,
    "query"
);
registry_id!(
    /// Handle of a digest slot (Merkle roots and authentication paths).
    SlotId,
    "slot"
);
