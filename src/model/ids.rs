//! Stable identities for model entities.
//!
//! Identities are assigned at creation and never change. Copies of an entity
//! keep its id so that cross references (a Join's endpoints, a document's
//! ordinals) still resolve after duplication.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing uuid (used when replaying saved documents).
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identity of an [`Item`](super::Item).
    ItemId
);

entity_id!(
    /// Identity of a [`Container`](super::Container).
    ContainerId
);

entity_id!(
    /// Identity of a [`Join`](super::Join).
    JoinId
);
