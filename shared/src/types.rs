use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CircuitCode = u32;
pub type SequenceNumber = u32;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn from_u128(value: u128) -> Self {
                Self(Uuid::from_u128(value))
            }

            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }

            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }

            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_newtype!(
    /// Identifies the avatar an account logs in as
    AgentId
);
uuid_newtype!(
    /// Identifies one login session, shared with the server instance
    SessionId
);
uuid_newtype!(
    /// Second session secret, never sent over the circuit
    SecureSessionId
);
uuid_newtype!(
    /// Opaque id of a folder, item or contact record
    ItemId
);

/// Address of a fetchable record: the account that owns it plus its own id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub owner_id: AgentId,
    pub item_id: ItemId,
}

impl ItemKey {
    pub fn new(owner_id: AgentId, item_id: ItemId) -> Self {
        Self { owner_id, item_id }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.item_id)
    }
}
