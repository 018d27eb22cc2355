//! Typed identifiers for persisted records.
//!
//! Every id wraps the datastore's 64-bit rowid. Records that have not been
//! written yet carry [`CharacterId::UNASSIGNED`] (and friends); the store
//! assigns the real value on insert.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Placeholder for a record the datastore has not numbered yet.
            pub const UNASSIGNED: Self = Self(0);

            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }

            /// Generated ids are always strictly positive.
            pub const fn is_assigned(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "Nº{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().parse::<i64>() {
                    Ok(raw) if raw > 0 => Ok(Self(raw)),
                    _ => Err(ParseError::InvalidId {
                        kind: $label,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

define_id!(CharacterId, "character");
define_id!(ItemId, "item");
define_id!(ApiKeyId, "api key");
