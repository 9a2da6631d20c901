//! Strongly-typed ID wrappers for all entity types
//!
//! Ids are sequential integers allocated by the repositories. Wrapping them
//! prevents passing a `ServiceId` where a `ClientId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw id
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the underlying integer
            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Ids start at 1; zero means "unset"
            pub const fn is_valid(&self) -> bool {
                self.0 > 0
            }

            /// The id that follows this one
            pub const fn next(&self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_id!(ClientId, "cli-");
define_id!(ServiceId, "srv-");
define_id!(BillingId, "bil-");
define_id!(ServiceBillingId, "sbl-");
