//! Typed identifier newtypes.
//!
//! Devices and temperature reports are keyed by integers handed out by the
//! store on first save. Page speed reports carry a derived string key, see
//! [`PageSpeedReport::derive_id`](crate::page_speed::PageSpeedReport::derive_id).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::DocumentKey;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw store identifier.
            #[must_use]
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Access the raw identifier.
            #[must_use]
            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl DocumentKey for $name {
            const STORE_ASSIGNED: bool = true;
        }
    };
}

define_id!(
    /// Unique identifier for a [`Device`](crate::device::Device).
    DeviceId
);

define_id!(
    /// Unique identifier for a [`DeviceReport`](crate::report::DeviceReport).
    ReportId
);
