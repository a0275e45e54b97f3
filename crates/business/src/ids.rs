//! Typed identifiers for business objects.

use serde::{Deserialize, Serialize};

use bizbook_core::Guid;

macro_rules! guid_newtype {
    ($(#[$meta:meta])* $t:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(pub Guid);

        impl $t {
            pub fn guid(&self) -> Guid {
                self.0
            }
        }

        impl From<Guid> for $t {
            fn from(value: Guid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Guid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

guid_newtype!(
    /// Job identifier.
    JobId
);
guid_newtype!(
    /// Customer identifier.
    CustomerId
);
guid_newtype!(
    /// Vendor identifier.
    VendorId
);
