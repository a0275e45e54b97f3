use serde::{Deserialize, Serialize};

use bizbook_core::Guid;

use crate::ids::{CustomerId, VendorId};

/// The party a job belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Owner {
    Customer(CustomerId),
    Vendor(VendorId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Customer,
    Vendor,
}

impl Owner {
    pub fn kind(&self) -> OwnerKind {
        match self {
            Owner::Customer(_) => OwnerKind::Customer,
            Owner::Vendor(_) => OwnerKind::Vendor,
        }
    }

    pub fn guid(&self) -> Guid {
        match self {
            Owner::Customer(id) => id.guid(),
            Owner::Vendor(id) => id.guid(),
        }
    }
}

impl From<CustomerId> for Owner {
    fn from(id: CustomerId) -> Self {
        Owner::Customer(id)
    }
}

impl From<VendorId> for Owner {
    fn from(id: VendorId) -> Self {
        Owner::Vendor(id)
    }
}
