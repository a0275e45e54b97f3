use crate::party::party_object;

party_object! {
    /// A vendor: a party that does jobs for the business.
    Vendor, VendorMut, VendorId, "gncVendor"
}
