use crate::party::party_object;

party_object! {
    /// A customer: a party jobs are done for.
    Customer, CustomerMut, CustomerId, "gncCustomer"
}
