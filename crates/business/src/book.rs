//! The book: identity scope, object collections and backend for one set of
//! business objects.
//!
//! All edit-session transitions go through the book so that it can snapshot
//! objects for rollback, keep party membership indexes consistent, and notify
//! the backend on the outermost commit.

use std::collections::HashMap;
use std::sync::Arc;

use bizbook_core::{
    Backend, BookId, CommitKind, CommitRecord, ContractPolicy, DomainError, DomainResult,
    EditTransition, Guid,
};

use crate::customer::{Customer, CustomerMut};
use crate::ids::{CustomerId, JobId, VendorId};
use crate::instance::Instance;
use crate::job::{Job, JobMut};
use crate::object::{BusinessObject, Collection, Stores, TOKEN, Token};
use crate::owner::Owner;
use crate::party::{MemberIndex, Party};
use crate::vendor::{Vendor, VendorMut};

#[derive(Debug)]
pub struct Book {
    id: BookId,
    backend: Option<Arc<dyn Backend>>,
    policy: ContractPolicy,
    identities: HashMap<Guid, &'static str>,
    jobs: Collection<Job>,
    customers: Collection<Customer>,
    vendors: Collection<Vendor>,
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

impl Book {
    /// An empty book with no backend and the build's default policy.
    pub fn new() -> Self {
        Self::with_id(BookId::new())
    }

    pub fn with_id(id: BookId) -> Self {
        Self {
            id,
            backend: None,
            policy: ContractPolicy::default(),
            identities: HashMap::new(),
            jobs: Collection::default(),
            customers: Collection::default(),
            vendors: Collection::default(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_policy(mut self, policy: ContractPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_backend(&mut self, backend: Option<Arc<dyn Backend>>) {
        self.backend = backend;
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn backend(&self) -> Option<&Arc<dyn Backend>> {
        self.backend.as_ref()
    }

    pub fn policy(&self) -> ContractPolicy {
        self.policy
    }

    // ---- identity -------------------------------------------------------

    /// Create a clean, active object of type `T` with a fresh identity.
    pub fn create<T>(&mut self) -> T::Id
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        self.register::<T>(Guid::new())
    }

    /// Create an object under a caller-chosen identity.
    pub fn create_with_guid<T>(&mut self, guid: Guid) -> DomainResult<T::Id>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        if let Some(existing) = self.identities.get(&guid) {
            return Err(DomainError::conflict(format!(
                "guid {guid} already identifies a {existing}"
            )));
        }
        Ok(self.register::<T>(guid))
    }

    fn register<T>(&mut self, guid: Guid) -> T::Id
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        let object = T::create(Instance::new(guid, self.id), TOKEN);
        self.identities.insert(guid, T::TYPE_NAME);
        <Self as Stores<T>>::collection_mut(self, TOKEN)
            .items
            .insert(guid, object);
        tracing::debug!(book_id = %self.id, entity_type = T::TYPE_NAME, %guid, "object created");
        T::Id::from(guid)
    }

    /// Whether `guid` names a live object of any type.
    pub fn contains(&self, guid: Guid) -> bool {
        self.identities.contains_key(&guid)
    }

    /// Type name of the live object named by `guid`.
    pub fn type_of(&self, guid: Guid) -> Option<&'static str> {
        self.identities.get(&guid).copied()
    }

    pub fn get<T>(&self, id: T::Id) -> Option<&T>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        let guid: Guid = id.into();
        <Self as Stores<T>>::collection(self).items.get(&guid)
    }

    fn object_mut<T>(&mut self, id: T::Id) -> Option<&mut T>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        let guid: Guid = id.into();
        <Self as Stores<T>>::collection_mut(self, TOKEN)
            .items
            .get_mut(&guid)
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.get::<Job>(id)
    }

    /// Edit handle for the job's attribute setters.
    pub fn job_mut(&mut self, id: JobId) -> Option<JobMut<'_>> {
        self.object_mut::<Job>(id).map(JobMut::new)
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.get::<Customer>(id)
    }

    pub fn customer_mut(&mut self, id: CustomerId) -> Option<CustomerMut<'_>> {
        self.object_mut::<Customer>(id).map(CustomerMut::new)
    }

    pub fn vendor(&self, id: VendorId) -> Option<&Vendor> {
        self.get::<Vendor>(id)
    }

    pub fn vendor_mut(&mut self, id: VendorId) -> Option<VendorMut<'_>> {
        self.object_mut::<Vendor>(id).map(VendorMut::new)
    }

    pub fn book_of<T>(&self, id: T::Id) -> Option<BookId>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        self.get::<T>(id).map(|o| o.book())
    }

    /// `false` for unknown or destroyed identities.
    pub fn is_dirty<T>(&self, id: T::Id) -> bool
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        self.get::<T>(id).is_some_and(|o| o.instance().is_dirty())
    }

    pub fn edit_depth<T>(&self, id: T::Id) -> Option<u32>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        self.get::<T>(id).map(|o| o.instance().edit_level())
    }

    pub fn is_active<T>(&self, id: T::Id) -> Option<bool>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        self.get::<T>(id).map(|o| o.is_active())
    }

    pub fn set_active<T>(&mut self, id: T::Id, active: bool) -> DomainResult<()>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        self.object_mut::<T>(id)
            .ok_or(DomainError::NotFound)?
            .set_active(active, TOKEN);
        Ok(())
    }

    pub fn printable<T>(&self, id: T::Id) -> Option<String>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        self.get::<T>(id).map(|o| o.printable())
    }

    /// Live objects of type `T`, in identity order.
    pub fn list<T>(&self, include_inactive: bool) -> Vec<T::Id>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        let mut guids: Vec<Guid> = <Self as Stores<T>>::collection(self)
            .items
            .values()
            .filter(|o| include_inactive || o.is_active())
            .map(|o| o.guid())
            .collect();
        guids.sort();
        guids.into_iter().map(T::Id::from).collect()
    }

    // ---- edit sessions --------------------------------------------------

    /// Open a (possibly nested) edit session.
    ///
    /// The outermost begin snapshots the object for `rollback_edit`.
    pub fn begin_edit<T>(&mut self, id: T::Id) -> DomainResult<()>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        let guid: Guid = id.into();
        let collection = <Self as Stores<T>>::collection_mut(self, TOKEN);
        let object = collection.items.get_mut(&guid).ok_or(DomainError::NotFound)?;

        let outermost = object.instance_mut(TOKEN).begin_edit();
        let depth = object.instance().edit_level();
        if outermost {
            let snapshot = object.clone();
            collection.snapshots.insert(guid, snapshot);
        }

        tracing::debug!(entity_type = T::TYPE_NAME, %guid, depth, "begin edit");
        Ok(())
    }

    /// Close one session level.
    ///
    /// Closing the outermost level hands a commit record to the backend and,
    /// once the backend accepts it, clears the dirty flag. A rejected commit
    /// leaves the object dirty with no session open.
    pub fn commit_edit<T>(&mut self, id: T::Id) -> DomainResult<()>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        let guid: Guid = id.into();
        let (book_id, policy) = (self.id, self.policy);
        let backend = self.backend.clone();
        let collection = <Self as Stores<T>>::collection_mut(self, TOKEN);
        let object = collection.items.get_mut(&guid).ok_or(DomainError::NotFound)?;

        match object.instance_mut(TOKEN).commit_edit() {
            Err(violation) => return Err(policy.enforce(violation)),
            Ok(EditTransition::Nested { depth }) => {
                tracing::debug!(entity_type = T::TYPE_NAME, %guid, depth, "nested commit");
                return Ok(());
            }
            Ok(EditTransition::Outermost) => {}
        }
        collection.snapshots.remove(&guid);

        let record = commit_record(book_id, &*object, CommitKind::Updated)?;
        notify(backend.as_deref(), &record)?;
        object.instance_mut(TOKEN).mark_clean();

        tracing::debug!(entity_type = T::TYPE_NAME, %guid, "committed");
        Ok(())
    }

    /// Abandon the open session: attributes return to their state at the
    /// outermost begin, the object is clean, nothing reaches the backend.
    pub fn rollback_edit<T>(&mut self, id: T::Id) -> DomainResult<()>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        let guid: Guid = id.into();
        let policy = self.policy;
        let collection = <Self as Stores<T>>::collection_mut(self, TOKEN);
        let object = collection.items.get_mut(&guid).ok_or(DomainError::NotFound)?;

        if let Err(violation) = object.instance_mut(TOKEN).rollback_edit() {
            return Err(policy.enforce(violation));
        }

        let before = object.owner();
        if let Some(snapshot) = collection.snapshots.remove(&guid) {
            object.restore_from(snapshot, TOKEN);
        }
        let after = object.owner();

        if before != after {
            let job = JobId::from(guid);
            self.relink(job, before, after);
            // The restored owner may have been destroyed during the session;
            // the job then differs from its last commit and stays dirty.
            if let Some(owner) = after {
                if !self.party_exists(owner) {
                    if let Some(j) = self.jobs.items.get_mut(&guid) {
                        j.link_owner(None);
                    }
                }
            }
        }

        tracing::debug!(entity_type = T::TYPE_NAME, %guid, "rolled back");
        Ok(())
    }

    /// Destroy an object from inside an edit session.
    ///
    /// The backend is told first; if it refuses, the object stays live. On
    /// success the object leaves its party's membership index, a party's own
    /// jobs lose their owner link, and the identity is released.
    pub fn destroy<T>(&mut self, id: T::Id) -> DomainResult<()>
    where
        T: BusinessObject,
        Self: Stores<T>,
    {
        let guid: Guid = id.into();
        let (book_id, policy) = (self.id, self.policy);
        let backend = self.backend.clone();
        let collection = <Self as Stores<T>>::collection_mut(self, TOKEN);
        let object = collection.items.get(&guid).ok_or(DomainError::NotFound)?;

        if let Err(violation) = object.instance().ensure_destroyable() {
            return Err(policy.enforce(violation));
        }

        let record = commit_record(book_id, object, CommitKind::Destroyed)?;
        let owner = object.owner();
        let linked = object.linked_jobs();
        notify(backend.as_deref(), &record)?;

        collection.items.remove(&guid);
        collection.snapshots.remove(&guid);
        self.identities.remove(&guid);

        if let Some(owner) = owner {
            if let Some(members) = self.member_index_mut(owner) {
                members.remove(JobId::from(guid));
            }
        }
        for job in linked {
            if let Some(j) = self.jobs.items.get_mut(&job.guid()) {
                j.link_owner(None);
            }
        }

        tracing::debug!(entity_type = T::TYPE_NAME, %guid, "destroyed");
        Ok(())
    }

    // ---- owners and membership -----------------------------------------

    /// Link `job` to `owner` (or unlink it with `None`).
    ///
    /// The previous party loses the job and the new one gains it. The job is
    /// marked dirty even if the owner did not change.
    pub fn set_job_owner(&mut self, job: JobId, owner: Option<Owner>) -> DomainResult<()> {
        if let Some(owner) = owner {
            if !self.party_exists(owner) {
                return Err(DomainError::NotFound);
            }
        }

        let j = self
            .jobs
            .items
            .get_mut(&job.guid())
            .ok_or(DomainError::NotFound)?;
        let previous = j.owner_link();
        j.link_owner(owner);

        if previous != owner {
            self.relink(job, previous, owner);
        }
        tracing::debug!(%job, ?previous, ?owner, "job owner set");
        Ok(())
    }

    pub fn job_owner(&self, job: JobId) -> Option<Owner> {
        self.job(job).and_then(|j| j.owner_link())
    }

    /// Jobs linked to `owner`; inactive ones only with `include_inactive`.
    pub fn members(&self, owner: Owner, include_inactive: bool) -> Vec<JobId> {
        let Some(index) = self.member_index(owner) else {
            return Vec::new();
        };
        index
            .sorted()
            .into_iter()
            .filter(|job| {
                include_inactive
                    || self
                        .jobs
                        .items
                        .get(&job.guid())
                        .is_some_and(|j| j.is_active())
            })
            .collect()
    }

    pub fn active_jobs(&self, owner: impl Into<Owner>) -> Vec<JobId> {
        self.members(owner.into(), false)
    }

    pub fn all_jobs(&self, owner: impl Into<Owner>) -> Vec<JobId> {
        self.members(owner.into(), true)
    }

    fn party_exists(&self, owner: Owner) -> bool {
        self.member_index(owner).is_some()
    }

    fn member_index(&self, owner: Owner) -> Option<&MemberIndex> {
        match owner {
            Owner::Customer(id) => self.customer(id).map(|c| c.members()),
            Owner::Vendor(id) => self.vendor(id).map(|v| v.members()),
        }
    }

    fn member_index_mut(&mut self, owner: Owner) -> Option<&mut MemberIndex> {
        match owner {
            Owner::Customer(id) => self
                .object_mut::<Customer>(id)
                .map(|c| c.members_mut(TOKEN)),
            Owner::Vendor(id) => self
                .object_mut::<Vendor>(id)
                .map(|v| v.members_mut(TOKEN)),
        }
    }

    fn relink(&mut self, job: JobId, from: Option<Owner>, to: Option<Owner>) {
        if let Some(owner) = from {
            if let Some(members) = self.member_index_mut(owner) {
                members.remove(job);
            }
        }
        if let Some(owner) = to {
            if let Some(members) = self.member_index_mut(owner) {
                members.insert(job);
            }
        }
    }
}

/// Create an object in `book`; without a book there is nothing to create.
pub fn create<T>(book: Option<&mut Book>) -> Option<T::Id>
where
    T: BusinessObject,
    Book: Stores<T>,
{
    match book {
        Some(book) => Some(book.create::<T>()),
        None => {
            tracing::warn!(entity_type = T::TYPE_NAME, "cannot create an object without a book");
            None
        }
    }
}

fn commit_record<T: BusinessObject>(
    book_id: BookId,
    object: &T,
    kind: CommitKind,
) -> DomainResult<CommitRecord> {
    let guid = object.guid();
    let snapshot = serde_json::to_value(object).map_err(|e| {
        tracing::error!(entity_type = T::TYPE_NAME, %guid, error = %e, "snapshot failed");
        DomainError::Snapshot(e.to_string())
    })?;
    Ok(CommitRecord::new(book_id, T::TYPE_NAME, guid, kind, snapshot))
}

fn notify(backend: Option<&dyn Backend>, record: &CommitRecord) -> DomainResult<()> {
    match backend {
        Some(backend) => backend.commit(record).map_err(|e| {
            tracing::error!(
                entity_type = %record.entity_type,
                guid = %record.guid,
                kind = ?record.kind,
                error = %e,
                "backend refused commit"
            );
            DomainError::Backend(e)
        }),
        None => {
            tracing::debug!(guid = %record.guid, "no backend attached; commit not persisted");
            Ok(())
        }
    }
}

impl Stores<Job> for Book {
    fn collection(&self) -> &Collection<Job> {
        &self.jobs
    }

    fn collection_mut(&mut self, _: Token) -> &mut Collection<Job> {
        &mut self.jobs
    }
}

impl Stores<Customer> for Book {
    fn collection(&self) -> &Collection<Customer> {
        &self.customers
    }

    fn collection_mut(&mut self, _: Token) -> &mut Collection<Customer> {
        &mut self.customers
    }
}

impl Stores<Vendor> for Book {
    fn collection(&self) -> &Collection<Vendor> {
        &self.vendors
    }

    fn collection_mut(&mut self, _: Token) -> &mut Collection<Vendor> {
        &mut self.vendors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizbook_core::{BackendError, Entity};
    use proptest::prelude::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingBackend {
        records: Mutex<Vec<CommitRecord>>,
        refuse: Mutex<bool>,
    }

    impl RecordingBackend {
        fn records(&self) -> Vec<CommitRecord> {
            self.records.lock().unwrap().clone()
        }

        fn refuse(&self, refuse: bool) {
            *self.refuse.lock().unwrap() = refuse;
        }
    }

    impl Backend for RecordingBackend {
        fn commit(&self, record: &CommitRecord) -> Result<(), BackendError> {
            if *self.refuse.lock().unwrap() {
                return Err(BackendError::Rejected("read-only".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn test_book() -> (Book, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend::default());
        let book = Book::new()
            .with_backend(backend.clone())
            .with_policy(ContractPolicy::Report);
        (book, backend)
    }

    #[test]
    fn create_without_book_yields_nothing() {
        assert_eq!(create::<Job>(None), None);
    }

    #[test]
    fn created_object_is_clean_and_belongs_to_the_book() {
        let (mut book, _) = test_book();
        let job = create::<Job>(Some(&mut book)).unwrap();

        assert!(!book.is_dirty::<Job>(job));
        assert_eq!(book.book_of::<Job>(job), Some(book.id()));
        assert_eq!(book.edit_depth::<Job>(job), Some(0));
        assert_eq!(book.type_of(job.guid()), Some("gncJob"));
    }

    #[test]
    fn edit_then_commit_scenario() {
        let (mut book, backend) = test_book();
        let job = book.create::<Job>();

        book.begin_edit::<Job>(job).unwrap();
        book.job_mut(job).unwrap().set_name("Acme");
        assert!(book.is_dirty::<Job>(job));

        book.commit_edit::<Job>(job).unwrap();
        assert!(!book.is_dirty::<Job>(job));
        assert_eq!(book.job(job).unwrap().name(), "Acme");

        let records = backend.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, CommitKind::Updated);
        assert_eq!(records[0].guid, job.guid());
        assert_eq!(records[0].snapshot["name"], "Acme");
    }

    #[test]
    fn only_outermost_commit_notifies_backend() {
        let (mut book, backend) = test_book();
        let job = book.create::<Job>();

        book.begin_edit::<Job>(job).unwrap();
        book.begin_edit::<Job>(job).unwrap();
        book.job_mut(job).unwrap().set_reference("PO-1");

        book.commit_edit::<Job>(job).unwrap();
        assert!(book.is_dirty::<Job>(job));
        assert!(backend.records().is_empty());
        assert_eq!(book.edit_depth::<Job>(job), Some(1));

        book.commit_edit::<Job>(job).unwrap();
        assert!(!book.is_dirty::<Job>(job));
        assert_eq!(backend.records().len(), 1);
    }

    #[test]
    fn setter_outside_session_applies_and_stays_dirty() {
        let (mut book, backend) = test_book();
        let job = book.create::<Job>();

        book.job_mut(job).unwrap().set_number("000001");
        assert!(book.is_dirty::<Job>(job));
        assert_eq!(book.job(job).unwrap().number(), "000001");
        assert!(backend.records().is_empty());
    }

    #[test]
    fn commit_without_begin_is_reported() {
        let (mut book, backend) = test_book();
        let job = book.create::<Job>();

        let err = book.commit_edit::<Job>(job).unwrap_err();
        match err {
            DomainError::ContractViolation(_) => {}
            other => panic!("expected ContractViolation, got {other:?}"),
        }
        assert_eq!(book.edit_depth::<Job>(job), Some(0));
        assert!(backend.records().is_empty());
    }

    #[test]
    #[should_panic(expected = "edit-session contract violated")]
    fn commit_without_begin_panics_under_panic_policy() {
        let mut book = Book::new().with_policy(ContractPolicy::Panic);
        let job = book.create::<Job>();
        let _ = book.commit_edit::<Job>(job);
    }

    #[test]
    fn destroy_outside_session_is_reported_and_keeps_object() {
        let (mut book, _) = test_book();
        let job = book.create::<Job>();

        assert!(matches!(
            book.destroy::<Job>(job),
            Err(DomainError::ContractViolation(_))
        ));
        assert!(book.job(job).is_some());
    }

    #[test]
    fn destroy_releases_identity_and_notifies_backend() {
        let (mut book, backend) = test_book();
        let job = book.create::<Job>();

        book.begin_edit::<Job>(job).unwrap();
        book.destroy::<Job>(job).unwrap();

        assert!(book.job(job).is_none());
        assert!(!book.contains(job.guid()));
        assert_eq!(book.begin_edit::<Job>(job), Err(DomainError::NotFound));
        assert_eq!(backend.records()[0].kind, CommitKind::Destroyed);
    }

    #[test]
    fn without_backend_commit_still_clears_dirty() {
        let mut book = Book::new();
        let job = book.create::<Job>();

        book.begin_edit::<Job>(job).unwrap();
        book.job_mut(job).unwrap().set_name("Local");
        book.commit_edit::<Job>(job).unwrap();
        assert!(!book.is_dirty::<Job>(job));
    }

    #[test]
    fn refused_commit_leaves_object_dirty() {
        let (mut book, backend) = test_book();
        let job = book.create::<Job>();
        backend.refuse(true);

        book.begin_edit::<Job>(job).unwrap();
        book.job_mut(job).unwrap().set_name("Unsaved");
        let err = book.commit_edit::<Job>(job).unwrap_err();

        assert!(matches!(err, DomainError::Backend(BackendError::Rejected(_))));
        assert!(book.is_dirty::<Job>(job));
        assert_eq!(book.edit_depth::<Job>(job), Some(0));
    }

    #[test]
    fn refused_destroy_keeps_object_live() {
        let (mut book, backend) = test_book();
        let customer = book.create::<Customer>();
        let job = book.create::<Job>();
        book.set_job_owner(job, Some(customer.into())).unwrap();
        backend.refuse(true);

        book.begin_edit::<Job>(job).unwrap();
        assert!(book.destroy::<Job>(job).is_err());
        assert!(book.job(job).is_some());
        assert_eq!(book.all_jobs(customer), vec![job]);
    }

    #[test]
    fn create_with_guid_rejects_taken_identity() {
        let (mut book, _) = test_book();
        let guid = Guid::new();

        let job = book.create_with_guid::<Job>(guid).unwrap();
        assert_eq!(job.guid(), guid);

        let err = book.create_with_guid::<Customer>(guid).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn owner_membership_follows_active_flag_and_destroy() {
        let (mut book, _) = test_book();
        let customer = book.create::<Customer>();
        let job = book.create::<Job>();

        assert!(book.active_jobs(customer).is_empty());

        book.set_job_owner(job, Some(Owner::Customer(customer))).unwrap();
        assert_eq!(book.active_jobs(customer), vec![job]);
        assert_eq!(book.all_jobs(customer), vec![job]);

        book.set_active::<Job>(job, false).unwrap();
        assert!(book.active_jobs(customer).is_empty());
        assert_eq!(book.all_jobs(customer), vec![job]);

        book.begin_edit::<Job>(job).unwrap();
        book.destroy::<Job>(job).unwrap();
        assert!(book.all_jobs(customer).is_empty());
    }

    #[test]
    fn changing_owner_moves_the_job() {
        let (mut book, _) = test_book();
        let customer = book.create::<Customer>();
        let vendor = book.create::<Vendor>();
        let job = book.create::<Job>();

        book.set_job_owner(job, Some(customer.into())).unwrap();
        book.set_job_owner(job, Some(vendor.into())).unwrap();

        assert!(book.all_jobs(customer).is_empty());
        assert_eq!(book.all_jobs(vendor), vec![job]);
        assert_eq!(book.job_owner(job), Some(Owner::Vendor(vendor)));

        book.set_job_owner(job, None).unwrap();
        assert!(book.all_jobs(vendor).is_empty());
        assert_eq!(book.job_owner(job), None);
    }

    #[test]
    fn setting_same_owner_still_marks_dirty() {
        let (mut book, _) = test_book();
        let customer = book.create::<Customer>();
        let job = book.create::<Job>();

        book.set_job_owner(job, Some(customer.into())).unwrap();
        book.begin_edit::<Job>(job).unwrap();
        book.commit_edit::<Job>(job).unwrap();
        assert!(!book.is_dirty::<Job>(job));

        book.set_job_owner(job, Some(customer.into())).unwrap();
        assert!(book.is_dirty::<Job>(job));
        assert_eq!(book.all_jobs(customer), vec![job]);
    }

    #[test]
    fn unknown_owner_is_not_found() {
        let (mut book, _) = test_book();
        let job = book.create::<Job>();
        let ghost = CustomerId::from(Guid::new());

        assert_eq!(
            book.set_job_owner(job, Some(ghost.into())),
            Err(DomainError::NotFound)
        );
        assert_eq!(book.job_owner(job), None);
    }

    #[test]
    fn destroying_a_party_unlinks_its_jobs() {
        let (mut book, _) = test_book();
        let customer = book.create::<Customer>();
        let job = book.create::<Job>();
        book.set_job_owner(job, Some(customer.into())).unwrap();

        book.begin_edit::<Customer>(customer).unwrap();
        book.destroy::<Customer>(customer).unwrap();

        assert_eq!(book.job_owner(job), None);
        assert!(book.is_dirty::<Job>(job));
        assert!(book.all_jobs(customer).is_empty());
    }

    #[test]
    fn rollback_restores_attributes_without_backend_traffic() {
        let (mut book, backend) = test_book();
        let job = book.create::<Job>();
        book.begin_edit::<Job>(job).unwrap();
        book.job_mut(job).unwrap().set_name("Original");
        book.commit_edit::<Job>(job).unwrap();

        book.begin_edit::<Job>(job).unwrap();
        book.begin_edit::<Job>(job).unwrap();
        book.job_mut(job).unwrap().set_name("Scratch");
        book.rollback_edit::<Job>(job).unwrap();

        assert_eq!(book.job(job).unwrap().name(), "Original");
        assert!(!book.is_dirty::<Job>(job));
        assert_eq!(book.edit_depth::<Job>(job), Some(0));
        assert_eq!(backend.records().len(), 1);
    }

    #[test]
    fn rollback_relinks_previous_owner() {
        let (mut book, _) = test_book();
        let customer = book.create::<Customer>();
        let vendor = book.create::<Vendor>();
        let job = book.create::<Job>();
        book.set_job_owner(job, Some(customer.into())).unwrap();

        book.begin_edit::<Job>(job).unwrap();
        book.set_job_owner(job, Some(vendor.into())).unwrap();
        book.rollback_edit::<Job>(job).unwrap();

        assert_eq!(book.job_owner(job), Some(Owner::Customer(customer)));
        assert_eq!(book.all_jobs(customer), vec![job]);
        assert!(book.all_jobs(vendor).is_empty());
    }

    #[test]
    fn rollback_drops_link_to_destroyed_party() {
        let (mut book, _) = test_book();
        let customer = book.create::<Customer>();
        let job = book.create::<Job>();
        book.set_job_owner(job, Some(customer.into())).unwrap();

        book.begin_edit::<Job>(job).unwrap();
        book.begin_edit::<Customer>(customer).unwrap();
        book.destroy::<Customer>(customer).unwrap();
        book.rollback_edit::<Job>(job).unwrap();

        assert_eq!(book.job_owner(job), None);
        assert!(book.is_dirty::<Job>(job));
        assert_eq!(book.edit_depth::<Job>(job), Some(0));
    }

    #[test]
    fn edit_handle_changes_attributes_not_identity() {
        let (mut book, backend) = test_book();
        let a = book.create::<Job>();
        let b = book.create::<Job>();

        book.begin_edit::<Job>(b).unwrap();
        {
            let mut handle = book.job_mut(b).unwrap();
            handle.set_name("Fence");
            handle.set_reference("PO-9");
            assert_eq!(handle.name(), "Fence");
        }
        book.commit_edit::<Job>(b).unwrap();

        let job = book.job(b).unwrap();
        assert_eq!(job.id(), b);
        assert_ne!(job.guid(), a.guid());
        assert_eq!(backend.records()[0].guid, b.guid());
        assert_eq!(book.job(a).unwrap().name(), "");
    }

    #[test]
    fn party_handle_marks_dirty_and_keeps_membership() {
        let (mut book, _) = test_book();
        let vendor = book.create::<Vendor>();
        let job = book.create::<Job>();
        book.set_job_owner(job, Some(vendor.into())).unwrap();

        let mut handle = book.vendor_mut(vendor).unwrap();
        handle.set_notes("net 30");
        handle.set_active(false);

        assert!(book.is_dirty::<Vendor>(vendor));
        assert_eq!(book.is_active::<Vendor>(vendor), Some(false));
        assert_eq!(book.all_jobs(vendor), vec![job]);
    }

    #[derive(Debug, Clone)]
    struct Unserializable {
        instance: Instance,
    }

    impl serde::Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(<S::Error as serde::ser::Error>::custom("no snapshot for this object"))
        }
    }

    impl Entity for Unserializable {
        type Id = JobId;

        fn guid(&self) -> Guid {
            self.instance.guid()
        }

        fn book(&self) -> BookId {
            self.instance.book()
        }
    }

    impl BusinessObject for Unserializable {
        const TYPE_NAME: &'static str = "unserializable";

        fn instance(&self) -> &Instance {
            &self.instance
        }

        fn is_active(&self) -> bool {
            true
        }

        fn printable(&self) -> String {
            String::new()
        }

        fn create(instance: Instance, _: Token) -> Self {
            Self { instance }
        }

        fn instance_mut(&mut self, _: Token) -> &mut Instance {
            &mut self.instance
        }

        fn set_active(&mut self, _: bool, _: Token) {}
    }

    #[test]
    fn snapshot_failure_is_an_error_not_a_null_record() {
        let book_id = BookId::new();
        let object = Unserializable::create(Instance::new(Guid::new(), book_id), TOKEN);

        let err = commit_record(book_id, &object, CommitKind::Updated).unwrap_err();
        match err {
            DomainError::Snapshot(msg) => assert!(msg.contains("no snapshot"), "{msg}"),
            other => panic!("expected Snapshot, got {other:?}"),
        }
    }

    #[test]
    fn rollback_of_party_keeps_membership() {
        let (mut book, _) = test_book();
        let customer = book.create::<Customer>();

        book.begin_edit::<Customer>(customer).unwrap();
        book.customer_mut(customer).unwrap().set_name("Temp");
        let job = book.create::<Job>();
        book.set_job_owner(job, Some(customer.into())).unwrap();
        book.rollback_edit::<Customer>(customer).unwrap();

        assert_eq!(book.customer(customer).unwrap().name(), "");
        assert_eq!(book.all_jobs(customer), vec![job]);
    }

    #[test]
    fn rollback_without_session_is_reported() {
        let (mut book, _) = test_book();
        let vendor = book.create::<Vendor>();
        assert!(matches!(
            book.rollback_edit::<Vendor>(vendor),
            Err(DomainError::ContractViolation(_))
        ));
    }

    #[test]
    fn list_filters_inactive_objects() {
        let (mut book, _) = test_book();
        let a = book.create::<Job>();
        let b = book.create::<Job>();
        book.set_active::<Job>(b, false).unwrap();

        let mut all = vec![a, b];
        all.sort();
        assert_eq!(book.list::<Job>(true), all);
        assert_eq!(book.list::<Job>(false), vec![a]);
        assert!(book.list::<Customer>(true).is_empty());
    }

    #[test]
    fn printable_uses_the_name() {
        let (mut book, _) = test_book();
        let customer = book.create::<Customer>();
        book.customer_mut(customer).unwrap().set_name("Globex");
        assert_eq!(book.printable::<Customer>(customer).as_deref(), Some("Globex"));
        assert_eq!(book.printable::<Job>(JobId::from(Guid::new())), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: whatever the value and nesting depth, a setter inside a
        /// session dirties the job and the outermost commit cleans it while
        /// keeping the last value.
        #[test]
        fn dirty_during_edit_clean_after_commit(
            names in prop::collection::vec(".{0,24}", 1..6),
            depth in 1u32..5,
        ) {
            let (mut book, backend) = test_book();
            let job = book.create::<Job>();
            prop_assert!(!book.is_dirty::<Job>(job));

            for _ in 0..depth {
                book.begin_edit::<Job>(job).unwrap();
            }
            for name in &names {
                book.job_mut(job).unwrap().set_name(name.clone());
                prop_assert!(book.is_dirty::<Job>(job));
            }
            for _ in 0..depth {
                book.commit_edit::<Job>(job).unwrap();
            }

            prop_assert!(!book.is_dirty::<Job>(job));
            prop_assert_eq!(book.job(job).unwrap().name(), names.last().unwrap().as_str());
            prop_assert_eq!(backend.records().len(), 1);
        }

        /// Property: active members are exactly the linked jobs whose active
        /// flag is set; all members are every linked job.
        #[test]
        fn membership_matches_active_flags(flags in prop::collection::vec(any::<bool>(), 0..12)) {
            let (mut book, _) = test_book();
            let customer = book.create::<Customer>();

            let mut expected_active = Vec::new();
            let mut expected_all = Vec::new();
            for active in flags {
                let job = book.create::<Job>();
                book.set_job_owner(job, Some(customer.into())).unwrap();
                book.set_active::<Job>(job, active).unwrap();
                expected_all.push(job);
                if active {
                    expected_active.push(job);
                }
            }
            expected_all.sort();
            expected_active.sort();

            prop_assert_eq!(book.all_jobs(customer), expected_all);
            prop_assert_eq!(book.active_jobs(customer), expected_active);
        }

        /// Property: across owner changes, sessions, rollbacks and party
        /// destruction, a job's owner link and the parties' membership
        /// indexes always agree.
        #[test]
        fn owner_links_and_membership_agree(
            ops in prop::collection::vec((0usize..3, 0u8..6, 0usize..3), 0..40),
        ) {
            let (mut book, _) = test_book();
            let customer = book.create::<Customer>();
            let vendor = book.create::<Vendor>();
            let jobs: Vec<JobId> = (0..3).map(|_| book.create::<Job>()).collect();

            for (j, op, arg) in ops {
                let job = jobs[j];
                match op {
                    0 => {
                        let owner = match arg {
                            0 => Some(Owner::Customer(customer)),
                            1 => Some(Owner::Vendor(vendor)),
                            _ => None,
                        };
                        let _ = book.set_job_owner(job, owner);
                    }
                    1 => book.begin_edit::<Job>(job).unwrap(),
                    2 => {
                        let _ = book.commit_edit::<Job>(job);
                    }
                    3 => {
                        let _ = book.rollback_edit::<Job>(job);
                    }
                    4 => {
                        if arg == 0 && book.customer(customer).is_some() {
                            book.begin_edit::<Customer>(customer).unwrap();
                            book.destroy::<Customer>(customer).unwrap();
                        }
                    }
                    _ => {
                        let _ = book.set_active::<Job>(job, arg == 0);
                    }
                }

                for &job in &jobs {
                    if let Some(owner) = book.job_owner(job) {
                        prop_assert!(book.members(owner, true).contains(&job));
                    }
                }
                for owner in [Owner::Customer(customer), Owner::Vendor(vendor)] {
                    for job in book.members(owner, true) {
                        prop_assert_eq!(book.job_owner(job), Some(owner));
                    }
                }
            }
        }
    }
}
