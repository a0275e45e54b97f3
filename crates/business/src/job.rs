use serde::Serialize;

use bizbook_core::{BookId, Entity, Guid};

use crate::ids::JobId;
use crate::instance::Instance;
use crate::object::{BusinessObject, Token};
use crate::owner::Owner;

/// A job: a unit of billable work done for a customer or a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    instance: Instance,
    number: String,
    name: String,
    reference: String,
    active: bool,
    owner: Option<Owner>,
}

impl Job {
    /// User-facing job number (the "ID" column in the UI), not the `Guid`.
    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn owner_link(&self) -> Option<Owner> {
        self.owner
    }

    /// Membership indexes are updated by the book; see `Book::set_job_owner`.
    pub(crate) fn link_owner(&mut self, owner: Option<Owner>) {
        self.owner = owner;
        self.instance.mark_dirty();
    }
}

/// Edit handle on a job held by a book.
///
/// Reads go through `Deref`; writes are limited to attribute setters, so the
/// job's identity and session state cannot be replaced through it.
///
/// ```compile_fail
/// use bizbook_business::{Book, Job};
///
/// let mut book = Book::new();
/// let a = book.create::<Job>();
/// let b = book.create::<Job>();
/// let copy = book.job(a).unwrap().clone();
/// *book.job_mut(b).unwrap() = copy;
/// ```
#[derive(Debug)]
pub struct JobMut<'a> {
    job: &'a mut Job,
}

impl<'a> JobMut<'a> {
    pub(crate) fn new(job: &'a mut Job) -> Self {
        Self { job }
    }

    pub fn set_number(&mut self, number: impl Into<String>) {
        self.job.number = number.into();
        self.job.instance.mark_dirty();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.job.name = name.into();
        self.job.instance.mark_dirty();
    }

    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.job.reference = reference.into();
        self.job.instance.mark_dirty();
    }

    pub fn set_active(&mut self, active: bool) {
        self.job.active = active;
        self.job.instance.mark_dirty();
    }
}

impl core::ops::Deref for JobMut<'_> {
    type Target = Job;

    fn deref(&self) -> &Job {
        &*self.job
    }
}

impl Entity for Job {
    type Id = JobId;

    fn guid(&self) -> Guid {
        self.instance.guid()
    }

    fn book(&self) -> BookId {
        self.instance.book()
    }
}

impl BusinessObject for Job {
    const TYPE_NAME: &'static str = "gncJob";

    fn instance(&self) -> &Instance {
        &self.instance
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn printable(&self) -> String {
        self.name.clone()
    }

    fn owner(&self) -> Option<Owner> {
        self.owner
    }

    fn create(instance: Instance, _: Token) -> Self {
        Self {
            instance,
            number: String::new(),
            name: String::new(),
            reference: String::new(),
            active: true,
            owner: None,
        }
    }

    fn instance_mut(&mut self, _: Token) -> &mut Instance {
        &mut self.instance
    }

    fn set_active(&mut self, active: bool, _: Token) {
        JobMut::new(self).set_active(active);
    }
}
