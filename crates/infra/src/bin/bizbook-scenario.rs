//! Runs the customer/job lifecycle against a book opened from the
//! environment and logs what the backend saw.

use anyhow::Context;

use bizbook_business::{Customer, Job, Owner};
use bizbook_infra::config::BookConfig;
use bizbook_infra::open_book;

fn main() -> anyhow::Result<()> {
    bizbook_observability::init();

    let config = BookConfig::from_env().context("loading book configuration")?;
    let opened = open_book(&config);
    let mut book = opened.book;

    let customer = book.create::<Customer>();
    book.begin_edit::<Customer>(customer)?;
    book.customer_mut(customer)
        .context("customer vanished")?
        .set_name("Acme");
    book.commit_edit::<Customer>(customer)?;

    let job = book.create::<Job>();
    book.begin_edit::<Job>(job)?;
    {
        let mut j = book.job_mut(job).context("job vanished")?;
        j.set_number("000001");
        j.set_name("Warehouse shelving");
    }
    book.set_job_owner(job, Some(Owner::Customer(customer)))?;
    book.commit_edit::<Job>(job)?;
    tracing::info!(active = book.active_jobs(customer).len(), "job linked");

    book.set_active::<Job>(job, false)?;
    tracing::info!(
        active = book.active_jobs(customer).len(),
        all = book.all_jobs(customer).len(),
        "job deactivated"
    );

    book.begin_edit::<Job>(job)?;
    book.destroy::<Job>(job)?;
    tracing::info!(all = book.all_jobs(customer).len(), "job destroyed");

    for record in opened.store.log() {
        tracing::info!(
            entity_type = %record.entity_type,
            guid = %record.guid,
            kind = ?record.kind,
            "backend record"
        );
    }
    if let Some(bus) = opened.events {
        tracing::info!(subscribers = bus.subscriber_count(), "lifecycle events published");
    }

    Ok(())
}
