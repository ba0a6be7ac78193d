//! [`Command`] for publishing a new [`Listing`].

use std::error::Error as StdError;

use common::{operations::Insert, DateTime, Money};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{listing, Listing},
    gate,
    infra::Backend,
    Client,
};

use super::Command;

/// [`Command`] for publishing a new [`Listing`] on the marketplace.
#[derive(Clone, Debug)]
pub struct CreateListing {
    /// [`listing::Title`] of the new [`Listing`].
    pub title: listing::Title,

    /// Asking price of the new [`Listing`].
    ///
    /// A zero amount makes it a giveaway.
    pub price: Money,

    /// [`listing::Category`] to file the new [`Listing`] under.
    pub category: listing::Category,
}

impl<B, E> Command<CreateListing> for Client<B>
where
    B: Backend<Insert<Listing>, Ok = (), Err = Traced<E>> + Clone + 'static,
    E: StdError + 'static,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateListing,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateListing {
            title,
            price,
            category,
        } = cmd;

        let seller_id = self
            .gate()
            .principal()
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        let listing = Listing {
            id: listing::Id::new(),
            seller_id,
            title,
            price,
            category,
            created_at: DateTime::now().coerce(),
        };

        // Writes are never coalesced with each other: a random per-call ID
        // in the key makes retries distinct operations.
        #[expect(unsafe_code, reason = "never empty")]
        let key = unsafe {
            gate::Key::new_unchecked(format!(
                "listings:insert:{}",
                listing.id,
            ))
        };

        let backend = self.backend().clone();
        let inserted = listing.clone();
        self.gate()
            .execute(key, true, move || async move {
                backend.execute(Insert(inserted)).await
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?;

        Ok(listing)
    }
}

/// Error of [`CreateListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Gate`] error.
    ///
    /// [`Gate`]: crate::Gate
    #[display("`Gate` operation failed: {_0}")]
    Gate(gate::ExecutionError),
}
