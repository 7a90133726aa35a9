use async_trait::async_trait;
use thiserror::Error;

use quoteflow_core::domain::quote::{Quote, QuoteId};

pub mod memory;
pub mod quote;

pub use memory::InMemoryQuoteRepository;
pub use quote::SqlQuoteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("quote `{0}` is not stored")]
    MissingQuote(QuoteId),
    #[error("quote `{quote_id}` moved past revision {expected}")]
    StaleRevision { quote_id: QuoteId, expected: i64 },
}

/// Quote store. Listing order is newest `created_date` first, ties broken by id.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Quote>, RepositoryError>;
    /// Inserts or overwrites a quote. Overwriting bumps the stored revision.
    async fn save(&self, quote: Quote) -> Result<(), RepositoryError>;

    /// Writes the workflow, current step and status of an already stored quote as one unit.
    ///
    /// The write is conditional on the stored revision still being `quote.revision` and moves
    /// it to `quote.revision + 1`. A newer stored revision fails with
    /// [`RepositoryError::StaleRevision`] and leaves the row untouched.
    async fn update_workflow(&self, quote: &Quote) -> Result<(), RepositoryError>;
}
