use std::collections::HashMap;

use tokio::sync::RwLock;

use quoteflow_core::domain::quote::{Quote, QuoteId};

use super::{QuoteRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryQuoteRepository {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl InMemoryQuoteRepository {
    pub fn with_quotes(quotes: impl IntoIterator<Item = Quote>) -> Self {
        let quotes = quotes.into_iter().map(|quote| (quote.id.0.clone(), quote)).collect();
        Self { quotes: RwLock::new(quotes) }
    }
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.get(&id.0).cloned())
    }

    async fn list(&self) -> Result<Vec<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        let mut listed: Vec<Quote> = quotes.values().cloned().collect();
        listed.sort_by(|a, b| b.created_date.cmp(&a.created_date).then_with(|| a.id.cmp(&b.id)));
        Ok(listed)
    }

    async fn save(&self, mut quote: Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        if let Some(existing) = quotes.get(&quote.id.0) {
            quote.revision = existing.revision + 1;
        }
        quotes.insert(quote.id.0.clone(), quote);
        Ok(())
    }

    async fn update_workflow(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        let stored =
            quotes.get_mut(&quote.id.0).ok_or_else(|| RepositoryError::MissingQuote(quote.id.clone()))?;
        if stored.revision != quote.revision {
            return Err(RepositoryError::StaleRevision {
                quote_id: quote.id.clone(),
                expected: quote.revision,
            });
        }
        stored.workflow = quote.workflow.clone();
        stored.current_step = quote.current_step.clone();
        stored.status = quote.status;
        stored.revision = quote.revision + 1;
        Ok(())
    }
}
