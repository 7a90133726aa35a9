//! Read-side helpers for the quote list: search, status filter, ordering and summary stats.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{Quote, QuoteStatus};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteSort {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
    Customer,
}

impl std::str::FromStr for QuoteSort {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date-desc" => Ok(Self::DateDesc),
            "date-asc" => Ok(Self::DateAsc),
            "amount-desc" => Ok(Self::AmountDesc),
            "amount-asc" => Ok(Self::AmountAsc),
            "customer" => Ok(Self::Customer),
            other => Err(DomainError::InvalidInput(format!(
                "unsupported sort `{other}` (expected date-desc|date-asc|amount-desc|amount-asc|customer)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteQuery {
    pub search: Option<String>,
    pub status: Option<QuoteStatus>,
    pub sort: Option<QuoteSort>,
}

impl QuoteQuery {
    pub fn matches(&self, quote: &Quote) -> bool {
        let status_ok = self.status.map(|status| quote.status == status).unwrap_or(true);
        let term = self
            .search
            .as_deref()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());
        let search_ok = match term {
            None => true,
            Some(term) => {
                quote.id.0.to_lowercase().contains(&term)
                    || quote.customer.to_lowercase().contains(&term)
                    || quote.amount.normalize().to_string().contains(&term)
            }
        };
        status_ok && search_ok
    }

    /// Filters then orders. Without an explicit sort the input order is kept.
    pub fn apply(&self, quotes: Vec<Quote>) -> Vec<Quote> {
        let mut selected: Vec<Quote> = quotes.into_iter().filter(|quote| self.matches(quote)).collect();
        if let Some(sort) = self.sort {
            match sort {
                QuoteSort::DateDesc => selected.sort_by(|a, b| b.created_date.cmp(&a.created_date)),
                QuoteSort::DateAsc => selected.sort_by(|a, b| a.created_date.cmp(&b.created_date)),
                QuoteSort::AmountDesc => selected.sort_by(|a, b| b.amount.cmp(&a.amount)),
                QuoteSort::AmountAsc => selected.sort_by(|a, b| a.amount.cmp(&b.amount)),
                QuoteSort::Customer => selected.sort_by(|a, b| {
                    a.customer.to_lowercase().cmp(&b.customer.to_lowercase())
                }),
            }
        }
        selected
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStats {
    pub total_quotes: usize,
    pub pending_quotes: usize,
    pub approved_quotes: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
}

impl QuoteStats {
    pub fn from_quotes(quotes: &[Quote]) -> Self {
        let count = |status: QuoteStatus| quotes.iter().filter(|q| q.status == status).count();
        Self {
            total_quotes: quotes.len(),
            pending_quotes: count(QuoteStatus::Pending),
            approved_quotes: count(QuoteStatus::Approved),
            total_value: quotes.iter().map(|quote| quote.amount).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{QuoteQuery, QuoteSort, QuoteStats};
    use crate::domain::quote::{Quote, QuoteId, QuoteStatus};
    use crate::errors::DomainError;

    fn quote(id: &str, customer: &str, amount: i64, day: u32, status: QuoteStatus) -> Quote {
        Quote {
            id: QuoteId(id.to_owned()),
            customer: customer.to_owned(),
            amount: Decimal::new(amount, 0),
            discount: Decimal::ZERO,
            created_by: "John Smith".to_owned(),
            created_date: NaiveDate::from_ymd_opt(2025, 1, day).expect("valid date"),
            products: Vec::new(),
            workflow: Vec::new(),
            current_step: None,
            status,
            revision: 0,
        }
    }

    fn fixtures() -> Vec<Quote> {
        vec![
            quote("Q-2025-001", "Acme Corporation", 125_000, 15, QuoteStatus::Pending),
            quote("Q-2025-002", "Globex Industries", 48_500, 18, QuoteStatus::Approved),
            quote("Q-2025-003", "Initech", 310_000, 10, QuoteStatus::Pending),
        ]
    }

    fn ids(quotes: &[Quote]) -> Vec<&str> {
        quotes.iter().map(|quote| quote.id.0.as_str()).collect()
    }

    #[test]
    fn search_matches_id_customer_and_amount() {
        let by_customer = QuoteQuery { search: Some("GLOBEX".to_owned()), ..QuoteQuery::default() };
        assert_eq!(ids(&by_customer.apply(fixtures())), ["Q-2025-002"]);

        let by_amount = QuoteQuery { search: Some("310".to_owned()), ..QuoteQuery::default() };
        assert_eq!(ids(&by_amount.apply(fixtures())), ["Q-2025-003"]);

        let by_id = QuoteQuery { search: Some("q-2025-00".to_owned()), ..QuoteQuery::default() };
        assert_eq!(by_id.apply(fixtures()).len(), 3);
    }

    #[test]
    fn status_filter_and_sorting_compose() {
        let query = QuoteQuery {
            status: Some(QuoteStatus::Pending),
            sort: Some(QuoteSort::AmountDesc),
            ..QuoteQuery::default()
        };
        assert_eq!(ids(&query.apply(fixtures())), ["Q-2025-003", "Q-2025-001"]);

        let by_date = QuoteQuery { sort: Some(QuoteSort::DateDesc), ..QuoteQuery::default() };
        assert_eq!(ids(&by_date.apply(fixtures())), ["Q-2025-002", "Q-2025-001", "Q-2025-003"]);

        let by_customer = QuoteQuery { sort: Some(QuoteSort::Customer), ..QuoteQuery::default() };
        assert_eq!(ids(&by_customer.apply(fixtures())), ["Q-2025-001", "Q-2025-002", "Q-2025-003"]);
    }

    #[test]
    fn sort_parses_kebab_case_names() {
        assert_eq!("amount-asc".parse::<QuoteSort>().expect("parse"), QuoteSort::AmountAsc);
        let error = "sideways".parse::<QuoteSort>().expect_err("unknown sort");
        assert!(matches!(error, DomainError::InvalidInput(_)));
        assert!(error.to_string().starts_with("unsupported sort `sideways`"));
    }

    #[test]
    fn stats_summarize_counts_and_value() {
        let stats = QuoteStats::from_quotes(&fixtures());

        assert_eq!(stats.total_quotes, 3);
        assert_eq!(stats.pending_quotes, 2);
        assert_eq!(stats.approved_quotes, 1);
        assert_eq!(stats.total_value, Decimal::new(483_500, 0));
    }
}
