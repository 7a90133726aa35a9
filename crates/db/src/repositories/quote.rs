use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, Transaction};

use quoteflow_core::domain::quote::{Quote, QuoteId, QuoteProduct, QuoteStatus};
use quoteflow_core::domain::workflow::{StepId, StepStatus, WorkflowStep};

use super::{QuoteRepository, RepositoryError};
use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn load_steps(
    conn: &mut SqliteConnection,
    quote_id: Option<&QuoteId>,
) -> Result<HashMap<String, Vec<WorkflowStep>>, RepositoryError> {
    let rows = match quote_id {
        Some(id) => {
            sqlx::query(
                "SELECT quote_id, step_id, name, assignee, status, completed_date
                 FROM workflow_step WHERE quote_id = ? ORDER BY position ASC",
            )
            .bind(&id.0)
            .fetch_all(&mut *conn)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT quote_id, step_id, name, assignee, status, completed_date
                 FROM workflow_step ORDER BY quote_id ASC, position ASC",
            )
            .fetch_all(&mut *conn)
            .await?
        }
    };

    let mut steps: HashMap<String, Vec<WorkflowStep>> = HashMap::new();
    for row in &rows {
        let quote_id: String = decode(row, "quote_id")?;
        steps.entry(quote_id).or_default().push(row_to_step(row)?);
    }
    Ok(steps)
}

fn decode<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_date(column: &str, value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| RepositoryError::Decode(format!("{column} `{value}`: {e}")))
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|e| RepositoryError::Decode(format!("{column} `{value}`: {e}")))
}

fn row_to_step(row: &SqliteRow) -> Result<WorkflowStep, RepositoryError> {
    let status_str: String = decode(row, "status")?;
    let completed_date: Option<String> = decode(row, "completed_date")?;

    Ok(WorkflowStep {
        id: StepId(decode(row, "step_id")?),
        name: decode(row, "name")?,
        assignee: decode(row, "assignee")?,
        status: StepStatus::from_str(&status_str)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        completed_date: completed_date
            .as_deref()
            .map(|value| parse_date("completed_date", value))
            .transpose()?,
    })
}

fn row_to_quote(row: &SqliteRow, workflow: Vec<WorkflowStep>) -> Result<Quote, RepositoryError> {
    let amount: String = decode(row, "amount")?;
    let discount: String = decode(row, "discount")?;
    let created_date: String = decode(row, "created_date")?;
    let products_json: String = decode(row, "products_json")?;
    let current_step: Option<String> = decode(row, "current_step")?;
    let status_str: String = decode(row, "status")?;

    let products: Vec<QuoteProduct> = serde_json::from_str(&products_json)
        .map_err(|e| RepositoryError::Decode(format!("products_json: {e}")))?;

    Ok(Quote {
        id: QuoteId(decode(row, "id")?),
        customer: decode(row, "customer")?,
        amount: parse_decimal("amount", &amount)?,
        discount: parse_decimal("discount", &discount)?,
        created_by: decode(row, "created_by")?,
        created_date: parse_date("created_date", &created_date)?,
        products,
        workflow,
        current_step: current_step.map(StepId),
        status: QuoteStatus::from_str(&status_str)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        revision: decode(row, "revision")?,
    })
}

async fn replace_steps(
    tx: &mut Transaction<'_, Sqlite>,
    quote: &Quote,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM workflow_step WHERE quote_id = ?")
        .bind(&quote.id.0)
        .execute(&mut **tx)
        .await?;

    for (position, step) in quote.workflow.iter().enumerate() {
        sqlx::query(
            "INSERT INTO workflow_step (quote_id, position, step_id, name, assignee, status,
                                        completed_date)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&quote.id.0)
        .bind(position as i64)
        .bind(step.id.as_str())
        .bind(&step.name)
        .bind(&step.assignee)
        .bind(step.status.as_str())
        .bind(step.completed_date.map(|date| date.format(DATE_FORMAT).to_string()))
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait::async_trait]
impl QuoteRepository for SqlQuoteRepository {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            "SELECT id, customer, amount, discount, created_by, created_date, products_json,
                    current_step, status, revision
             FROM quote WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let mut steps = load_steps(&mut *tx, Some(id)).await?;
        tx.commit().await?;

        let workflow = steps.remove(&id.0).unwrap_or_default();
        Ok(Some(row_to_quote(&row, workflow)?))
    }

    async fn list(&self) -> Result<Vec<Quote>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(
            "SELECT id, customer, amount, discount, created_by, created_date, products_json,
                    current_step, status, revision
             FROM quote ORDER BY created_date DESC, id ASC",
        )
        .fetch_all(&mut *tx)
        .await?;
        let mut steps = load_steps(&mut *tx, None).await?;
        tx.commit().await?;

        rows.iter()
            .map(|row| {
                let id: String = decode(row, "id")?;
                row_to_quote(row, steps.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn save(&self, quote: Quote) -> Result<(), RepositoryError> {
        let products_json = serde_json::to_string(&quote.products)
            .map_err(|e| RepositoryError::Decode(format!("products_json: {e}")))?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO quote (id, customer, amount, discount, created_by, created_date,
                                products_json, current_step, status, revision, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 customer = excluded.customer,
                 amount = excluded.amount,
                 discount = excluded.discount,
                 created_by = excluded.created_by,
                 created_date = excluded.created_date,
                 products_json = excluded.products_json,
                 current_step = excluded.current_step,
                 status = excluded.status,
                 revision = quote.revision + 1,
                 updated_at = excluded.updated_at",
        )
        .bind(&quote.id.0)
        .bind(&quote.customer)
        .bind(quote.amount.to_string())
        .bind(quote.discount.to_string())
        .bind(&quote.created_by)
        .bind(quote.created_date.format(DATE_FORMAT).to_string())
        .bind(&products_json)
        .bind(quote.current_step.as_ref().map(StepId::as_str))
        .bind(quote.status.as_str())
        .bind(quote.revision)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        replace_steps(&mut tx, &quote).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_workflow(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE quote SET current_step = ?, status = ?, revision = revision + 1, updated_at = ?
             WHERE id = ? AND revision = ?",
        )
        .bind(quote.current_step.as_ref().map(StepId::as_str))
        .bind(quote.status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(&quote.id.0)
        .bind(quote.revision)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let stored: Option<i64> = sqlx::query_scalar("SELECT revision FROM quote WHERE id = ?")
                .bind(&quote.id.0)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;
            return Err(match stored {
                None => RepositoryError::MissingQuote(quote.id.clone()),
                Some(_) => RepositoryError::StaleRevision {
                    quote_id: quote.id.clone(),
                    expected: quote.revision,
                },
            });
        }

        replace_steps(&mut tx, quote).await?;
        tx.commit().await?;
        Ok(())
    }
}
