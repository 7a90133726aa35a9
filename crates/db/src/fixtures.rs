//! Demo quotes for local runs and the `seed` command.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use quoteflow_core::domain::persona::PersonaCatalog;
use quoteflow_core::domain::quote::{Quote, QuoteId, QuoteProduct, QuoteStatus};
use quoteflow_core::domain::workflow::{StepId, StepStatus, WorkflowStep};

use crate::repositories::{QuoteRepository, RepositoryError};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
}

struct DemoStep {
    persona: &'static str,
    status: StepStatus,
    completed_on: Option<(i32, u32, u32)>,
}

struct DemoQuote {
    id: &'static str,
    customer: &'static str,
    amount: i64,
    discount: i64,
    created_by: &'static str,
    created_on: (i32, u32, u32),
    products: &'static [(&'static str, u32, i64)],
    steps: &'static [DemoStep],
}

const fn done(persona: &'static str, on: (i32, u32, u32)) -> DemoStep {
    DemoStep { persona, status: StepStatus::Completed, completed_on: Some(on) }
}

const fn active(persona: &'static str) -> DemoStep {
    DemoStep { persona, status: StepStatus::Pending, completed_on: None }
}

const fn queued(persona: &'static str) -> DemoStep {
    DemoStep { persona, status: StepStatus::Waiting, completed_on: None }
}

const DEMO_QUOTES: &[DemoQuote] = &[
    DemoQuote {
        id: "Q-2025-001",
        customer: "Acme Corporation",
        amount: 125_000,
        discount: 10,
        created_by: "John Smith",
        created_on: (2025, 1, 15),
        products: &[("Enterprise License", 50, 2_000), ("Implementation Services", 1, 25_000)],
        steps: &[
            done("configuration", (2025, 1, 15)),
            done("pricing", (2025, 1, 16)),
            active("quoting"),
            queued("contract-creation"),
        ],
    },
    DemoQuote {
        id: "Q-2025-002",
        customer: "Globex Industries",
        amount: 48_500,
        discount: 5,
        created_by: "Sarah Johnson",
        created_on: (2025, 1, 18),
        products: &[("Professional License", 25, 1_800), ("Onboarding Package", 1, 3_500)],
        steps: &[
            done("configuration", (2025, 1, 18)),
            done("pricing", (2025, 1, 19)),
            done("quoting", (2025, 1, 21)),
        ],
    },
    DemoQuote {
        id: "Q-2025-003",
        customer: "Initech",
        amount: 310_000,
        discount: 15,
        created_by: "Mike Chen",
        created_on: (2025, 1, 10),
        products: &[("Enterprise License", 120, 2_500), ("Premium Support", 1, 10_000)],
        steps: &[
            done("configuration", (2025, 1, 10)),
            active("pricing"),
            queued("contract-creation"),
            queued("contract-negotiation"),
        ],
    },
    DemoQuote {
        id: "Q-2025-004",
        customer: "Umbrella Health",
        amount: 72_000,
        discount: 0,
        created_by: "John Smith",
        created_on: (2025, 1, 20),
        products: &[("Team License", 40, 1_800)],
        steps: &[active("configuration"), queued("pricing"), queued("billing")],
    },
];

fn date((year, month, day): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn build(demo: &DemoQuote, catalog: &PersonaCatalog) -> Quote {
    let workflow: Vec<WorkflowStep> = demo
        .steps
        .iter()
        .map(|step| {
            let (name, assignee) = catalog
                .get(step.persona)
                .map(|persona| (persona.name, persona.default_assignee))
                .unwrap_or((step.persona, catalog.default_assignee(step.persona)));
            WorkflowStep {
                id: StepId::from(step.persona),
                name: name.to_owned(),
                assignee: assignee.to_owned(),
                status: step.status,
                completed_date: step.completed_on.map(date),
            }
        })
        .collect();

    let current_step =
        workflow.iter().find(|step| step.status == StepStatus::Pending).map(|step| step.id.clone());
    let status = if current_step.is_none() { QuoteStatus::Approved } else { QuoteStatus::Pending };

    Quote {
        id: QuoteId(demo.id.to_owned()),
        customer: demo.customer.to_owned(),
        amount: Decimal::new(demo.amount, 0),
        discount: Decimal::new(demo.discount, 0),
        created_by: demo.created_by.to_owned(),
        created_date: date(demo.created_on),
        products: demo
            .products
            .iter()
            .map(|(name, quantity, price)| QuoteProduct {
                name: (*name).to_owned(),
                quantity: *quantity,
                price: Decimal::new(*price, 0),
            })
            .collect(),
        workflow,
        current_step,
        status,
        revision: 0,
    }
}

pub fn demo_quotes() -> Vec<Quote> {
    let catalog = PersonaCatalog::standard();
    DEMO_QUOTES.iter().map(|demo| build(demo, &catalog)).collect()
}

/// Inserts the demo quotes that are not stored yet. Existing quotes are left alone so a
/// restart never rewinds workflow progress.
pub async fn seed_demo_quotes<R>(repository: &R) -> Result<SeedResult, RepositoryError>
where
    R: QuoteRepository + ?Sized,
{
    let mut result = SeedResult::default();
    for quote in demo_quotes() {
        if repository.find_by_id(&quote.id).await?.is_some() {
            result.skipped.push(quote.id.0);
            continue;
        }
        let id = quote.id.0.clone();
        repository.save(quote).await?;
        result.inserted.push(id);
    }
    Ok(result)
}
