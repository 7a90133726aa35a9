use serde::Serialize;

pub const UNASSIGNED: &str = "Unassigned";

/// A reusable workflow-step type offered to the step editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub default_assignee: &'static str,
}

const STANDARD_PERSONAS: &[Persona] = &[
    Persona {
        id: "configuration",
        name: "Product Configuration",
        description: "Configure products, bundles and options for the deal",
        icon: "fas fa-cogs",
        color: "#3b82f6",
        default_assignee: "Account Executive",
    },
    Persona {
        id: "pricing",
        name: "Pricing Review",
        description: "Validate pricing, discounts and margin targets",
        icon: "fas fa-tags",
        color: "#10b981",
        default_assignee: "Finance Team",
    },
    Persona {
        id: "quoting",
        name: "Quote Generation",
        description: "Assemble and review the customer-facing quote",
        icon: "fas fa-file-invoice-dollar",
        color: "#8b5cf6",
        default_assignee: "Deal Desk",
    },
    Persona {
        id: "contract-creation",
        name: "Contract Creation",
        description: "Draft the contract from approved quote terms",
        icon: "fas fa-file-signature",
        color: "#f59e0b",
        default_assignee: "Legal Team",
    },
    Persona {
        id: "contract-negotiation",
        name: "Contract Negotiation",
        description: "Negotiate non-standard terms with the customer",
        icon: "fas fa-handshake",
        color: "#ef4444",
        default_assignee: "Chief Revenue Officer",
    },
    Persona {
        id: "contract-execution",
        name: "Contract Execution",
        description: "Collect signatures and countersign the agreement",
        icon: "fas fa-pen-nib",
        color: "#06b6d4",
        default_assignee: "Customer",
    },
    Persona {
        id: "order-fulfillment",
        name: "Order Fulfillment",
        description: "Provision licenses and deliver the order",
        icon: "fas fa-truck",
        color: "#84cc16",
        default_assignee: "Operations Team",
    },
    Persona {
        id: "billing",
        name: "Billing Setup",
        description: "Create invoices and billing schedules",
        icon: "fas fa-credit-card",
        color: "#ec4899",
        default_assignee: "Billing Team",
    },
    Persona {
        id: "revenue",
        name: "Revenue Recognition",
        description: "Recognize revenue according to contract terms",
        icon: "fas fa-chart-line",
        color: "#14b8a6",
        default_assignee: "Finance Team",
    },
    Persona {
        id: "renewal",
        name: "Renewal Planning",
        description: "Plan the renewal and expansion motion",
        icon: "fas fa-sync-alt",
        color: "#6366f1",
        default_assignee: "Account Executive",
    },
];

#[derive(Clone, Debug)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self { personas }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_PERSONAS.to_vec())
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|persona| persona.id == id)
    }

    pub fn list(&self) -> &[Persona] {
        &self.personas
    }

    pub fn default_assignee(&self, id: &str) -> &'static str {
        self.get(id).map(|persona| persona.default_assignee).unwrap_or(UNASSIGNED)
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::{PersonaCatalog, UNASSIGNED};

    #[test]
    fn default_assignees_follow_the_role_table() {
        let catalog = PersonaCatalog::standard();
        let expected = [
            ("configuration", "Account Executive"),
            ("pricing", "Finance Team"),
            ("quoting", "Deal Desk"),
            ("contract-creation", "Legal Team"),
            ("contract-negotiation", "Chief Revenue Officer"),
            ("contract-execution", "Customer"),
            ("order-fulfillment", "Operations Team"),
            ("billing", "Billing Team"),
            ("revenue", "Finance Team"),
            ("renewal", "Account Executive"),
        ];

        for (id, assignee) in expected {
            assert_eq!(catalog.default_assignee(id), assignee, "{id}");
        }
        assert_eq!(catalog.list().len(), expected.len());
    }

    #[test]
    fn unknown_ids_are_unassigned() {
        let catalog = PersonaCatalog::standard();
        assert_eq!(catalog.default_assignee("deal-desk"), UNASSIGNED);
        assert_eq!(catalog.default_assignee("nope"), UNASSIGNED);
    }

    #[test]
    fn serialized_persona_exposes_display_fields() {
        let catalog = PersonaCatalog::standard();
        let value = serde_json::to_value(catalog.list()).expect("serialize personas");

        assert_eq!(value.as_array().map(Vec::len), Some(10));
        assert_eq!(value[0]["id"], "configuration");
        assert!(value[0]["icon"].is_string());
        assert!(value[0]["color"].is_string());
        assert!(value[0]["description"].is_string());
    }
}
