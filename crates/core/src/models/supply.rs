use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{coerce_amount, coerce_quantity, coerce_text, Document, Fields};

/// A reusable shipping material, tracked by unit count and unit cost.
///
/// `total` is always `quantity * cost` rounded to cents. It is recomputed when
/// read from a document, so a stale stored total never reaches the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supply {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub cost: f64,
    pub total: f64,
}

impl Supply {
    pub fn from_document(doc: &Document) -> Self {
        let quantity = coerce_quantity(doc.get("quantity"));
        let cost = coerce_amount(doc.get("cost"));
        Self {
            id: doc.id.clone(),
            name: coerce_text(doc.get("name")),
            quantity,
            cost,
            total: supply_total(quantity, cost),
        }
    }

    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::from(self.name.clone()));
        fields.insert("quantity".into(), Value::from(self.quantity));
        fields.insert("cost".into(), Value::from(self.cost));
        fields.insert("total".into(), Value::from(self.total));
        fields
    }
}

/// `quantity * cost`, rounded to cents.
#[must_use]
pub fn supply_total(quantity: u32, cost: f64) -> f64 {
    round_cents(f64::from(quantity) * cost)
}

#[must_use]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Input for a new supply line; also the shape of the configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyDraft {
    pub name: String,
    pub quantity: u32,
    pub cost: f64,
}

impl SupplyDraft {
    pub fn new(name: impl Into<String>, quantity: u32, cost: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            cost,
        }
    }
}

/// The supplies seeded into an empty supply collection.
#[must_use]
pub fn default_supplies() -> Vec<SupplyDraft> {
    vec![
        SupplyDraft::new("Penny Sleeves", 50, 0.05),
        SupplyDraft::new("Top Loaders", 20, 0.25),
        SupplyDraft::new("Envelopes", 10, 0.15),
        SupplyDraft::new("Bubble Mailers", 5, 0.75),
    ]
}

/// Partial edit of a supply. There is no `total`: it is always derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyChanges {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub cost: Option<f64>,
}

impl SupplyChanges {
    #[must_use]
    pub fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cost(cost: f64) -> Self {
        Self {
            cost: Some(cost),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.quantity.is_none() && self.cost.is_none()
    }
}
