use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{coerce_amount, coerce_text, Document, Fields};

/// A one-off incidental cost (team bags, card savers, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiscSupply {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl MiscSupply {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: coerce_text(doc.get("name")),
            price: coerce_amount(doc.get("price")),
        }
    }

    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::from(self.name.clone()));
        fields.insert("price".into(), Value::from(self.price));
        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiscSupplyDraft {
    pub name: String,
    pub price: f64,
}

impl MiscSupplyDraft {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiscSupplyChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl MiscSupplyChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }
}
