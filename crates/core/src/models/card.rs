use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;

use super::document::{
    coerce_amount, coerce_date, coerce_text, format_date, Document, Fields,
};

/// Lifecycle status of a card. Decides which tab shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardStatus {
    #[serde(rename = "forSale")]
    ForSale,
    #[serde(rename = "sold")]
    Sold,
    #[serde(rename = "keeping")]
    Keeping,
}

impl CardStatus {
    /// Literal token stored in the `status` field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::ForSale => "forSale",
            CardStatus::Sold => "sold",
            CardStatus::Keeping => "keeping",
        }
    }
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CardStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forSale" => Ok(CardStatus::ForSale),
            "sold" => Ok(CardStatus::Sold),
            "keeping" => Ok(CardStatus::Keeping),
            other => Err(CoreError::ValidationError(format!(
                "Unknown card status '{other}': expected forSale, sold or keeping"
            ))),
        }
    }
}

/// A purchased collectible card.
///
/// `is_sold` mirrors `status == Sold` and `date_sold` is `None` unless the
/// card is sold. Both are re-established whenever a card is read from a
/// document and whenever a status change goes through the transition service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub bought_for: f64,
    pub sold_for: f64,
    pub status: CardStatus,
    pub is_sold: bool,
    pub date_bought: Option<NaiveDate>,
    pub date_sold: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl Card {
    /// Build a card from a stored document, coercing malformed fields.
    pub fn from_document(doc: &Document) -> Self {
        let stored_flag = matches!(doc.get("isSold"), Some(Value::Bool(true)));
        let status = match doc.get("status").and_then(Value::as_str) {
            Some(token) => token.parse().unwrap_or_else(|_| {
                tracing::debug!("card {} has unknown status '{token}', falling back", doc.id);
                fallback_status(stored_flag)
            }),
            None => fallback_status(stored_flag),
        };
        let is_sold = status == CardStatus::Sold;
        let date_sold = if is_sold {
            coerce_date(doc.get("dateSold"))
        } else {
            None
        };

        Self {
            id: doc.id.clone(),
            name: coerce_text(doc.get("name")),
            bought_for: coerce_amount(doc.get("boughtFor")),
            sold_for: coerce_amount(doc.get("soldFor")),
            status,
            is_sold,
            date_bought: coerce_date(doc.get("dateBought")),
            date_sold,
            notes: coerce_text(doc.get("notes")),
        }
    }

    /// Wire fields of this card (without the id).
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::from(self.name.clone()));
        fields.insert("boughtFor".into(), Value::from(self.bought_for));
        fields.insert("soldFor".into(), Value::from(self.sold_for));
        fields.insert("status".into(), Value::from(self.status.as_str()));
        fields.insert("isSold".into(), Value::from(self.is_sold));
        fields.insert("dateBought".into(), Value::from(format_date(self.date_bought)));
        fields.insert("dateSold".into(), Value::from(format_date(self.date_sold)));
        fields.insert("notes".into(), Value::from(self.notes.clone()));
        fields
    }

    /// Per-card profit. Only meaningful for sold cards; never stored.
    #[must_use]
    pub fn profit(&self) -> f64 {
        self.sold_for - self.bought_for
    }
}

fn fallback_status(stored_flag: bool) -> CardStatus {
    if stored_flag {
        CardStatus::Sold
    } else {
        CardStatus::ForSale
    }
}

/// Input of the "add card" form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDraft {
    pub name: String,
    pub bought_for: f64,
    /// Only stored when the card is created as sold.
    pub sold_for: f64,
    pub status: CardStatus,
    /// Defaults to the creation date.
    pub date_bought: Option<NaiveDate>,
    /// Defaults to the creation date when the card is created as sold.
    pub date_sold: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl CardDraft {
    pub fn new(name: impl Into<String>, bought_for: f64, status: CardStatus) -> Self {
        Self {
            name: name.into(),
            bought_for,
            sold_for: 0.0,
            status,
            date_bought: None,
            date_sold: None,
            notes: String::new(),
        }
    }

    /// Draft for a card that was bought and sold already.
    pub fn sold(
        name: impl Into<String>,
        bought_for: f64,
        sold_for: f64,
        date_sold: Option<NaiveDate>,
    ) -> Self {
        Self {
            sold_for,
            date_sold,
            ..Self::new(name, bought_for, CardStatus::Sold)
        }
    }
}

impl Default for CardDraft {
    fn default() -> Self {
        Self::new("", 0.0, CardStatus::ForSale)
    }
}

/// A proposed partial edit of a card. `None` fields are left as they are.
///
/// `date_sold` has three states: `None` (not supplied), `Some(None)` (clear
/// it) and `Some(Some(date))` (explicit date). Clearing counts as "not
/// supplied" when the card moves into `Sold`, so the date is defaulted.
///
/// There is no `is_sold` field: it is derived by the transition service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardChanges {
    pub name: Option<String>,
    pub bought_for: Option<f64>,
    pub sold_for: Option<f64>,
    pub status: Option<CardStatus>,
    pub date_bought: Option<NaiveDate>,
    pub date_sold: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

impl CardChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bought_for.is_none()
            && self.sold_for.is_none()
            && self.status.is_none()
            && self.date_bought.is_none()
            && self.date_sold.is_none()
            && self.notes.is_none()
    }

    /// The explicitly supplied sold date, if any.
    #[must_use]
    pub fn explicit_date_sold(&self) -> Option<NaiveDate> {
        self.date_sold.flatten()
    }
}

/// A fully consistent card update, ready to be persisted.
///
/// Only produced by [`TransitionService`](crate::services::transition_service::TransitionService),
/// so `is_sold` and `date_sold` always agree with the status being written.
#[derive(Debug, Clone, PartialEq)]
pub struct CardUpdate {
    changes: CardChanges,
    is_sold: Option<bool>,
}

impl CardUpdate {
    pub(crate) fn new(changes: CardChanges, is_sold: Option<bool>) -> Self {
        Self { changes, is_sold }
    }

    #[must_use]
    pub fn changes(&self) -> &CardChanges {
        &self.changes
    }

    #[must_use]
    pub fn is_sold(&self) -> Option<bool> {
        self.is_sold
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.is_sold.is_none()
    }

    /// Wire fields touched by this update.
    #[must_use]
    pub fn to_fields(&self) -> Fields {
        let c = &self.changes;
        let mut fields = Fields::new();
        if let Some(name) = &c.name {
            fields.insert("name".into(), Value::from(name.clone()));
        }
        if let Some(bought_for) = c.bought_for {
            fields.insert("boughtFor".into(), Value::from(bought_for));
        }
        if let Some(sold_for) = c.sold_for {
            fields.insert("soldFor".into(), Value::from(sold_for));
        }
        if let Some(status) = c.status {
            fields.insert("status".into(), Value::from(status.as_str()));
        }
        if let Some(is_sold) = self.is_sold {
            fields.insert("isSold".into(), Value::from(is_sold));
        }
        if let Some(date_bought) = c.date_bought {
            fields.insert("dateBought".into(), Value::from(format_date(Some(date_bought))));
        }
        if let Some(date_sold) = c.date_sold {
            fields.insert("dateSold".into(), Value::from(format_date(date_sold)));
        }
        if let Some(notes) = &c.notes {
            fields.insert("notes".into(), Value::from(notes.clone()));
        }
        fields
    }

    /// Apply this update to an in-memory card.
    pub fn apply_to(&self, card: &mut Card) {
        let c = &self.changes;
        if let Some(name) = &c.name {
            card.name = name.clone();
        }
        if let Some(bought_for) = c.bought_for {
            card.bought_for = bought_for;
        }
        if let Some(sold_for) = c.sold_for {
            card.sold_for = sold_for;
        }
        if let Some(status) = c.status {
            card.status = status;
        }
        if let Some(is_sold) = self.is_sold {
            card.is_sold = is_sold;
        }
        if let Some(date_bought) = c.date_bought {
            card.date_bought = Some(date_bought);
        }
        if let Some(date_sold) = c.date_sold {
            card.date_sold = date_sold;
        }
        if let Some(notes) = &c.notes {
            card.notes = notes.clone();
        }
    }
}

/// A user action on an existing card.
///
/// Every variant lowers to [`CardChanges`] and goes through the same
/// transition, whichever widget produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum CardIntent {
    /// Inline status dropdown.
    SetStatus(CardStatus),
    /// Inline "sold for" input.
    SetSoldFor(f64),
    /// "Mark as sold" quick action.
    MarkSold,
    /// Edit form with any subset of fields.
    FullEdit(CardChanges),
}

impl CardIntent {
    #[must_use]
    pub fn into_changes(self) -> CardChanges {
        match self {
            CardIntent::SetStatus(status) => CardChanges {
                status: Some(status),
                ..CardChanges::default()
            },
            CardIntent::SetSoldFor(amount) => CardChanges {
                sold_for: Some(amount),
                ..CardChanges::default()
            },
            CardIntent::MarkSold => CardChanges {
                status: Some(CardStatus::Sold),
                ..CardChanges::default()
            },
            CardIntent::FullEdit(changes) => changes,
        }
    }
}
