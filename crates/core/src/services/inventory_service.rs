use chrono::NaiveDate;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::card::{Card, CardChanges, CardDraft, CardStatus, CardUpdate};
use crate::models::document::{format_date, sanitize_amount, Document, Fields};
use crate::models::misc_supply::{MiscSupplyChanges, MiscSupplyDraft};
use crate::models::supply::{supply_total, Supply, SupplyChanges, SupplyDraft};
use crate::services::transition_service::TransitionService;

/// Validates user input and builds the exact field sets sent to the store.
///
/// No I/O: every method returns the fields to write, and the caller performs
/// the gateway call. A validation error means nothing must be sent.
pub struct InventoryService {
    transitions: TransitionService,
}

impl InventoryService {
    pub fn new() -> Self {
        Self {
            transitions: TransitionService::new(),
        }
    }

    // ── Cards ───────────────────────────────────────────────────────

    /// Fields of a new card. Creation goes through the same transition as
    /// edits, so a card created as sold gets today's date by default.
    pub fn new_card(&self, draft: &CardDraft, today: NaiveDate) -> Result<Fields, CoreError> {
        let name = validate_name(&draft.name, "Card")?;
        let sold_for = if draft.status == CardStatus::Sold {
            sanitize_amount(draft.sold_for)
        } else {
            0.0
        };

        let changes = CardChanges {
            name: Some(name),
            bought_for: Some(sanitize_amount(draft.bought_for)),
            sold_for: Some(sold_for),
            status: Some(draft.status),
            date_bought: Some(draft.date_bought.unwrap_or(today)),
            date_sold: Some(draft.date_sold),
            notes: Some(draft.notes.trim().to_string()),
        };
        let update = self.transitions.apply(None, changes, today);

        let mut fields = update.to_fields();
        // always written on creation, even when the transition left it out
        fields
            .entry("dateSold")
            .or_insert_with(|| Value::from(format_date(None)));
        Ok(fields)
    }

    /// Validated, transition-consistent update of an existing card.
    pub fn card_update(
        &self,
        current: Option<&Card>,
        mut changes: CardChanges,
        today: NaiveDate,
    ) -> Result<CardUpdate, CoreError> {
        if let Some(name) = &changes.name {
            changes.name = Some(validate_name(name, "Card")?);
        }
        changes.bought_for = changes.bought_for.map(sanitize_amount);
        changes.sold_for = changes.sold_for.map(sanitize_amount);
        Ok(self.transitions.apply(current, changes, today))
    }

    // ── Supplies ────────────────────────────────────────────────────

    pub fn new_supply(&self, draft: &SupplyDraft) -> Result<Fields, CoreError> {
        let name = validate_name(&draft.name, "Supply")?;
        let cost = sanitize_amount(draft.cost);
        Ok(supply_fields(&name, draft.quantity, cost))
    }

    /// Fields for a supply edit. Whenever quantity or cost changes, the
    /// total is re-derived from the resulting pair.
    pub fn supply_update(
        &self,
        current: &Supply,
        changes: &SupplyChanges,
    ) -> Result<Fields, CoreError> {
        let mut fields = Fields::new();
        if let Some(name) = &changes.name {
            fields.insert("name".into(), Value::from(validate_name(name, "Supply")?));
        }

        let cost = changes.cost.map(sanitize_amount);
        if changes.quantity.is_some() || cost.is_some() {
            let quantity = changes.quantity.unwrap_or(current.quantity);
            let cost = cost.unwrap_or(current.cost);
            if let Some(q) = changes.quantity {
                fields.insert("quantity".into(), Value::from(q));
            }
            if changes.cost.is_some() {
                fields.insert("cost".into(), Value::from(cost));
            }
            fields.insert("total".into(), Value::from(supply_total(quantity, cost)));
        }
        Ok(fields)
    }

    /// Fields for the +/- buttons: the quantity moves by `delta` and never
    /// drops below zero.
    pub fn adjust_quantity(&self, current: &Supply, delta: i64) -> Fields {
        let quantity = i64::from(current.quantity)
            .saturating_add(delta)
            .clamp(0, i64::from(u32::MAX)) as u32;
        let mut fields = Fields::new();
        fields.insert("quantity".into(), Value::from(quantity));
        fields.insert("total".into(), Value::from(supply_total(quantity, current.cost)));
        fields
    }

    /// Supplies to create when bootstrapping: all defaults if the collection
    /// is empty, nothing otherwise.
    pub fn seed_supplies(&self, existing: &[Document], defaults: &[SupplyDraft]) -> Vec<Fields> {
        if !existing.is_empty() {
            return Vec::new();
        }
        defaults
            .iter()
            .filter_map(|draft| self.new_supply(draft).ok())
            .collect()
    }

    // ── Misc supplies ───────────────────────────────────────────────

    pub fn new_misc_supply(&self, draft: &MiscSupplyDraft) -> Result<Fields, CoreError> {
        let name = validate_name(&draft.name, "Misc supply")?;
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::from(name));
        fields.insert("price".into(), Value::from(sanitize_amount(draft.price)));
        Ok(fields)
    }

    pub fn misc_supply_update(&self, changes: &MiscSupplyChanges) -> Result<Fields, CoreError> {
        let mut fields = Fields::new();
        if let Some(name) = &changes.name {
            fields.insert("name".into(), Value::from(validate_name(name, "Misc supply")?));
        }
        if let Some(price) = changes.price {
            fields.insert("price".into(), Value::from(sanitize_amount(price)));
        }
        Ok(fields)
    }
}

impl Default for InventoryService {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim a name and reject it if nothing is left.
pub fn validate_name(name: &str, what: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError(format!("{what} name must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn supply_fields(name: &str, quantity: u32, cost: f64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".into(), Value::from(name));
    fields.insert("quantity".into(), Value::from(quantity));
    fields.insert("cost".into(), Value::from(cost));
    fields.insert("total".into(), Value::from(supply_total(quantity, cost)));
    fields
}
