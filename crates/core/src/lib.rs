pub mod errors;
pub mod gateways;
pub mod models;
pub mod services;

use std::sync::Arc;

use chrono::NaiveDate;
use errors::CoreError;
use gateways::feed::{LedgerFeed, LedgerUpdate};
use gateways::traits::StorageGateway;
use models::{
    card::{Card, CardChanges, CardDraft, CardIntent},
    document::{Collection, Document},
    ledger::Ledger,
    misc_supply::{MiscSupply, MiscSupplyChanges, MiscSupplyDraft},
    settings::Settings,
    supply::{Supply, SupplyChanges, SupplyDraft},
    totals::LedgerTotals,
    view::{CardPage, SortField, Tab, ViewParams},
};
use services::{
    aggregation_service::AggregationService, inventory_service::InventoryService,
    view_service::ViewService,
};

pub use models::document::{parse_amount, parse_quantity};

/// Main entry point for the Card Tracker core library.
///
/// Holds the latest ledger snapshot, the card list parameters and the
/// services operating on them. Mutations go straight to the storage gateway
/// and never touch the ledger: it changes only when the store delivers a
/// new snapshot through [`apply_update`](Self::apply_update).
#[must_use]
pub struct CardTracker {
    gateway: Arc<dyn StorageGateway>,
    ledger: Ledger,
    view: ViewParams,
    settings: Settings,
    inventory_service: InventoryService,
    aggregation_service: AggregationService,
    view_service: ViewService,
}

impl std::fmt::Debug for CardTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardTracker")
            .field("gateway", &self.gateway.name())
            .field("cards", &self.ledger.cards.len())
            .field("supplies", &self.ledger.supplies.len())
            .field("misc_supplies", &self.ledger.misc_supplies.len())
            .field("view", &self.view)
            .finish()
    }
}

impl CardTracker {
    /// Create a tracker over `gateway` with an empty ledger.
    pub fn new(gateway: Arc<dyn StorageGateway>, settings: Settings) -> Self {
        Self {
            gateway,
            ledger: Ledger::new(),
            view: ViewParams::new(settings.page_size),
            settings,
            inventory_service: InventoryService::new(),
            aggregation_service: AggregationService::new(),
            view_service: ViewService::new(),
        }
    }

    /// Create a tracker over the gateway `settings` describe.
    pub fn from_settings(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let gateway = gateways::from_settings(&settings)?;
        Ok(Self::new(gateway, settings))
    }

    /// Start a session: seed the default supplies if the store has none,
    /// subscribe to all three collections and load their current contents.
    ///
    /// A failed bootstrap is logged and does not prevent the session from
    /// starting. A failed subscription does.
    pub async fn connect(
        gateway: Arc<dyn StorageGateway>,
        settings: Settings,
    ) -> Result<(Self, LedgerFeed), CoreError> {
        let mut tracker = Self::new(gateway, settings);

        if let Err(e) = tracker.bootstrap_default_supplies().await {
            tracing::warn!("default supplies were not seeded: {e}");
        }

        let feed = tracker.report("subscribe", LedgerFeed::open(tracker.gateway.as_ref()).await)?;
        for update in feed.current() {
            tracker.apply_update(update);
        }
        Ok((tracker, feed))
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Replace one collection of the ledger with a delivered snapshot.
    pub fn apply_update(&mut self, update: LedgerUpdate) {
        self.apply_snapshot(update.collection, &update.documents);
    }

    pub fn apply_snapshot(&mut self, collection: Collection, documents: &[Document]) {
        self.ledger.replace(collection, documents);
    }

    // ── Cards ───────────────────────────────────────────────────────

    /// Add a card. Returns the id assigned by the store.
    pub async fn add_card(&self, draft: &CardDraft) -> Result<String, CoreError> {
        let fields = self.inventory_service.new_card(draft, today())?;
        self.report("add card", self.gateway.create(Collection::Cards, fields).await)
    }

    /// Apply a user action to a card. Status side effects are worked out
    /// against the card as last delivered by the store.
    pub async fn apply_intent(&self, card_id: &str, intent: CardIntent) -> Result<(), CoreError> {
        let update = self.inventory_service.card_update(
            self.ledger.card(card_id),
            intent.into_changes(),
            today(),
        )?;
        if update.is_empty() {
            return Ok(());
        }
        self.report(
            "update card",
            self.gateway
                .update(Collection::Cards, card_id, update.to_fields())
                .await,
        )
    }

    /// Edit any subset of a card's fields.
    pub async fn update_card(&self, card_id: &str, changes: CardChanges) -> Result<(), CoreError> {
        self.apply_intent(card_id, CardIntent::FullEdit(changes)).await
    }

    pub async fn delete_card(&self, card_id: &str) -> Result<(), CoreError> {
        self.report(
            "delete card",
            self.gateway.delete(Collection::Cards, card_id).await,
        )
    }

    // ── Supplies ────────────────────────────────────────────────────

    pub async fn add_supply(&self, draft: &SupplyDraft) -> Result<String, CoreError> {
        let fields = self.inventory_service.new_supply(draft)?;
        self.report("add supply", self.gateway.create(Collection::Supplies, fields).await)
    }

    /// Edit a supply. The total is re-derived whenever quantity or cost
    /// changes.
    pub async fn update_supply(
        &self,
        supply_id: &str,
        changes: &SupplyChanges,
    ) -> Result<(), CoreError> {
        let current = self.known_supply(supply_id)?;
        let fields = self.inventory_service.supply_update(current, changes)?;
        if fields.is_empty() {
            return Ok(());
        }
        self.report(
            "update supply",
            self.gateway
                .update(Collection::Supplies, supply_id, fields)
                .await,
        )
    }

    /// Move a supply's quantity by `delta` (the +/- buttons), never below zero.
    pub async fn adjust_supply_quantity(
        &self,
        supply_id: &str,
        delta: i64,
    ) -> Result<(), CoreError> {
        let current = self.known_supply(supply_id)?;
        let fields = self.inventory_service.adjust_quantity(current, delta);
        self.report(
            "adjust supply quantity",
            self.gateway
                .update(Collection::Supplies, supply_id, fields)
                .await,
        )
    }

    pub async fn delete_supply(&self, supply_id: &str) -> Result<(), CoreError> {
        self.report(
            "delete supply",
            self.gateway.delete(Collection::Supplies, supply_id).await,
        )
    }

    /// Seed the configured default supplies if the supply collection is
    /// empty. Returns how many were created (0 when supplies already exist).
    pub async fn bootstrap_default_supplies(&self) -> Result<usize, CoreError> {
        let existing = self.report(
            "list supplies",
            self.gateway.list_once(Collection::Supplies).await,
        )?;
        let seeds = self
            .inventory_service
            .seed_supplies(&existing, &self.settings.default_supplies);

        let mut created = 0;
        for fields in seeds {
            self.report(
                "seed supply",
                self.gateway.create(Collection::Supplies, fields).await,
            )?;
            created += 1;
        }
        if created > 0 {
            tracing::info!("seeded {created} default supplies");
        }
        Ok(created)
    }

    // ── Misc supplies ───────────────────────────────────────────────

    pub async fn add_misc_supply(&self, draft: &MiscSupplyDraft) -> Result<String, CoreError> {
        let fields = self.inventory_service.new_misc_supply(draft)?;
        self.report(
            "add misc supply",
            self.gateway.create(Collection::MiscSupplies, fields).await,
        )
    }

    pub async fn update_misc_supply(
        &self,
        misc_id: &str,
        changes: &MiscSupplyChanges,
    ) -> Result<(), CoreError> {
        let fields = self.inventory_service.misc_supply_update(changes)?;
        if fields.is_empty() {
            return Ok(());
        }
        self.report(
            "update misc supply",
            self.gateway
                .update(Collection::MiscSupplies, misc_id, fields)
                .await,
        )
    }

    pub async fn remove_misc_supply(&self, misc_id: &str) -> Result<(), CoreError> {
        self.report(
            "remove misc supply",
            self.gateway.delete(Collection::MiscSupplies, misc_id).await,
        )
    }

    // ── Totals & card list ──────────────────────────────────────────

    /// Profit/loss summary of the current snapshot.
    #[must_use]
    pub fn totals(&self) -> LedgerTotals {
        self.aggregation_service.totals(&self.ledger)
    }

    /// The visible page of the card list.
    #[must_use]
    pub fn current_page(&self) -> CardPage<'_> {
        self.view_service.view(&self.ledger.cards, &self.view)
    }

    /// Number of pages of the current tab and search.
    #[must_use]
    pub fn page_count(&self) -> usize {
        let matches = self
            .view_service
            .filter(&self.ledger.cards, self.view.tab, &self.view.search_term)
            .len();
        ViewService::page_count(matches, self.view.page_size)
    }

    #[must_use]
    pub fn view_params(&self) -> &ViewParams {
        &self.view
    }

    /// Restore previously saved list parameters.
    pub fn set_view_params(&mut self, params: ViewParams) {
        self.view = params;
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.view.set_tab(tab);
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.view.set_search_term(term);
    }

    pub fn select_sort(&mut self, field: SortField) {
        self.view.select_sort(field);
    }

    pub fn clear_sort(&mut self) {
        self.view.clear_sort();
    }

    /// Jump to a page, clamped to the pages that exist.
    pub fn go_to_page(&mut self, page: i64) {
        let page_count = self.page_count();
        self.view.go_to_page(page, page_count);
    }

    pub fn next_page(&mut self) {
        let page = self.current_page().page;
        self.go_to_page(page_number(page) + 1);
    }

    pub fn previous_page(&mut self) {
        let page = self.current_page().page;
        self.go_to_page(page_number(page) - 1);
    }

    // ── Lookups ─────────────────────────────────────────────────────

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.ledger.card(card_id)
    }

    #[must_use]
    pub fn supply(&self, supply_id: &str) -> Option<&Supply> {
        self.ledger.supply(supply_id)
    }

    #[must_use]
    pub fn misc_supply(&self, misc_id: &str) -> Option<&MiscSupply> {
        self.ledger.misc_supply(misc_id)
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Format an amount with the configured currency symbol.
    #[must_use]
    pub fn format_amount(&self, amount: f64) -> String {
        self.settings.format_amount(amount)
    }

    #[must_use]
    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn known_supply(&self, supply_id: &str) -> Result<&Supply, CoreError> {
        self.ledger
            .supply(supply_id)
            .ok_or_else(|| CoreError::NotFound {
                collection: Collection::Supplies.to_string(),
                id: supply_id.to_string(),
            })
    }

    /// Log a failed gateway call and pass the result through.
    fn report<T>(&self, action: &str, result: Result<T, CoreError>) -> Result<T, CoreError> {
        if let Err(e) = &result {
            tracing::warn!("{action} failed ({}): {e}", self.gateway.name());
        }
        result
    }
}

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn page_number(page: usize) -> i64 {
    i64::try_from(page).unwrap_or(i64::MAX)
}
