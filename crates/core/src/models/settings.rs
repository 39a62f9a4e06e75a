use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::supply::{default_supplies, SupplyDraft};
use super::view::DEFAULT_PAGE_SIZE;

/// Library configuration.
///
/// Every field has a default, so a partial JSON document (or `{}`) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Symbol used when formatting amounts (e.g., "$", "€").
    pub currency_symbol: String,

    /// Cards per page in the card list.
    pub page_size: usize,

    /// Supplies seeded into an empty supply collection.
    pub default_supplies: Vec<SupplyDraft>,

    /// Remote document store. Without it an in-memory store is used.
    pub firestore: Option<FirestoreSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            default_supplies: default_supplies(),
            firestore: None,
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Malformed settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file on disk.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.page_size == 0 {
            return Err(CoreError::Config("page_size must be at least 1".into()));
        }
        for supply in &self.default_supplies {
            if supply.name.trim().is_empty() {
                return Err(CoreError::Config("default supply names must not be empty".into()));
            }
            if !supply.cost.is_finite() || supply.cost < 0.0 {
                return Err(CoreError::Config(format!(
                    "default supply '{}' has an invalid cost: {}",
                    supply.name, supply.cost
                )));
            }
        }
        if let Some(firestore) = &self.firestore {
            firestore.validate()?;
        }
        Ok(())
    }

    /// Format an amount with the configured currency symbol and two decimals.
    #[must_use]
    pub fn format_amount(&self, amount: f64) -> String {
        if amount < 0.0 {
            format!("-{}{:.2}", self.currency_symbol, -amount)
        } else {
            format!("{}{:.2}", self.currency_symbol, amount)
        }
    }
}

/// Connection settings of the Firestore REST adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirestoreSettings {
    pub project_id: String,

    #[serde(default = "default_database")]
    pub database: String,

    /// Web API key, sent as the `key` query parameter.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// How often subscriptions re-read their collection.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FirestoreSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: default_database(),
            api_key: None,
            base_url: default_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Reject an empty project id or a zero poll interval.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.project_id.trim().is_empty() {
            return Err(CoreError::Config("firestore.project_id must not be empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(CoreError::Config(
                "firestore.poll_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}
