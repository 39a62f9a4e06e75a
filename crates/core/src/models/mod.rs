pub mod card;
pub mod document;
pub mod ledger;
pub mod misc_supply;
pub mod settings;
pub mod supply;
pub mod totals;
pub mod view;
