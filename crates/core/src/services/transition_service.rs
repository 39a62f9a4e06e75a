use chrono::NaiveDate;

use crate::models::card::{Card, CardChanges, CardStatus, CardUpdate};

/// Turns a proposed card edit into the update that gets persisted, keeping
/// `is_sold` and `date_sold` consistent with the status.
///
/// Pure: no I/O. The date used for defaults is passed in by the caller.
pub struct TransitionService;

impl TransitionService {
    pub fn new() -> Self {
        Self
    }

    /// Apply status side effects to `changes`.
    ///
    /// When the status changes:
    /// - `is_sold` is set to `status == Sold`.
    /// - Into `Sold` without an explicit sold date: the current card's date is
    ///   kept if it has one, otherwise `today` is used.
    /// - Into any other status: the sold date is cleared, even if one was
    ///   supplied.
    ///
    /// Without a status change, a sold date supplied for a card known not to
    /// be sold is cleared. Every other field passes through untouched.
    pub fn apply(
        &self,
        current: Option<&Card>,
        mut changes: CardChanges,
        today: NaiveDate,
    ) -> CardUpdate {
        let is_sold = match changes.status {
            Some(CardStatus::Sold) => {
                if changes.explicit_date_sold().is_none() {
                    let has_date = current.and_then(|c| c.date_sold).is_some();
                    changes.date_sold = if has_date { None } else { Some(Some(today)) };
                }
                Some(true)
            }
            Some(_) => {
                changes.date_sold = Some(None);
                Some(false)
            }
            None => {
                if let (Some(card), Some(Some(_))) = (current, changes.date_sold) {
                    if card.status != CardStatus::Sold {
                        changes.date_sold = Some(None);
                    }
                }
                None
            }
        };

        CardUpdate::new(changes, is_sold)
    }
}

impl Default for TransitionService {
    fn default() -> Self {
        Self::new()
    }
}

