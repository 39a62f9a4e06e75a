use serde::{Deserialize, Serialize};

use super::card::{Card, CardStatus};

/// Cards shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// The three card tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tab {
    /// Sold cards, with the supplies and summary panels
    #[serde(rename = "sales")]
    Sales,
    #[serde(rename = "forSale")]
    ForSale,
    #[serde(rename = "keeping")]
    Keeping,
}

impl Tab {
    /// The card status listed under this tab.
    #[must_use]
    pub fn status(&self) -> CardStatus {
        match self {
            Tab::Sales => CardStatus::Sold,
            Tab::ForSale => CardStatus::ForSale,
            Tab::Keeping => CardStatus::Keeping,
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tab::Sales => write!(f, "Sold"),
            Tab::ForSale => write!(f, "For Sale"),
            Tab::Keeping => write!(f, "Keeping"),
        }
    }
}

/// Column a card list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    BoughtFor,
    SoldFor,
    /// `sold_for - bought_for`, computed per card
    Profit,
    DateBought,
    DateSold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Everything the card list depends on besides the cards themselves.
///
/// A plain value: the view service is a pure function of
/// `(cards, ViewParams)`, and the parameters can be stored or restored freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewParams {
    pub tab: Tab,
    pub search_term: String,
    /// `None` keeps the order in which the store delivered the cards.
    pub sort_field: Option<SortField>,
    pub sort_direction: SortDirection,
    /// 1-indexed
    pub page: usize,
    pub page_size: usize,
}

impl ViewParams {
    pub fn new(page_size: usize) -> Self {
        Self {
            tab: Tab::Sales,
            search_term: String::new(),
            sort_field: None,
            sort_direction: SortDirection::Asc,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Switch tabs. The page resets since the old page may not exist.
    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.page = 1;
    }

    /// Change the search term. Always goes back to the first page.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    /// Column header click: the active field flips direction, any other
    /// field becomes active in ascending order.
    pub fn select_sort(&mut self, field: SortField) {
        if self.sort_field == Some(field) {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_field = Some(field);
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn clear_sort(&mut self) {
        self.sort_field = None;
        self.sort_direction = SortDirection::Asc;
    }

    /// Navigate to `requested`, clamped to the pages that exist.
    pub fn go_to_page(&mut self, requested: i64, page_count: usize) {
        self.page = clamp_page(requested, page_count);
    }
}

impl Default for ViewParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Clamp a requested page into `[1, page_count]`. With no pages at all the
/// result is 1.
#[must_use]
pub fn clamp_page(requested: i64, page_count: usize) -> usize {
    let last = i64::try_from(page_count).unwrap_or(i64::MAX).max(1);
    requested.clamp(1, last) as usize
}

/// One page of the filtered and sorted card list.
#[derive(Debug, Clone, PartialEq)]
pub struct CardPage<'a> {
    pub cards: Vec<&'a Card>,
    /// The page actually shown, after clamping
    pub page: usize,
    pub page_count: usize,
    /// Number of cards matching tab and search, across all pages
    pub total_matches: usize,
    pub page_size: usize,
}

impl CardPage<'_> {
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    /// Pagination controls are only shown when there is more than one page.
    #[must_use]
    pub fn needs_pagination(&self) -> bool {
        self.total_matches > self.page_size
    }
}
