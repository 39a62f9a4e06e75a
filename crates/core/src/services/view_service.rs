use std::cmp::Ordering;

use chrono::NaiveDate;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::models::card::Card;
use crate::models::view::{clamp_page, CardPage, SortDirection, SortField, Tab, ViewParams};

/// Derives the visible card list: filter → sort → paginate.
///
/// Pure business logic over a card snapshot and a `ViewParams` value.
pub struct ViewService;

impl ViewService {
    pub fn new() -> Self {
        Self
    }

    /// Full pipeline for the given parameters.
    pub fn view<'a>(&self, cards: &'a [Card], params: &ViewParams) -> CardPage<'a> {
        let mut visible = self.filter(cards.iter(), params.tab, &params.search_term);
        if let Some(field) = params.sort_field {
            self.sort(&mut visible, field, params.sort_direction);
        }
        let requested = i64::try_from(params.page).unwrap_or(i64::MAX);
        self.paginate(visible, requested, params.page_size)
    }

    /// Cards listed under `tab` whose name contains `search_term`,
    /// ignoring case. An empty term matches every card.
    pub fn filter<'a>(
        &self,
        cards: impl IntoIterator<Item = &'a Card>,
        tab: Tab,
        search_term: &str,
    ) -> Vec<&'a Card> {
        let status = tab.status();
        let needle = search_term.to_lowercase();
        cards
            .into_iter()
            .filter(|c| c.status == status && c.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Stable sort by `field`. Descending inverts the comparator, so cards
    /// that compare equal keep their relative order in both directions.
    /// Reversing an ascending result therefore matches a descending one on
    /// sort keys, but not on the order of tied cards.
    pub fn sort(&self, cards: &mut [&Card], field: SortField, direction: SortDirection) {
        cards.sort_by(|a, b| {
            let ord = compare_by(a, b, field);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }

    /// Slice out one 1-indexed page, clamping `requested` to the pages that
    /// exist.
    pub fn paginate<'a>(
        &self,
        cards: Vec<&'a Card>,
        requested: i64,
        page_size: usize,
    ) -> CardPage<'a> {
        let page_size = page_size.max(1);
        let total_matches = cards.len();
        let page_count = Self::page_count(total_matches, page_size);
        let page = clamp_page(requested, page_count);

        let start = ((page - 1) * page_size).min(total_matches);
        let end = (start + page_size).min(total_matches);

        CardPage {
            cards: cards[start..end].to_vec(),
            page,
            page_count,
            total_matches,
            page_size,
        }
    }

    /// `ceil(count / page_size)`
    #[must_use]
    pub fn page_count(count: usize, page_size: usize) -> usize {
        count.div_ceil(page_size.max(1))
    }
}

impl Default for ViewService {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_by(a: &Card, b: &Card, field: SortField) -> Ordering {
    match field {
        SortField::Name => compare_names(&a.name, &b.name),
        SortField::BoughtFor => a.bought_for.total_cmp(&b.bought_for),
        SortField::SoldFor => a.sold_for.total_cmp(&b.sold_for),
        SortField::Profit => a.profit().total_cmp(&b.profit()),
        SortField::DateBought => sort_date(a.date_bought).cmp(&sort_date(b.date_bought)),
        SortField::DateSold => sort_date(a.date_sold).cmp(&sort_date(b.date_sold)),
    }
}

/// Missing dates sort as the Unix epoch.
fn sort_date(date: Option<NaiveDate>) -> NaiveDate {
    date.or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1))
        .unwrap_or(NaiveDate::MIN)
}

/// Locale-style name order: accents and case only break ties.
/// "émile" sorts with "Emile", and both before "Zed".
fn compare_names(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn fold(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
