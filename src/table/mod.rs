//! Results table model.
//!
//! The table is an explicit in-memory model: a [`RowStore`] captured once from the
//! server-rendered page, plus page and sort state. Every mutation goes through
//! [`ResultsTable`], which re-renders the projection in the same call so that
//! the visible state never lags the logical state.

mod capture;
mod pagination;
mod sort;

pub use capture::capture;
use pagination::{total_pages, PageState};
pub use pagination::PaginationChrome;
pub use sort::SortState;

use crate::model::Locale;
use serde::Serialize;

/// One captured result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// Capture position; the row's identity.
    pub id: usize,
    /// Cells after the ordinal column, as rendered by the server.
    pub cells: Vec<String>,
    pub stress_level: i64,
    /// Displayed ordinal. Only rewritten while the row is visible.
    pub ordinal: usize,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowStore {
    /// Header captions, including the ordinal column.
    pub columns: Vec<String>,
    /// Index into `columns` of the single sortable header.
    pub sortable_column: Option<usize>,
    pub rows: Vec<Row>,
}

impl RowStore {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Snapshot of what the table shows, for text/JSON output and rendering.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub columns: Vec<String>,
    pub sortable_column: Option<usize>,
    pub sort: SortState,
    pub sort_glyph: Option<char>,
    pub rows: Vec<VisibleRow>,
    pub chrome: PaginationChrome,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisibleRow {
    pub ordinal: usize,
    pub stress_level: i64,
    pub cells: Vec<String>,
}

/// Row store plus page/sort state for one loaded results page.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    store: RowStore,
    page: PageState,
    sort: SortState,
    chrome: PaginationChrome,
    locale: Locale,
}

impl ResultsTable {
    /// Take ownership of a freshly captured store and render page 1.
    pub fn new(store: RowStore, locale: Locale) -> Self {
        let mut table = Self {
            store,
            page: PageState::default(),
            sort: SortState::None,
            chrome: PaginationChrome::default(),
            locale,
        };
        table.render_page(1);
        table
    }

    pub fn render_page(&mut self, requested: i64) {
        self.chrome = pagination::render_page(&mut self.store, &mut self.page, requested, self.locale);
    }

    pub fn previous(&mut self) {
        if !self.chrome.prev_disabled {
            self.render_page(self.page.current as i64 - 1);
        }
    }

    pub fn next(&mut self) {
        if !self.chrome.next_disabled {
            self.render_page(self.page.current as i64 + 1);
        }
    }

    /// Activate the page-strip button at `index` (0-based, left to right).
    pub fn activate_button(&mut self, index: usize) {
        let Some(button) = self.chrome.buttons.get(index) else {
            return;
        };
        if button.disabled {
            return;
        }
        let page = button.number;
        self.render_page(page as i64);
    }

    /// Header activation. Only the sortable column reacts.
    pub fn activate_header(&mut self, column: usize) {
        if self.store.sortable_column == Some(column) {
            self.toggle_sort();
        }
    }

    pub fn toggle_sort(&mut self) {
        self.sort = self.sort.toggled();
        sort::apply(&mut self.store.rows, self.sort);
        self.render_page(1);
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    #[cfg(test)]
    pub fn current_page(&self) -> usize {
        self.page.current
    }

    #[cfg(test)]
    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    #[cfg(test)]
    pub fn chrome(&self) -> &PaginationChrome {
        &self.chrome
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.store.rows.iter().filter(|r| r.visible)
    }

    pub fn view(&self) -> PageView {
        PageView {
            page: self.page.current,
            total_pages: total_pages(self.store.len()).max(1),
            total_records: self.store.len(),
            columns: self.store.columns.clone(),
            sortable_column: self.store.sortable_column,
            sort: self.sort,
            sort_glyph: self.sort.glyph(),
            rows: self
                .visible_rows()
                .map(|r| VisibleRow {
                    ordinal: r.ordinal,
                    stress_level: r.stress_level,
                    cells: r.cells.clone(),
                })
                .collect(),
            chrome: self.chrome.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn store_with_levels(levels: &[i64]) -> RowStore {
    RowStore {
        columns: vec!["#".into(), "Name".into(), "Stress".into()],
        sortable_column: Some(2),
        rows: levels
            .iter()
            .enumerate()
            .map(|(i, &lvl)| Row {
                id: i,
                cells: vec![format!("r{i}"), lvl.to_string()],
                stress_level: lvl,
                ordinal: i + 1,
                visible: true,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(table: &ResultsTable) -> Vec<usize> {
        table.store().rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn small_store_hides_chrome_and_shows_all_rows() {
        let table = ResultsTable::new(store_with_levels(&[2, 0, 1]), Locale::En);
        assert!(!table.chrome().visible);
        assert_eq!(table.visible_rows().count(), 3);
        assert_eq!(table.chrome().info, "Showing 1-3 of 3 records");
    }

    #[test]
    fn sort_cycles_asc_desc_asc_and_resets_page() {
        let levels: Vec<i64> = (0..40).map(|i| [2, 0, 1][i % 3]).collect();
        let mut table = ResultsTable::new(store_with_levels(&levels), Locale::En);
        table.render_page(3);
        assert_eq!(table.current_page(), 3);

        table.toggle_sort();
        assert_eq!(table.sort_state(), SortState::Ascending);
        assert_eq!(table.view().sort_glyph, Some('↑'));
        assert_eq!(table.current_page(), 1);
        let asc: Vec<i64> = table.store().rows.iter().map(|r| r.stress_level).collect();
        assert!(asc.windows(2).all(|w| w[0] <= w[1]));

        table.render_page(2);
        table.toggle_sort();
        assert_eq!(table.sort_state(), SortState::Descending);
        assert_eq!(table.view().sort_glyph, Some('↓'));
        assert_eq!(table.current_page(), 1);
        let desc: Vec<i64> = table.store().rows.iter().map(|r| r.stress_level).collect();
        assert!(desc.windows(2).all(|w| w[0] >= w[1]));

        table.toggle_sort();
        assert_eq!(table.sort_state(), SortState::Ascending);
    }

    #[test]
    fn ties_keep_prior_relative_order() {
        let mut table = ResultsTable::new(store_with_levels(&[1, 0, 1, 0, 1]), Locale::En);
        table.toggle_sort();
        assert_eq!(ids(&table), vec![1, 3, 0, 2, 4]);
        table.toggle_sort();
        // Descending is applied to the ascending order, ties stay as they were.
        assert_eq!(ids(&table), vec![0, 2, 4, 1, 3]);
    }

    #[test]
    fn ordinals_follow_current_order() {
        let levels: Vec<i64> = (0..20).map(|i| (i % 3) as i64).collect();
        let mut table = ResultsTable::new(store_with_levels(&levels), Locale::En);
        table.toggle_sort();
        table.render_page(2);
        let ordinals: Vec<usize> = table.visible_rows().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, (16..=20).collect::<Vec<_>>());
    }

    #[test]
    fn non_sortable_header_is_ignored() {
        let mut table = ResultsTable::new(store_with_levels(&[2, 1, 0]), Locale::En);
        table.activate_header(1);
        assert_eq!(table.sort_state(), SortState::None);
        assert_eq!(ids(&table), vec![0, 1, 2]);
        table.activate_header(2);
        assert_eq!(table.sort_state(), SortState::Ascending);
    }

    #[test]
    fn prev_next_and_buttons_navigate() {
        let mut table = ResultsTable::new(store_with_levels(&vec![0; 100]), Locale::En);
        table.previous();
        assert_eq!(table.current_page(), 1);
        table.next();
        assert_eq!(table.current_page(), 2);
        // Strip for page 2 of 7 is 1..=5; button index 4 is page 5.
        table.activate_button(4);
        assert_eq!(table.current_page(), 5);
        table.activate_button(42);
        assert_eq!(table.current_page(), 5);
        table.render_page(7);
        table.next();
        assert_eq!(table.current_page(), 7);
    }

    #[test]
    fn empty_store_is_a_single_empty_page() {
        let mut table = ResultsTable::new(RowStore::default(), Locale::En);
        table.toggle_sort();
        let view = table.view();
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 1);
        assert!(view.rows.is_empty());
        assert!(view.chrome.prev_disabled && view.chrome.next_disabled);
        assert!(!view.chrome.visible);
    }
}
