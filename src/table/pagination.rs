use super::RowStore;
use crate::model::Locale;
use serde::Serialize;
use std::ops::RangeInclusive;

pub const RECORDS_PER_PAGE: usize = 15;
/// Maximum number of page-number buttons in the strip.
const MAX_PAGE_BUTTONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub current: usize,
    pub records_per_page: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            current: 1,
            records_per_page: RECORDS_PER_PAGE,
        }
    }
}

/// Page-control affordances for the current render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationChrome {
    /// Whether the pagination region is shown at all.
    pub visible: bool,
    pub info: String,
    pub prev_disabled: bool,
    pub next_disabled: bool,
    pub buttons: Vec<PageButton>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageButton {
    pub number: usize,
    pub active: bool,
    pub disabled: bool,
}

pub fn total_pages(total_records: usize) -> usize {
    total_records.div_ceil(RECORDS_PER_PAGE)
}

/// Contiguous page numbers for the strip, centred on `current` where possible.
pub fn page_window(current: usize, total_pages: usize) -> RangeInclusive<usize> {
    let total_pages = total_pages.max(1);
    let mut start = current.saturating_sub(MAX_PAGE_BUTTONS / 2).max(1);
    let end = (start + MAX_PAGE_BUTTONS - 1).min(total_pages);
    if end - start < MAX_PAGE_BUTTONS - 1 {
        start = end.saturating_sub(MAX_PAGE_BUTTONS - 1).max(1);
    }
    start..=end
}

/// Clamp `requested`, update row visibility/ordinals and return the new chrome.
pub(super) fn render_page(
    store: &mut RowStore,
    state: &mut PageState,
    requested: i64,
    locale: Locale,
) -> PaginationChrome {
    let total = store.len();
    let pages = total_pages(total).max(1);
    let page = requested.clamp(1, pages as i64) as usize;
    state.current = page;

    let start = (page - 1) * state.records_per_page;
    let end = page * state.records_per_page;

    for (index, row) in store.rows.iter_mut().enumerate() {
        if (start..end).contains(&index) {
            row.visible = true;
            row.ordinal = index + 1;
        } else {
            row.visible = false;
        }
    }

    let buttons = page_window(page, pages)
        .map(|number| PageButton {
            number,
            active: number == page,
            disabled: total == 0,
        })
        .collect();

    PaginationChrome {
        visible: total > state.records_per_page,
        info: locale.page_info(start + 1, end.min(total), total),
        prev_disabled: page == 1,
        next_disabled: page == pages,
        buttons,
    }
}
