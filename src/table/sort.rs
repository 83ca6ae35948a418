use super::Row;
use serde::Serialize;
use std::cmp::Reverse;

/// Sort direction of the single sortable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortState {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortState {
    /// Next state on activation. `None` is never re-entered.
    pub fn toggled(self) -> Self {
        match self {
            SortState::None | SortState::Descending => SortState::Ascending,
            SortState::Ascending => SortState::Descending,
        }
    }

    pub fn glyph(self) -> Option<char> {
        match self {
            SortState::None => None,
            SortState::Ascending => Some('↑'),
            SortState::Descending => Some('↓'),
        }
    }
}

/// Stable reorder by stress level; ties keep their current relative order.
pub(super) fn apply(rows: &mut [Row], state: SortState) {
    match state {
        SortState::None => {}
        SortState::Ascending => rows.sort_by_key(|r| r.stress_level),
        SortState::Descending => rows.sort_by_key(|r| Reverse(r.stress_level)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_never_returns_to_none() {
        let mut s = SortState::None;
        let seen: Vec<SortState> = (0..4)
            .map(|_| {
                s = s.toggled();
                s
            })
            .collect();
        assert_eq!(
            seen,
            vec![
                SortState::Ascending,
                SortState::Descending,
                SortState::Ascending,
                SortState::Descending
            ]
        );
    }

    #[test]
    fn single_row_is_unchanged() {
        let mut rows = crate::table::store_with_levels(&[2]).rows;
        let before = rows.clone();
        apply(&mut rows, SortState::Descending);
        assert_eq!(rows, before);
    }
}
