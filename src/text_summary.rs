//! Text summary builder for CLI output.
//!
//! Formats the rendered projections (table page, prediction panel, upload
//! outcome) as human-readable lines for text mode.

use crate::model::Locale;
use crate::submit::predict::PredictionPanel;
use crate::submit::upload::UploadOutcome;
use crate::table::PageView;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn page_summary(view: &PageView) -> TextSummary {
    let mut lines = Vec::new();

    let header: Vec<String> = view
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| match view.sort_glyph {
            Some(g) if view.sortable_column == Some(i) => format!("{c} {g}"),
            _ => c.clone(),
        })
        .collect();
    if !header.is_empty() {
        lines.push(header.join(" | "));
    }

    for row in &view.rows {
        let mut cells = vec![row.ordinal.to_string()];
        cells.extend(row.cells.iter().cloned());
        lines.push(cells.join(" | "));
    }

    if view.chrome.visible {
        let strip: Vec<String> = view
            .chrome
            .buttons
            .iter()
            .map(|b| {
                if b.active {
                    format!("[{}]", b.number)
                } else {
                    b.number.to_string()
                }
            })
            .collect();
        lines.push(format!(
            "{}  {} {} {}",
            view.chrome.info,
            if view.chrome.prev_disabled { " " } else { "<" },
            strip.join(" "),
            if view.chrome.next_disabled { " " } else { ">" },
        ));
    }

    TextSummary { lines }
}

pub(crate) fn prediction_summary(panel: &PredictionPanel, locale: Locale) -> TextSummary {
    let lines = match panel {
        PredictionPanel::Result {
            prediction,
            label,
            description,
            color,
            ..
        } => {
            let heading = match locale {
                Locale::En => "Prediction",
                Locale::Ru => "Предсказание",
            };
            vec![
                format!("{heading}: {prediction} ({label}, {color})"),
                description.clone(),
            ]
        }
        PredictionPanel::Error { message } => vec![message.clone()],
    };
    TextSummary { lines }
}

pub(crate) fn upload_summary(outcome: &UploadOutcome) -> TextSummary {
    let lines = match outcome {
        UploadOutcome::Navigate { target } => vec![format!("Redirect: {target}")],
        UploadOutcome::Error(banner) => vec![format!("Error: {}", banner.message)],
    };
    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{store_with_levels, ResultsTable};

    #[test]
    fn page_summary_marks_active_page() {
        let mut table = ResultsTable::new(store_with_levels(&vec![1; 31]), Locale::En);
        table.render_page(2);
        let summary = page_summary(&table.view());
        assert_eq!(summary.lines[0], "# | Name | Stress");
        assert_eq!(summary.lines[1], "16 | r15 | 1");
        let footer = summary.lines.last().unwrap();
        assert!(footer.starts_with("Showing 16-30 of 31 records"));
        assert!(footer.contains("1 [2] 3"));
    }

    #[test]
    fn small_tables_have_no_footer() {
        let table = ResultsTable::new(store_with_levels(&[0, 2]), Locale::En);
        let summary = page_summary(&table.view());
        assert_eq!(summary.lines.len(), 3);
    }
}
