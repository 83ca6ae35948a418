//! Row capture from a server-rendered results page.

use super::{Row, RowStore};
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    tbody: Regex,
    tr: Regex,
    td: Regex,
    th: Regex,
    stress_level: Regex,
    sortable: Regex,
    sort_icon: Regex,
    tag: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static pattern");
        Patterns {
            tbody: re(r#"(?is)<tbody\b[^>]*\bid\s*=\s*["']results-tbody["'][^>]*>(.*?)</tbody>"#),
            tr: re(r"(?is)<tr\b([^>]*)>(.*?)</tr>"),
            td: re(r"(?is)<td\b[^>]*>(.*?)</td>"),
            th: re(r"(?is)<th\b([^>]*)>(.*?)</th>"),
            stress_level: re(r#"(?i)\bdata-stress-level\s*=\s*["']?\s*(-?\d+)"#),
            sortable: re(r#"(?i)\bclass\s*=\s*["'][^"']*\bsortable\b"#),
            sort_icon: re(r#"(?is)<span\b[^>]*\bsort-icon\b[^>]*>.*?</span>"#),
            tag: re(r"(?s)<[^>]+>"),
        }
    })
}

/// Capture the results rows of `document` in document order.
///
/// Returns `None` when the page has no results container; that is the normal
/// state before anything has been uploaded.
pub fn capture(document: &str) -> Option<RowStore> {
    let p = patterns();
    let body = p.tbody.captures(document)?;
    let body_match = body.get(0)?;
    let inner = body.get(1).map_or("", |m| m.as_str());

    let (columns, sortable_column) = capture_header(&document[..body_match.start()]);

    let rows = p
        .tr
        .captures_iter(inner)
        .enumerate()
        .map(|(id, tr)| {
            let attrs = tr.get(1).map_or("", |m| m.as_str());
            let mut cells: Vec<String> = p
                .td
                .captures_iter(tr.get(2).map_or("", |m| m.as_str()))
                .map(|td| cell_text(td.get(1).map_or("", |m| m.as_str())))
                .collect();
            let ordinal = if cells.is_empty() {
                id + 1
            } else {
                let first = cells.remove(0);
                first.parse().unwrap_or(id + 1)
            };
            let stress_level = match p
                .stress_level
                .captures(attrs)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok())
            {
                Some(level) => level,
                None => {
                    tracing::warn!(row = id, "row has no usable data-stress-level; treating as 0");
                    0
                }
            };
            Row {
                id,
                cells,
                stress_level,
                ordinal,
                visible: true,
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(rows = rows.len(), "captured results table");
    Some(RowStore {
        columns,
        sortable_column,
        rows,
    })
}

/// Header captions of the table enclosing the results body.
fn capture_header(before_body: &str) -> (Vec<String>, Option<usize>) {
    let p = patterns();
    let table_start = before_body
        .to_ascii_lowercase()
        .rfind("<table")
        .unwrap_or(0);
    let head = &before_body[table_start..];

    let mut sortable = None;
    let columns = p
        .th
        .captures_iter(head)
        .enumerate()
        .map(|(i, th)| {
            let attrs = th.get(1).map_or("", |m| m.as_str());
            if sortable.is_none() && p.sortable.is_match(attrs) {
                sortable = Some(i);
            }
            let inner = th.get(2).map_or("", |m| m.as_str());
            cell_text(&p.sort_icon.replace_all(inner, ""))
        })
        .collect();
    (columns, sortable)
}

fn cell_text(html: &str) -> String {
    let stripped = patterns().tag.replace_all(html, "");
    let text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<table class="summary"><tr><th>Ignored</th></tr></table>
<table class="results">
  <thead>
    <tr>
      <th>#</th>
      <th>Student</th>
      <th class="sortable" data-column="stress">Stress <span class="sort-icon">↕</span></th>
    </tr>
  </thead>
  <tbody id="results-tbody">
    <tr data-stress-level="2"><td>1</td><td>Ann &amp; Bob</td><td><span class="badge">High</span></td></tr>
    <tr data-stress-level="0"><td>2</td><td>Carl</td><td>Low</td></tr>
    <tr><td>3</td><td>Dee</td><td>?</td></tr>
  </tbody>
</table>
</body></html>"#;

    #[test]
    fn captures_rows_in_document_order() {
        let store = capture(PAGE).expect("results container");
        assert_eq!(store.columns, vec!["#", "Student", "Stress"]);
        assert_eq!(store.sortable_column, Some(2));
        let levels: Vec<i64> = store.rows.iter().map(|r| r.stress_level).collect();
        assert_eq!(levels, vec![2, 0, 0]);
        assert_eq!(store.rows[0].cells, vec!["Ann & Bob", "High"]);
        assert_eq!(store.rows[1].ordinal, 2);
    }

    #[test]
    fn page_without_results_is_silent() {
        assert!(capture("<html><body><form id=\"uploadForm\"></form></body></html>").is_none());
    }

    #[test]
    fn empty_body_is_a_valid_store() {
        let store = capture(r#"<table><tbody id="results-tbody">  </tbody></table>"#)
            .expect("results container");
        assert!(store.is_empty());
        assert_eq!(store.sortable_column, None);
    }
}
