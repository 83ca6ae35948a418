//! Results page loading.
//!
//! Navigating to a results page discards the previous table: the new page is
//! fetched and its rows captured into a fresh store.

use crate::submit::Transport;
use crate::table::{self, RowStore};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Where a results page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageSource {
    /// URL or path resolved against the endpoint.
    Remote(String),
    Local(PathBuf),
}

impl PageSource {
    /// Interpret a command-line argument: http(s) URLs are remote, anything else is a file.
    pub(crate) fn from_arg(arg: &str) -> Self {
        let lower = arg.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            PageSource::Remote(arg.to_string())
        } else {
            PageSource::Local(PathBuf::from(arg))
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            PageSource::Remote(url) => url.clone(),
            PageSource::Local(path) => path.display().to_string(),
        }
    }
}

/// Load a results page and capture its rows.
pub(crate) async fn load_page<T: Transport>(
    transport: &T,
    source: &PageSource,
) -> Result<Option<RowStore>> {
    let document = match source {
        PageSource::Remote(target) => {
            let resp = transport
                .get_page(target)
                .await
                .with_context(|| format!("fetch results page {target}"))?;
            if !resp.is_success() {
                bail!("results page {target} returned HTTP {}", resp.status);
            }
            resp.body
        }
        PageSource::Local(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read results page {}", path.display()))?,
    };
    Ok(table::capture(&document))
}
