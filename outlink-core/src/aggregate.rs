// Deduplication, ordering and indexing of audit results

use outlink_scanner::{AuditMode, AuditedLink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One line of the final table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub index: usize,
    /// Source page without its scheme
    pub page: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ResultRow {
    /// Cells in column order for `mode`
    pub fn cells(&self, mode: AuditMode) -> Vec<String> {
        let mut cells = vec![self.index.to_string(), self.page.clone(), self.link.clone()];
        if mode == AuditMode::Redirected {
            cells.push(self.redirect.clone().unwrap_or_default());
        }
        cells
    }
}

pub fn columns_for(mode: AuditMode) -> Vec<String> {
    let mut columns = vec!["№".to_string(), "Page".to_string(), "Link".to_string()];
    if mode == AuditMode::Redirected {
        columns.push("Final redirect".to_string());
    }
    columns
}

/// Authority and path of a URL, without scheme, query or fragment.
/// Input that has no scheme is taken to be stripped already.
pub fn strip_scheme(url: &str) -> String {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    rest[..end].to_string()
}

/// Collapses links whose source pages differ only by scheme. The set is
/// ordered by stripped page, then link, then redirect target.
pub fn remove_duplicates<I>(links: I) -> BTreeSet<AuditedLink>
where
    I: IntoIterator<Item = AuditedLink>,
{
    links
        .into_iter()
        .map(|link| AuditedLink {
            page: strip_scheme(&link.page),
            ..link
        })
        .collect()
}

/// Numbers rows from 1 in iteration order.
pub fn add_indexes<I>(sorted: I) -> Vec<ResultRow>
where
    I: IntoIterator<Item = AuditedLink>,
{
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, link)| ResultRow {
            index: i + 1,
            page: link.page,
            link: link.target,
            redirect: link.redirect,
        })
        .collect()
}

pub fn aggregate<I>(links: I) -> Vec<ResultRow>
where
    I: IntoIterator<Item = AuditedLink>,
{
    add_indexes(remove_duplicates(links))
}
