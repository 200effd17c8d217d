//! Paging, sorting and filtering descriptors shared by every listing screen.
//!
//! [`PageQuery`] is the canonical request descriptor sent to a list endpoint
//! and [`PageResult`] is the envelope it answers with. Queries are only ever
//! derived through [`PageQuery::build`], which owns the page-reset and
//! filter-pairing rules.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used by the listing screens unless the view overrides it.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Page size used to pull a complete lookup list (e.g. countries for a select).
pub const LOOKUP_PAGE_SIZE: u32 = 99_999;

/// Errors raised while deriving a query. They never reach the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Sort direction of a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SortOrder {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("unknown sort order `{value}`")),
        }
    }
}

impl From<SortOrder> for String {
    fn from(value: SortOrder) -> Self {
        value.as_str().to_string()
    }
}

/// Canonical request descriptor for a list endpoint.
///
/// Serializes directly into the endpoint's query string; the filter pair is
/// omitted entirely when no filter is active.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_index: u32,
    pub page_size: u32,
    pub sort_column: String,
    pub sort_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_query: Option<String>,
}

/// Partial update applied to a [`PageQuery`].
///
/// Numeric fields are signed so that malformed view input can be rejected
/// instead of silently wrapping. `filter_query: Some("")` clears the filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryPatch {
    pub page_index: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_column: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filter_column: Option<String>,
    pub filter_query: Option<String>,
}

impl QueryPatch {
    /// Patch produced by a paginator click.
    pub fn page(page_index: i64, page_size: i64) -> Self {
        Self {
            page_index: Some(page_index),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Patch produced by a sortable header click.
    pub fn sort(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort_column: Some(column.into()),
            sort_order: Some(order),
            ..Self::default()
        }
    }

    /// Patch produced by the filter input.
    pub fn filter(column: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            filter_column: Some(column.into()),
            filter_query: Some(query.into()),
            ..Self::default()
        }
    }
}

fn invalid(message: impl Into<String>) -> QueryError {
    QueryError::InvalidQuery(message.into())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Filter text is sent as typed; only blank text clears the filter.
fn filter_text(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

impl PageQuery {
    /// Creates the query for the first page of a listing.
    pub fn first_page(
        page_size: u32,
        sort_column: impl Into<String>,
        sort_order: SortOrder,
    ) -> Result<Self, QueryError> {
        let sort_column = non_empty(sort_column.into()).ok_or_else(|| invalid("empty sort column"))?;
        if page_size == 0 {
            return Err(invalid("page size must be positive"));
        }
        Ok(Self {
            page_index: 0,
            page_size,
            sort_column,
            sort_order,
            filter_column: None,
            filter_query: None,
        })
    }

    /// Derives the next query from `self` and a partial update.
    ///
    /// The page index falls back to 0 whenever the filter, sort column or
    /// sort order differ from `self`; otherwise the requested (or current)
    /// index is kept.
    pub fn build(&self, patch: QueryPatch) -> Result<PageQuery, QueryError> {
        let page_size = match patch.page_size {
            Some(size) if size <= 0 => return Err(invalid(format!("page size {size}"))),
            Some(size) => u32::try_from(size).map_err(|_| invalid(format!("page size {size}")))?,
            None => self.page_size,
        };
        let requested_index = match patch.page_index {
            Some(index) if index < 0 => return Err(invalid(format!("page index {index}"))),
            Some(index) => {
                u32::try_from(index).map_err(|_| invalid(format!("page index {index}")))?
            }
            None => self.page_index,
        };

        let sort_column = match patch.sort_column {
            Some(column) => non_empty(column).ok_or_else(|| invalid("empty sort column"))?,
            None => self.sort_column.clone(),
        };
        let sort_order = patch.sort_order.unwrap_or(self.sort_order);

        let filter_query = match patch.filter_query {
            Some(query) => filter_text(query),
            None => self.filter_query.clone(),
        };
        let filter_column = match filter_query {
            Some(_) => Some(
                patch
                    .filter_column
                    .and_then(non_empty)
                    .or_else(|| self.filter_column.clone())
                    .ok_or_else(|| invalid("filter query without a filter column"))?,
            ),
            None => None,
        };

        let reshaped = filter_query != self.filter_query
            || filter_column != self.filter_column
            || sort_column != self.sort_column
            || sort_order != self.sort_order;

        Ok(PageQuery {
            page_index: if reshaped { 0 } else { requested_index },
            page_size,
            sort_column,
            sort_order,
            filter_column,
            filter_query,
        })
    }
}

/// Envelope returned by a list endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub page_index: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub sort_column: Option<String>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub filter_column: Option<String>,
    #[serde(default)]
    pub filter_query: Option<String>,
}

impl<T> PageResult<T> {
    /// Checks the envelope invariants, returning a description of the first
    /// one that does not hold.
    pub fn check(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("page size is zero".to_string());
        }
        if self.data.len() > self.page_size as usize {
            return Err(format!(
                "{} rows exceed page size {}",
                self.data.len(),
                self.page_size
            ));
        }
        let expected_pages = self.total_count.div_ceil(u64::from(self.page_size));
        if u64::from(self.total_pages) != expected_pages {
            return Err(format!(
                "total pages {} does not match {} rows of {}",
                self.total_pages, self.total_count, self.page_size
            ));
        }
        if self.total_count > 0 && self.page_index >= self.total_pages {
            return Err(format!(
                "page index {} is past the last page {}",
                self.page_index, self.total_pages
            ));
        }
        Ok(())
    }
}

fn get_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = (current_page + right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

/// Windowed, 1-based page links around the zero-based `page_index`.
/// `None` marks a gap.
pub fn page_links(total_pages: u32, page_index: u32) -> Vec<Option<usize>> {
    get_pages(total_pages as usize, page_index as usize + 1, 2, 2, 4, 2)
}
