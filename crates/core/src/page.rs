use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// Sort direction for paginated reads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A declarative read request: one page of a collection, optionally sorted
/// and filtered.
///
/// Page numbers are 1-based. The request is immutable once built; the
/// `with_*` methods consume and return a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sort_field: Option<String>,
    #[serde(default)]
    sort_direction: SortDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
}

impl PageRequest {
    /// Request page `page` (1-based) with at most `limit` items.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            sort_field: None,
            sort_direction: SortDirection::Asc,
            filter: None,
        }
    }

    /// Sort by `field` in `direction`.
    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = direction;
        self
    }

    /// Restrict results to entities matching `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Number of rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results plus the totals needed to render pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    /// `max(1, ceil(total_items / per_page))`.
    pub total_pages: u64,
    pub items: Vec<T>,
}

impl<T> PageResult<T> {
    /// Assemble a page, deriving `total_pages` from the totals.
    #[must_use]
    pub fn new(page: u32, per_page: u32, total_items: u64, items: Vec<T>) -> Self {
        Self {
            page,
            per_page,
            total_items,
            total_pages: total_pages(total_items, per_page),
            items,
        }
    }

    /// Convert the items while keeping the pagination totals.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<PageResult<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(PageResult {
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
            items,
        })
    }
}

fn total_pages(total_items: u64, per_page: u32) -> u64 {
    let per_page = u64::from(per_page.max(1));
    total_items.div_ceil(per_page).max(1)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
        assert_eq!(PageRequest::new(0, 25).offset(), 0);
    }

    #[test]
    fn empty_result_has_one_page() {
        let page: PageResult<()> = PageResult::new(1, 10, 0, vec![]);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(1, 1000), 1);
        assert_eq!(total_pages(2001, 1000), 3);
    }

    #[test]
    fn request_serializes_without_empty_options() {
        let req = PageRequest::new(2, 5);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"page": 2, "limit": 5, "sort_direction": "asc"}));
    }

    #[test]
    fn with_sort_sets_field_and_direction() {
        let req = PageRequest::new(1, 5).with_sort("name", SortDirection::Desc);
        assert_eq!(req.sort_field(), Some("name"));
        assert_eq!(req.sort_direction(), SortDirection::Desc);
    }

    #[test]
    fn try_map_keeps_totals() {
        let page = PageResult::new(2, 2, 5, vec![1, 2]);
        let mapped: PageResult<String> = page
            .try_map(|n| Ok::<_, std::convert::Infallible>(n.to_string()))
            .unwrap();
        assert_eq!(mapped.items, vec!["1", "2"]);
        assert_eq!(mapped.total_pages, 3);
        assert_eq!(mapped.total_items, 5);
    }
}
