#![allow(missing_docs)]

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};

use super::error::CatalogError;

/// Highest rated first.
pub const ORDER_BY_RATING: &str = "-rating";
/// Most added to user libraries first.
pub const ORDER_BY_ADDED: &str = "-added";

/// Page size used by search, trending and upcoming listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Inclusive release date range, sent as `dates=start,end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// January 1st through December 31st of `year`.
    pub fn calendar_year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Date windows behind the trending and upcoming listings.
///
/// Trending covers the current calendar year, upcoming the following one,
/// so the two never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWindows {
    pub trending: DateRange,
    pub upcoming: DateRange,
}

impl ReleaseWindows {
    /// Windows anchored on `year`.
    pub fn for_year(year: i32) -> Option<Self> {
        Some(Self {
            trending: DateRange::calendar_year(year)?,
            upcoming: DateRange::calendar_year(year.checked_add(1)?)?,
        })
    }

    /// Windows anchored on the local clock.
    pub fn current() -> Option<Self> {
        Self::for_year(Local::now().year())
    }
}

/// Parameters of a `/games` listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct GameQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub dates: Option<DateRange>,
}

impl Default for GameQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            ordering: Some(ORDER_BY_RATING.to_string()),
            dates: None,
        }
    }
}

impl GameQuery {
    /// First page of twenty, highest rated first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text search; the catalog's own relevance order is kept.
    pub fn text_search(query: impl Into<String>, page: u32) -> Self {
        Self {
            page,
            search: Some(query.into()),
            ordering: None,
            ..Self::default()
        }
    }

    /// Most-added games released inside `window`.
    pub fn released_within(window: DateRange, page: u32) -> Self {
        Self {
            page,
            ordering: Some(ORDER_BY_ADDED.to_string()),
            dates: Some(window),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn ordering(mut self, ordering: impl Into<String>) -> Self {
        self.ordering = Some(ordering.into());
        self
    }

    pub fn dates(mut self, dates: DateRange) -> Self {
        self.dates = Some(dates);
        self
    }

    /// Query string pairs, excluding the credential.
    ///
    /// Empty searches and orderings are left out rather than sent blank.
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>, CatalogError> {
        if self.page == 0 {
            return Err(CatalogError::InvalidQuery("page must be positive".into()));
        }
        if self.page_size == 0 {
            return Err(CatalogError::InvalidQuery(
                "page_size must be positive".into(),
            ));
        }

        let mut params = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(ordering) = self.ordering.as_deref().filter(|s| !s.is_empty()) {
            params.push(("ordering", ordering.to_string()));
        }
        if let Some(dates) = &self.dates {
            params.push(("dates", dates.to_string()));
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(params: &[(&str, String)], key: &str, value: &str) -> bool {
        params.iter().any(|(k, v)| *k == key && v == value)
    }

    #[test]
    fn default_query_omits_search() {
        let params = GameQuery::new().to_params().unwrap();
        assert!(has(&params, "page", "1"));
        assert!(has(&params, "page_size", "20"));
        assert!(has(&params, "ordering", "-rating"));
        assert!(!params.iter().any(|(k, _)| *k == "search"));
        assert!(!params.iter().any(|(k, _)| *k == "dates"));
    }

    #[test]
    fn empty_search_is_not_sent() {
        let params = GameQuery::new().search("").to_params().unwrap();
        assert!(!params.iter().any(|(k, _)| *k == "search"));
    }

    #[test]
    fn text_search_has_no_ordering() {
        let params = GameQuery::text_search("zelda", 3).to_params().unwrap();
        assert!(has(&params, "search", "zelda"));
        assert!(has(&params, "page", "3"));
        assert!(has(&params, "page_size", "20"));
        assert!(!params.iter().any(|(k, _)| *k == "ordering"));
    }

    #[test]
    fn release_window_query() {
        let window = DateRange::calendar_year(2024).unwrap();
        let params = GameQuery::released_within(window, 1).to_params().unwrap();
        assert!(has(&params, "dates", "2024-01-01,2024-12-31"));
        assert!(has(&params, "ordering", "-added"));
    }

    #[test]
    fn zero_page_or_size_is_rejected() {
        assert!(matches!(
            GameQuery::new().page(0).to_params(),
            Err(CatalogError::InvalidQuery(_))
        ));
        assert!(matches!(
            GameQuery::new().page_size(0).to_params(),
            Err(CatalogError::InvalidQuery(_))
        ));
    }

    #[test]
    fn release_windows_are_disjoint() {
        let windows = ReleaseWindows::for_year(2024).unwrap();
        assert_eq!(windows.trending.to_string(), "2024-01-01,2024-12-31");
        assert_eq!(windows.upcoming.to_string(), "2025-01-01,2025-12-31");
        assert!(windows.trending.end < windows.upcoming.start);
    }
}
