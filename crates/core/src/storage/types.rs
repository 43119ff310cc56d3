use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Backend-specific page boundary.
///
/// The key-value backend stores the last evaluated primary key here, the
/// relational backend the last row id. Callers only ever see it through an
/// opaque cursor (see [`crate::pagination::CursorCodec`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageMarker(BTreeMap<String, String>);

impl PageMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Page size and optional starting boundary of a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub after: Option<PageMarker>,
}

impl PageRequest {
    /// Creates a first-page request, clamping `limit` to `1..=MAX_PAGE_LIMIT`.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            after: None,
        }
    }

    /// Continues after the given boundary.
    pub fn after(mut self, marker: PageMarker) -> Self {
        self.after = Some(marker);
        self
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

/// One page of results plus the boundary to resume from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageMarker>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<PageMarker>) -> Self {
        Self { items, next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_limit() {
        assert_eq!(PageRequest::new(0).limit, 1);
        assert_eq!(PageRequest::new(50).limit, 50);
        assert_eq!(PageRequest::new(10_000).limit, MAX_PAGE_LIMIT);
        assert_eq!(PageRequest::default().limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_page_marker_accessors() {
        let marker = PageMarker::new().with("PK", "PRODUCT#1").with("SK", "DETAILS#1");
        assert_eq!(marker.get("PK"), Some("PRODUCT#1"));
        assert_eq!(marker.get("missing"), None);
        assert!(!marker.is_empty());
        assert!(PageMarker::new().is_empty());
    }

    #[test]
    fn test_page_marker_serializes_as_plain_map() {
        let marker = PageMarker::new().with("rowid", "42");
        assert_eq!(serde_json::to_string(&marker).unwrap(), r#"{"rowid":"42"}"#);
    }
}
