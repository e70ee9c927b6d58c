//! Cursor pagination.
//!
//! Feeds page backwards by id (newest first); user listings page forwards by handle.

use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MIN_PAGE_SIZE: u64 = 1;
pub const MAX_PAGE_SIZE: u64 = 90;

/// Absent or zero selects the default; anything else is clamped to the allowed range.
pub fn normalize_page_size(requested: Option<i64>) -> u64 {
    match requested {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(n) if n < 0 => MIN_PAGE_SIZE,
        Some(n) => (n as u64).clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
    }
}

/// `last` items strictly older than the `before` id, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BackwardPage {
    pub last: u64,
    pub before: Option<i64>,
}

impl BackwardPage {
    pub fn new(last: Option<i64>, before: Option<i64>) -> Self {
        Self {
            last: normalize_page_size(last),
            before: before.filter(|id| *id > 0),
        }
    }
}

impl Default for BackwardPage {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// `first` items strictly after the `after` handle, in handle order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForwardPage {
    pub first: u64,
    pub after: Option<String>,
}

impl ForwardPage {
    pub fn new(first: Option<i64>, after: Option<String>) -> Self {
        Self {
            first: normalize_page_size(first),
            after: after
                .map(|handle| handle.trim().to_string())
                .filter(|handle| !handle.is_empty()),
        }
    }
}

impl Default for ForwardPage {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_defaults() {
        assert_eq!(normalize_page_size(None), 10);
        assert_eq!(normalize_page_size(Some(0)), 10);
    }

    #[test]
    fn test_page_size_clamps() {
        assert_eq!(normalize_page_size(Some(-5)), 1);
        assert_eq!(normalize_page_size(Some(1)), 1);
        assert_eq!(normalize_page_size(Some(45)), 45);
        assert_eq!(normalize_page_size(Some(90)), 90);
        assert_eq!(normalize_page_size(Some(1000)), 90);
    }

    #[test]
    fn test_cursors_are_sanitized() {
        assert_eq!(BackwardPage::new(Some(2), Some(0)).before, None);
        assert_eq!(BackwardPage::new(Some(2), Some(17)).before, Some(17));
        assert_eq!(ForwardPage::new(None, Some("  ".to_string())).after, None);
        assert_eq!(
            ForwardPage::new(None, Some(" bob ".to_string())).after.as_deref(),
            Some("bob")
        );
    }
}
