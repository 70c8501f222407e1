use serde::Serialize;

use crate::core::config::PaginationSettings;

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total: i64,
    pub(crate) page: i64,
    pub(crate) page_size: i64,
}

impl<T> PaginatedResponse<T> {
    pub(crate) fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self { items, total, page: page.page, page_size: page.page_size }
    }
}

/// A normalized 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Page {
    pub(crate) page: i64,
    pub(crate) page_size: i64,
}

impl Page {
    pub(crate) fn offset(self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub(crate) fn limit(self) -> i64 {
        self.page_size
    }
}

/// Missing or non-positive values fall back to page 1 and the default
/// size; sizes above the maximum are capped.
pub(crate) fn normalize(
    page: Option<i64>,
    page_size: Option<i64>,
    settings: PaginationSettings,
) -> Page {
    let page = page.filter(|page| *page >= 1).unwrap_or(1);
    let page_size = page_size
        .filter(|size| *size >= 1)
        .unwrap_or(settings.default_page_size)
        .min(settings.max_page_size);
    Page { page, page_size }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: PaginationSettings =
        PaginationSettings { default_page_size: 10, max_page_size: 100 };

    #[test]
    fn zero_values_match_defaults() {
        assert_eq!(normalize(Some(0), Some(0), SETTINGS), normalize(Some(1), Some(10), SETTINGS));
        assert_eq!(normalize(None, None, SETTINGS), Page { page: 1, page_size: 10 });
    }

    #[test]
    fn size_is_capped_and_offset_computed() {
        let page = normalize(Some(3), Some(500), SETTINGS);
        assert_eq!(page, Page { page: 3, page_size: 100 });
        assert_eq!(page.offset(), 200);
        assert_eq!(normalize(Some(-4), Some(-1), SETTINGS).offset(), 0);
    }
}
