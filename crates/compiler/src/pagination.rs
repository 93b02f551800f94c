//! Page bounds for search documents.

use serde::{Deserialize, Serialize};

/// Page size used when a request names none.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Largest page size a request may ask for.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Requested page (1-based) and page size.
///
/// ```
/// use vista_compiler::pagination::Pagination;
///
/// let pagination = Pagination::new(Some(3), Some(50));
/// assert_eq!(pagination.from(), 100);
/// assert_eq!(pagination.size(), 50);
///
/// assert_eq!(Pagination::default().size(), 25);
/// assert_eq!(Pagination::new(None, Some(5000)).size(), 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    size: Option<usize>,
}

impl Pagination {
    /// Creates a pagination request.
    pub fn new(page: Option<usize>, size: Option<usize>) -> Self {
        Self { page, size }
    }

    /// Returns the page size, defaulted and clamped to `[1, MAX_PAGE_SIZE]`.
    pub fn size(&self) -> usize {
        self.size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Returns the requested page, if any. Page 0 is treated as page 1.
    pub fn page(&self) -> Option<usize> {
        self.page.map(|page| page.max(1))
    }

    /// Returns the offset of the first hit.
    pub fn from(&self) -> usize {
        self.page()
            .map(|page| (page - 1).saturating_mul(self.size()))
            .unwrap_or(0)
    }
}
