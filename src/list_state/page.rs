use super::ListStateError;

/// Page size used when the URL carries no `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// One-based page position and page size. Both are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageState {
    page: u32,
    page_size: u32,
}

impl PageState {
    /// # Errors
    ///
    /// Returns [`ListStateError::InvalidPage`] or
    /// [`ListStateError::InvalidPageSize`] for zero values.
    pub fn new(page: u32, page_size: u32) -> Result<Self, ListStateError> {
        if page == 0 {
            return Err(ListStateError::InvalidPage(page));
        }
        if page_size == 0 {
            return Err(ListStateError::InvalidPageSize(page_size));
        }
        Ok(Self { page, page_size })
    }

    /// The first page of `page_size` items. A zero size falls back to 1.
    #[must_use]
    pub const fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: if page_size == 0 { 1 } else { page_size },
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Zero-based index of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    /// Number of pages needed for `total` items.
    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size as u64)
    }

    /// Reads `page` and `limit` URL values. Malformed or zero values fall
    /// back to the first page and the default size.
    pub(crate) fn from_params(page: Option<&str>, limit: Option<&str>, default_size: u32) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<u32>().ok()).filter(|n| *n > 0);
        Self {
            page: parse(page).unwrap_or(1),
            page_size: parse(limit).unwrap_or(Self::first(default_size).page_size),
        }
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}
