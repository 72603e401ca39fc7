use crate::DEFAULT_LOG_PAGE_SIZE;

/// Page position over a server-side paginated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogPager {
    page: u64,
    count: u64,
    page_size: u64,
}

impl Default for LogPager {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PAGE_SIZE)
    }
}

impl LogPager {
    /// A zero page size is treated as one.
    pub fn new(page_size: u64) -> Self {
        Self {
            page: 1,
            count: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Never below one, even for an empty list.
    pub fn total_pages(&self) -> u64 {
        pages_for(self.count, self.page_size)
    }

    /// Records the row count reported by the backend for the current query.
    pub fn set_count(&mut self, count: u64) {
        self.count = count;
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Moves to `page`, clamped to the known page range. Returns whether it moved.
    pub fn go_to(&mut self, page: u64) -> bool {
        let target = page.clamp(1, self.total_pages());
        let moved = target != self.page;
        self.page = target;
        moved
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.page.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        self.go_to(self.page.saturating_sub(1))
    }

    /// Applies a successful single-row deletion.
    ///
    /// When the removed row was the last one of the trailing page, the page
    /// steps back to the new last page so the view never lands on an empty page.
    pub fn after_delete(&mut self) {
        self.count = self.count.saturating_sub(1);
        let total_pages = self.total_pages();
        if self.page > total_pages {
            self.page = total_pages;
        }
    }
}

fn pages_for(count: u64, page_size: u64) -> u64 {
    count.div_ceil(page_size).max(1)
}
