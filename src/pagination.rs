pub const MIN_PAGE: usize = 6;
pub const MAX_PAGE: usize = 12;
pub const PAGE_STEP: usize = 6;

/// Number of matched postings currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    visible: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { visible: MIN_PAGE }
    }
}

impl Pagination {
    pub fn visible(&self) -> usize {
        self.visible
    }

    /// Called whenever the result set changes.
    pub fn reset(&mut self, match_count: usize) {
        self.visible = match_count.clamp(MIN_PAGE, MAX_PAGE);
    }

    pub fn load_more(&mut self, match_count: usize) {
        self.visible = (self.visible + PAGE_STEP).min(match_count).max(MIN_PAGE);
    }

    pub fn has_more(&self, match_count: usize) -> bool {
        match_count > self.visible
    }

    pub fn shown(&self, match_count: usize) -> usize {
        self.visible.min(match_count)
    }
}
