use crate::error::{Result, WorkflowError};

pub const MAX_LIMIT: u32 = 10;

/// A validated page request: `page >= 1`, `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u32,
    limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Result<Self> {
        if page < 1 {
            return Err(WorkflowError::ValidationFailed("page must be at least 1".into()));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(WorkflowError::ValidationFailed(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_starts_at_zero() {
        let page = Page::new(1, 10).unwrap();
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(Page::new(3, 4).unwrap().offset(), 8);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Page::new(0, 5).is_err());
        assert!(Page::new(1, 0).is_err());
        assert!(Page::new(1, 11).is_err());
    }
}
