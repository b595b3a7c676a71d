//! Page arithmetic for listing endpoints
//!
//! Pages are 1-based. `skip = (page - 1) * amount`, `take = amount`, and the
//! page count is `ceil(total / amount)`. A page past the end is an empty
//! window, not an error.

use serde::{Deserialize, Serialize};

use crate::error::{AnnalsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    amount: i64,
    page: i64,
}

impl Pagination {
    pub fn new(amount: i64, page: i64) -> Result<Self> {
        if amount <= 0 {
            return Err(AnnalsError::InvalidPageSize(amount));
        }
        if page <= 0 {
            return Err(AnnalsError::InvalidPage(page));
        }
        Ok(Self { amount, page })
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn skip(&self) -> usize {
        let skip = (self.page - 1).saturating_mul(self.amount);
        usize::try_from(skip).unwrap_or(usize::MAX)
    }

    pub fn take(&self) -> usize {
        usize::try_from(self.amount).unwrap_or(usize::MAX)
    }

    pub fn total_pages(&self, total: usize) -> u64 {
        total_pages(total, self.take())
    }

    /// Cut this page out of an already ordered sequence.
    pub fn window<T>(&self, items: Vec<T>) -> PageWindow<T> {
        let total_pages = self.total_pages(items.len());
        let items = items
            .into_iter()
            .skip(self.skip())
            .take(self.take())
            .collect();
        PageWindow { total_pages, items }
    }
}

/// `ceil(total / amount)`; zero rows means zero pages.
pub fn total_pages(total: usize, amount: usize) -> u64 {
    if amount == 0 {
        return 0;
    }
    total.div_ceil(amount) as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow<T> {
    pub total_pages: u64,
    pub items: Vec<T>,
}

/// Validate `(amount, page)` and cut the window in one step.
pub fn paginate<T>(items: Vec<T>, amount: i64, page: i64) -> Result<PageWindow<T>> {
    Ok(Pagination::new(amount, page)?.window(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_amount() {
        assert!(matches!(
            Pagination::new(0, 1),
            Err(AnnalsError::InvalidPageSize(0))
        ));
        assert!(matches!(
            Pagination::new(-3, 1),
            Err(AnnalsError::InvalidPageSize(-3))
        ));
    }

    #[test]
    fn rejects_non_positive_page() {
        assert!(matches!(Pagination::new(10, 0), Err(AnnalsError::InvalidPage(0))));
    }

    #[test]
    fn second_page_of_five() {
        let window = paginate(vec![0, 1, 2, 3, 4], 2, 2).unwrap();
        assert_eq!(window.total_pages, 3);
        assert_eq!(window.items, vec![2, 3]);
    }

    #[test]
    fn last_page_is_partial() {
        let window = paginate(vec![0, 1, 2, 3, 4], 2, 3).unwrap();
        assert_eq!(window.total_pages, 3);
        assert_eq!(window.items, vec![4]);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let window = paginate(vec![0, 1, 2, 3, 4], 2, 4).unwrap();
        assert_eq!(window.total_pages, 3);
        assert!(window.items.is_empty());
    }

    #[test]
    fn huge_page_saturates() {
        let pagination = Pagination::new(i64::MAX, i64::MAX).unwrap();
        assert_eq!(pagination.skip() as u64, i64::MAX as u64);
        assert!(pagination.window(vec![1, 2, 3]).items.is_empty());
    }

    #[test]
    fn page_count_is_ceiling() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(1, 1), 1);
    }
}
