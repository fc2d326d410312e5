pub mod flashcard;
pub mod generation;
pub mod learning;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Pagination metadata shared by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64)
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }

    /// Row offset of the first item on `page` (pages are 1-based).
    pub fn offset(page: u32, limit: u32) -> i64 {
        (page.saturating_sub(1) as i64) * limit as i64
    }
}

/// Raw `?page=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// Returns `(page, limit)`: page >= 1, limit in 1..=100, defaults 1 and 20.
    pub fn validate(self) -> Result<(u32, u32), AppError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::invalid_field("page", "must be at least 1"));
        }
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(AppError::invalid_field(
                "limit",
                format!("must be between 1 and {MAX_PAGE_LIMIT}"),
            ));
        }
        Ok((page, limit))
    }
}
