use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::SchedulingError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page size must be positive, got {0}")]
    InvalidPageSize(i64),
}

impl From<PaginationError> for SchedulingError {
    fn from(error: PaginationError) -> Self {
        SchedulingError::InvalidArgument(error.to_string())
    }
}

/// Row window handed to storage. `offset` is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageWindow {
    pub page: i64,
    pub page_size: i64,
    pub offset: i64,
}

impl PageWindow {
    /// Pages at or below zero are treated as page 1.
    pub fn new(page: i64, page_size: i64) -> Result<Self, PaginationError> {
        if page_size <= 0 {
            return Err(PaginationError::InvalidPageSize(page_size));
        }

        let page = page.max(1);
        let offset = (page - 1).saturating_mul(page_size);

        Ok(Self {
            page,
            page_size,
            offset,
        })
    }

    /// Query-string form: a missing page means 1, a missing size means `default_page_size`.
    pub fn from_query(
        page: Option<i64>,
        page_size: Option<i64>,
        default_page_size: i64,
    ) -> Result<Self, PaginationError> {
        Self::new(page.unwrap_or(1), page_size.unwrap_or(default_page_size))
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }

    pub fn skip(&self) -> usize {
        self.offset as usize
    }
}

pub fn total_pages(total: u64, page_size: i64) -> Result<u64, PaginationError> {
    if page_size <= 0 {
        return Err(PaginationError::InvalidPageSize(page_size));
    }

    Ok(total.div_ceil(page_size as u64))
}

/// One page of a listing plus the metadata clients need to walk the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn assemble(data: Vec<T>, window: PageWindow, total: u64) -> Self {
        Self {
            data,
            page: window.page,
            limit: window.page_size,
            total,
            // PageWindow::new already rejected non-positive sizes
            total_pages: total_pages(total, window.page_size).unwrap_or_default(),
        }
    }
}
