//! Data models shared across database access and API handlers.

use serde::Serialize;
use utoipa::ToSchema;

/// Wrapper for paginated API responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    /// The data items for the current page.
    pub data: Vec<T>,
    /// Total number of records matching the query.
    pub total: i64,
    /// Page number, starting at 1.
    pub page: i64,
    /// Requested page size.
    pub per_page: i64,
    /// Number of pages available at this page size.
    pub total_pages: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        Self {
            data,
            total,
            page,
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

pub mod session;
pub mod user;
