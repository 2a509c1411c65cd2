//! services/api/src/web/paging.rs
//!
//! Query parameters and response shape shared by every paginated endpoint.

use reading_tracker_core::domain::{Page, PageRequest};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// `?page=&limit=&sort=`. Missing or non-positive page and limit fall back to
/// 1 and 10; any `sort` other than `desc` is ascending.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// `asc` (default) or `desc`.
    pub sort: Option<String>,
}

impl PageParams {
    pub fn to_request(&self) -> PageRequest {
        let ascending = self.sort.as_deref() != Some("desc");
        PageRequest::new(self.page, self.limit, ascending)
    }
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> PageResponse<T> {
    pub fn from_page<D>(page: Page<D>, f: impl FnMut(D) -> T) -> Self {
        let page = page.map(f);
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}
