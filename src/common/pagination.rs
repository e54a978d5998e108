// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_PAGE: u32 = 1_000_000;

// ?page=1&limit=10
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Pagination {
    #[validate(range(min = 1, max = 1_000_000, message = "Página deve estar entre 1 e 1000000"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "Limite deve estar entre 1 e 100"))]
    pub limit: Option<u32>,
}

impl Pagination {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1).saturating_mul(u64::from(self.limit()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        let page = pagination.page();
        let limit = pagination.limit();
        let total_pages = total.div_ceil(u64::from(limit));
        Self {
            data,
            meta: PageMeta {
                total,
                page,
                limit,
                total_pages,
                has_next_page: u64::from(page) < total_pages,
                has_previous_page: page > 1,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
