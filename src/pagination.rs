use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QuerySelect};
use serde::Serialize;

use crate::query::QuerySpec;

/// Albums shown per listing page.
pub const ALBUM_PAGE_SIZE: u64 = 9;

/// Reads a raw `page` parameter. Anything that is not a positive integer
/// means the first page.
pub fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Both values are clamped to at least 1.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        Self {
            page: request.page(),
            page_size: request.page_size(),
            total_items,
            total_pages: total_items.div_ceil(request.page_size()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Runs `spec` for one page: a count over the same joins and predicate, then
/// the offset/limit slice. A page past the end is empty, not an error.
#[tracing::instrument(skip(conn, spec), fields(page = request.page(), page_size = request.page_size()))]
pub async fn paginate<C, E>(
    conn: &C,
    spec: &QuerySpec<E>,
    request: PageRequest,
) -> Result<Page<E::Model>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let total_items = spec.select_unordered().count(conn).await?;
    let pagination = Pagination::new(request, total_items);

    if request.offset() >= total_items {
        tracing::debug!(total_items, "Requested page is past the end");
        return Ok(Page {
            items: Vec::new(),
            pagination,
        });
    }

    let items = spec
        .select()
        .limit(request.page_size())
        .offset(request.offset())
        .all(conn)
        .await?;

    Ok(Page { items, pagination })
}
