// src/pagination.rs
use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use serde::Serialize;

use crate::errors::{AppError, RepositoryError};
use crate::sorting::{SortSpec, Sortable};

pub const PAGINATION_HEADER: &str = "X-Pagination";

/// Zwalidowane żądanie strony: `page >= 1`, `page_size >= 1`, sortowanie z listy dozwolonych.
#[derive(Debug)]
pub struct PaginationRequest<T: 'static> {
    page: i64,
    page_size: i64,
    sort: SortSpec<T>,
}

impl<T: Sortable> PaginationRequest<T> {
    pub(crate) fn new(page: i64, page_size: i64, sort: SortSpec<T>) -> Self {
        debug_assert!(page >= 1 && page_size >= 1);
        PaginationRequest {
            page,
            page_size,
            sort,
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn sort(&self) -> SortSpec<T> {
        self.sort
    }
}

/// Okno strony wyliczone z żądania i rzeczywistej liczby rekordów.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
    pub offset: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn compute(requested_page: i64, requested_page_size: i64, total_count: i64) -> Self {
        let total_count = total_count.max(0);
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count - 1) / requested_page_size + 1
        };
        let page_size = if total_count > 0 {
            requested_page_size.min(total_count)
        } else {
            requested_page_size
        };
        // Strona poza zakresem jest przycinana do ostatniej, a nie zwraca błędu
        let current_page = requested_page.min(total_pages.max(1));
        let offset = page_size * (current_page - 1);

        PageWindow {
            total_count,
            total_pages,
            current_page,
            page_size,
            offset,
            limit: page_size,
        }
    }

    /// Oczekiwana liczba rekordów na tej stronie.
    pub fn expected_len(&self) -> i64 {
        self.limit.min(self.total_count - self.offset).max(0)
    }

    /// Wycina okno z już posortowanego zbioru w pamięci.
    #[cfg(test)]
    pub fn slice<'a, T>(&self, sorted: &'a [T]) -> &'a [T] {
        let start = (self.offset.max(0) as usize).min(sorted.len());
        let end = start.saturating_add(self.limit.max(0) as usize).min(sorted.len());
        &sorted[start..end]
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page_size: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    fn from_window(window: &PageWindow, items: Vec<T>) -> Self {
        PaginatedResponse {
            items,
            total_count: window.total_count,
            page_size: window.page_size,
            current_page: window.current_page,
            total_pages: window.total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Metadane stronicowania jako nagłówek `X-Pagination` (JSON).
    pub fn metadata_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let metadata = serde_json::json!({
            "totalCount": self.total_count,
            "pageSize": self.page_size,
            "currentPage": self.current_page,
            "totalPages": self.total_pages,
        });
        if let Ok(val) = HeaderValue::from_str(&metadata.to_string()) {
            headers.insert(PAGINATION_HEADER, val);
        }
        headers
    }
}

/// Źródło rekordów, które umie je policzyć i zwrócić posortowane okno.
#[async_trait]
pub trait PagedSource<T: Sortable>: Send + Sync {
    async fn count(&self) -> Result<i64, RepositoryError>;

    async fn fetch(
        &self,
        sort: &SortSpec<T>,
        window: &PageWindow,
    ) -> Result<Vec<T>, RepositoryError>;
}

/// Liczy rekordy dokładnie raz, wylicza okno i pobiera dokładnie jedną stronę.
pub async fn paginate<T, S>(
    source: &S,
    request: &PaginationRequest<T>,
) -> Result<PaginatedResponse<T>, AppError>
where
    T: Sortable,
    S: PagedSource<T> + ?Sized,
{
    let total_count = source.count().await?;
    let window = PageWindow::compute(request.page(), request.page_size(), total_count);

    if total_count == 0 {
        return Ok(PaginatedResponse::from_window(&window, Vec::new()));
    }

    let mut items = source.fetch(&request.sort(), &window).await?;
    if items.len() as i64 != window.expected_len() {
        // Dane zmieniły się między zliczeniem a pobraniem strony
        tracing::debug!(
            "Strona {} ma {} rekordów, oczekiwano {}",
            window.current_page,
            items.len(),
            window.expected_len()
        );
    }
    if items.len() as i64 > window.limit {
        tracing::warn!(
            "Źródło zwróciło {} rekordów przy limicie {}. Przycinam.",
            items.len(),
            window.limit
        );
        items.truncate(window.limit as usize);
    }

    let sort = request.sort();
    if !items.is_sorted_by(|a, b| sort.compare(a, b).is_le()) {
        tracing::warn!(
            "Źródło zwróciło stronę {} w złej kolejności (sortowanie: {} {}). Sortuję.",
            window.current_page,
            sort.field(),
            sort.direction()
        );
        sort.sort(&mut items);
    }

    Ok(PaginatedResponse::from_window(&window, items))
}
