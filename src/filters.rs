// src/filters.rs
use serde::Deserialize;
use validator::Validate;

use crate::errors::AppError;
use crate::pagination::PaginationRequest;
use crate::sorting::{SortDirection, SortSpec, Sortable};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

/// Surowe parametry stronicowania z query stringa (niezaufane).
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default)]
    #[validate(range(min = 1, message = "Numer strony musi być większy od zera"))]
    page: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 1, message = "Rozmiar strony musi być większy od zera"))]
    page_size: Option<i64>,

    //Sortowanie
    #[serde(default)]
    sort_field: Option<String>,
    #[serde(default)]
    descending: Option<bool>,
}

#[cfg(test)]
impl PaginationParams {
    pub fn new(
        page: Option<i64>,
        page_size: Option<i64>,
        sort_field: Option<&str>,
        descending: Option<bool>,
    ) -> Self {
        PaginationParams {
            page,
            page_size,
            sort_field: sort_field.map(str::to_string),
            descending,
        }
    }
}

impl PaginationParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    /// Rozmiar strony, przycięty do `MAX_PAGE_SIZE`.
    pub fn page_size(&self) -> i64 {
        match self.page_size {
            Some(size) if size > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            Some(size) => size,
            None => DEFAULT_PAGE_SIZE,
        }
    }

    pub fn sort_field<T: Sortable>(&self) -> &str {
        self.sort_field.as_deref().unwrap_or(T::DEFAULT_SORT_FIELD)
    }

    pub fn direction(&self) -> SortDirection {
        SortDirection::from_descending(self.descending.unwrap_or(false))
    }

    /// Waliduje parametry dla danego typu rekordu. Wywoływane przed jakimkolwiek zapytaniem.
    pub fn into_request<T: Sortable>(self) -> Result<PaginationRequest<T>, AppError> {
        self.validate()?;
        let sort = SortSpec::<T>::resolve(self.sort_field::<T>(), self.direction())?;
        Ok(PaginationRequest::new(self.page(), self.page_size(), sort))
    }
}
