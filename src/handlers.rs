// src/handlers.rs
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use validator::Validate;

use crate::auth_models::TokenClaims;
use crate::errors::AppError;
use crate::filters::PaginationParams;
use crate::models::{CheckoutPayload, Order, OrderDetailsResponse, SavedProduct};
use crate::pagination::PaginatedResponse;
use crate::services;
use crate::state::AppState;

/// Strona wyników z metadanymi w nagłówku `X-Pagination`; pusty wynik to 204.
fn paginated_response<T: Serialize>(page: PaginatedResponse<T>) -> Response {
    let headers = page.metadata_headers();
    if page.is_empty() {
        (StatusCode::NO_CONTENT, headers).into_response()
    } else {
        (StatusCode::OK, headers, Json(page)).into_response()
    }
}

pub async fn list_orders_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    tracing::debug!("GET /api/orders z parametrami: {:?}", params);
    let request = params.into_request::<Order>()?;
    let page = services::list_orders(app_state.store.as_ref(), claims.sub, &request).await?;
    Ok(paginated_response(page))
}

pub async fn get_order_details_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetailsResponse>, AppError> {
    let details = services::get_order(app_state.store.as_ref(), claims.sub, order_id).await?;
    Ok(Json(details))
}

pub async fn checkout_order_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(order_id): Path<i64>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<Json<Order>, AppError> {
    payload.validate()?;
    let order = services::checkout_order(
        app_state.store.as_ref(),
        claims.sub,
        order_id,
        payload.payment_id,
    )
    .await?;
    Ok(Json(order))
}

pub async fn cancel_order_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Path(order_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::cancel_order(app_state.store.as_ref(), claims.sub, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_saved_products_handler(
    State(app_state): State<Arc<AppState>>,
    claims: TokenClaims,
    Query(params): Query<PaginationParams>,
) -> Result<Response, AppError> {
    let request = params.into_request::<SavedProduct>()?;
    let page =
        services::list_saved_products(app_state.store.as_ref(), claims.sub, &request).await?;
    Ok(paginated_response(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PAGINATION_HEADER;

    fn page(items: Vec<i64>, total_count: i64, total_pages: i64) -> PaginatedResponse<i64> {
        PaginatedResponse {
            items,
            total_count,
            page_size: 10,
            current_page: 1,
            total_pages,
        }
    }

    #[test]
    fn empty_page_is_no_content_with_metadata_header() {
        let response = paginated_response(page(Vec::new(), 0, 0));

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let raw = response.headers().get(PAGINATION_HEADER).unwrap();
        let value: serde_json::Value = serde_json::from_slice(raw.as_bytes()).unwrap();
        assert_eq!(value["totalCount"], 0);
        assert_eq!(value["totalPages"], 0);
    }

    #[test]
    fn non_empty_page_is_ok_with_metadata_header() {
        let response = paginated_response(page(vec![1, 2, 3], 3, 1));

        assert_eq!(response.status(), StatusCode::OK);
        let raw = response.headers().get(PAGINATION_HEADER).unwrap();
        let value: serde_json::Value = serde_json::from_slice(raw.as_bytes()).unwrap();
        assert_eq!(value["totalCount"], 3);
        assert_eq!(value["currentPage"], 1);
    }
}
