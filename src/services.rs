// src/services.rs
//
// Logika zamówień. Tożsamość wywołującego jest zawsze jawnym parametrem,
// funkcje nie wiedzą nic o warstwie HTTP.

use crate::errors::AppError;
use crate::models::{CheckoutOutcome, Order, OrderDetailsResponse, OrderStatus, SavedProduct};
use crate::pagination::{PaginatedResponse, PaginationRequest, paginate};
use crate::repository::{OrderStore, UserOrders, UserSavedProducts};

fn ensure_positive(value: i64, name: &str) -> Result<(), AppError> {
    if value <= 0 {
        return Err(AppError::InvalidArgument(format!(
            "Identyfikator '{}' musi być dodatni, otrzymano {}",
            name, value
        )));
    }
    Ok(())
}

pub async fn list_orders(
    store: &dyn OrderStore,
    caller_id: i64,
    request: &PaginationRequest<Order>,
) -> Result<PaginatedResponse<Order>, AppError> {
    let source = UserOrders {
        store,
        user_id: caller_id,
    };
    let page = paginate(&source, request).await?;

    tracing::info!(
        "Użytkownik {} pobrał stronę {}/{} zamówień (sortowanie: {} {})",
        caller_id,
        page.current_page,
        page.total_pages,
        request.sort().field(),
        request.sort().direction()
    );
    Ok(page)
}

pub async fn list_saved_products(
    store: &dyn OrderStore,
    caller_id: i64,
    request: &PaginationRequest<SavedProduct>,
) -> Result<PaginatedResponse<SavedProduct>, AppError> {
    let source = UserSavedProducts {
        store,
        user_id: caller_id,
    };
    paginate(&source, request).await
}

/// Pobiera zamówienie wywołującego razem z pozycjami.
/// Cudze zamówienie jest raportowane jak nieistniejące.
pub async fn get_order(
    store: &dyn OrderStore,
    caller_id: i64,
    order_id: i64,
) -> Result<OrderDetailsResponse, AppError> {
    ensure_positive(order_id, "orderId")?;

    let order = store
        .find_user_order(caller_id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;
    let items = store.order_items(order_id).await?;

    Ok(OrderDetailsResponse { order, items })
}

/// Opłaca zamówienie wskazaną płatnością.
///
/// Kolejność błędów: `InvalidArgument`, `NotFound("payment")`, `NotFound("order")`,
/// `Conflict`. Obie wyszukiwarki wykonują się zawsze, zanim cokolwiek zostanie zapisane.
pub async fn checkout_order(
    store: &dyn OrderStore,
    caller_id: i64,
    order_id: i64,
    payment_id: i64,
) -> Result<Order, AppError> {
    ensure_positive(order_id, "orderId")?;
    ensure_positive(payment_id, "paymentId")?;

    let (payment_result, order_result) = tokio::join!(
        store.find_user_payment(caller_id, payment_id),
        store.find_user_order(caller_id, order_id),
    );

    let payment = payment_result?;
    let order = order_result?;

    if payment.is_none() {
        tracing::warn!(
            "Płatność {} nie istnieje lub nie należy do użytkownika {}",
            payment_id,
            caller_id
        );
        return Err(AppError::NotFound("payment".to_string()));
    }
    let Some(order) = order else {
        tracing::warn!(
            "Zamówienie {} nie istnieje lub nie należy do użytkownika {}",
            order_id,
            caller_id
        );
        return Err(AppError::NotFound("order".to_string()));
    };

    if order.status == OrderStatus::Paid {
        return Err(already_paid(order_id));
    }

    // Ponowne sprawdzenie statusu odbywa się wewnątrz regionu atomowego
    match store.checkout_order(order_id, payment_id).await {
        Ok(CheckoutOutcome::Paid(order, transaction)) => {
            tracing::info!(
                "Opłacono zamówienie {} płatnością {} (transakcja {}), user_id={}",
                order_id,
                payment_id,
                transaction.id,
                caller_id
            );
            Ok(order)
        }
        Ok(CheckoutOutcome::AlreadyPaid) => Err(already_paid(order_id)),
        Err(e) => {
            tracing::error!("Nie udało się opłacić zamówienia {}: {:?}", order_id, e);
            Err(AppError::InternalServerError(
                "Nie udało się zapisać płatności. Spróbuj ponownie.".to_string(),
            ))
        }
    }
}

fn already_paid(order_id: i64) -> AppError {
    tracing::warn!("Zamówienie {} jest już opłacone", order_id);
    AppError::Conflict(format!("Zamówienie {} jest już opłacone", order_id))
}

/// Anuluje zamówienie: każda pozycja trafia na listę "zapisane na później"
/// wywołującego, a powiązania zamówienia z produktami są usuwane. Samo zamówienie zostaje.
pub async fn cancel_order(
    store: &dyn OrderStore,
    caller_id: i64,
    order_id: i64,
) -> Result<Vec<SavedProduct>, AppError> {
    ensure_positive(order_id, "orderId")?;

    let order = store
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    if order.user_id != caller_id {
        tracing::warn!(
            "Nieautoryzowana próba anulowania zamówienia: order_id={}, user_id={}",
            order_id,
            caller_id
        );
        return Err(AppError::UnauthorizedAccess(
            "Nie masz uprawnień do tego zamówienia".to_string(),
        ));
    }

    match store.cancel_order(caller_id, order_id).await {
        Ok(saved) => {
            tracing::info!(
                "Anulowano zamówienie {}: {} produktów zapisano na później, user_id={}",
                order_id,
                saved.len(),
                caller_id
            );
            Ok(saved)
        }
        Err(e) => {
            tracing::error!("Nie udało się anulować zamówienia {}: {:?}", order_id, e);
            Err(AppError::InternalServerError(
                "Nie udało się anulować zamówienia. Spróbuj ponownie.".to_string(),
            ))
        }
    }
}
