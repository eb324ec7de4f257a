// src/repository.rs
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::errors::RepositoryError;
use crate::models::{
    CheckoutOutcome, Order, OrderItem, OrderStatus, Payment, SavedProduct, Transaction,
};
use crate::pagination::{PageWindow, PagedSource};
use crate::sorting::SortSpec;

/// Dostęp do zamówień, płatności i listy "zapisane na później".
///
/// `checkout_order` i `cancel_order` to jednostki atomowe: albo widać wszystkie
/// ich zapisy, albo żaden.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn count_orders(&self, user_id: i64) -> Result<i64, RepositoryError>;

    async fn list_orders(
        &self,
        user_id: i64,
        sort: &SortSpec<Order>,
        window: &PageWindow,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Zamówienie niezależnie od właściciela.
    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, RepositoryError>;

    async fn find_user_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Option<Order>, RepositoryError>;

    async fn find_user_payment(
        &self,
        user_id: i64,
        payment_id: i64,
    ) -> Result<Option<Payment>, RepositoryError>;

    async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, RepositoryError>;

    async fn count_saved_products(&self, user_id: i64) -> Result<i64, RepositoryError>;

    async fn list_saved_products(
        &self,
        user_id: i64,
        sort: &SortSpec<SavedProduct>,
        window: &PageWindow,
    ) -> Result<Vec<SavedProduct>, RepositoryError>;

    /// Blokuje zamówienie, ponownie sprawdza status, zapisuje transakcję i ustawia `Paid`.
    async fn checkout_order(
        &self,
        order_id: i64,
        payment_id: i64,
    ) -> Result<CheckoutOutcome, RepositoryError>;

    /// Przenosi pozycje zamówienia na listę "zapisane na później" użytkownika.
    async fn cancel_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Vec<SavedProduct>, RepositoryError>;
}

/// Zamówienia jednego użytkownika jako źródło stron.
pub struct UserOrders<'a> {
    pub store: &'a dyn OrderStore,
    pub user_id: i64,
}

#[async_trait]
impl<'a> PagedSource<Order> for UserOrders<'a> {
    async fn count(&self) -> Result<i64, RepositoryError> {
        self.store.count_orders(self.user_id).await
    }

    async fn fetch(
        &self,
        sort: &SortSpec<Order>,
        window: &PageWindow,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.store.list_orders(self.user_id, sort, window).await
    }
}

/// Produkty zapisane na później przez jednego użytkownika.
pub struct UserSavedProducts<'a> {
    pub store: &'a dyn OrderStore,
    pub user_id: i64,
}

#[async_trait]
impl<'a> PagedSource<SavedProduct> for UserSavedProducts<'a> {
    async fn count(&self) -> Result<i64, RepositoryError> {
        self.store.count_saved_products(self.user_id).await
    }

    async fn fetch(
        &self,
        sort: &SortSpec<SavedProduct>,
        window: &PageWindow,
    ) -> Result<Vec<SavedProduct>, RepositoryError> {
        self.store
            .list_saved_products(self.user_id, sort, window)
            .await
    }
}

pub struct PgOrderStore {
    db_pool: PgPool,
}

impl PgOrderStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    fn paged_select<'q>(
        table: &str,
        user_id: i64,
        order_by: &str,
        window: &PageWindow,
    ) -> QueryBuilder<'q, Postgres> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT * FROM {} WHERE user_id = ", table));
        query_builder.push_bind(user_id);
        // ORDER BY pochodzi wyłącznie z zamkniętej mapy sortowania
        query_builder.push(format!(" ORDER BY {}", order_by));
        query_builder.push(" LIMIT ").push_bind(window.limit);
        query_builder.push(" OFFSET ").push_bind(window.offset);
        query_builder
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn count_orders(&self, user_id: i64) -> Result<i64, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db_pool)
            .await?;
        Ok(total)
    }

    async fn list_orders(
        &self,
        user_id: i64,
        sort: &SortSpec<Order>,
        window: &PageWindow,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut query_builder =
            Self::paged_select("orders", user_id, &sort.order_by_clause(), window);
        let orders = query_builder
            .build_query_as::<Order>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(orders)
    }

    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(order)
    }

    async fn find_user_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Option<Order>, RepositoryError> {
        let order =
            sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
                .bind(order_id)
                .bind(user_id)
                .fetch_optional(&self.db_pool)
                .await?;
        Ok(order)
    }

    async fn find_user_payment(
        &self,
        user_id: i64,
        payment_id: i64,
    ) -> Result<Option<Payment>, RepositoryError> {
        let payment =
            sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 AND user_id = $2")
                .bind(payment_id)
                .bind(user_id)
                .fetch_optional(&self.db_pool)
                .await?;
        Ok(payment)
    }

    async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(items)
    }

    async fn count_saved_products(&self, user_id: i64) -> Result<i64, RepositoryError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM saved_products WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.db_pool)
                .await?;
        Ok(total)
    }

    async fn list_saved_products(
        &self,
        user_id: i64,
        sort: &SortSpec<SavedProduct>,
        window: &PageWindow,
    ) -> Result<Vec<SavedProduct>, RepositoryError> {
        let mut query_builder =
            Self::paged_select("saved_products", user_id, &sort.order_by_clause(), window);
        let saved = query_builder
            .build_query_as::<SavedProduct>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(saved)
    }

    async fn checkout_order(
        &self,
        order_id: i64,
        payment_id: i64,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        let mut tx = self.db_pool.begin().await?;
        tracing::debug!("Rozpoczęto transakcję opłacenia zamówienia {}", order_id);

        // Blokada wiersza: równoległe opłacenia tego samego zamówienia czekają tutaj
        let status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        if status == OrderStatus::Paid {
            tx.rollback().await?;
            return Ok(CheckoutOutcome::AlreadyPaid);
        }

        let transaction_result = sqlx::query_as::<_, Transaction>(
            r#"
                INSERT INTO transactions (order_id, payment_id, created_at)
                VALUES ($1, $2, CURRENT_TIMESTAMP)
                RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(payment_id)
        .fetch_one(&mut *tx)
        .await;

        let transaction = match transaction_result {
            Ok(transaction) => transaction,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!(
                    "Transakcja dla zamówienia {} już istnieje (unikalny indeks)",
                    order_id
                );
                tx.rollback().await?;
                return Ok(CheckoutOutcome::AlreadyPaid);
            }
            Err(e) => return Err(e.into()),
        };

        let order = sqlx::query_as::<_, Order>(
            r#"
                UPDATE orders
                SET status = $1, updated_at = CURRENT_TIMESTAMP
                WHERE id = $2
                RETURNING *
            "#,
        )
        .bind(OrderStatus::Paid)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(CheckoutOutcome::Paid(order, transaction))
    }

    async fn cancel_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Vec<SavedProduct>, RepositoryError> {
        let mut tx = self.db_pool.begin().await?;
        tracing::debug!("Rozpoczęto transakcję anulowania zamówienia {}", order_id);

        sqlx::query("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;

        // Usunięte pozycje wyznaczają dokładnie te produkty, które trafią na listę
        let removed_product_ids: Vec<i64> = sqlx::query_scalar(
            "DELETE FROM order_items WHERE order_id = $1 RETURNING product_id",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        let saved = if removed_product_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, SavedProduct>(
                r#"
                    INSERT INTO saved_products (user_id, product_id, created_at)
                    SELECT $1, product_id, CURRENT_TIMESTAMP
                    FROM UNNEST($2::BIGINT[]) AS removed(product_id)
                    RETURNING *
                "#,
            )
            .bind(user_id)
            .bind(&removed_product_ids)
            .fetch_all(&mut *tx)
            .await?
        };

        tx.commit().await?;
        Ok(saved)
    }
}
