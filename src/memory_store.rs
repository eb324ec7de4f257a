// src/memory_store.rs
//
// Magazyn w pamięci do testów. Jednostki atomowe pracują na kopii tabel
// i podmieniają ją dopiero po sukcesie, więc błąd w połowie nic nie zmienia.

use std::collections::BTreeMap;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::errors::RepositoryError;
use crate::models::{
    CheckoutOutcome, Order, OrderItem, OrderStatus, Payment, SavedProduct, Transaction,
};
use crate::pagination::PageWindow;
use crate::repository::OrderStore;
use crate::sorting::SortSpec;

/// Miejsce, w którym symulowany jest błąd zapisu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    CheckoutAfterTransactionInsert,
    CancelAfterSavedInsert,
    Reads,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    orders: BTreeMap<i64, Order>,
    items: Vec<OrderItem>,
    payments: Vec<Payment>,
    transactions: Vec<Transaction>,
    saved: Vec<SavedProduct>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    tables: Mutex<Tables>,
    fail_point: StdMutex<Option<FailPoint>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.tables.try_lock().unwrap().next_id = 1000;
        store
    }

    pub fn fail_at(&self, point: FailPoint) {
        *self.fail_point.lock().unwrap() = Some(point);
    }

    fn check(&self, point: FailPoint) -> Result<(), RepositoryError> {
        if *self.fail_point.lock().unwrap() == Some(point) {
            tracing::debug!("Symulowany błąd magazynu: {:?}", point);
            return Err(RepositoryError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub async fn add_order(&self, order: Order) {
        self.tables.lock().await.orders.insert(order.id, order);
    }

    pub async fn add_item(&self, order_id: i64, product_id: i64) {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        tables.items.push(OrderItem {
            id,
            order_id,
            product_id,
            quantity: 1,
            price_at_purchase: 1000,
        });
    }

    pub async fn add_payment(&self, id: i64, user_id: i64) {
        self.tables.lock().await.payments.push(Payment {
            id,
            user_id,
            method: "karta".to_string(),
        });
    }

    pub async fn order(&self, order_id: i64) -> Option<Order> {
        self.tables.lock().await.orders.get(&order_id).cloned()
    }

    pub async fn items_of(&self, order_id: i64) -> Vec<OrderItem> {
        let tables = self.tables.lock().await;
        tables
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.tables.lock().await.transactions.clone()
    }

    pub async fn saved_of(&self, user_id: i64) -> Vec<SavedProduct> {
        let tables = self.tables.lock().await;
        tables
            .saved
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    // Odczyt oddaje sterowanie, jak prawdziwe I/O, żeby równoległe żądania się przeplatały
    async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, RepositoryError> {
        self.check(FailPoint::Reads)?;
        let result = {
            let tables = self.tables.lock().await;
            f(&tables)
        };
        tokio::task::yield_now().await;
        Ok(result)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn count_orders(&self, user_id: i64) -> Result<i64, RepositoryError> {
        self.read(|t| t.orders.values().filter(|o| o.user_id == user_id).count() as i64)
            .await
    }

    async fn list_orders(
        &self,
        user_id: i64,
        sort: &SortSpec<Order>,
        window: &PageWindow,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.read(|t| {
            let mut orders: Vec<Order> = t
                .orders
                .values()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect();
            sort.sort(&mut orders);
            window.slice(&orders).to_vec()
        })
        .await
    }

    async fn find_order(&self, order_id: i64) -> Result<Option<Order>, RepositoryError> {
        self.read(|t| t.orders.get(&order_id).cloned()).await
    }

    async fn find_user_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Option<Order>, RepositoryError> {
        self.read(|t| {
            t.orders
                .get(&order_id)
                .filter(|o| o.user_id == user_id)
                .cloned()
        })
        .await
    }

    async fn find_user_payment(
        &self,
        user_id: i64,
        payment_id: i64,
    ) -> Result<Option<Payment>, RepositoryError> {
        self.read(|t| {
            t.payments
                .iter()
                .find(|p| p.id == payment_id && p.user_id == user_id)
                .cloned()
        })
        .await
    }

    async fn order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, RepositoryError> {
        self.read(|t| {
            t.items
                .iter()
                .filter(|i| i.order_id == order_id)
                .cloned()
                .collect()
        })
        .await
    }

    async fn count_saved_products(&self, user_id: i64) -> Result<i64, RepositoryError> {
        self.read(|t| t.saved.iter().filter(|s| s.user_id == user_id).count() as i64)
            .await
    }

    async fn list_saved_products(
        &self,
        user_id: i64,
        sort: &SortSpec<SavedProduct>,
        window: &PageWindow,
    ) -> Result<Vec<SavedProduct>, RepositoryError> {
        self.read(|t| {
            let mut saved: Vec<SavedProduct> = t
                .saved
                .iter()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect();
            sort.sort(&mut saved);
            window.slice(&saved).to_vec()
        })
        .await
    }

    async fn checkout_order(
        &self,
        order_id: i64,
        payment_id: i64,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        // Blokada trzymana przez cały region atomowy
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();

        let now = Utc::now();
        let Some(order) = staged.orders.get(&order_id).cloned() else {
            return Err(RepositoryError::Sqlx(sqlx::Error::RowNotFound));
        };
        if order.status == OrderStatus::Paid {
            return Ok(CheckoutOutcome::AlreadyPaid);
        }

        let transaction = Transaction {
            id: staged.next_id(),
            order_id,
            payment_id,
            created_at: now,
        };
        staged.transactions.push(transaction.clone());
        self.check(FailPoint::CheckoutAfterTransactionInsert)?;

        let order = Order {
            status: OrderStatus::Paid,
            updated_at: now,
            ..order
        };
        staged.orders.insert(order_id, order.clone());

        *tables = staged;
        Ok(CheckoutOutcome::Paid(order, transaction))
    }

    async fn cancel_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Vec<SavedProduct>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();

        let now = Utc::now();
        let lines: Vec<OrderItem> = staged
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();

        let mut saved = Vec::with_capacity(lines.len());
        for line in &lines {
            let entry = SavedProduct {
                id: staged.next_id(),
                user_id,
                product_id: line.product_id,
                created_at: now,
            };
            staged.saved.push(entry.clone());
            saved.push(entry);
        }
        self.check(FailPoint::CancelAfterSavedInsert)?;

        staged.items.retain(|i| i.order_id != order_id);

        *tables = staged;
        Ok(saved)
    }
}
