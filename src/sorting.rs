// src/sorting.rs
//
// Zamknięta mapa "nazwa pola -> klucz sortowania" dla każdego typu rekordu.
// Do zapytań SQL trafiają wyłącznie stałe kolumny z tej mapy, nigdy tekst od klienta.

use std::cmp::Ordering;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use strum_macros::Display;

use crate::errors::AppError;
use crate::models::{Order, SavedProduct};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SortDirection {
    #[strum(serialize = "ASC")]
    Ascending,
    #[strum(serialize = "DESC")]
    Descending,
}

impl SortDirection {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Klucz sortowania: kolumna w bazie oraz odpowiadający jej komparator w pamięci.
pub struct SortKey<T> {
    pub column: &'static str,
    pub compare: fn(&T, &T) -> Ordering,
}

pub type SortTable<T> = HashMap<&'static str, SortKey<T>>;

/// Typ rekordu, który można stronicować i sortować po polach z listy dozwolonych.
pub trait Sortable: Sized + Send + Sync + 'static {
    /// Kolumna klucza głównego, używana do rozstrzygania remisów.
    const ID_COLUMN: &'static str;
    const DEFAULT_SORT_FIELD: &'static str;

    fn sort_table() -> &'static SortTable<Self>;
    fn id(&self) -> i64;
}

/// Rozwiązane sortowanie: pole z listy dozwolonych i kierunek.
pub struct SortSpec<T: 'static> {
    field: &'static str,
    key: &'static SortKey<T>,
    direction: SortDirection,
}

impl<T: 'static> Clone for SortSpec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for SortSpec<T> {}

impl<T: 'static> std::fmt::Debug for SortSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortSpec")
            .field("field", &self.field)
            .field("column", &self.key.column)
            .field("direction", &self.direction)
            .finish()
    }
}

impl<T: Sortable> SortSpec<T> {
    pub fn resolve(field: &str, direction: SortDirection) -> Result<Self, AppError> {
        let (name, key) = T::sort_table().get_key_value(field).ok_or_else(|| {
            let mut allowed: Vec<&str> = T::sort_table().keys().copied().collect();
            allowed.sort_unstable();
            AppError::InvalidArgument(format!(
                "Nieobsługiwane pole sortowania '{}'. Dozwolone: {}",
                field,
                allowed.join(", ")
            ))
        })?;

        Ok(SortSpec {
            field: *name,
            key,
            direction,
        })
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Porządek całkowity: żądane pole w żądanym kierunku, remisy po id rosnąco.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.direction
            .apply((self.key.compare)(a, b))
            .then_with(|| a.id().cmp(&b.id()))
    }

    pub fn sort(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }

    pub fn order_by_clause(&self) -> String {
        format!(
            "{} {}, {} ASC",
            self.key.column, self.direction, T::ID_COLUMN
        )
    }
}

static ORDER_SORT_KEYS: Lazy<SortTable<Order>> = Lazy::new(|| {
    HashMap::from([
        (
            "id",
            SortKey {
                column: "id",
                compare: |a: &Order, b: &Order| a.id.cmp(&b.id),
            },
        ),
        (
            "ts",
            SortKey {
                column: "created_at",
                compare: |a: &Order, b: &Order| a.created_at.cmp(&b.created_at),
            },
        ),
        (
            "status",
            SortKey {
                column: "status",
                compare: |a: &Order, b: &Order| a.status.cmp(&b.status),
            },
        ),
        (
            "total",
            SortKey {
                column: "total_price",
                compare: |a: &Order, b: &Order| a.total_price.cmp(&b.total_price),
            },
        ),
    ])
});

static SAVED_PRODUCT_SORT_KEYS: Lazy<SortTable<SavedProduct>> = Lazy::new(|| {
    HashMap::from([
        (
            "id",
            SortKey {
                column: "id",
                compare: |a: &SavedProduct, b: &SavedProduct| a.id.cmp(&b.id),
            },
        ),
        (
            "ts",
            SortKey {
                column: "created_at",
                compare: |a: &SavedProduct, b: &SavedProduct| a.created_at.cmp(&b.created_at),
            },
        ),
        (
            "product",
            SortKey {
                column: "product_id",
                compare: |a: &SavedProduct, b: &SavedProduct| a.product_id.cmp(&b.product_id),
            },
        ),
    ])
});

impl Sortable for Order {
    const ID_COLUMN: &'static str = "id";
    const DEFAULT_SORT_FIELD: &'static str = "ts";

    fn sort_table() -> &'static SortTable<Self> {
        &ORDER_SORT_KEYS
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Sortable for SavedProduct {
    const ID_COLUMN: &'static str = "id";
    const DEFAULT_SORT_FIELD: &'static str = "ts";

    fn sort_table() -> &'static SortTable<Self> {
        &SAVED_PRODUCT_SORT_KEYS
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use chrono::{TimeZone, Utc};

    fn order(id: i64, total_price: i64, status: OrderStatus) -> Order {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        Order {
            id,
            user_id: 42,
            status,
            total_price,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn resolves_allowed_fields() {
        for field in ["id", "ts", "status", "total"] {
            let spec = SortSpec::<Order>::resolve(field, SortDirection::Ascending).unwrap();
            assert_eq!(spec.field(), field);
        }
    }

    #[test]
    fn rejects_fields_outside_allow_list() {
        for field in ["", "TS", "created_at", "user_id", "id; DROP TABLE orders"] {
            let result = SortSpec::<Order>::resolve(field, SortDirection::Ascending);
            assert!(
                matches!(result, Err(AppError::InvalidArgument(_))),
                "field {field:?} should be rejected"
            );
        }
    }

    #[test]
    fn order_by_clause_uses_mapped_columns() {
        let spec = SortSpec::<Order>::resolve("ts", SortDirection::Descending).unwrap();
        assert_eq!(spec.order_by_clause(), "created_at DESC, id ASC");

        let spec = SortSpec::<SavedProduct>::resolve("product", SortDirection::Ascending).unwrap();
        assert_eq!(spec.order_by_clause(), "product_id ASC, id ASC");
    }

    #[test]
    fn ties_are_broken_by_id_in_both_directions() {
        let mut orders = vec![
            order(3, 100, OrderStatus::Created),
            order(1, 100, OrderStatus::Created),
            order(2, 50, OrderStatus::Created),
        ];

        let asc = SortSpec::<Order>::resolve("total", SortDirection::Ascending).unwrap();
        asc.sort(&mut orders);
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let desc = SortSpec::<Order>::resolve("total", SortDirection::Descending).unwrap();
        desc.sort(&mut orders);
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn status_sorts_created_before_paid() {
        let mut orders = vec![order(1, 0, OrderStatus::Paid), order(2, 0, OrderStatus::Created)];
        let spec = SortSpec::<Order>::resolve("status", SortDirection::Ascending).unwrap();
        spec.sort(&mut orders);
        assert_eq!(orders[0].status, OrderStatus::Created);
    }
}
