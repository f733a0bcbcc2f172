//! Order repository.
//!
//! Inserts take an open connection: orders are only ever written inside the
//! checkout transaction.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use bazaar_core::{OrderId, OrderLineId, Price, ProductId, Quantity, UserId};

use super::{RepositoryError, corrupt};
use crate::models::order::NewOrderLine;
use crate::models::{Order, OrderDetail, OrderLine};

// =============================================================================
// Internal Row Types
// =============================================================================

const ORDER_COLUMNS: &str = "id, user_id, created_on, ships_on, status, address";
const LINE_COLUMNS: &str = "id, order_id, product_id, product_name, unit_price, quantity";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    created_on: NaiveDate,
    ships_on: NaiveDate,
    status: String,
    address: String,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            created_on: row.created_on,
            ships_on: row.ships_on,
            status: row.status,
            address: row.address,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: i32,
    order_id: i32,
    product_id: Option<i32>,
    product_name: String,
    unit_price: i32,
    quantity: i32,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderLineId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: row.product_id.map(ProductId::new),
            product_name: row.product_name,
            unit_price: Price::new(row.unit_price).map_err(|e| corrupt("order line price", e))?,
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt("order line quantity", e))?,
        })
    }
}

/// Fields of an order about to be inserted.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub created_on: NaiveDate,
    pub ships_on: NaiveDate,
    pub status: &'a str,
    pub address: &'a str,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(conn: &mut PgConnection, order: &NewOrder<'_>) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO shop.order (user_id, created_on, ships_on, status, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id)
        .bind(order.created_on)
        .bind(order.ships_on)
        .bind(order.status)
        .bind(order.address)
        .fetch_one(conn)
        .await?;

        Ok(row.into())
    }

    /// Insert one line per item, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails.
    pub async fn insert_lines(
        conn: &mut PgConnection,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        let mut inserted = Vec::with_capacity(lines.len());

        for line in lines {
            let row = sqlx::query_as::<_, OrderLineRow>(&format!(
                r"
                INSERT INTO shop.order_line (order_id, product_id, product_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {LINE_COLUMNS}
                "
            ))
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price.minor_units())
            .bind(line.quantity.get())
            .fetch_one(&mut *conn)
            .await?;

            inserted.push(row.try_into()?);
        }

        Ok(inserted)
    }

    /// Get an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = self.lines_for(&[order.id]).await?;
        Ok(Some(OrderDetail::new(order.into(), lines)))
    }

    /// A user's orders, newest first, each with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE user_id = $1 ORDER BY created_on DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
        let mut by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for line in self.lines_for(&ids).await? {
            by_order.entry(line.order_id).or_default().push(line);
        }

        let details = orders
            .into_iter()
            .map(|row| {
                let order: Order = row.into();
                let lines = by_order.remove(&order.id).unwrap_or_default();
                OrderDetail::new(order, lines)
            })
            .collect();

        Ok(details)
    }

    async fn lines_for(&self, order_ids: &[i32]) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM shop.order_line WHERE order_id = ANY($1) ORDER BY order_id, id"
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
