//! Cart repository.
//!
//! Every mutation is a single transaction. Increment is one upsert on the
//! `(user_id, product_id)` key; decrement locks the row with `FOR UPDATE`
//! so two concurrent decrements cannot both see quantity 2.

use sqlx::{PgConnection, PgPool};

use bazaar_core::{CartLineId, ProductId, Quantity, UserId};

use super::products::ProductRow;
use super::{RepositoryError, corrupt};
use crate::models::{CartChange, CartItem, CartLine};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    quantity: i32,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CartLineId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt("cart quantity", e))?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    #[sqlx(flatten)]
    product: ProductRow,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product: row.product.try_into()?,
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt("cart quantity", e))?,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add one unit of a product, creating the line if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add_or_increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartLine, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>("SELECT id FROM shop.product WHERE id = $1 FOR SHARE")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            INSERT INTO shop.cart_line (user_id, product_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT ON CONSTRAINT cart_line_user_product_key
            DO UPDATE SET quantity = shop.cart_line.quantity + 1, updated_at = NOW()
            RETURNING id, user_id, product_id, quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Take one unit away; the last unit deletes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn decrement_or_remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, user_id, product_id, quantity
            FROM shop.cart_line
            WHERE user_id = $1 AND product_id = $2
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(CartChange::Unchanged);
        };
        let line = CartLine::try_from(current)?;

        let change = match line.quantity.decremented() {
            Some(quantity) => {
                let row = sqlx::query_as::<_, CartLineRow>(
                    r"
                    UPDATE shop.cart_line
                    SET quantity = $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, user_id, product_id, quantity
                    ",
                )
                .bind(line.id)
                .bind(quantity.get())
                .fetch_one(&mut *tx)
                .await?;
                CartChange::Updated(row.try_into()?)
            }
            None => {
                sqlx::query("DELETE FROM shop.cart_line WHERE id = $1")
                    .bind(line.id)
                    .execute(&mut *tx)
                    .await?;
                CartChange::Removed
            }
        };

        tx.commit().await?;
        Ok(change)
    }

    /// Delete the line for a product regardless of quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartChange, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        Ok(if result.rows_affected() == 0 {
            CartChange::Unchanged
        } else {
            CartChange::Removed
        })
    }

    /// Cart lines joined with their products, ordered by product ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT p.id, p.name, p.price, p.image, p.category_id, c.quantity
            FROM shop.cart_line c
            JOIN shop.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY p.id, c.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Merge duplicate lines for one user into the oldest line.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn repair_duplicates(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        merge_duplicates(self.pool, Some(user_id)).await
    }

    /// Merge duplicate lines across every cart.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reconcile_all(&self) -> Result<u64, RepositoryError> {
        merge_duplicates(self.pool, None).await
    }

    /// Delete a user's lines for the given products on an open connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_for_products(
        conn: &mut PgConnection,
        user_id: UserId,
        product_ids: &[ProductId],
    ) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();

        let result =
            sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1 AND product_id = ANY($2)")
                .bind(user_id)
                .bind(ids)
                .execute(conn)
                .await?;

        Ok(result.rows_affected())
    }
}

async fn merge_duplicates(pool: &PgPool, user_id: Option<UserId>) -> Result<u64, RepositoryError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r"
        WITH merged AS (
            SELECT user_id, product_id, MIN(id) AS keep_id, SUM(quantity)::INTEGER AS total
            FROM shop.cart_line
            WHERE $1::INTEGER IS NULL OR user_id = $1
            GROUP BY user_id, product_id
            HAVING COUNT(*) > 1
        ),
        kept AS (
            UPDATE shop.cart_line c
            SET quantity = m.total, updated_at = NOW()
            FROM merged m
            WHERE c.id = m.keep_id
            RETURNING c.id
        )
        DELETE FROM shop.cart_line c
        USING merged m
        WHERE c.user_id = m.user_id
          AND c.product_id = m.product_id
          AND c.id <> m.keep_id
        ",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}
