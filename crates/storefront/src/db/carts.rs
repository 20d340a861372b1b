//! Cart repository.
//!
//! One row per (user, product). Merges happen in a single upsert so two
//! concurrent adds of the same product both land.

use async_trait::async_trait;
use sqlx::PgPool;

use eglys_core::{OrderId, ProductId, Quantity, UserId};

use super::{CartStore, RepositoryError};
use crate::models::{CartLine, CartLineView, LineItem};

/// `PostgreSQL` cart store.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn add_line(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        let line = sqlx::query_as::<_, CartLine>(
            r"
            INSERT INTO storefront.cart_line (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = storefront.cart_line.quantity + EXCLUDED.quantity
            RETURNING line_id, user_id, product_id, quantity
            ",
        )
        .bind(user)
        .bind(product)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(line)
    }

    async fn get_lines(&self, user: UserId) -> Result<Vec<CartLineView>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLineView>(
            r"
            SELECT c.line_id, c.product_id, c.quantity,
                   p.name, p.image, p.price AS unit_price
            FROM storefront.cart_line c
            LEFT JOIN storefront.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.added_at ASC, c.product_id ASC
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn remove_line(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.cart_line
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user)
        .bind(product)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.cart_line
            WHERE user_id = $1
            ",
        )
        .bind(user)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn consume(
        &self,
        user: UserId,
        order: OrderId,
        snapshot: &[LineItem],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for item in snapshot {
            sqlx::query(
                r"
                DELETE FROM storefront.cart_line
                WHERE user_id = $1 AND line_id = $2 AND quantity <= $3
                  AND consumed_by IS DISTINCT FROM $4
                ",
            )
            .bind(user)
            .bind(item.line_id)
            .bind(item.quantity)
            .bind(order)
            .execute(&mut *tx)
            .await?;

            // Lines that grew after the snapshot keep the difference
            sqlx::query(
                r"
                UPDATE storefront.cart_line
                SET quantity = quantity - $3, consumed_by = $4
                WHERE user_id = $1 AND line_id = $2 AND quantity > $3
                  AND consumed_by IS DISTINCT FROM $4
                ",
            )
            .bind(user)
            .bind(item.line_id)
            .bind(item.quantity)
            .bind(order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
