//! Order ledger repository.
//!
//! Orders and their lines are written in one transaction; the schema rejects
//! any later UPDATE or DELETE on either table.

use async_trait::async_trait;
use sqlx::PgPool;

use eglys_core::{OrderId, OrderStatus, UserId};

use super::{OrderLedger, RepositoryError};
use crate::models::{Order, OrderDetail, OrderLine, PricedOrder};

/// `PostgreSQL` order ledger.
#[derive(Clone)]
pub struct PgOrderLedger {
    pool: PgPool,
}

impl PgOrderLedger {
    /// Create a new order ledger.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderLedger for PgOrderLedger {
    async fn create_order(
        &self,
        user: UserId,
        priced: &PricedOrder,
    ) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.customer_order (user_id, total, status)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(user)
        .bind(priced.total())
        .bind(OrderStatus::Confirmed)
        .fetch_one(&mut *tx)
        .await?;

        for line in priced.lines() {
            sqlx::query(
                r"
                INSERT INTO storefront.order_line
                    (order_id, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order_id)
            .bind(line.product_id())
            .bind(line.quantity())
            .bind(line.unit_price())
            .bind(line.subtotal())
            .execute(&mut *tx)
            .await?;
        }

        // Dropping the transaction on any error above rolls everything back
        tx.commit().await?;

        Ok(order_id)
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, total, status, created_at
            FROM storefront.customer_order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn get_order(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, total, status, created_at
            FROM storefront.customer_order
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(order)
        .bind(user)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderLine>(
            r"
            SELECT order_id, product_id, quantity, unit_price, subtotal
            FROM storefront.order_line
            WHERE order_id = $1
            ORDER BY product_id ASC
            ",
        )
        .bind(order.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderDetail { order, lines }))
    }
}
