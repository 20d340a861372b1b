//! Order inspection command.

use eglys_core::{OrderId, UserId};
use eglys_storefront::db::OrderLedger;
use eglys_storefront::db::orders::PgOrderLedger;
use eglys_storefront::models::{Order, OrderDetail};

use super::{CommandError, connect};

/// Print a customer's orders, or one order with its lines.
pub async fn show(user_id: i32, order_id: Option<i32>, json: bool) -> Result<(), CommandError> {
    let ledger = PgOrderLedger::new(connect().await?);
    let user = UserId::new(user_id);

    let output = match order_id {
        Some(order_id) => {
            let detail = ledger
                .get_order(user, OrderId::new(order_id))
                .await?
                .ok_or_else(|| {
                    CommandError::NotFound(format!("order {order_id} not found for user {user}"))
                })?;
            if json {
                serde_json::to_string_pretty(&detail)?
            } else {
                format_detail(&detail)
            }
        }
        None => {
            let orders = ledger.list_orders(user).await?;
            if json {
                serde_json::to_string_pretty(&orders)?
            } else {
                format_orders(&orders)
            }
        }
    };

    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}

fn format_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "no orders".to_string();
    }

    let mut out = format!("{:>8}  {:<25}  {:<10}  {:>14}", "ID", "CREATED", "STATUS", "TOTAL");
    for order in orders {
        out.push('\n');
        out.push_str(&format!(
            "{:>8}  {:<25}  {:<10}  {:>14}",
            order.id.to_string(),
            order.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            order.status.as_str(),
            order.total.display(),
        ));
    }
    out
}

fn format_detail(detail: &OrderDetail) -> String {
    let mut out = format!(
        "order {} ({}) for user {} at {}\n{:>10}  {:>6}  {:>14}  {:>14}",
        detail.order.id,
        detail.order.status,
        detail.order.user_id,
        detail.order.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        "PRODUCT",
        "QTY",
        "UNIT PRICE",
        "SUBTOTAL",
    );
    for line in &detail.lines {
        out.push('\n');
        out.push_str(&format!(
            "{:>10}  {:>6}  {:>14}  {:>14}",
            line.product_id.to_string(),
            line.quantity.to_string(),
            line.unit_price.display(),
            line.subtotal.display(),
        ));
    }
    out.push_str(&format!("\ntotal {}", detail.order.total.display()));
    out
}
