//! Order lifecycle persistence.
//!
//! Creation writes the order row and its line-item snapshots in one
//! transaction. The user-side cancel is a single conditional UPDATE so a
//! concurrent second cancel (or an admin transition racing it) resolves at
//! the database rather than in application code.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shopd_schemas::{
    AdminOrderView, Order, OrderItem, OrderStatus, OrderView, PaymentMethod, ShippingAddress,
};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

const ORDER_COLUMNS: &str =
    "order_id, user_id, total, status, shipping_address, payment_method, created_at";

const ITEM_COLUMNS: &str = "order_item_id, order_id, product_id, name, price, quantity";

/// Checkout payload after boundary validation. Prices, names and the total
/// are taken from the client snapshot verbatim; nothing is re-derived from
/// the live catalog.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub total: Decimal,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Option<Uuid>,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// Outcome of a user-initiated cancellation.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled(OrderView),
    /// The order exists and belongs to the caller, but is past `pending`.
    NotPending,
    /// No such order for this caller. Deliberately indistinguishable from
    /// "exists but owned by someone else" so ownership never leaks.
    NotFound,
}

pub async fn create_order(
    pool: &PgPool,
    user_id: Uuid,
    new: &NewOrder,
) -> Result<OrderView, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        insert into orders (order_id, user_id, total, shipping_address, payment_method)
        values ($1, $2, $3, $4, $5)
        returning {ORDER_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(new.total)
    .bind(Json(&new.shipping_address))
    .bind(new.payment_method)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(new.items.len());
    for item in &new.items {
        let row = sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            insert into order_items (order_item_id, order_id, product_id, name, price, quantity)
            values ($1, $2, $3, $4, $5, $6)
            returning {ITEM_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(order.order_id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .fetch_one(&mut *tx)
        .await?;
        items.push(row);
    }

    tx.commit().await?;

    Ok(OrderView { order, items })
}

/// Orders owned by one user, item snapshots embedded, newest first.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<OrderView>, sqlx::Error> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "select {ORDER_COLUMNS} from orders where user_id = $1 order by created_at desc"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut by_order = items_for(pool, orders.iter().map(|o| o.order_id).collect()).await?;

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.order_id).unwrap_or_default();
            OrderView { order, items }
        })
        .collect())
}

/// Every order in the system with the owner's email resolved (admin view).
pub async fn list_all(pool: &PgPool) -> Result<Vec<AdminOrderView>, sqlx::Error> {
    #[derive(sqlx::FromRow)]
    struct AdminOrderRow {
        #[sqlx(flatten)]
        order: Order,
        user_email: String,
    }

    let rows = sqlx::query_as::<_, AdminOrderRow>(&format!(
        r#"
        select {ORDER_COLUMNS_QUALIFIED}, u.email as user_email
        from orders o
        join users u on u.user_id = o.user_id
        order by o.created_at desc
        "#,
        ORDER_COLUMNS_QUALIFIED = "o.order_id, o.user_id, o.total, o.status, \
                                   o.shipping_address, o.payment_method, o.created_at"
    ))
    .fetch_all(pool)
    .await?;

    let mut by_order = items_for(pool, rows.iter().map(|r| r.order.order_id).collect()).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = by_order.remove(&row.order.order_id).unwrap_or_default();
            AdminOrderView {
                order: row.order,
                user_email: row.user_email,
                items,
            }
        })
        .collect())
}

/// User-initiated cancel. The lookup is scoped to the caller, so a foreign
/// order is indistinguishable from a missing one; the actual write is a
/// conditional UPDATE keyed on `pending` so a racing writer cannot produce
/// a double cancel.
pub async fn cancel_for_user(
    pool: &PgPool,
    order_id: Uuid,
    user_id: Uuid,
) -> Result<CancelOutcome, sqlx::Error> {
    let existing = sqlx::query_as::<_, Order>(&format!(
        "select {ORDER_COLUMNS} from orders where order_id = $1 and user_id = $2"
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(order) = existing else {
        return Ok(CancelOutcome::NotFound);
    };
    if !order.status.user_can_cancel() {
        return Ok(CancelOutcome::NotPending);
    }

    let cancelled = sqlx::query_as::<_, Order>(&format!(
        r#"
        update orders set status = 'cancelled'
        where order_id = $1 and user_id = $2 and status = 'pending'
        returning {ORDER_COLUMNS}
        "#,
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match cancelled {
        Some(order) => {
            let mut by_order = items_for(pool, vec![order.order_id]).await?;
            let items = by_order.remove(&order.order_id).unwrap_or_default();
            Ok(CancelOutcome::Cancelled(OrderView { order, items }))
        }
        // Lost the race to another writer between the read and the UPDATE.
        None => Ok(CancelOutcome::NotPending),
    }
}

/// Admin status overwrite. No transition-graph check on purpose: the
/// observed system lets admins move an order between any of the four
/// states, and that asymmetry is preserved.
pub async fn set_status(
    pool: &PgPool,
    order_id: Uuid,
    status: OrderStatus,
) -> Result<Option<OrderView>, sqlx::Error> {
    let updated = sqlx::query_as::<_, Order>(&format!(
        r#"
        update orders set status = $2 where order_id = $1
        returning {ORDER_COLUMNS}
        "#,
    ))
    .bind(order_id)
    .bind(status)
    .fetch_optional(pool)
    .await?;

    let Some(order) = updated else {
        return Ok(None);
    };

    let mut by_order = items_for(pool, vec![order.order_id]).await?;
    let items = by_order.remove(&order.order_id).unwrap_or_default();
    Ok(Some(OrderView { order, items }))
}

/// Fetch item snapshots for a set of orders, grouped by order id.
async fn items_for(
    pool: &PgPool,
    order_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Vec<OrderItem>>, sqlx::Error> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "select {ITEM_COLUMNS} from order_items where order_id = any($1) order by order_item_id"
    ))
    .bind(&order_ids)
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(by_order)
}
