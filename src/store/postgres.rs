//! PostgreSQL implementation of [`Store`].

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::{Store, StoreResult};
use crate::db::AppDb;
use crate::models::{
    Deliveryman, DeliverymanSummary, NewOrder, NewRecipient, Order, OrderChanges, OrderDetail,
    OrderListItem, Recipient, RecipientChanges, RecipientSummary,
};

/// Columns of the recipient and deliveryman summaries, aliased so they do
/// not collide with the order's own columns.
const SUMMARY_COLUMNS: &str = r#"
    r.id AS r_id, r.name AS r_name,
    d.id AS d_id, d.name AS d_name, d.email AS d_email
"#;

const SUMMARY_JOINS: &str = r#"
    LEFT JOIN recipients r ON r.id = o.recipient_id
    LEFT JOIN deliverymen d ON d.id = o.deliveryman_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct SummaryColumns {
    r_id: Option<i32>,
    r_name: Option<String>,
    d_id: Option<i32>,
    d_name: Option<String>,
    d_email: Option<String>,
}

impl SummaryColumns {
    fn recipient(&self) -> Option<RecipientSummary> {
        Some(RecipientSummary {
            id: self.r_id?,
            name: self.r_name.clone()?,
        })
    }

    fn deliveryman(&self) -> Option<DeliverymanSummary> {
        Some(DeliverymanSummary {
            id: self.d_id?,
            name: self.d_name.clone()?,
            email: self.d_email.clone()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderDetailRow {
    #[sqlx(flatten)]
    order: Order,
    #[sqlx(flatten)]
    summaries: SummaryColumns,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        Self {
            recipient: row.summaries.recipient(),
            deliveryman: row.summaries.deliveryman(),
            order: row.order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderListRow {
    id: i32,
    product: String,
    created_at: NaiveDateTime,
    #[sqlx(flatten)]
    summaries: SummaryColumns,
}

impl From<OrderListRow> for OrderListItem {
    fn from(row: OrderListRow) -> Self {
        Self {
            recipient: row.summaries.recipient(),
            deliveryman: row.summaries.deliveryman(),
            id: row.id,
            product: row.product,
            created_at: row.created_at,
        }
    }
}

/// Escape `LIKE` wildcards so the filter matches as a plain substring.
fn like_pattern(filter: &str) -> String {
    let mut escaped = String::with_capacity(filter.len() + 2);
    escaped.push('%');
    for c in filter.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// sqlx-backed store over the application database.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: AppDb,
}

impl PgStore {
    pub fn new(pool: AppDb) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_orders(&self) -> StoreResult<Vec<OrderListItem>> {
        let sql = format!(
            "SELECT o.id, o.product, o.created_at, {SUMMARY_COLUMNS} FROM orders o {SUMMARY_JOINS} \
             ORDER BY o.created_at DESC, o.id DESC"
        );
        let rows: Vec<OrderListRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(OrderListItem::from).collect())
    }

    async fn find_order_detail(&self, id: i32) -> StoreResult<Option<OrderDetail>> {
        let sql = format!("SELECT o.*, {SUMMARY_COLUMNS} FROM orders o {SUMMARY_JOINS} WHERE o.id = $1");
        let row: Option<OrderDetailRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(OrderDetail::from))
    }

    async fn create_order(&self, order: &NewOrder) -> StoreResult<Order> {
        let created: Order = sqlx::query_as(
            r#"
            INSERT INTO orders (product, recipient_id, deliveryman_id, signature_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&order.product)
        .bind(order.recipient_id)
        .bind(order.deliveryman_id)
        .bind(order.signature_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_order(&self, id: i32, changes: &OrderChanges) -> StoreResult<Option<Order>> {
        let updated: Option<Order> = sqlx::query_as(
            r#"
            UPDATE orders
            SET recipient_id = COALESCE($2, recipient_id),
                deliveryman_id = COALESCE($3, deliveryman_id),
                product = COALESCE($4, product),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.recipient_id)
        .bind(changes.deliveryman_id)
        .bind(changes.product.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn cancel_order(&self, id: i32, canceled_at: NaiveDateTime) -> StoreResult<Option<Order>> {
        let updated: Option<Order> = sqlx::query_as(
            "UPDATE orders SET canceled_at = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(canceled_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn list_recipients(&self, filter: &str, limit: i64, offset: i64) -> StoreResult<Vec<Recipient>> {
        let recipients: Vec<Recipient> = sqlx::query_as(
            "SELECT * FROM recipients WHERE name ILIKE $1 ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(like_pattern(filter))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(recipients)
    }

    async fn find_recipient(&self, id: i32) -> StoreResult<Option<Recipient>> {
        let recipient: Option<Recipient> = sqlx::query_as("SELECT * FROM recipients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(recipient)
    }

    async fn find_recipient_by_name(&self, name: &str) -> StoreResult<Option<Recipient>> {
        let recipient: Option<Recipient> = sqlx::query_as("SELECT * FROM recipients WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(recipient)
    }

    async fn create_recipient(&self, recipient: &NewRecipient) -> StoreResult<Recipient> {
        let created: Recipient = sqlx::query_as(
            r#"
            INSERT INTO recipients (name, street_name, number, complement, state, town, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&recipient.name)
        .bind(&recipient.street_name)
        .bind(recipient.number)
        .bind(recipient.complement.as_deref())
        .bind(&recipient.state)
        .bind(&recipient.town)
        .bind(&recipient.postal_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_recipient(
        &self,
        id: i32,
        changes: &RecipientChanges,
    ) -> StoreResult<Option<Recipient>> {
        let updated: Option<Recipient> = sqlx::query_as(
            r#"
            UPDATE recipients
            SET name = COALESCE($2, name),
                street_name = COALESCE($3, street_name),
                number = COALESCE($4, number),
                complement = COALESCE($5, complement),
                state = COALESCE($6, state),
                town = COALESCE($7, town),
                postal_code = COALESCE($8, postal_code),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.street_name.as_deref())
        .bind(changes.number)
        .bind(changes.complement.as_deref())
        .bind(changes.state.as_deref())
        .bind(changes.town.as_deref())
        .bind(changes.postal_code.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_recipient(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM recipients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_deliveryman(&self, id: i32) -> StoreResult<Option<Deliveryman>> {
        let deliveryman: Option<Deliveryman> = sqlx::query_as("SELECT * FROM deliverymen WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(deliveryman)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_wraps_and_escapes_wildcards() {
        assert_eq!(like_pattern("jo"), "%jo%");
        assert_eq!(like_pattern(""), "%%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
