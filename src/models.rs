//! Domain models for the logistics API.
//!
//! Database rows derive `sqlx::FromRow` and map to the tables created in
//! `migrations/`. Request models are produced by the route schemas after
//! validation; response models shape the JSON the controllers return.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// Database Models (sqlx::FromRow)
// ============================================================================

/// A delivery request linking a product, a recipient and a deliveryman.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i32,
    pub product: String,
    pub recipient_id: i32,
    pub deliveryman_id: i32,
    pub signature_id: Option<i32>,
    /// Set when the deliveryman picks the order up.
    pub start_date: Option<NaiveDateTime>,
    pub canceled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A delivery destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipient {
    pub id: i32,
    pub name: String,
    pub street_name: String,
    pub number: i32,
    pub complement: Option<String>,
    pub state: String,
    pub town: String,
    pub postal_code: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A courier that orders are assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Deliveryman {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ============================================================================
// Embedded summaries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientSummary {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverymanSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&Recipient> for RecipientSummary {
    fn from(recipient: &Recipient) -> Self {
        Self {
            id: recipient.id,
            name: recipient.name.clone(),
        }
    }
}

impl From<&Deliveryman> for DeliverymanSummary {
    fn from(deliveryman: &Deliveryman) -> Self {
        Self {
            id: deliveryman.id,
            name: deliveryman.name.clone(),
            email: deliveryman.email.clone(),
        }
    }
}

/// An order together with its recipient and deliveryman summaries.
///
/// The summaries are optional because the association is loaded with an
/// outer join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub recipient: Option<RecipientSummary>,
    pub deliveryman: Option<DeliverymanSummary>,
}

/// One entry of the order listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderListItem {
    pub id: i32,
    pub product: String,
    pub created_at: NaiveDateTime,
    pub recipient: Option<RecipientSummary>,
    pub deliveryman: Option<DeliverymanSummary>,
}

// ============================================================================
// Request Models (validated input)
// ============================================================================

/// Fields of a new order, after schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub recipient_id: i32,
    pub deliveryman_id: i32,
    pub signature_id: Option<i32>,
    pub product: String,
}

/// Partial update of an order. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderChanges {
    pub recipient_id: Option<i32>,
    pub deliveryman_id: Option<i32>,
    pub product: Option<String>,
}

/// Fields of a new recipient, after schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipient {
    pub name: String,
    pub street_name: String,
    pub number: i32,
    pub complement: Option<String>,
    pub state: String,
    pub town: String,
    pub postal_code: String,
}

/// Partial update of a recipient. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientChanges {
    pub name: Option<String>,
    pub street_name: Option<String>,
    pub number: Option<i32>,
    pub complement: Option<String>,
    pub state: Option<String>,
    pub town: Option<String>,
    pub postal_code: Option<String>,
}

// ============================================================================
// Response Models
// ============================================================================

/// Recipient fields echoed back by create and update.
#[derive(Debug, Serialize)]
pub struct RecipientResponse {
    pub id: i32,
    pub name: String,
    pub street_name: String,
    pub number: i32,
    pub complement: Option<String>,
    pub state: String,
    pub town: String,
    pub postal_code: String,
}

impl From<Recipient> for RecipientResponse {
    fn from(recipient: Recipient) -> Self {
        Self {
            id: recipient.id,
            name: recipient.name,
            street_name: recipient.street_name,
            number: recipient.number,
            complement: recipient.complement,
            state: recipient.state,
            town: recipient.town,
            postal_code: recipient.postal_code,
        }
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
