//! Recipient routes.
//!
//! GET    /recipients      - List recipients (`?page=&filter=`), 20 per page
//! POST   /recipients      - Create a recipient with a unique name
//! GET    /recipients/{id} - Retrieve a recipient by ID
//! PUT    /recipients/{id} - Partially update a recipient (PATCH is accepted too)
//! DELETE /recipients/{id} - Delete a recipient

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::ApiError;
use crate::models::{
    MessageResponse, NewRecipient, Recipient, RecipientChanges, RecipientResponse,
};
use crate::validation::{min_len, Payload, ValidationError};
use crate::AppState;

pub const RECIPIENTS_PER_PAGE: i64 = 20;

const NAME_MIN_LEN: usize = 6;
const STATE_MIN_LEN: usize = 2;

/// Build the recipients router.
pub fn router() -> Router {
    Router::new()
        .route("/recipients", get(list_recipients).post(create_recipient))
        .route(
            "/recipients/{id}",
            get(get_recipient)
                .put(update_recipient)
                .patch(update_recipient)
                .delete(delete_recipient),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipientQuery {
    pub page: Option<i64>,
    pub filter: Option<String>,
}

impl RecipientQuery {
    /// Row offset of the requested page; pages start at 1.
    fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1).saturating_mul(RECIPIENTS_PER_PAGE)
    }
}

fn validation_failed(err: ValidationError) -> ApiError {
    debug!("Recipient validation failed: {}", err);
    ApiError::unauthorized("Validation fails")
}

fn parse_new_recipient(payload: &Payload) -> Result<NewRecipient, ValidationError> {
    let name = payload.required_string("name")?;
    min_len("name", &name, NAME_MIN_LEN)?;
    let street_name = payload.required_string("street_name")?;
    let number = payload.required_integer("number")?;
    let complement = payload.string("complement")?;
    let state = payload.required_string("state")?;
    min_len("state", &state, STATE_MIN_LEN)?;

    Ok(NewRecipient {
        name,
        street_name,
        number,
        complement,
        state,
        town: payload.required_string("town")?,
        postal_code: payload.required_string("postal_code")?,
    })
}

fn parse_recipient_changes(payload: &Payload) -> Result<RecipientChanges, ValidationError> {
    let changes = RecipientChanges {
        name: payload.string("name")?,
        street_name: payload.string("street_name")?,
        number: payload.integer("number")?,
        complement: payload.string("complement")?,
        state: payload.string("state")?,
        town: payload.string("town")?,
        postal_code: payload.string("postal_code")?,
    };

    if let Some(name) = &changes.name {
        min_len("name", name, NAME_MIN_LEN)?;
    }
    if let Some(state) = &changes.state {
        min_len("state", state, STATE_MIN_LEN)?;
    }
    Ok(changes)
}

/// List recipients whose name contains `filter`, case-insensitively.
async fn list_recipients(
    Extension(state): Extension<AppState>,
    query: Result<Query<RecipientQuery>, QueryRejection>,
) -> Result<Json<Vec<Recipient>>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        debug!("Invalid recipient query: {}", rejection.body_text());
        ApiError::bad_request("Invalid query parameters")
    })?;

    let recipients = state
        .store
        .list_recipients(
            query.filter.as_deref().unwrap_or(""),
            RECIPIENTS_PER_PAGE,
            query.offset(),
        )
        .await?;

    Ok(Json(recipients))
}

/// Retrieve a recipient by ID.
async fn get_recipient(
    Extension(state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Recipient>, ApiError> {
    let Path(id) = path?;
    let recipient = state
        .store
        .find_recipient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipient not found"))?;

    Ok(Json(recipient))
}

async fn create_recipient(
    Extension(state): Extension<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecipientResponse>, ApiError> {
    let new_recipient = Payload::from_request(body)
        .and_then(|payload| parse_new_recipient(&payload))
        .map_err(validation_failed)?;

    if state
        .store
        .find_recipient_by_name(&new_recipient.name)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Recipient already exists!"));
    }

    let recipient = state.store.create_recipient(&new_recipient).await?;
    info!("Recipient {} created", recipient.id);

    Ok(Json(recipient.into()))
}

/// Apply a partial update.
///
/// The recipient is not looked up first: an unknown id is an internal error.
async fn update_recipient(
    Extension(state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecipientResponse>, ApiError> {
    let Path(id) = path?;
    let changes = Payload::from_request(body)
        .and_then(|payload| parse_recipient_changes(&payload))
        .map_err(validation_failed)?;

    let Some(recipient) = state.store.update_recipient(id, &changes).await? else {
        error!("Update requested for unknown recipient {}", id);
        return Err(ApiError::internal());
    };

    info!("Recipient {} updated", id);
    Ok(Json(recipient.into()))
}

async fn delete_recipient(
    Extension(state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    if state.store.find_recipient(id).await?.is_none() {
        return Err(ApiError::not_found("Recipient not found"));
    }

    if !state.store.delete_recipient(id).await? {
        error!("Recipient {} was not deleted", id);
        return Err(ApiError::internal());
    }

    info!("Recipient {} deleted", id);
    Ok(Json(MessageResponse {
        message: "Recipient deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        Payload::from_value(value).unwrap()
    }

    fn valid_recipient() -> Value {
        json!({
            "name": "Joana Prado",
            "street_name": "Rua das Flores",
            "number": "12",
            "state": "PE",
            "town": "Recife",
            "postal_code": 50000000
        })
    }

    #[test]
    fn page_offsets() {
        let page = |page| RecipientQuery { page, filter: None };
        assert_eq!(page(None).offset(), 0);
        assert_eq!(page(Some(1)).offset(), 0);
        assert_eq!(page(Some(3)).offset(), 40);
        assert_eq!(page(Some(-4)).offset(), 0);
    }

    #[test]
    fn new_recipient_casts_loose_fields() {
        let recipient = parse_new_recipient(&payload(valid_recipient())).unwrap();
        assert_eq!(recipient.number, 12);
        assert_eq!(recipient.postal_code, "50000000");
        assert_eq!(recipient.complement, None);
    }

    #[test]
    fn new_recipient_enforces_minimum_lengths() {
        let mut body = valid_recipient();
        body["name"] = json!("Joana");
        assert_eq!(
            parse_new_recipient(&payload(body)).unwrap_err(),
            ValidationError::TooShort { field: "name", min: 6 }
        );

        let mut body = valid_recipient();
        body["state"] = json!("P");
        assert_eq!(
            parse_new_recipient(&payload(body)).unwrap_err(),
            ValidationError::TooShort { field: "state", min: 2 }
        );
    }

    #[test]
    fn changes_are_all_optional_but_keep_minimums() {
        assert_eq!(
            parse_recipient_changes(&payload(json!({}))).unwrap(),
            RecipientChanges::default()
        );
        assert!(parse_recipient_changes(&payload(json!({ "name": "Ana" }))).is_err());
        let changes = parse_recipient_changes(&payload(json!({ "town": "Olinda" }))).unwrap();
        assert_eq!(changes.town.as_deref(), Some("Olinda"));
    }
}
