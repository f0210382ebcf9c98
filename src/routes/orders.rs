//! Order routes.
//!
//! GET    /orders      - List orders, newest first
//! POST   /orders      - Create an order and queue the new order mail
//! GET    /orders/{id} - Retrieve an order with recipient and deliveryman
//! PUT    /orders/{id} - Partially update an order (PATCH is accepted too)
//! DELETE /orders/{id} - Cancel an order that has not started

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::error::ApiError;
use crate::models::{NewOrder, Order, OrderChanges, OrderDetail, OrderListItem};
use crate::queue::NEW_ORDER_MAIL;
use crate::validation::{Payload, ValidationError};
use crate::AppState;

/// Build the orders router.
pub fn router() -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order)
                .put(update_order)
                .patch(update_order)
                .delete(cancel_order),
        )
}

fn validation_failed(err: ValidationError) -> ApiError {
    debug!("Order validation failed: {}", err);
    ApiError::bad_request("Validation fails")
}

fn parse_new_order(payload: &Payload) -> Result<NewOrder, ValidationError> {
    Ok(NewOrder {
        recipient_id: payload.required_integer("recipient_id")?,
        deliveryman_id: payload.required_integer("deliveryman_id")?,
        signature_id: payload.integer("signature_id")?,
        product: payload.required_string("product")?,
    })
}

fn parse_order_changes(payload: &Payload) -> Result<OrderChanges, ValidationError> {
    Ok(OrderChanges {
        recipient_id: payload.integer("recipient_id")?,
        deliveryman_id: payload.integer("deliveryman_id")?,
        product: payload.string("product")?,
    })
}

/// List every order with its recipient and deliveryman summaries.
async fn list_orders(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<OrderListItem>>, ApiError> {
    let orders = state.store.list_orders().await?;
    Ok(Json(orders))
}

/// Retrieve an order by ID.
async fn get_order(
    Extension(state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<OrderDetail>, ApiError> {
    let Path(id) = path?;
    let order = state
        .store
        .find_order_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    Ok(Json(order))
}

/// Create a new order and queue the new order mail for its deliveryman.
///
/// 1. Validate the body
/// 2. Check that the recipient and the deliveryman exist
/// 3. Insert the order
/// 4. Queue `NewOrderMail` with the deliveryman and the order
async fn create_order(
    Extension(state): Extension<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let new_order = Payload::from_request(body)
        .and_then(|payload| parse_new_order(&payload))
        .map_err(validation_failed)?;

    if state.store.find_recipient(new_order.recipient_id).await?.is_none() {
        return Err(ApiError::bad_request("Unable to find recipient"));
    }

    let deliveryman = state
        .store
        .find_deliveryman(new_order.deliveryman_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Unable to find deliveryman"))?;

    let order = state.store.create_order(&new_order).await?;
    info!("Order {} created for deliveryman {}", order.id, deliveryman.id);

    let payload = json!({
        "deliveryman": deliveryman,
        "order": order,
    });
    if let Err(e) = state.queue.add(&NEW_ORDER_MAIL, payload).await {
        error!("Failed to queue {} for order {}: {}", NEW_ORDER_MAIL.key, order.id, e);
    }

    Ok((StatusCode::CREATED, Json(order)))
}

/// Apply a partial update. Responds with an empty body.
///
/// The deliveryman and recipient are looked up by the ids in the body; an id
/// left out of the body counts as a missing reference.
async fn update_order(
    Extension(state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = path?;
    let changes = Payload::from_request(body)
        .and_then(|payload| parse_order_changes(&payload))
        .map_err(validation_failed)?;

    let deliveryman = match changes.deliveryman_id {
        Some(deliveryman_id) => state.store.find_deliveryman(deliveryman_id).await?,
        None => None,
    };
    if deliveryman.is_none() {
        return Err(ApiError::not_found("Delivery man not found"));
    }

    let recipient = match changes.recipient_id {
        Some(recipient_id) => state.store.find_recipient(recipient_id).await?,
        None => None,
    };
    if recipient.is_none() {
        return Err(ApiError::not_found("Recipient not found"));
    }

    state
        .store
        .update_order(id, &changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    info!("Order {} updated", id);
    Ok(StatusCode::OK)
}

/// Cancel an order by stamping `canceled_at`.
///
/// Orders already out for delivery (`start_date` set) cannot be canceled.
/// There is no not-found branch: an unknown id is an internal error.
async fn cancel_order(
    Extension(state): Extension<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<OrderDetail>, ApiError> {
    let Path(id) = path?;
    let Some(mut detail) = state.store.find_order_detail(id).await? else {
        error!("Cancel requested for unknown order {}", id);
        return Err(ApiError::internal());
    };

    if detail.order.start_date.is_some() {
        return Err(ApiError::unauthorized("You cannot cancel a delivery in progress."));
    }

    let Some(order) = state.store.cancel_order(id, Utc::now().naive_utc()).await? else {
        error!("Order {} disappeared while being canceled", id);
        return Err(ApiError::internal());
    };

    info!("Order {} canceled", id);
    detail.order = order;
    Ok(Json(detail))
}
