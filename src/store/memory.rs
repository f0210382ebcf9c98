//! In-process implementation of [`Store`].
//!
//! Mirrors the constraints of the PostgreSQL schema: unique recipient names
//! and restrictive foreign keys from orders to recipients and deliverymen.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Deliveryman, DeliverymanSummary, NewOrder, NewRecipient, Order, OrderChanges, OrderDetail,
    OrderListItem, Recipient, RecipientChanges, RecipientSummary,
};

#[derive(Debug, Default)]
struct Tables {
    orders: BTreeMap<i32, Order>,
    recipients: BTreeMap<i32, Recipient>,
    deliverymen: BTreeMap<i32, Deliveryman>,
    last_order_id: i32,
    last_recipient_id: i32,
    last_deliveryman_id: i32,
}

impl Tables {
    fn summaries(&self, order: &Order) -> (Option<RecipientSummary>, Option<DeliverymanSummary>) {
        (
            self.recipients.get(&order.recipient_id).map(RecipientSummary::from),
            self.deliverymen.get(&order.deliveryman_id).map(DeliverymanSummary::from),
        )
    }

    fn check_references(&self, recipient_id: i32, deliveryman_id: i32) -> StoreResult<()> {
        if !self.recipients.contains_key(&recipient_id) {
            return Err(StoreError::ForeignKeyViolation("orders_recipient_id_fkey".into()));
        }
        if !self.deliverymen.contains_key(&deliveryman_id) {
            return Err(StoreError::ForeignKeyViolation("orders_deliveryman_id_fkey".into()));
        }
        Ok(())
    }

    fn check_unique_name(&self, name: &str, except: Option<i32>) -> StoreResult<()> {
        let taken = self
            .recipients
            .values()
            .any(|r| r.name == name && Some(r.id) != except);
        if taken {
            return Err(StoreError::UniqueViolation("recipients_name_key".into()));
        }
        Ok(())
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Store keeping every table in memory behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a deliveryman. Deliverymen have no HTTP surface, so this is how
    /// they get into the in-memory store.
    pub async fn insert_deliveryman(&self, name: &str, email: &str) -> Deliveryman {
        let mut tables = self.tables.write().await;
        tables.last_deliveryman_id += 1;
        let timestamp = now();
        let deliveryman = Deliveryman {
            id: tables.last_deliveryman_id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.deliverymen.insert(deliveryman.id, deliveryman.clone());
        deliveryman
    }

    /// Mark an order as picked up by its deliveryman. There is no endpoint
    /// that starts a delivery, so tests use this to build in-progress orders.
    pub async fn start_delivery(&self, order_id: i32, start_date: NaiveDateTime) -> Option<Order> {
        let mut tables = self.tables.write().await;
        let order = tables.orders.get_mut(&order_id)?;
        order.start_date = Some(start_date);
        order.updated_at = now();
        Some(order.clone())
    }

    /// Number of stored orders, for test assertions.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_orders(&self) -> StoreResult<Vec<OrderListItem>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<&Order> = tables.orders.values().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(orders
            .into_iter()
            .map(|order| {
                let (recipient, deliveryman) = tables.summaries(order);
                OrderListItem {
                    id: order.id,
                    product: order.product.clone(),
                    created_at: order.created_at,
                    recipient,
                    deliveryman,
                }
            })
            .collect())
    }

    async fn find_order_detail(&self, id: i32) -> StoreResult<Option<OrderDetail>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).map(|order| {
            let (recipient, deliveryman) = tables.summaries(order);
            OrderDetail {
                order: order.clone(),
                recipient,
                deliveryman,
            }
        }))
    }

    async fn create_order(&self, order: &NewOrder) -> StoreResult<Order> {
        let mut tables = self.tables.write().await;
        tables.check_references(order.recipient_id, order.deliveryman_id)?;

        tables.last_order_id += 1;
        let timestamp = now();
        let created = Order {
            id: tables.last_order_id,
            product: order.product.clone(),
            recipient_id: order.recipient_id,
            deliveryman_id: order.deliveryman_id,
            signature_id: order.signature_id,
            start_date: None,
            canceled_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.orders.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_order(&self, id: i32, changes: &OrderChanges) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.orders.get(&id) else {
            return Ok(None);
        };

        let recipient_id = changes.recipient_id.unwrap_or(current.recipient_id);
        let deliveryman_id = changes.deliveryman_id.unwrap_or(current.deliveryman_id);
        tables.check_references(recipient_id, deliveryman_id)?;

        let Some(order) = tables.orders.get_mut(&id) else {
            return Ok(None);
        };
        order.recipient_id = recipient_id;
        order.deliveryman_id = deliveryman_id;
        if let Some(product) = &changes.product {
            order.product = product.clone();
        }
        order.updated_at = now();
        Ok(Some(order.clone()))
    }

    async fn cancel_order(&self, id: i32, canceled_at: NaiveDateTime) -> StoreResult<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&id).map(|order| {
            order.canceled_at = Some(canceled_at);
            order.updated_at = now();
            order.clone()
        }))
    }

    async fn list_recipients(&self, filter: &str, limit: i64, offset: i64) -> StoreResult<Vec<Recipient>> {
        let needle = filter.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .recipients
            .values()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_recipient(&self, id: i32) -> StoreResult<Option<Recipient>> {
        Ok(self.tables.read().await.recipients.get(&id).cloned())
    }

    async fn find_recipient_by_name(&self, name: &str) -> StoreResult<Option<Recipient>> {
        let tables = self.tables.read().await;
        Ok(tables.recipients.values().find(|r| r.name == name).cloned())
    }

    async fn create_recipient(&self, recipient: &NewRecipient) -> StoreResult<Recipient> {
        let mut tables = self.tables.write().await;
        tables.check_unique_name(&recipient.name, None)?;

        tables.last_recipient_id += 1;
        let timestamp = now();
        let created = Recipient {
            id: tables.last_recipient_id,
            name: recipient.name.clone(),
            street_name: recipient.street_name.clone(),
            number: recipient.number,
            complement: recipient.complement.clone(),
            state: recipient.state.clone(),
            town: recipient.town.clone(),
            postal_code: recipient.postal_code.clone(),
            created_at: timestamp,
            updated_at: timestamp,
        };
        tables.recipients.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_recipient(
        &self,
        id: i32,
        changes: &RecipientChanges,
    ) -> StoreResult<Option<Recipient>> {
        let mut tables = self.tables.write().await;
        if !tables.recipients.contains_key(&id) {
            return Ok(None);
        }
        if let Some(name) = &changes.name {
            tables.check_unique_name(name, Some(id))?;
        }

        let Some(recipient) = tables.recipients.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            recipient.name = name.clone();
        }
        if let Some(street_name) = &changes.street_name {
            recipient.street_name = street_name.clone();
        }
        if let Some(number) = changes.number {
            recipient.number = number;
        }
        if let Some(complement) = &changes.complement {
            recipient.complement = Some(complement.clone());
        }
        if let Some(state) = &changes.state {
            recipient.state = state.clone();
        }
        if let Some(town) = &changes.town {
            recipient.town = town.clone();
        }
        if let Some(postal_code) = &changes.postal_code {
            recipient.postal_code = postal_code.clone();
        }
        recipient.updated_at = now();
        Ok(Some(recipient.clone()))
    }

    async fn delete_recipient(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.orders.values().any(|o| o.recipient_id == id) {
            return Err(StoreError::ForeignKeyViolation("orders_recipient_id_fkey".into()));
        }
        Ok(tables.recipients.remove(&id).is_some())
    }

    async fn find_deliveryman(&self, id: i32) -> StoreResult<Option<Deliveryman>> {
        Ok(self.tables.read().await.deliverymen.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_recipient(name: &str) -> NewRecipient {
        NewRecipient {
            name: name.to_string(),
            street_name: "Rua das Flores".to_string(),
            number: 12,
            complement: None,
            state: "PE".to_string(),
            town: "Recife".to_string(),
            postal_code: "50000-000".to_string(),
        }
    }

    #[tokio::test]
    async fn recipient_names_are_unique() {
        let store = MemoryStore::new();
        store.create_recipient(&new_recipient("Joana Prado")).await.unwrap();
        let err = store
            .create_recipient(&new_recipient("Joana Prado"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn orders_require_existing_references() {
        let store = MemoryStore::new();
        let err = store
            .create_order(&NewOrder {
                recipient_id: 1,
                deliveryman_id: 1,
                signature_id: None,
                product: "Notebook".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn referenced_recipients_cannot_be_deleted() {
        let store = MemoryStore::new();
        let recipient = store.create_recipient(&new_recipient("Joana Prado")).await.unwrap();
        let deliveryman = store.insert_deliveryman("Carlos Lima", "carlos@fastfeet.com").await;
        store
            .create_order(&NewOrder {
                recipient_id: recipient.id,
                deliveryman_id: deliveryman.id,
                signature_id: None,
                product: "Notebook".into(),
            })
            .await
            .unwrap();

        assert!(store.delete_recipient(recipient.id).await.is_err());
        assert!(store.find_recipient(recipient.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn recipient_listing_filters_case_insensitively_and_pages() {
        let store = MemoryStore::new();
        for name in ["Joana Prado", "Marcos JOrge", "Ana Beatriz", "Pedro Jobim"] {
            store.create_recipient(&new_recipient(name)).await.unwrap();
        }

        let names: Vec<String> = store
            .list_recipients("jo", 20, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Joana Prado", "Marcos JOrge", "Pedro Jobim"]);

        let second_page = store.list_recipients("jo", 2, 2).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].name, "Pedro Jobim");
    }
}
