//! MongoDB storage backend using the official MongoDB async driver.
//!
//! # Storage model
//!
//! Collection-per-entity: `orders`, `payments`, `products`, `users`. The
//! catalog and directory collections are written by the sibling services
//! that own them; this backend only reads them.
//!
//! # Serialization strategy
//!
//! Entities are serialized via `serde_json::Value` as an intermediate
//! format, then converted to BSON documents. This ensures consistent
//! handling of UUIDs (stored as strings) and timestamps (stored as ISO 8601
//! strings). The `id` field is mapped to MongoDB's `_id` convention.
//! Query-side values (user ids, statuses, time bounds) are rendered through
//! the same serialization so filters compare against the stored form.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::entities::{Order, OrderStatus, Payment, Product, User};
use crate::storage::{OrderFilter, OrderStore, PaymentStore, ProductCatalog, UserDirectory};

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serializable entity into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn to_document<T: Serialize>(entity: &T) -> Result<Document> {
    let json = serde_json::to_value(entity)
        .map_err(|e| anyhow!("Failed to serialize entity: {}", e))?;
    let bson_val =
        mongodb::bson::to_bson(&json).map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into an entity,
/// renaming `_id` → `id` for domain convention.
fn from_document<T: DeserializeOwned>(mut doc: Document) -> Result<T> {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    let json = Bson::Document(doc).into_relaxed_extjson();
    serde_json::from_value(json).map_err(|e| anyhow!("Failed to deserialize entity: {}", e))
}

/// Convert a UUID to its BSON string representation for queries.
fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

/// Render a timestamp the same way entity serialization stores it, so range
/// filters compare like with like.
fn datetime_bson(dt: &DateTime<Utc>) -> Result<Bson> {
    match serde_json::to_value(dt) {
        Ok(serde_json::Value::String(s)) => Ok(Bson::String(s)),
        Ok(other) => Err(anyhow!("Unexpected timestamp serialization: {}", other)),
        Err(e) => Err(anyhow!("Failed to serialize timestamp: {}", e)),
    }
}

/// Build the query document for an [`OrderFilter`].
fn filter_document(filter: &OrderFilter) -> Result<Document> {
    let mut doc = Document::new();

    if let Some(user) = &filter.user {
        doc.insert("user", uuid_bson(user));
    }
    if let Some(status) = &filter.status {
        doc.insert("status", status.as_str());
    }

    let mut created = Document::new();
    if let Some(from) = &filter.created_from {
        created.insert("$gte", datetime_bson(from)?);
    }
    if let Some(to) = &filter.created_to {
        created.insert("$lte", datetime_bson(to)?);
    }
    if !created.is_empty() {
        doc.insert("created_at", created);
    }

    Ok(doc)
}

// ---------------------------------------------------------------------------
// MongoOrderStore
// ---------------------------------------------------------------------------

/// Order store backed by the `orders` collection.
#[derive(Clone, Debug)]
pub struct MongoOrderStore {
    database: Database,
}

impl MongoOrderStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection("orders")
    }
}

#[async_trait]
impl OrderStore for MongoOrderStore {
    /// Insert the order and read it back to return the stored version.
    async fn insert(&self, order: Order) -> Result<Order> {
        let doc = to_document(&order)?;
        let id_bson = uuid_bson(&order.id);

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| anyhow!("Failed to create order: {}", e))?;

        let result = self
            .collection()
            .find_one(doc! { "_id": id_bson })
            .await
            .map_err(|e| anyhow!("Failed to read back created order: {}", e))?
            .ok_or_else(|| anyhow!("Order not found after insert"))?;

        from_document(result)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Order>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get order: {}", e))?;

        match doc {
            Some(d) => Ok(Some(from_document(d)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let doc = to_document(order)?;

        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(&order.id) }, doc)
            .await
            .map_err(|e| anyhow!("Failed to update order: {}", e))?;

        if result.matched_count == 0 {
            return Err(anyhow!("Order not found: {}", order.id));
        }

        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = self
            .collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete order: {}", e))?;

        Ok(result.deleted_count > 0)
    }

    async fn find(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let cursor = self
            .collection()
            .find(filter_document(filter)?)
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(|e| anyhow!("Failed to find orders: {}", e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect orders: {}", e))?;

        docs.into_iter().map(from_document).collect()
    }

    async fn latest_open_for_user(&self, user: &Uuid) -> Result<Option<Order>> {
        let doc = self
            .collection()
            .find_one(doc! {
                "user": uuid_bson(user),
                "status": OrderStatus::New.as_str(),
            })
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(|e| anyhow!("Failed to find open order: {}", e))?;

        match doc {
            Some(d) => Ok(Some(from_document(d)?)),
            None => Ok(None),
        }
    }

    async fn count(&self, filter: &OrderFilter) -> Result<u64> {
        self.collection()
            .count_documents(filter_document(filter)?)
            .await
            .map_err(|e| anyhow!("Failed to count orders: {}", e))
    }
}

// ---------------------------------------------------------------------------
// MongoPaymentStore
// ---------------------------------------------------------------------------

/// Payment store backed by the `payments` collection.
#[derive(Clone, Debug)]
pub struct MongoPaymentStore {
    database: Database,
}

impl MongoPaymentStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection("payments")
    }
}

#[async_trait]
impl PaymentStore for MongoPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<Payment> {
        let doc = to_document(&payment)?;
        let id_bson = uuid_bson(&payment.id);

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| anyhow!("Failed to create payment: {}", e))?;

        let result = self
            .collection()
            .find_one(doc! { "_id": id_bson })
            .await
            .map_err(|e| anyhow!("Failed to read back created payment: {}", e))?
            .ok_or_else(|| anyhow!("Payment not found after insert"))?;

        from_document(result)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Payment>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get payment: {}", e))?;

        match doc {
            Some(d) => Ok(Some(from_document(d)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let doc = to_document(payment)?;

        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(&payment.id) }, doc)
            .await
            .map_err(|e| anyhow!("Failed to update payment: {}", e))?;

        if result.matched_count == 0 {
            return Err(anyhow!("Payment not found: {}", payment.id));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Read-only collaborators
// ---------------------------------------------------------------------------

/// Read-only catalog view over the `products` collection.
#[derive(Clone, Debug)]
pub struct MongoProductCatalog {
    database: Database,
}

impl MongoProductCatalog {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection("products")
    }
}

#[async_trait]
impl ProductCatalog for MongoProductCatalog {
    async fn get(&self, id: &Uuid) -> Result<Option<Product>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get product: {}", e))?;

        match doc {
            Some(d) => Ok(Some(from_document(d)?)),
            None => Ok(None),
        }
    }
}

/// Read-only directory view over the `users` collection.
#[derive(Clone, Debug)]
pub struct MongoUserDirectory {
    database: Database,
}

impl MongoUserDirectory {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection("users")
    }
}

#[async_trait]
impl UserDirectory for MongoUserDirectory {
    async fn get(&self, id: &Uuid) -> Result<Option<User>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get user: {}", e))?;

        match doc {
            Some(d) => Ok(Some(from_document(d)?)),
            None => Ok(None),
        }
    }
}
