//! Server binary: configuration, storage wiring, router, serve.

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tavola::config::{AppConfig, ReceiptMode};
use tavola::notify::{ConsoleReceiptSender, NoopReceiptSender, ReceiptSender};
use tavola::server::{AppState, build_router};
use tavola::service::OrderService;
use tavola::storage::{
    InMemoryOrderStore, InMemoryPaymentStore, InMemoryProductCatalog, InMemoryUserDirectory,
    MongoOrderStore, MongoPaymentStore, MongoProductCatalog, MongoUserDirectory,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load(std::env::args().nth(1).as_deref())?;

    let receipts: Arc<dyn ReceiptSender> = match config.receipts.mode {
        ReceiptMode::Console => Arc::new(ConsoleReceiptSender::new()?),
        ReceiptMode::Disabled => Arc::new(NoopReceiptSender),
    };

    let service = match &config.mongodb {
        Some(mongo) => {
            let client = mongodb::Client::with_uri_str(&mongo.uri).await?;
            let database = client.database(&mongo.database);
            tracing::info!(database = %mongo.database, "using MongoDB storage");
            OrderService::new(
                Arc::new(MongoOrderStore::new(database.clone())),
                Arc::new(MongoPaymentStore::new(database.clone())),
                Arc::new(MongoProductCatalog::new(database.clone())),
                Arc::new(MongoUserDirectory::new(database)),
                receipts,
            )
        }
        None => {
            tracing::warn!("no MongoDB configured, using in-memory storage");
            OrderService::new(
                Arc::new(InMemoryOrderStore::new()),
                Arc::new(InMemoryPaymentStore::new()),
                Arc::new(InMemoryProductCatalog::new()),
                Arc::new(InMemoryUserDirectory::new()),
                receipts,
            )
        }
    };

    let app = build_router(AppState { orders: service });

    let listener = tokio::net::TcpListener::bind(&config.http.bind).await?;
    tracing::info!(addr = %config.http.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
