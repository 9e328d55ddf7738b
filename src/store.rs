//! Narrow store seam: the handful of document-store capabilities the engine
//! needs, plus the MongoDB implementation. Everything above this module talks
//! in BSON filter trees and never sees the driver.

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use mongodb::options::{FindOneOptions, FindOptions};
use mongodb::{Client, Database};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mongodb: {0}")]
    Driver(#[from] mongodb::error::Error),
    #[error("store: {0}")]
    Other(String),
}

/// Store capabilities required by the listing engine: bounded projected find,
/// an independent count over the same clause, single-document lookup, and
/// plain insert. All calls are stateless round-trips; faults surface as
/// `StoreError` and are never retried here.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count_documents(&self, collection: &str, filter: Document)
        -> Result<u64, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: FindOneOptions,
    ) -> Result<Option<Document>, StoreError>;

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<Bson, StoreError>;
}

/// MongoDB-backed store.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(MongoStore {
            db: client.database(database),
        })
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(collection, filter = %filter, "find");
        let cursor = self
            .collection(collection)
            .find(filter)
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<u64, StoreError> {
        tracing::debug!(collection, filter = %filter, "count");
        Ok(self.collection(collection).count_documents(filter).await?)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        options: FindOneOptions,
    ) -> Result<Option<Document>, StoreError> {
        tracing::debug!(collection, filter = %filter, "find_one");
        Ok(self
            .collection(collection)
            .find_one(filter)
            .with_options(options)
            .await?)
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<Bson, StoreError> {
        tracing::debug!(collection, "insert_one");
        let result = self.collection(collection).insert_one(doc).await?;
        Ok(result.inserted_id)
    }
}
