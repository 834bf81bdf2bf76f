//! Document store client capability
//!
//! The gateway never talks to a driver directly. It goes through these traits,
//! which mirror the small surface a document store client has to offer:
//! connect, select a database, resolve a collection, and run one call per
//! catalog operation. [`crate::mongo`] binds them to the MongoDB driver.

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use docbridge_common::Result;

/// Entry point of a document store client
#[async_trait]
pub trait StoreClient: Send + Sync + 'static {
    type Connection: StoreConnection;

    /// Establish a connection to `address`
    async fn connect(&self, address: &str) -> Result<Self::Connection>;
}

/// An established connection
#[async_trait]
pub trait StoreConnection: Send + Sync + 'static {
    type Database: StoreDatabase;

    /// Select a database by name
    fn select_database(&self, name: &str) -> Self::Database;

    /// Release the connection
    async fn close(&self) -> Result<()>;
}

/// A selected database
pub trait StoreDatabase: Send + Sync + 'static {
    type Collection: StoreCollection;

    /// Resolve a collection by name; `None` if the store doesn't know it
    fn collection(&self, name: &str) -> Option<Self::Collection>;
}

/// Calls available on a collection
#[async_trait]
pub trait StoreCollection: Send + Sync + 'static {
    async fn insert_one(&self, document: BsonDocument) -> Result<InsertOneResult>;

    async fn insert_many(&self, documents: Vec<BsonDocument>) -> Result<InsertManyResult>;

    async fn distinct(&self, field: &str, filter: BsonDocument) -> Result<Vec<Bson>>;

    async fn find_one(&self, filter: BsonDocument) -> Result<Option<BsonDocument>>;

    /// Run a find and materialize every matching document
    async fn find(&self, request: FindRequest) -> Result<Vec<BsonDocument>>;

    async fn delete_one(&self, filter: BsonDocument) -> Result<DeleteResult>;

    async fn delete_many(&self, filter: BsonDocument) -> Result<DeleteResult>;

    async fn update_one(&self, filter: BsonDocument, update: BsonDocument) -> Result<UpdateResult>;

    async fn update_many(&self, filter: BsonDocument, update: BsonDocument)
        -> Result<UpdateResult>;

    async fn find_one_and_update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
    ) -> Result<Option<BsonDocument>>;
}

/// A find call with optional sort, skip and limit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindRequest {
    pub filter: BsonDocument,
    pub sort: Option<BsonDocument>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl FindRequest {
    pub fn new(filter: BsonDocument) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Set the sort order
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the number of documents to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of documents to return
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    pub inserted_id: Bson,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    /// Ids in insertion order
    pub inserted_ids: Vec<Bson>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Bson>,
}
