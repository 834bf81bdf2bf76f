//! Connection-and-query facade over a MongoDB document store
//!
//! This crate owns one lazily-established connection and a fixed catalog of
//! CRUD operations. The actual work is delegated to the store client.
//!
//! # Features
//! - Background connect with unbounded, fixed-delay retry
//! - Request gate: absent parameters or a handle that isn't ready never reach the store
//! - Twelve catalog operations dispatched through one closed [`OperationKind`]
//! - Store client abstraction with a MongoDB driver binding
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use docbridge_mongodb::{MongoClient, MongoGateway};
//! use std::time::Duration;
//!
//! let gateway = MongoGateway::new(MongoClient::new());
//! gateway.open_connection("shop", "mongodb://localhost:27017/", Duration::from_secs(1));
//! gateway.wait_ready().await;
//!
//! let outcome = gateway.insert_one("users", doc! { "name": "a" }).await?;
//! gateway.close_connection().await;
//! ```

pub mod config;
pub mod gateway;
pub mod handle;
pub mod mongo;
pub mod operation;
pub mod store;

pub use config::{PoolConfig, StoreConfig};
pub use docbridge_common::{DatabaseError, DocBridgeError, Result};
pub use gateway::Gateway;
pub use handle::{CollectionOf, ConnectionAttempt, ConnectionState, StoreHandle};
pub use mongo::{MongoClient, MongoCollection, MongoConnection, MongoDatabase};
pub use operation::{normalize, OperationKind, OperationOutcome, StoreCall};
pub use store::{
    DeleteResult, FindRequest, InsertManyResult, InsertOneResult, StoreClient, StoreCollection,
    StoreConnection, StoreDatabase, UpdateResult,
};

/// Gateway bound to the MongoDB driver
pub type MongoGateway = Gateway<MongoClient>;
