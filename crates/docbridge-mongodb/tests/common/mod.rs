//! Recording in-memory store client for gateway and lifecycle tests

#![allow(dead_code)]

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use docbridge_common::{DocBridgeError, Result};
use docbridge_mongodb::{
    DeleteResult, FindRequest, Gateway, InsertManyResult, InsertOneResult, StoreCall,
    StoreClient, StoreCollection, StoreConnection, StoreDatabase, UpdateResult,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub const NAME: &str = "shop";
pub const ADDRESS: &str = "store://host/";
pub const TARGET: &str = "store://host/shop";

#[derive(Default)]
struct MockState {
    connects: Mutex<Vec<String>>,
    /// Connect attempts left to fail; `None` fails forever
    failures_left: Mutex<Option<usize>>,
    selected: Mutex<Vec<String>>,
    closes: Mutex<usize>,
    /// `None` resolves every name
    collections: Mutex<Option<HashSet<String>>>,
    calls: Mutex<Vec<(String, StoreCall)>>,
    store_failure: Mutex<Option<String>>,
}

#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<MockState>,
}

impl MockClient {
    /// Connects on the first attempt
    pub fn reachable() -> Self {
        let client = Self::default();
        *client.state.failures_left.lock() = Some(0);
        client
    }

    /// Fails every connect until [`MockClient::make_reachable`]
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Fails the first `count` connects
    pub fn failing(count: usize) -> Self {
        let client = Self::default();
        *client.state.failures_left.lock() = Some(count);
        client
    }

    pub fn make_reachable(&self) {
        *self.state.failures_left.lock() = Some(0);
    }

    /// Only resolve the given collection names
    pub fn with_collections(self, names: &[&str]) -> Self {
        *self.state.collections.lock() = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Every store call fails with this message
    pub fn with_store_failure(self, message: &str) -> Self {
        *self.state.store_failure.lock() = Some(message.to_string());
        self
    }

    pub fn connects(&self) -> Vec<String> {
        self.state.connects.lock().clone()
    }

    pub fn selected(&self) -> Vec<String> {
        self.state.selected.lock().clone()
    }

    pub fn closes(&self) -> usize {
        *self.state.closes.lock()
    }

    pub fn calls(&self) -> Vec<(String, StoreCall)> {
        self.state.calls.lock().clone()
    }
}

#[async_trait]
impl StoreClient for MockClient {
    type Connection = MockConnection;

    async fn connect(&self, address: &str) -> Result<MockConnection> {
        self.state.connects.lock().push(address.to_string());

        let mut failures_left = self.state.failures_left.lock();
        match failures_left.as_mut() {
            Some(0) => Ok(MockConnection {
                state: Arc::clone(&self.state),
            }),
            Some(left) => {
                *left -= 1;
                Err(DocBridgeError::Connection("connection refused".to_string()))
            }
            None => Err(DocBridgeError::Connection("connection refused".to_string())),
        }
    }
}

pub struct MockConnection {
    state: Arc<MockState>,
}

#[async_trait]
impl StoreConnection for MockConnection {
    type Database = MockDatabase;

    fn select_database(&self, name: &str) -> MockDatabase {
        self.state.selected.lock().push(name.to_string());
        MockDatabase {
            state: Arc::clone(&self.state),
        }
    }

    async fn close(&self) -> Result<()> {
        *self.state.closes.lock() += 1;
        Ok(())
    }
}

pub struct MockDatabase {
    state: Arc<MockState>,
}

impl StoreDatabase for MockDatabase {
    type Collection = MockCollection;

    fn collection(&self, name: &str) -> Option<MockCollection> {
        let known = match self.state.collections.lock().as_ref() {
            Some(names) => names.contains(name),
            None => true,
        };
        known.then(|| MockCollection {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockCollection {
    name: String,
    state: Arc<MockState>,
}

impl MockCollection {
    fn record(&self, call: StoreCall) -> Result<()> {
        self.state.calls.lock().push((self.name.clone(), call));
        match self.state.store_failure.lock().as_ref() {
            Some(message) => Err(DocBridgeError::Store(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StoreCollection for MockCollection {
    async fn insert_one(&self, document: BsonDocument) -> Result<InsertOneResult> {
        let inserted_id = document.get("_id").cloned().unwrap_or(Bson::Int32(1));
        self.record(StoreCall::InsertOne(document))?;
        Ok(InsertOneResult { inserted_id })
    }

    async fn insert_many(&self, documents: Vec<BsonDocument>) -> Result<InsertManyResult> {
        let inserted_ids = (0..documents.len() as i64).map(Bson::Int64).collect();
        self.record(StoreCall::InsertMany(documents))?;
        Ok(InsertManyResult { inserted_ids })
    }

    async fn distinct(&self, field: &str, filter: BsonDocument) -> Result<Vec<Bson>> {
        self.record(StoreCall::Distinct {
            field: field.to_string(),
            filter,
        })?;
        Ok(vec![Bson::String("paris".to_string()), Bson::String("rome".to_string())])
    }

    async fn find_one(&self, filter: BsonDocument) -> Result<Option<BsonDocument>> {
        self.record(StoreCall::FindOne(filter.clone()))?;
        Ok(Some(filter))
    }

    async fn find(&self, request: FindRequest) -> Result<Vec<BsonDocument>> {
        let filter = request.filter.clone();
        self.record(StoreCall::Find(request))?;
        Ok(vec![filter])
    }

    async fn delete_one(&self, filter: BsonDocument) -> Result<DeleteResult> {
        self.record(StoreCall::DeleteOne(filter))?;
        Ok(DeleteResult { deleted_count: 1 })
    }

    async fn delete_many(&self, filter: BsonDocument) -> Result<DeleteResult> {
        self.record(StoreCall::DeleteMany(filter))?;
        Ok(DeleteResult { deleted_count: 3 })
    }

    async fn update_one(&self, filter: BsonDocument, update: BsonDocument) -> Result<UpdateResult> {
        self.record(StoreCall::UpdateOne { filter, update })?;
        Ok(UpdateResult {
            matched_count: 1,
            modified_count: 1,
            upserted_id: None,
        })
    }

    async fn update_many(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
    ) -> Result<UpdateResult> {
        self.record(StoreCall::UpdateMany { filter, update })?;
        Ok(UpdateResult {
            matched_count: 4,
            modified_count: 2,
            upserted_id: None,
        })
    }

    async fn find_one_and_update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
    ) -> Result<Option<BsonDocument>> {
        self.record(StoreCall::FindOneAndUpdate {
            filter: filter.clone(),
            update,
        })?;
        Ok(Some(filter))
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Formatted log lines written while a capture is installed
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route this thread's events into a fresh buffer until the guard drops.
    ///
    /// `#[tokio::test]` runs spawned tasks on the test thread, so events from
    /// the connect task are captured as well.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Number of captured lines containing `needle`
    pub fn count(&self, needle: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Open against `client` with a short retry delay and wait until ready
pub async fn ready_gateway(client: MockClient) -> Gateway<MockClient> {
    init_tracing();
    let gateway = Gateway::new(client);
    gateway.open_connection(NAME, ADDRESS, Duration::from_millis(10));
    tokio::time::timeout(Duration::from_secs(5), gateway.wait_ready())
        .await
        .expect("gateway never became ready");
    gateway
}
