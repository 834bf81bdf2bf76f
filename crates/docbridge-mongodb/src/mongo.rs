//! MongoDB binding of the store client capability

use async_trait::async_trait;
use bson::{doc, Bson, Document as BsonDocument};
use docbridge_common::Result;
use futures::TryStreamExt;
use mongodb::{
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection, Database,
};

use crate::config::PoolConfig;
use crate::store::{
    DeleteResult, FindRequest, InsertManyResult, InsertOneResult, StoreClient, StoreCollection,
    StoreConnection, StoreDatabase, UpdateResult,
};

/// Connects through the official MongoDB driver
#[derive(Debug, Clone, Default)]
pub struct MongoClient {
    pool: PoolConfig,
}

impl MongoClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(pool: PoolConfig) -> Self {
        Self { pool }
    }

    fn apply_pool(&self, client_options: &mut ClientOptions) {
        let config = &self.pool;

        if let Some(min) = config.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(max) = config.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(idle) = config.max_idle_time() {
            client_options.max_idle_time = Some(idle);
        }
        if let Some(connect) = config.connect_timeout() {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = config.server_selection_timeout() {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = &config.app_name {
            client_options.app_name = Some(app.clone());
        }

        // Set stable API version for compatibility
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);
    }
}

#[async_trait]
impl StoreClient for MongoClient {
    type Connection = MongoConnection;

    async fn connect(&self, address: &str) -> Result<MongoConnection> {
        let mut client_options = ClientOptions::parse(address).await?;
        self.apply_pool(&mut client_options);

        let client = Client::with_options(client_options)?;

        // The driver connects lazily; ping so an unreachable server fails here.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        Ok(MongoConnection { client })
    }
}

/// A connected MongoDB client
#[derive(Debug, Clone)]
pub struct MongoConnection {
    client: Client,
}

impl MongoConnection {
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StoreConnection for MongoConnection {
    type Database = MongoDatabase;

    fn select_database(&self, name: &str) -> MongoDatabase {
        MongoDatabase {
            database: self.client.database(name),
        }
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    database: Database,
}

impl StoreDatabase for MongoDatabase {
    type Collection = MongoCollection;

    fn collection(&self, name: &str) -> Option<MongoCollection> {
        Some(MongoCollection {
            collection: self.database.collection(name),
        })
    }
}

/// Untyped document collection
#[derive(Debug, Clone)]
pub struct MongoCollection {
    collection: Collection<BsonDocument>,
}

#[async_trait]
impl StoreCollection for MongoCollection {
    async fn insert_one(&self, document: BsonDocument) -> Result<InsertOneResult> {
        let result = self.collection.insert_one(document).await?;
        Ok(InsertOneResult {
            inserted_id: result.inserted_id,
        })
    }

    async fn insert_many(&self, documents: Vec<BsonDocument>) -> Result<InsertManyResult> {
        let result = self.collection.insert_many(documents).await?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);

        Ok(InsertManyResult {
            inserted_ids: ids.into_iter().map(|(_, id)| id).collect(),
        })
    }

    async fn distinct(&self, field: &str, filter: BsonDocument) -> Result<Vec<Bson>> {
        Ok(self.collection.distinct(field, filter).await?)
    }

    async fn find_one(&self, filter: BsonDocument) -> Result<Option<BsonDocument>> {
        Ok(self.collection.find_one(filter).await?)
    }

    async fn find(&self, request: FindRequest) -> Result<Vec<BsonDocument>> {
        let mut find = self.collection.find(request.filter);
        if let Some(sort) = request.sort {
            find = find.sort(sort);
        }
        if let Some(skip) = request.skip {
            find = find.skip(skip);
        }
        if let Some(limit) = request.limit {
            find = find.limit(limit);
        }

        let cursor = find.await?;
        let documents: Vec<BsonDocument> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn delete_one(&self, filter: BsonDocument) -> Result<DeleteResult> {
        let result = self.collection.delete_one(filter).await?;
        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(&self, filter: BsonDocument) -> Result<DeleteResult> {
        let result = self.collection.delete_many(filter).await?;
        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }

    async fn update_one(&self, filter: BsonDocument, update: BsonDocument) -> Result<UpdateResult> {
        let result = self.collection.update_one(filter, update).await?;
        Ok(convert_update(result))
    }

    async fn update_many(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
    ) -> Result<UpdateResult> {
        let result = self.collection.update_many(filter, update).await?;
        Ok(convert_update(result))
    }

    async fn find_one_and_update(
        &self,
        filter: BsonDocument,
        update: BsonDocument,
    ) -> Result<Option<BsonDocument>> {
        Ok(self.collection.find_one_and_update(filter, update).await?)
    }
}

fn convert_update(result: mongodb::results::UpdateResult) -> UpdateResult {
    UpdateResult {
        matched_count: result.matched_count,
        modified_count: result.modified_count,
        upserted_id: result.upserted_id,
    }
}
