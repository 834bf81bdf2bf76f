//! Request gateway
//!
//! Every store operation goes through [`Gateway::execute_with`], which rejects
//! the request before any store call when a parameter is absent or the handle
//! isn't ready, then resolves the collection and hands it to the operation's
//! adapter. Whatever the adapter returns comes back unchanged.

use bson::Bson;
use docbridge_common::{DatabaseError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::StoreConfig;
use crate::handle::{CollectionOf, ConnectionState, StoreHandle};
use crate::operation::{normalize, OperationKind, OperationOutcome};
use crate::store::StoreClient;

/// Shared entry point for connection management and the operation catalog.
///
/// Construct one per process and clone it wherever store access is needed.
pub struct Gateway<C: StoreClient> {
    handle: StoreHandle<C>,
}

impl<C: StoreClient> Clone for Gateway<C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<C: StoreClient> std::fmt::Debug for Gateway<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("handle", &self.handle).finish()
    }
}

/// A parameter counts as absent when it is null or undefined
fn is_absent(parameter: &Bson) -> bool {
    matches!(parameter, Bson::Null | Bson::Undefined)
}

impl<C: StoreClient> Gateway<C> {
    pub fn new(client: C) -> Self {
        Self {
            handle: StoreHandle::new(client),
        }
    }

    pub fn handle(&self) -> &StoreHandle<C> {
        &self.handle
    }

    /// Start connecting to `address + name`, retrying every `retry_delay` until it works
    pub fn open_connection(
        &self,
        name: impl Into<String>,
        address: impl Into<String>,
        retry_delay: Duration,
    ) {
        self.handle.open(name, address, retry_delay);
    }

    /// Start connecting with the target and delay from a configuration
    pub fn open_with_config(&self, config: &StoreConfig) {
        self.handle.open(
            config.name.clone(),
            config.address.clone(),
            config.retry_delay_duration(),
        );
    }

    pub async fn close_connection(&self) {
        self.handle.close().await;
    }

    pub fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    pub fn state(&self) -> ConnectionState {
        self.handle.state()
    }

    pub async fn wait_ready(&self) {
        self.handle.wait_ready().await;
    }

    /// True iff every parameter is present and the handle is ready
    pub fn validate(&self, parameters: &[Bson]) -> bool {
        !parameters.iter().any(is_absent) && self.handle.is_ready()
    }

    /// Validate, resolve the collection, then run `adapter` on it.
    ///
    /// # Errors
    /// - "request is invalid" if validation fails; no store call is made
    /// - "collection doesn't exist" if resolution yields nothing; the adapter
    ///   is never invoked
    /// - otherwise whatever the adapter returns, unchanged
    pub async fn execute_with<F, Fut, T>(
        &self,
        collection_name: &str,
        parameters: Vec<Bson>,
        adapter: F,
    ) -> Result<T>
    where
        F: FnOnce(CollectionOf<C>, Vec<Bson>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.validate(&parameters) {
            return Err(DatabaseError::invalid_request().into());
        }

        let collection = self
            .handle
            .collection(collection_name)
            .ok_or_else(DatabaseError::missing_collection)?;

        adapter(collection, parameters).await
    }

    /// Run one catalog operation on a parameter sequence
    pub async fn execute(
        &self,
        collection_name: &str,
        parameters: Vec<Bson>,
        kind: OperationKind,
    ) -> Result<OperationOutcome> {
        debug!(operation = %kind, collection = collection_name, "Executing request");

        self.execute_with(collection_name, parameters, |collection, parameters| async move {
            kind.map(parameters)?.dispatch(&collection).await
        })
        .await
    }

    /// Insert one document. An array argument is used as the parameter
    /// sequence, so only its first element is inserted.
    pub async fn insert_one(
        &self,
        collection: &str,
        data: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = normalize(data.into());
        self.execute(collection, parameters, OperationKind::InsertOne)
            .await
    }

    pub async fn insert_many(
        &self,
        collection: &str,
        documents: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        self.execute(collection, vec![documents.into()], OperationKind::InsertMany)
            .await
    }

    /// Distinct values of `field` among documents matching `query`
    pub async fn distinct(
        &self,
        collection: &str,
        field: impl Into<Bson>,
        query: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = vec![field.into(), query.into()];
        self.execute(collection, parameters, OperationKind::Distinct)
            .await
    }

    pub async fn find_one(
        &self,
        collection: &str,
        query: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = normalize(query.into());
        self.execute(collection, parameters, OperationKind::FindOne)
            .await
    }

    pub async fn find_many(
        &self,
        collection: &str,
        query: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = normalize(query.into());
        self.execute(collection, parameters, OperationKind::FindMany)
            .await
    }

    pub async fn find_sorted(
        &self,
        collection: &str,
        query: impl Into<Bson>,
        sort: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = vec![query.into(), sort.into()];
        self.execute(collection, parameters, OperationKind::FindSorted)
            .await
    }

    /// One page of sorted results: `skip` documents are skipped, at most
    /// `limit` returned
    pub async fn find_sorted_paged(
        &self,
        collection: &str,
        query: impl Into<Bson>,
        sort: impl Into<Bson>,
        skip: impl Into<Bson>,
        limit: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = vec![query.into(), sort.into(), skip.into(), limit.into()];
        self.execute(collection, parameters, OperationKind::FindSortedPaged)
            .await
    }

    pub async fn delete_one(
        &self,
        collection: &str,
        query: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = normalize(query.into());
        self.execute(collection, parameters, OperationKind::DeleteOne)
            .await
    }

    pub async fn delete_many(
        &self,
        collection: &str,
        query: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = normalize(query.into());
        self.execute(collection, parameters, OperationKind::DeleteMany)
            .await
    }

    pub async fn update_many(
        &self,
        collection: &str,
        query: impl Into<Bson>,
        update: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = vec![query.into(), update.into()];
        self.execute(collection, parameters, OperationKind::UpdateMany)
            .await
    }

    pub async fn update_one(
        &self,
        collection: &str,
        query: impl Into<Bson>,
        update: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = vec![query.into(), update.into()];
        self.execute(collection, parameters, OperationKind::UpdateOne)
            .await
    }

    /// Update the first matching document and return it as it was before the update
    pub async fn find_and_update_one(
        &self,
        collection: &str,
        query: impl Into<Bson>,
        update: impl Into<Bson>,
    ) -> Result<OperationOutcome> {
        let parameters = vec![query.into(), update.into()];
        self.execute(collection, parameters, OperationKind::FindAndUpdateOne)
            .await
    }
}
