//! Operation catalog
//!
//! Every catalog operation follows the same pattern: its arguments become an
//! ordered parameter sequence, the gateway validates that sequence, and the
//! operation's adapter turns it into exactly one store call. The adapter is
//! split in two so the interesting half stays pure:
//!
//! - [`OperationKind::map`] checks parameter shapes and builds a [`StoreCall`]
//! - [`StoreCall::dispatch`] issues that call on a collection

use bson::{Bson, Document as BsonDocument};
use docbridge_common::{DatabaseError, Result};
use std::fmt;

use crate::store::{
    DeleteResult, FindRequest, InsertManyResult, InsertOneResult, StoreCollection, UpdateResult,
};

/// The closed set of operations the gateway forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    InsertOne,
    InsertMany,
    Distinct,
    FindOne,
    FindMany,
    FindSorted,
    FindSortedPaged,
    DeleteOne,
    DeleteMany,
    UpdateMany,
    UpdateOne,
    FindAndUpdateOne,
}

impl OperationKind {
    pub const ALL: [OperationKind; 12] = [
        OperationKind::InsertOne,
        OperationKind::InsertMany,
        OperationKind::Distinct,
        OperationKind::FindOne,
        OperationKind::FindMany,
        OperationKind::FindSorted,
        OperationKind::FindSortedPaged,
        OperationKind::DeleteOne,
        OperationKind::DeleteMany,
        OperationKind::UpdateMany,
        OperationKind::UpdateOne,
        OperationKind::FindAndUpdateOne,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::InsertOne => "insert-one",
            OperationKind::InsertMany => "insert-many",
            OperationKind::Distinct => "distinct",
            OperationKind::FindOne => "find-one",
            OperationKind::FindMany => "find-many",
            OperationKind::FindSorted => "find-sorted",
            OperationKind::FindSortedPaged => "find-sorted-paged",
            OperationKind::DeleteOne => "delete-one",
            OperationKind::DeleteMany => "delete-many",
            OperationKind::UpdateMany => "update-many",
            OperationKind::UpdateOne => "update-one",
            OperationKind::FindAndUpdateOne => "find-and-update-one",
        }
    }

    /// Map a validated parameter sequence onto the store call for this operation.
    ///
    /// Parameters beyond the ones the operation reads are ignored. A missing
    /// parameter or one of the wrong BSON type is an invalid request.
    pub fn map(self, parameters: Vec<Bson>) -> Result<StoreCall> {
        let mut params = Params(parameters.into_iter());

        let call = match self {
            OperationKind::InsertOne => StoreCall::InsertOne(params.document()?),
            OperationKind::InsertMany => StoreCall::InsertMany(params.documents()?),
            OperationKind::Distinct => StoreCall::Distinct {
                field: params.string()?,
                filter: params.document()?,
            },
            OperationKind::FindOne => StoreCall::FindOne(params.document()?),
            OperationKind::FindMany => StoreCall::Find(FindRequest::new(params.document()?)),
            OperationKind::FindSorted => {
                let filter = params.document()?;
                StoreCall::Find(FindRequest::new(filter).sort(params.document()?))
            }
            OperationKind::FindSortedPaged => {
                let filter = params.document()?;
                let sort = params.document()?;
                let skip = params.skip()?;
                let limit = params.limit()?;
                StoreCall::Find(FindRequest::new(filter).sort(sort).skip(skip).limit(limit))
            }
            OperationKind::DeleteOne => StoreCall::DeleteOne(params.document()?),
            OperationKind::DeleteMany => StoreCall::DeleteMany(params.document()?),
            OperationKind::UpdateMany => StoreCall::UpdateMany {
                filter: params.document()?,
                update: params.document()?,
            },
            OperationKind::UpdateOne => StoreCall::UpdateOne {
                filter: params.document()?,
                update: params.document()?,
            },
            OperationKind::FindAndUpdateOne => StoreCall::FindOneAndUpdate {
                filter: params.document()?,
                update: params.document()?,
            },
        };

        Ok(call)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalize a "data or sequence of data" argument.
///
/// An array passes through as the parameter sequence; anything else is
/// wrapped into a one-element sequence.
pub fn normalize(argument: Bson) -> Vec<Bson> {
    match argument {
        Bson::Array(items) => items,
        other => vec![other],
    }
}

/// One typed call against a store collection
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    InsertOne(BsonDocument),
    InsertMany(Vec<BsonDocument>),
    Distinct {
        field: String,
        filter: BsonDocument,
    },
    FindOne(BsonDocument),
    Find(FindRequest),
    DeleteOne(BsonDocument),
    DeleteMany(BsonDocument),
    UpdateMany {
        filter: BsonDocument,
        update: BsonDocument,
    },
    UpdateOne {
        filter: BsonDocument,
        update: BsonDocument,
    },
    FindOneAndUpdate {
        filter: BsonDocument,
        update: BsonDocument,
    },
}

impl StoreCall {
    /// Issue the call and wrap whatever the store returned
    pub async fn dispatch<C: StoreCollection>(self, collection: &C) -> Result<OperationOutcome> {
        let outcome = match self {
            StoreCall::InsertOne(document) => {
                OperationOutcome::InsertedOne(collection.insert_one(document).await?)
            }
            StoreCall::InsertMany(documents) => {
                OperationOutcome::InsertedMany(collection.insert_many(documents).await?)
            }
            StoreCall::Distinct { field, filter } => {
                OperationOutcome::Values(collection.distinct(&field, filter).await?)
            }
            StoreCall::FindOne(filter) => {
                OperationOutcome::Document(collection.find_one(filter).await?)
            }
            StoreCall::Find(request) => OperationOutcome::Documents(collection.find(request).await?),
            StoreCall::DeleteOne(filter) => {
                OperationOutcome::Deleted(collection.delete_one(filter).await?)
            }
            StoreCall::DeleteMany(filter) => {
                OperationOutcome::Deleted(collection.delete_many(filter).await?)
            }
            StoreCall::UpdateMany { filter, update } => {
                OperationOutcome::Updated(collection.update_many(filter, update).await?)
            }
            StoreCall::UpdateOne { filter, update } => {
                OperationOutcome::Updated(collection.update_one(filter, update).await?)
            }
            StoreCall::FindOneAndUpdate { filter, update } => {
                OperationOutcome::Document(collection.find_one_and_update(filter, update).await?)
            }
        };

        Ok(outcome)
    }
}

/// What the store returned for one operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    InsertedOne(InsertOneResult),
    InsertedMany(InsertManyResult),
    Values(Vec<Bson>),
    Document(Option<BsonDocument>),
    Documents(Vec<BsonDocument>),
    Deleted(DeleteResult),
    Updated(UpdateResult),
}

impl OperationOutcome {
    /// Render the outcome as a single BSON value
    pub fn into_bson(self) -> Bson {
        match self {
            OperationOutcome::InsertedOne(result) => {
                Bson::Document(bson::doc! { "insertedId": result.inserted_id })
            }
            OperationOutcome::InsertedMany(result) => {
                Bson::Document(bson::doc! { "insertedIds": result.inserted_ids })
            }
            OperationOutcome::Values(values) => Bson::Array(values),
            OperationOutcome::Document(document) => document.map_or(Bson::Null, Bson::Document),
            OperationOutcome::Documents(documents) => {
                Bson::Array(documents.into_iter().map(Bson::Document).collect())
            }
            OperationOutcome::Deleted(result) => Bson::Document(bson::doc! {
                "deletedCount": count(result.deleted_count),
            }),
            OperationOutcome::Updated(result) => Bson::Document(bson::doc! {
                "matchedCount": count(result.matched_count),
                "modifiedCount": count(result.modified_count),
                "upsertedId": result.upserted_id.unwrap_or(Bson::Null),
            }),
        }
    }
}

fn count(value: u64) -> Bson {
    i64::try_from(value).map_or(Bson::Double(value as f64), Bson::Int64)
}

/// Cursor over a parameter sequence, reading each slot with its expected type
struct Params(std::vec::IntoIter<Bson>);

impl Params {
    fn next(&mut self) -> Result<Bson> {
        self.0.next().ok_or_else(|| DatabaseError::invalid_request().into())
    }

    fn document(&mut self) -> Result<BsonDocument> {
        match self.next()? {
            Bson::Document(document) => Ok(document),
            _ => Err(DatabaseError::invalid_request().into()),
        }
    }

    fn documents(&mut self) -> Result<Vec<BsonDocument>> {
        match self.next()? {
            Bson::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Bson::Document(document) => Ok(document),
                    _ => Err(DatabaseError::invalid_request().into()),
                })
                .collect(),
            _ => Err(DatabaseError::invalid_request().into()),
        }
    }

    fn string(&mut self) -> Result<String> {
        match self.next()? {
            Bson::String(value) => Ok(value),
            _ => Err(DatabaseError::invalid_request().into()),
        }
    }

    fn integer(&mut self) -> Result<i64> {
        match self.next()? {
            Bson::Int32(value) => Ok(i64::from(value)),
            Bson::Int64(value) => Ok(value),
            _ => Err(DatabaseError::invalid_request().into()),
        }
    }

    fn skip(&mut self) -> Result<u64> {
        u64::try_from(self.integer()?).map_err(|_| DatabaseError::invalid_request().into())
    }

    fn limit(&mut self) -> Result<i64> {
        self.integer()
    }
}
