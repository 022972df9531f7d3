//! Multi-collection document store contracts.
//!
//! # Responsibility
//! - Define the store the sync engine and cascade orchestrator talk to:
//!   per-collection reads, per-collection subscriptions, atomic batches.
//! - Keep SQL details inside the SQLite implementation.
//!
//! # Invariants
//! - Every read and write is confined to one user scope.
//! - A committed batch is all-or-nothing.
//! - Subscribers receive full collection snapshots, in commit order per
//!   collection, starting with the contents at subscribe time.

use crate::db::DbError;
use crate::model::collection::{Collection, CollectionSnapshot, Entity};
use crate::model::scope::UserScope;
use crate::model::training::DocId;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod hub;
mod sqlite_store;

pub use hub::{Subscription, SubscriptionEvent, SubscriptionHub, SubscriptionId};
pub use sqlite_store::SqliteDocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted into a valid entity.
    InvalidData(String),
    /// Child lookup was requested for a collection without a parent link.
    NoParent(Collection),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::NoParent(collection) => {
                write!(f, "collection `{collection}` has no parent collection")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_)
            | Self::NoParent(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert or wholesale replace by id (last writer wins).
    Put(Entity),
    /// Remove by id; removing an absent document is a no-op.
    Delete { collection: Collection, id: DocId },
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            Self::Put(entity) => entity.collection(),
            Self::Delete { collection, .. } => *collection,
        }
    }
}

/// Ordered set of writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, entity: impl Into<Entity>) -> &mut Self {
        self.ops.push(WriteOp::Put(entity.into()));
        self
    }

    pub fn delete(&mut self, collection: Collection, id: impl Into<DocId>) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection,
            id: id.into(),
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Collections written by this batch.
    pub fn touched_collections(&self) -> BTreeSet<Collection> {
        self.ops.iter().map(WriteOp::collection).collect()
    }
}

/// Store the core reads from, writes to and subscribes against.
pub trait DocumentStore {
    /// Reads the full current contents of one collection.
    fn fetch_collection(
        &self,
        scope: &UserScope,
        collection: Collection,
    ) -> StoreResult<CollectionSnapshot>;
    /// Reads one document by id.
    fn fetch_entity(
        &self,
        scope: &UserScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<Entity>>;
    /// Lists ids in `collection` whose parent link equals `parent_id`.
    fn child_ids(
        &self,
        scope: &UserScope,
        collection: Collection,
        parent_id: &str,
    ) -> StoreResult<Vec<DocId>>;
    /// Applies every write of `batch`, or none of them.
    fn commit(&self, scope: &UserScope, batch: &WriteBatch) -> StoreResult<()>;
    /// Opens a change subscription on one collection.
    fn subscribe(&self, scope: &UserScope, collection: Collection) -> StoreResult<Subscription>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn fetch_collection(
        &self,
        scope: &UserScope,
        collection: Collection,
    ) -> StoreResult<CollectionSnapshot> {
        (**self).fetch_collection(scope, collection)
    }

    fn fetch_entity(
        &self,
        scope: &UserScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<Entity>> {
        (**self).fetch_entity(scope, collection, id)
    }

    fn child_ids(
        &self,
        scope: &UserScope,
        collection: Collection,
        parent_id: &str,
    ) -> StoreResult<Vec<DocId>> {
        (**self).child_ids(scope, collection, parent_id)
    }

    fn commit(&self, scope: &UserScope, batch: &WriteBatch) -> StoreResult<()> {
        (**self).commit(scope, batch)
    }

    fn subscribe(&self, scope: &UserScope, collection: Collection) -> StoreResult<Subscription> {
        (**self).subscribe(scope, collection)
    }
}
