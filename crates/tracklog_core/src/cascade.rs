//! Two-phase cascade delete over the entity hierarchy.
//!
//! # Responsibility
//! - Compute the transitive closure of a deletion root by reading the store.
//! - Remove root and dependents in one atomic batch.
//!
//! # Invariants
//! - The closure is read from the store, never from the mirror.
//! - Either every planned document is removed or none is.
//! - Entities created between planning and execution are not covered by
//!   the plan and stay behind as orphans.

use crate::model::collection::Collection;
use crate::model::scope::UserScope;
use crate::model::training::DocId;
use crate::store::{DocumentStore, StoreError, WriteBatch};
use log::{error, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Entity a cascade delete starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionRoot {
    Cycle(DocId),
    Workout(DocId),
    DayEntry(DocId),
}

impl DeletionRoot {
    pub fn collection(&self) -> Collection {
        match self {
            Self::Cycle(_) => Collection::Cycles,
            Self::Workout(_) => Collection::Workouts,
            Self::DayEntry(_) => Collection::DayEntries,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Cycle(id) | Self::Workout(id) | Self::DayEntry(id) => id,
        }
    }
}

impl Display for DeletionRoot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection(), self.id())
    }
}

/// Closure of a deletion root, as read in phase one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    root: DeletionRoot,
    root_exists: bool,
    targets: BTreeMap<Collection, Vec<DocId>>,
}

impl DeletionPlan {
    pub fn root(&self) -> &DeletionRoot {
        &self.root
    }

    /// Whether the root document itself was found while planning.
    pub fn root_exists(&self) -> bool {
        self.root_exists
    }

    /// Planned ids of `collection`, root included.
    pub fn ids(&self, collection: Collection) -> &[DocId] {
        self.targets
            .get(&collection)
            .map_or(&[][..], |ids| ids.as_slice())
    }

    pub fn total(&self) -> usize {
        self.targets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Delete batch covering every planned document, leaves first.
    pub fn to_batch(&self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for collection in Collection::ALL.into_iter().rev() {
            for id in self.ids(collection) {
                batch.delete(collection, id.clone());
            }
        }
        batch
    }
}

/// Outcome of an executed deletion plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub root: DeletionRoot,
    counts: BTreeMap<Collection, usize>,
}

impl DeletionReport {
    pub fn count(&self, collection: Collection) -> usize {
        self.counts.get(&collection).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Atomic cascade batch failure. Nothing was deleted.
#[derive(Debug)]
pub struct BatchWriteError {
    pub root: DeletionRoot,
    pub source: StoreError,
}

impl Display for BatchWriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cascade delete of {} failed: {}", self.root, self.source)
    }
}

impl Error for BatchWriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug)]
pub enum CascadeError {
    /// Closure read failed; nothing was written.
    Read(StoreError),
    BatchWrite(BatchWriteError),
}

impl Display for CascadeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "cascade closure read failed: {err}"),
            Self::BatchWrite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CascadeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            Self::BatchWrite(err) => Some(err),
        }
    }
}

impl From<StoreError> for CascadeError {
    fn from(value: StoreError) -> Self {
        Self::Read(value)
    }
}

impl From<BatchWriteError> for CascadeError {
    fn from(value: BatchWriteError) -> Self {
        Self::BatchWrite(value)
    }
}

pub type CascadeResult<T> = Result<T, CascadeError>;

/// Cascade delete orchestrator bound to one store and scope.
pub struct CascadeDeleter<S> {
    store: S,
    scope: UserScope,
}

impl<S: DocumentStore> CascadeDeleter<S> {
    pub fn new(store: S, scope: UserScope) -> Self {
        Self { store, scope }
    }

    pub fn plan_cycle(&self, id: &str) -> CascadeResult<DeletionPlan> {
        self.plan(DeletionRoot::Cycle(id.to_string()))
    }

    pub fn plan_workout(&self, id: &str) -> CascadeResult<DeletionPlan> {
        self.plan(DeletionRoot::Workout(id.to_string()))
    }

    pub fn plan_day_entry(&self, id: &str) -> CascadeResult<DeletionPlan> {
        self.plan(DeletionRoot::DayEntry(id.to_string()))
    }

    /// Phase one: reads the closure of `root` level by level.
    ///
    /// A root that no longer exists still has its remaining dependents
    /// planned, so orphans left by an earlier race are collected.
    pub fn plan(&self, root: DeletionRoot) -> CascadeResult<DeletionPlan> {
        let root_collection = root.collection();
        let root_exists = self
            .store
            .fetch_entity(&self.scope, root_collection, root.id())?
            .is_some();

        let mut targets = BTreeMap::new();
        if root_exists {
            targets.insert(root_collection, vec![root.id().to_string()]);
        }

        let mut collection = root_collection;
        let mut frontier = vec![root.id().to_string()];
        while let Some(child) = collection.child() {
            let mut next = Vec::new();
            for parent_id in &frontier {
                next.extend(self.store.child_ids(&self.scope, child, parent_id)?);
            }
            if next.is_empty() {
                break;
            }
            targets.insert(child, next.clone());
            frontier = next;
            collection = child;
        }

        let plan = DeletionPlan {
            root,
            root_exists,
            targets,
        };
        info!(
            "event=cascade_plan module=cascade status=ok root_collection={root_collection} root_exists={root_exists} planned={}",
            plan.total()
        );
        Ok(plan)
    }

    /// Phase two: commits the plan as one atomic batch.
    pub fn execute(&self, plan: &DeletionPlan) -> Result<DeletionReport, BatchWriteError> {
        let started_at = Instant::now();
        let batch = plan.to_batch();

        if let Err(source) = self.store.commit(&self.scope, &batch) {
            error!(
                "event=cascade_execute module=cascade status=error root_collection={} planned={} duration_ms={} error={source}",
                plan.root.collection(),
                plan.total(),
                started_at.elapsed().as_millis()
            );
            return Err(BatchWriteError {
                root: plan.root.clone(),
                source,
            });
        }

        let counts = plan
            .targets
            .iter()
            .map(|(collection, ids)| (*collection, ids.len()))
            .collect();
        let report = DeletionReport {
            root: plan.root.clone(),
            counts,
        };
        info!(
            "event=cascade_execute module=cascade status=ok root_collection={} deleted={} duration_ms={}",
            plan.root.collection(),
            report.total(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    pub fn delete_cycle(&self, id: &str) -> CascadeResult<DeletionReport> {
        let plan = self.plan_cycle(id)?;
        Ok(self.execute(&plan)?)
    }

    pub fn delete_workout(&self, id: &str) -> CascadeResult<DeletionReport> {
        let plan = self.plan_workout(id)?;
        Ok(self.execute(&plan)?)
    }

    pub fn delete_day_entry(&self, id: &str) -> CascadeResult<DeletionReport> {
        let plan = self.plan_day_entry(id)?;
        Ok(self.execute(&plan)?)
    }
}
