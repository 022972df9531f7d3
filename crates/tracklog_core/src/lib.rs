//! Core domain logic for tracklog.
//! This crate is the single source of truth for training-log invariants.

pub mod cascade;
pub mod config;
pub mod db;
pub mod logging;
pub mod mirror;
pub mod model;
pub mod query;
pub mod service;
pub mod store;
pub mod sync;

pub use cascade::{
    BatchWriteError, CascadeDeleter, CascadeError, DeletionPlan, DeletionReport, DeletionRoot,
};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use mirror::MirrorStore;
pub use model::collection::{Collection, CollectionSnapshot, Entity, EntityRef};
pub use model::dataset::TrainingDataSet;
pub use model::recovery::{format_recovery, parse_recovery, RecoveryDisplay};
pub use model::scope::{ScopeError, UserScope};
pub use model::series::{GymSeries, SeriesBody, SeriesSet, TrackSeries};
pub use model::training::{Cycle, DayEntry, DocId, TrainingType, Workout};
pub use query::{
    DayEntryFilter, DayEntrySummary, ProgressionPoint, ReferentialWarning, TrackDistances,
    TrainingQuery,
};
pub use service::{
    CycleFields, DayEntryFields, SeriesFields, ServiceError, ServiceResult, TrainingService,
    ValidationError, WorkoutFields,
};
pub use store::{
    DocumentStore, SqliteDocumentStore, StoreError, StoreResult, Subscription, SubscriptionEvent,
    WriteBatch, WriteOp,
};
pub use sync::{
    CollectionReplaced, PumpOutcome, RefreshHook, SessionContext, SyncEngine, SyncError,
    SyncState, ViewId,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
