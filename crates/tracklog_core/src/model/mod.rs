//! Training-log domain model.
//!
//! # Responsibility
//! - Define the four-level hierarchy Cycle → Workout → DayEntry → SeriesSet.
//! - Keep the track/gym series variants as one tagged sum type.
//! - Provide the recovery mm:ss codec shared by forms and views.
//!
//! # Invariants
//! - Every entity is identified by an opaque id unique within its collection.
//! - Each entity has exactly one parent; deleting a parent deletes its subtree.
//! - A last track series never carries a recovery time.

pub mod collection;
pub mod dataset;
pub mod recovery;
pub mod scope;
pub mod series;
pub mod training;
