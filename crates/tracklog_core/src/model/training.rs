//! Cycle, Workout and DayEntry records.
//!
//! # Invariants
//! - `Workout::cycle_id` and `DayEntry::workout_id` reference their parent by
//!   id only; the store enforces no foreign keys, cascade delete keeps them
//!   consistent.
//! - `Cycle::start_date <= Cycle::end_date` is assumed by sorting but never
//!   enforced.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque document identifier, unique within one collection.
pub type DocId = String;

/// Calendar date wire format used by forms, storage and interchange.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Generates a fresh document id.
pub fn new_doc_id() -> DocId {
    Uuid::new_v4().to_string()
}

/// Discipline of a workout and of the series recorded under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingType {
    /// Running intervals with time, distance and recovery.
    Track,
    /// Lifting sets with free-text reps and weight.
    Gym,
}

impl TrainingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Gym => "gym",
        }
    }

    /// Parses the lowercase wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "track" => Some(Self::Track),
            "gym" => Some(Self::Gym),
            _ => None,
        }
    }
}

impl Display for TrainingType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level training period, e.g. a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: DocId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Cycle {
    /// Creates a cycle with a generated id.
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: new_doc_id(),
            name: name.into(),
            start_date,
            end_date,
        }
    }

    /// Returns whether the soft `start_date <= end_date` invariant holds.
    pub fn has_ordered_range(&self) -> bool {
        self.start_date <= self.end_date
    }
}

/// Named recurring session template inside a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    pub id: DocId,
    pub cycle_id: DocId,
    pub name: String,
    /// Serialized as `type` to match the persisted layout.
    #[serde(rename = "type")]
    pub kind: TrainingType,
}

impl Workout {
    pub fn new(cycle_id: impl Into<DocId>, name: impl Into<String>, kind: TrainingType) -> Self {
        Self {
            id: new_doc_id(),
            cycle_id: cycle_id.into(),
            name: name.into(),
            kind,
        }
    }
}

/// One dated occurrence of a workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub id: DocId,
    pub workout_id: DocId,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl DayEntry {
    pub fn new(workout_id: impl Into<DocId>, date: NaiveDate, notes: impl Into<String>) -> Self {
        Self {
            id: new_doc_id(),
            workout_id: workout_id.into(),
            date,
            notes: notes.into(),
        }
    }
}
