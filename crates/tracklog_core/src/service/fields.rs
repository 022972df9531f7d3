//! Raw form fields and their validation.
//!
//! # Responsibility
//! - Accept untrusted form strings for every entity kind.
//! - Turn them into typed values or a [`ValidationError`] before any store
//!   access happens.
//!
//! # Invariants
//! - A track series marked last never carries a recovery.
//! - Gym reps and weight are kept as free text and never parsed.
//! - Recovery never fails validation; unreadable text means unknown.

use crate::model::recovery::parse_recovery;
use crate::model::series::{GymSeries, SeriesBody, TrackSeries};
use crate::model::training::{TrainingType, DATE_FORMAT};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Form input rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is empty after trimming.
    MissingField(&'static str),
    /// Field is not a usable number.
    InvalidNumber { field: &'static str, value: String },
    /// Field is not a `YYYY-MM-DD` calendar date.
    InvalidDate { field: &'static str, value: String },
    /// Workout type is neither `track` nor `gym`.
    InvalidWorkoutType(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidNumber { field, value } => {
                write!(f, "field `{field}` is not a valid number: `{value}`")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "field `{field}` is not a valid date: `{value}`")
            }
            Self::InvalidWorkoutType(value) => {
                write!(f, "workout type must be `track` or `gym`, got `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Cycle form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleFields {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
}

/// Validated cycle values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CycleFields {
    pub fn validate(&self) -> ValidationResult<CycleInput> {
        Ok(CycleInput {
            name: required("name", &self.name)?.to_string(),
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
        })
    }
}

/// Workout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutFields {
    pub cycle_id: String,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutInput {
    pub cycle_id: String,
    pub name: String,
    pub kind: TrainingType,
}

impl WorkoutFields {
    pub fn validate(&self) -> ValidationResult<WorkoutInput> {
        let cycle_id = required("cycle_id", &self.cycle_id)?.to_string();
        let name = required("name", &self.name)?.to_string();
        let kind_text = required("type", &self.kind)?;
        let kind = TrainingType::parse(&kind_text.to_ascii_lowercase())
            .ok_or_else(|| ValidationError::InvalidWorkoutType(kind_text.to_string()))?;
        Ok(WorkoutInput {
            cycle_id,
            name,
            kind,
        })
    }
}

/// Day entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayEntryFields {
    pub workout_id: String,
    pub date: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntryInput {
    pub workout_id: String,
    pub date: NaiveDate,
    pub notes: String,
}

impl DayEntryFields {
    pub fn validate(&self) -> ValidationResult<DayEntryInput> {
        Ok(DayEntryInput {
            workout_id: required("workout_id", &self.workout_id)?.to_string(),
            date: parse_date("date", &self.date)?,
            notes: self.notes.clone(),
        })
    }
}

/// One series card of a day entry form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesFields {
    Track {
        run_time: String,
        /// Blank when the distance is unknown.
        distance_meters: String,
        /// `M:SS` or `[M]MSS`; blank or unreadable when unknown.
        recovery: String,
        is_last: bool,
    },
    Gym {
        reps: String,
        weight: String,
    },
}

impl SeriesFields {
    /// Whether the card was left empty and should be skipped on submit.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Track { run_time, .. } => run_time.trim().is_empty(),
            Self::Gym { reps, .. } => reps.trim().is_empty(),
        }
    }

    pub fn kind(&self) -> TrainingType {
        match self {
            Self::Track { .. } => TrainingType::Track,
            Self::Gym { .. } => TrainingType::Gym,
        }
    }

    pub fn validate(&self) -> ValidationResult<SeriesBody> {
        match self {
            Self::Track {
                run_time,
                distance_meters,
                recovery,
                is_last,
            } => {
                let run_time = parse_positive("run_time", required("run_time", run_time)?)?;
                let distance_meters = optional(distance_meters)
                    .map(|value| parse_positive("distance_meters", value))
                    .transpose()?;
                // Unreadable recovery is stored as unknown, not rejected.
                let recovery_seconds = if *is_last {
                    None
                } else {
                    parse_recovery(recovery)
                };
                Ok(SeriesBody::Track(TrackSeries::new(
                    run_time,
                    distance_meters,
                    recovery_seconds,
                    *is_last,
                )))
            }
            Self::Gym { reps, weight } => Ok(SeriesBody::Gym(GymSeries {
                reps: required("reps", reps)?.to_string(),
                weight: weight.trim().to_string(),
            })),
        }
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> ValidationResult<&'a str> {
    optional(value).ok_or(ValidationError::MissingField(field))
}

fn optional(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_date(field: &'static str, value: &str) -> ValidationResult<NaiveDate> {
    let trimmed = required(field, value)?;
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: trimmed.to_string(),
    })
}

fn parse_positive(field: &'static str, value: &str) -> ValidationResult<f64> {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() && number > 0.0 => Ok(number),
        _ => Err(ValidationError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}
