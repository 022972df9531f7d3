//! Core use-case services.
//!
//! # Responsibility
//! - Turn raw form input into validated store writes.
//! - Keep CLI and view layers decoupled from storage details.

pub mod fields;
pub mod training_service;

pub use fields::{
    CycleFields, DayEntryFields, SeriesFields, ValidationError, ValidationResult, WorkoutFields,
};
pub use training_service::{ServiceError, ServiceResult, TrainingService};
