//! Series/set records recorded under a day entry.
//!
//! # Invariants
//! - A series is either a track interval or a gym set, never both.
//! - `TrackSeries::is_last() == true` implies `recovery_seconds() == None`;
//!   every constructor and deserialization path enforces it.
//! - A missing `distance_meters` marks a legacy record and is never read
//!   as zero.

use crate::model::recovery::RecoveryDisplay;
use crate::model::training::{new_doc_id, DocId, TrainingType};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One interval (track) or one set (gym) inside a day entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    pub id: DocId,
    pub day_entry_id: DocId,
    /// 1-based display order within the owning day entry.
    pub index: u32,
    #[serde(flatten)]
    pub body: SeriesBody,
}

/// Type-tagged series payload, serialized with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeriesBody {
    Track(TrackSeries),
    Gym(GymSeries),
}

/// Track interval payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TrackSeriesWire")]
pub struct TrackSeries {
    run_time: f64,
    distance_meters: Option<f64>,
    recovery_seconds: Option<u32>,
    is_last: bool,
}

#[derive(Deserialize)]
struct TrackSeriesWire {
    run_time: f64,
    #[serde(default)]
    distance_meters: Option<f64>,
    #[serde(default)]
    recovery_seconds: Option<u32>,
    #[serde(default)]
    is_last: bool,
}

impl From<TrackSeriesWire> for TrackSeries {
    fn from(value: TrackSeriesWire) -> Self {
        Self::new(
            value.run_time,
            value.distance_meters,
            value.recovery_seconds,
            value.is_last,
        )
    }
}

impl TrackSeries {
    /// Builds a track payload, dropping recovery when `is_last` is set.
    pub fn new(
        run_time: f64,
        distance_meters: Option<f64>,
        recovery_seconds: Option<u32>,
        is_last: bool,
    ) -> Self {
        Self {
            run_time,
            distance_meters,
            recovery_seconds: if is_last { None } else { recovery_seconds },
            is_last,
        }
    }

    /// Running time in seconds.
    pub fn run_time(&self) -> f64 {
        self.run_time
    }

    pub fn distance_meters(&self) -> Option<f64> {
        self.distance_meters
    }

    pub fn recovery_seconds(&self) -> Option<u32> {
        self.recovery_seconds
    }

    pub fn is_last(&self) -> bool {
        self.is_last
    }

    /// True for records created before distance tracking existed.
    pub fn is_legacy(&self) -> bool {
        self.distance_meters.is_none()
    }
}

/// Gym set payload. Reps and weight stay free text (`5x5`, `100kg`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymSeries {
    pub reps: String,
    #[serde(default)]
    pub weight: String,
}

impl SeriesSet {
    pub fn new(day_entry_id: impl Into<DocId>, index: u32, body: SeriesBody) -> Self {
        Self {
            id: new_doc_id(),
            day_entry_id: day_entry_id.into(),
            index,
            body,
        }
    }

    /// Tag of the payload, comparable with the owning workout's type.
    pub fn kind(&self) -> TrainingType {
        match self.body {
            SeriesBody::Track(_) => TrainingType::Track,
            SeriesBody::Gym(_) => TrainingType::Gym,
        }
    }

    pub fn as_track(&self) -> Option<&TrackSeries> {
        match &self.body {
            SeriesBody::Track(track) => Some(track),
            SeriesBody::Gym(_) => None,
        }
    }
}

impl Display for SeriesSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            SeriesBody::Track(track) if track.is_last() => {
                write!(f, "{}s (last)", track.run_time())
            }
            SeriesBody::Track(track) => write!(
                f,
                "{}s [rec: {}]",
                track.run_time(),
                RecoveryDisplay(track.recovery_seconds())
            ),
            SeriesBody::Gym(gym) => write!(f, "{} @ {}", gym.reps, gym.weight),
        }
    }
}
