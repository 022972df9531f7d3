//! JSON interchange shape for a whole training log.
//!
//! Matches the saved-data layout of the browser app the log started in:
//! four flat arrays keyed `cycles`, `workouts`, `dayEntries`, `seriesSets`.

use crate::model::collection::{CollectionSnapshot, Entity};
use crate::model::series::SeriesSet;
use crate::model::training::{Cycle, DayEntry, Workout};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDataSet {
    #[serde(default)]
    pub cycles: Vec<Cycle>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub day_entries: Vec<DayEntry>,
    #[serde(default)]
    pub series_sets: Vec<SeriesSet>,
}

impl TrainingDataSet {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Total number of documents across the four collections.
    pub fn document_count(&self) -> usize {
        self.cycles.len() + self.workouts.len() + self.day_entries.len() + self.series_sets.len()
    }

    /// Stores one collection snapshot into the matching field.
    pub fn absorb(&mut self, snapshot: CollectionSnapshot) {
        match snapshot {
            CollectionSnapshot::Cycles(items) => self.cycles = items,
            CollectionSnapshot::Workouts(items) => self.workouts = items,
            CollectionSnapshot::DayEntries(items) => self.day_entries = items,
            CollectionSnapshot::SeriesSets(items) => self.series_sets = items,
        }
    }

    /// Consumes the data set into entities, parents before children.
    pub fn into_entities(self) -> Vec<Entity> {
        let mut entities = Vec::with_capacity(self.document_count());
        entities.extend(self.cycles.into_iter().map(Entity::from));
        entities.extend(self.workouts.into_iter().map(Entity::from));
        entities.extend(self.day_entries.into_iter().map(Entity::from));
        entities.extend(self.series_sets.into_iter().map(Entity::from));
        entities
    }
}
