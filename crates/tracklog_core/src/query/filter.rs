use crate::model::series::SeriesSet;
use crate::model::training::{DayEntry, TrainingType, Workout};
use crate::query::warnings::ReferentialWarning;
use crate::query::TrainingQuery;
use chrono::NaiveDate;

/// Day entry filter. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayEntryFilter {
    /// Keeps entries whose workout belongs to this cycle.
    pub cycle_id: Option<String>,
    /// Keeps entries of exactly this workout.
    pub workout_id: Option<String>,
    pub date: Option<NaiveDate>,
    /// Keeps entries whose workout has this type.
    pub kind: Option<TrainingType>,
}

impl DayEntryFilter {
    pub fn for_cycle(cycle_id: impl Into<String>) -> Self {
        Self {
            cycle_id: Some(cycle_id.into()),
            ..Self::default()
        }
    }

    pub fn for_workout(workout_id: impl Into<String>) -> Self {
        Self {
            workout_id: Some(workout_id.into()),
            ..Self::default()
        }
    }

    fn matches(&self, entry: &DayEntry, workout: Option<&Workout>) -> bool {
        if let Some(workout_id) = &self.workout_id {
            if &entry.workout_id != workout_id {
                return false;
            }
        }
        if let Some(cycle_id) = &self.cycle_id {
            if workout.map_or(true, |workout| &workout.cycle_id != cycle_id) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if workout.map_or(true, |workout| workout.kind != kind) {
                return false;
            }
        }
        if let Some(date) = self.date {
            if entry.date != date {
                return false;
            }
        }
        true
    }
}

/// Day entry with everything a list row needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DayEntrySummary<'a> {
    pub entry: &'a DayEntry,
    /// `None` when the owning workout is missing from the mirror.
    pub workout: Option<&'a Workout>,
    /// Series in display order.
    pub series: Vec<&'a SeriesSet>,
    pub warnings: Vec<ReferentialWarning>,
}

impl DayEntrySummary<'_> {
    pub fn workout_name(&self) -> Option<&str> {
        self.workout.map(|workout| workout.name.as_str())
    }
}

impl<'a> TrainingQuery<'a> {
    /// Day entries matching `filter`, newest date first.
    ///
    /// Entries whose workout is missing never match a cycle or type filter.
    pub fn filter_day_entries(&self, filter: &DayEntryFilter) -> Vec<&'a DayEntry> {
        let mut entries: Vec<_> = self
            .mirror
            .day_entries()
            .filter(|entry| filter.matches(entry, self.mirror.workout(&entry.workout_id)))
            .collect();
        entries.sort_by(|left, right| {
            right
                .date
                .cmp(&left.date)
                .then_with(|| left.id.cmp(&right.id))
        });
        entries
    }

    /// Filtered day entries joined with workout, series and warnings.
    pub fn day_entry_summaries(&self, filter: &DayEntryFilter) -> Vec<DayEntrySummary<'a>> {
        self.filter_day_entries(filter)
            .into_iter()
            .map(|entry| DayEntrySummary {
                entry,
                workout: self.mirror.workout(&entry.workout_id),
                series: self.series_for(&entry.id),
                warnings: self.warnings_for_day_entry(&entry.id),
            })
            .collect()
    }
}
