//! Derived views over the mirror.
//!
//! # Responsibility
//! - Filter day entries by hierarchy position, date and type.
//! - Aggregate track series for distance progression.
//! - Compute advisory referential warnings.
//!
//! # Invariants
//! - Every query is pure and synchronous; nothing here writes.
//! - Missing parents and legacy records are reported, never repaired.

use crate::mirror::MirrorStore;
use crate::model::series::SeriesSet;
use crate::model::training::{Cycle, Workout};

mod filter;
mod progression;
mod warnings;

pub use filter::{DayEntryFilter, DayEntrySummary};
pub use progression::{ProgressionPoint, TrackDistances};
pub use warnings::ReferentialWarning;

/// Read-only query facade borrowing the mirror.
#[derive(Debug, Clone, Copy)]
pub struct TrainingQuery<'a> {
    mirror: &'a MirrorStore,
}

impl<'a> TrainingQuery<'a> {
    pub fn new(mirror: &'a MirrorStore) -> Self {
        Self { mirror }
    }

    /// Series of one day entry in display order.
    pub fn series_for(&self, day_entry_id: &str) -> Vec<&'a SeriesSet> {
        let mut series: Vec<_> = self
            .mirror
            .series_sets()
            .filter(|series| series.day_entry_id == day_entry_id)
            .collect();
        series.sort_by(|left, right| {
            left.index
                .cmp(&right.index)
                .then_with(|| left.id.cmp(&right.id))
        });
        series
    }

    /// Workouts of one cycle, ordered by name.
    pub fn workouts_for_cycle(&self, cycle_id: &str) -> Vec<&'a Workout> {
        let mut workouts: Vec<_> = self
            .mirror
            .workouts()
            .filter(|workout| workout.cycle_id == cycle_id)
            .collect();
        workouts.sort_by(|left, right| {
            left.name
                .cmp(&right.name)
                .then_with(|| left.id.cmp(&right.id))
        });
        workouts
    }

    /// Cycles ordered by start date, then id.
    pub fn cycles_by_start(&self) -> Vec<&'a Cycle> {
        let mut cycles: Vec<_> = self.mirror.cycles().collect();
        cycles.sort_by(|left, right| {
            left.start_date
                .cmp(&right.start_date)
                .then_with(|| left.id.cmp(&right.id))
        });
        cycles
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{cycle, gym, mirror, track, workout};
    use super::TrainingQuery;
    use crate::model::training::TrainingType;

    #[test]
    fn series_for_orders_by_index() {
        let mirror = mirror(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![
                track("S-b", "DE-1", 2, 60.8, Some(400.0)),
                track("S-a", "DE-1", 1, 62.1, Some(400.0)),
                gym("S-c", "DE-2", 1),
            ],
        );
        let query = TrainingQuery::new(&mirror);
        let ids: Vec<_> = query
            .series_for("DE-1")
            .into_iter()
            .map(|series| series.id.as_str())
            .collect();
        assert_eq!(ids, vec!["S-a", "S-b"]);
        assert!(query.series_for("DE-404").is_empty());
    }

    #[test]
    fn cycles_sort_by_start_date() {
        let mirror = mirror(
            vec![
                cycle("CYC-late", "2024-07-01"),
                cycle("CYC-early", "2024-01-01"),
            ],
            vec![workout("WK-1", "CYC-early", TrainingType::Gym)],
            Vec::new(),
            Vec::new(),
        );
        let query = TrainingQuery::new(&mirror);
        let ids: Vec<_> = query
            .cycles_by_start()
            .into_iter()
            .map(|cycle| cycle.id.as_str())
            .collect();
        assert_eq!(ids, vec!["CYC-early", "CYC-late"]);
        assert_eq!(query.workouts_for_cycle("CYC-early").len(), 1);
        assert!(query.workouts_for_cycle("CYC-late").is_empty());
    }
}
