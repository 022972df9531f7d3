use crate::model::training::DocId;
use crate::query::TrainingQuery;
use chrono::NaiveDate;

/// Distinct known track distances plus the count of legacy records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackDistances {
    /// Ascending, without duplicates.
    pub distances: Vec<f64>,
    /// Track series recorded without a distance.
    pub legacy_count: usize,
}

/// One track series plotted on a distance progression.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionPoint {
    pub date: NaiveDate,
    pub run_time: f64,
    pub recovery_seconds: Option<u32>,
    /// `None` when the owning workout is missing from the mirror.
    pub workout_name: Option<String>,
    pub day_entry_id: DocId,
}

impl<'a> TrainingQuery<'a> {
    pub fn distinct_track_distances(&self) -> TrackDistances {
        let mut result = TrackDistances::default();
        for track in self
            .mirror
            .series_sets()
            .filter_map(|series| series.as_track())
        {
            match track.distance_meters() {
                Some(distance) => result.distances.push(distance),
                None => result.legacy_count += 1,
            }
        }
        result.distances.sort_by(f64::total_cmp);
        result.distances.dedup();
        result
    }

    /// Every track series run over `distance_meters`, oldest first.
    ///
    /// Series whose day entry is missing from the mirror have no date and
    /// are left out.
    pub fn progression_series(&self, distance_meters: f64) -> Vec<ProgressionPoint> {
        let mut points: Vec<_> = self
            .mirror
            .series_sets()
            .filter_map(|series| {
                let track = series.as_track()?;
                if track.distance_meters() != Some(distance_meters) {
                    return None;
                }
                let entry = self.mirror.day_entry(&series.day_entry_id)?;
                Some(ProgressionPoint {
                    date: entry.date,
                    run_time: track.run_time(),
                    recovery_seconds: track.recovery_seconds(),
                    workout_name: self
                        .mirror
                        .workout(&entry.workout_id)
                        .map(|workout| workout.name.clone()),
                    day_entry_id: entry.id.clone(),
                })
            })
            .collect();
        points.sort_by_key(|point| point.date);
        points
    }
}

#[cfg(test)]
mod tests {
    use crate::model::training::TrainingType;
    use crate::query::fixtures::{date, entry, gym, mirror, track, workout};
    use crate::query::TrainingQuery;

    #[test]
    fn distances_are_sorted_distinct_and_count_legacy() {
        let mirror = mirror(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![
                track("S-1", "DE-1", 1, 30.0, Some(200.0)),
                track("S-2", "DE-1", 2, 14.0, Some(100.0)),
                track("S-3", "DE-1", 3, 14.2, Some(100.0)),
                track("S-4", "DE-1", 4, 60.0, None),
                gym("S-5", "DE-2", 1),
            ],
        );
        let distances = TrainingQuery::new(&mirror).distinct_track_distances();
        assert_eq!(distances.distances, vec![100.0, 200.0]);
        assert_eq!(distances.legacy_count, 1);
    }

    #[test]
    fn progression_is_oldest_first_and_skips_other_distances() {
        let mirror = mirror(
            Vec::new(),
            vec![workout("WK-1", "CYC-1", TrainingType::Track)],
            vec![
                entry("DE-new", "WK-1", "2024-06-01"),
                entry("DE-old", "WK-gone", "2024-05-01"),
            ],
            vec![
                track("S-1", "DE-new", 1, 61.0, Some(400.0)),
                track("S-2", "DE-old", 1, 63.0, Some(400.0)),
                track("S-3", "DE-old", 2, 29.0, Some(200.0)),
                track("S-4", "DE-missing", 1, 60.0, Some(400.0)),
            ],
        );
        let points = TrainingQuery::new(&mirror).progression_series(400.0);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date("2024-05-01"));
        assert_eq!(points[0].workout_name, None);
        assert_eq!(points[1].run_time, 61.0);
        assert_eq!(points[1].workout_name.as_deref(), Some("WK-1"));
        assert!(TrainingQuery::new(&mirror).progression_series(800.0).is_empty());
    }
}
