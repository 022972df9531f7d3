use crate::model::training::{DocId, TrainingType};
use crate::query::TrainingQuery;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Advisory inconsistency found in the mirror. Never blocks a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferentialWarning {
    /// A series type differs from the owning workout's type.
    TypeMismatch {
        day_entry_id: DocId,
        workout_type: TrainingType,
        series_type: TrainingType,
    },
    /// One day entry holds both track and gym series.
    MixedSeriesTypes { day_entry_id: DocId },
    /// Legacy track record without a distance.
    MissingDistance {
        series_id: DocId,
        day_entry_id: DocId,
    },
    OrphanedWorkout { workout_id: DocId, cycle_id: DocId },
    OrphanedDayEntry {
        day_entry_id: DocId,
        workout_id: DocId,
    },
    OrphanedSeriesSet {
        series_id: DocId,
        day_entry_id: DocId,
    },
}

impl Display for ReferentialWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch {
                day_entry_id,
                workout_type,
                series_type,
            } => write!(
                f,
                "day entry {day_entry_id} holds {series_type} series under a {workout_type} workout"
            ),
            Self::MixedSeriesTypes { day_entry_id } => {
                write!(f, "day entry {day_entry_id} mixes track and gym series")
            }
            Self::MissingDistance { series_id, .. } => {
                write!(f, "track series {series_id} has no distance (legacy record)")
            }
            Self::OrphanedWorkout {
                workout_id,
                cycle_id,
            } => write!(f, "workout {workout_id} points at missing cycle {cycle_id}"),
            Self::OrphanedDayEntry {
                day_entry_id,
                workout_id,
            } => write!(
                f,
                "day entry {day_entry_id} points at missing workout {workout_id}"
            ),
            Self::OrphanedSeriesSet {
                series_id,
                day_entry_id,
            } => write!(
                f,
                "series {series_id} points at missing day entry {day_entry_id}"
            ),
        }
    }
}

impl<'a> TrainingQuery<'a> {
    /// Every warning over the whole mirror, parents before children.
    pub fn referential_warnings(&self) -> Vec<ReferentialWarning> {
        let mut warnings: Vec<_> = self
            .mirror
            .workouts()
            .filter(|workout| self.mirror.cycle(&workout.cycle_id).is_none())
            .map(|workout| ReferentialWarning::OrphanedWorkout {
                workout_id: workout.id.clone(),
                cycle_id: workout.cycle_id.clone(),
            })
            .collect();

        for entry in self.mirror.day_entries() {
            warnings.extend(self.warnings_for_day_entry(&entry.id));
        }

        warnings.extend(
            self.mirror
                .series_sets()
                .filter(|series| self.mirror.day_entry(&series.day_entry_id).is_none())
                .map(|series| ReferentialWarning::OrphanedSeriesSet {
                    series_id: series.id.clone(),
                    day_entry_id: series.day_entry_id.clone(),
                }),
        );
        warnings
    }

    /// Warnings about one day entry and the series it owns.
    pub fn warnings_for_day_entry(&self, day_entry_id: &str) -> Vec<ReferentialWarning> {
        let Some(entry) = self.mirror.day_entry(day_entry_id) else {
            return Vec::new();
        };
        let series = self.series_for(day_entry_id);
        let mut warnings = Vec::new();

        match self.mirror.workout(&entry.workout_id) {
            None => warnings.push(ReferentialWarning::OrphanedDayEntry {
                day_entry_id: entry.id.clone(),
                workout_id: entry.workout_id.clone(),
            }),
            Some(workout) => {
                if let Some(mismatch) = series.iter().find(|series| series.kind() != workout.kind) {
                    warnings.push(ReferentialWarning::TypeMismatch {
                        day_entry_id: entry.id.clone(),
                        workout_type: workout.kind,
                        series_type: mismatch.kind(),
                    });
                }
            }
        }

        let kinds: BTreeSet<_> = series.iter().map(|series| series.kind()).collect();
        if kinds.len() > 1 {
            warnings.push(ReferentialWarning::MixedSeriesTypes {
                day_entry_id: entry.id.clone(),
            });
        }

        warnings.extend(series.iter().filter_map(|series| {
            series
                .as_track()
                .filter(|track| track.is_legacy())
                .map(|_| ReferentialWarning::MissingDistance {
                    series_id: series.id.clone(),
                    day_entry_id: entry.id.clone(),
                })
        }));
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::ReferentialWarning;
    use crate::model::training::TrainingType;
    use crate::query::fixtures::{cycle, entry, gym, mirror, track, workout};
    use crate::query::TrainingQuery;

    #[test]
    fn flags_type_mismatch_and_mixed_series() {
        let mirror = mirror(
            vec![cycle("CYC-1", "2024-04-01")],
            vec![workout("WK-1", "CYC-1", TrainingType::Track)],
            vec![entry("DE-1", "WK-1", "2024-05-01")],
            vec![
                track("S-1", "DE-1", 1, 62.1, Some(400.0)),
                gym("S-2", "DE-1", 2),
            ],
        );
        let warnings = TrainingQuery::new(&mirror).warnings_for_day_entry("DE-1");
        assert_eq!(
            warnings,
            vec![
                ReferentialWarning::TypeMismatch {
                    day_entry_id: "DE-1".to_string(),
                    workout_type: TrainingType::Track,
                    series_type: TrainingType::Gym,
                },
                ReferentialWarning::MixedSeriesTypes {
                    day_entry_id: "DE-1".to_string()
                },
            ]
        );
    }

    #[test]
    fn flags_orphans_at_every_level_and_legacy_distance() {
        let mirror = mirror(
            Vec::new(),
            vec![workout("WK-1", "CYC-gone", TrainingType::Track)],
            vec![
                entry("DE-1", "WK-1", "2024-05-01"),
                entry("DE-2", "WK-gone", "2024-05-02"),
            ],
            vec![
                track("S-1", "DE-1", 1, 62.1, None),
                track("S-2", "DE-gone", 1, 60.0, Some(400.0)),
            ],
        );
        let warnings = TrainingQuery::new(&mirror).referential_warnings();

        assert!(warnings.contains(&ReferentialWarning::OrphanedWorkout {
            workout_id: "WK-1".to_string(),
            cycle_id: "CYC-gone".to_string(),
        }));
        assert!(warnings.contains(&ReferentialWarning::OrphanedDayEntry {
            day_entry_id: "DE-2".to_string(),
            workout_id: "WK-gone".to_string(),
        }));
        assert!(warnings.contains(&ReferentialWarning::OrphanedSeriesSet {
            series_id: "S-2".to_string(),
            day_entry_id: "DE-gone".to_string(),
        }));
        assert!(warnings.contains(&ReferentialWarning::MissingDistance {
            series_id: "S-1".to_string(),
            day_entry_id: "DE-1".to_string(),
        }));
        assert_eq!(warnings.len(), 4);
    }
}
