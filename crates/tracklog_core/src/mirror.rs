//! In-memory mirror of the four collections of one user scope.
//!
//! # Responsibility
//! - Hold the latest snapshot of every collection, keyed by id.
//! - Serve read accessors to the query layer.
//!
//! # Invariants
//! - A collection is only ever replaced in full.
//! - Readers never observe a half-applied snapshot.

use crate::model::collection::{Collection, CollectionSnapshot, EntityRef};
use crate::model::series::SeriesSet;
use crate::model::training::{Cycle, DayEntry, DocId, Workout};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct MirrorStore {
    cycles: BTreeMap<DocId, Cycle>,
    workouts: BTreeMap<DocId, Workout>,
    day_entries: BTreeMap<DocId, DayEntry>,
    series_sets: BTreeMap<DocId, SeriesSet>,
}

impl MirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps the whole contents of the snapshot's collection.
    ///
    /// Returns the number of entities now held for that collection.
    pub fn replace_collection(&mut self, snapshot: CollectionSnapshot) -> usize {
        match snapshot {
            CollectionSnapshot::Cycles(items) => {
                self.cycles = keyed(items, |item| &item.id);
                self.cycles.len()
            }
            CollectionSnapshot::Workouts(items) => {
                self.workouts = keyed(items, |item| &item.id);
                self.workouts.len()
            }
            CollectionSnapshot::DayEntries(items) => {
                self.day_entries = keyed(items, |item| &item.id);
                self.day_entries.len()
            }
            CollectionSnapshot::SeriesSets(items) => {
                self.series_sets = keyed(items, |item| &item.id);
                self.series_sets.len()
            }
        }
    }

    /// Every entity of `collection`, ordered by id.
    pub fn all(&self, collection: Collection) -> Vec<EntityRef<'_>> {
        match collection {
            Collection::Cycles => self.cycles.values().map(EntityRef::Cycle).collect(),
            Collection::Workouts => self.workouts.values().map(EntityRef::Workout).collect(),
            Collection::DayEntries => self.day_entries.values().map(EntityRef::DayEntry).collect(),
            Collection::SeriesSets => self.series_sets.values().map(EntityRef::SeriesSet).collect(),
        }
    }

    pub fn by_id(&self, collection: Collection, id: &str) -> Option<EntityRef<'_>> {
        match collection {
            Collection::Cycles => self.cycles.get(id).map(EntityRef::Cycle),
            Collection::Workouts => self.workouts.get(id).map(EntityRef::Workout),
            Collection::DayEntries => self.day_entries.get(id).map(EntityRef::DayEntry),
            Collection::SeriesSets => self.series_sets.get(id).map(EntityRef::SeriesSet),
        }
    }

    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Cycles => self.cycles.len(),
            Collection::Workouts => self.workouts.len(),
            Collection::DayEntries => self.day_entries.len(),
            Collection::SeriesSets => self.series_sets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Collection::ALL
            .into_iter()
            .all(|collection| self.len(collection) == 0)
    }

    /// Drops every collection. Used when a session ends.
    pub fn clear(&mut self) {
        self.cycles.clear();
        self.workouts.clear();
        self.day_entries.clear();
        self.series_sets.clear();
    }

    pub fn cycles(&self) -> impl Iterator<Item = &Cycle> {
        self.cycles.values()
    }

    pub fn workouts(&self) -> impl Iterator<Item = &Workout> {
        self.workouts.values()
    }

    pub fn day_entries(&self) -> impl Iterator<Item = &DayEntry> {
        self.day_entries.values()
    }

    pub fn series_sets(&self) -> impl Iterator<Item = &SeriesSet> {
        self.series_sets.values()
    }

    pub fn cycle(&self, id: &str) -> Option<&Cycle> {
        self.cycles.get(id)
    }

    pub fn workout(&self, id: &str) -> Option<&Workout> {
        self.workouts.get(id)
    }

    pub fn day_entry(&self, id: &str) -> Option<&DayEntry> {
        self.day_entries.get(id)
    }

    pub fn series_set(&self, id: &str) -> Option<&SeriesSet> {
        self.series_sets.get(id)
    }
}

fn keyed<T>(items: Vec<T>, id_of: impl Fn(&T) -> &DocId) -> BTreeMap<DocId, T> {
    items
        .into_iter()
        .map(|item| (id_of(&item).clone(), item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::MirrorStore;
    use crate::model::collection::{Collection, CollectionSnapshot, EntityRef};
    use crate::model::training::{Cycle, TrainingType, Workout};
    use chrono::NaiveDate;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn replace_collection_swaps_whole_collection() {
        let mut mirror = MirrorStore::new();
        let first = Cycle::new("Base", date("2024-04-01"), date("2024-06-30"));
        let second = Cycle::new("Peak", date("2024-07-01"), date("2024-08-31"));

        mirror.replace_collection(CollectionSnapshot::Cycles(vec![first.clone(), second.clone()]));
        assert_eq!(mirror.len(Collection::Cycles), 2);

        let count = mirror.replace_collection(CollectionSnapshot::Cycles(vec![second.clone()]));
        assert_eq!(count, 1);
        assert!(mirror.cycle(&first.id).is_none());
        assert_eq!(
            mirror.by_id(Collection::Cycles, &second.id),
            Some(EntityRef::Cycle(&second))
        );
    }

    #[test]
    fn collections_are_independent() {
        let mut mirror = MirrorStore::new();
        let workout = Workout::new("CYC-1", "400s", TrainingType::Track);
        mirror.replace_collection(CollectionSnapshot::Workouts(vec![workout.clone()]));
        mirror.replace_collection(CollectionSnapshot::Cycles(Vec::new()));

        assert_eq!(mirror.all(Collection::Workouts).len(), 1);
        assert!(mirror.all(Collection::Cycles).is_empty());

        mirror.clear();
        assert!(mirror.is_empty());
    }
}
