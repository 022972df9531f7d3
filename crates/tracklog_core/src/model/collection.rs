//! Collection names and collection-agnostic entity wrappers.
//!
//! # Responsibility
//! - Name the four flat collections of the persisted layout.
//! - Describe the parent link of each collection for cascade traversal.
//! - Carry whole-collection snapshots between store, sync and mirror.

use crate::model::series::SeriesSet;
use crate::model::training::{Cycle, DayEntry, DocId, Workout};
use std::fmt::{Display, Formatter};

/// One of the four flat collections stored per user scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Cycles,
    Workouts,
    DayEntries,
    SeriesSets,
}

impl Collection {
    /// Every collection, parents before children.
    pub const ALL: [Collection; 4] = [
        Collection::Cycles,
        Collection::Workouts,
        Collection::DayEntries,
        Collection::SeriesSets,
    ];

    /// Logical collection name of the persisted layout.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cycles => "cycles",
            Self::Workouts => "workouts",
            Self::DayEntries => "dayEntries",
            Self::SeriesSets => "seriesSets",
        }
    }

    /// Parses a logical collection name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.as_str() == value)
    }

    /// Collection owning this one, `None` for the hierarchy root.
    pub fn parent(self) -> Option<Collection> {
        match self {
            Self::Cycles => None,
            Self::Workouts => Some(Self::Cycles),
            Self::DayEntries => Some(Self::Workouts),
            Self::SeriesSets => Some(Self::DayEntries),
        }
    }

    /// Collection owned by this one, `None` for the leaves.
    pub fn child(self) -> Option<Collection> {
        match self {
            Self::Cycles => Some(Self::Workouts),
            Self::Workouts => Some(Self::DayEntries),
            Self::DayEntries => Some(Self::SeriesSets),
            Self::SeriesSets => None,
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned entity of any collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Cycle(Cycle),
    Workout(Workout),
    DayEntry(DayEntry),
    SeriesSet(SeriesSet),
}

impl Entity {
    pub fn id(&self) -> &str {
        self.borrowed().id()
    }

    pub fn collection(&self) -> Collection {
        self.borrowed().collection()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.borrowed().parent_id()
    }

    pub fn borrowed(&self) -> EntityRef<'_> {
        match self {
            Self::Cycle(value) => EntityRef::Cycle(value),
            Self::Workout(value) => EntityRef::Workout(value),
            Self::DayEntry(value) => EntityRef::DayEntry(value),
            Self::SeriesSet(value) => EntityRef::SeriesSet(value),
        }
    }
}

impl From<Cycle> for Entity {
    fn from(value: Cycle) -> Self {
        Self::Cycle(value)
    }
}

impl From<Workout> for Entity {
    fn from(value: Workout) -> Self {
        Self::Workout(value)
    }
}

impl From<DayEntry> for Entity {
    fn from(value: DayEntry) -> Self {
        Self::DayEntry(value)
    }
}

impl From<SeriesSet> for Entity {
    fn from(value: SeriesSet) -> Self {
        Self::SeriesSet(value)
    }
}

/// Borrowed entity of any collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Cycle(&'a Cycle),
    Workout(&'a Workout),
    DayEntry(&'a DayEntry),
    SeriesSet(&'a SeriesSet),
}

impl<'a> EntityRef<'a> {
    pub fn id(&self) -> &'a str {
        match *self {
            Self::Cycle(value) => &value.id,
            Self::Workout(value) => &value.id,
            Self::DayEntry(value) => &value.id,
            Self::SeriesSet(value) => &value.id,
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Self::Cycle(_) => Collection::Cycles,
            Self::Workout(_) => Collection::Workouts,
            Self::DayEntry(_) => Collection::DayEntries,
            Self::SeriesSet(_) => Collection::SeriesSets,
        }
    }

    /// Id of the owning entity in [`Collection::parent`].
    pub fn parent_id(&self) -> Option<&'a str> {
        match *self {
            Self::Cycle(_) => None,
            Self::Workout(value) => Some(&value.cycle_id),
            Self::DayEntry(value) => Some(&value.workout_id),
            Self::SeriesSet(value) => Some(&value.day_entry_id),
        }
    }

    pub fn to_entity(&self) -> Entity {
        match *self {
            Self::Cycle(value) => Entity::Cycle(value.clone()),
            Self::Workout(value) => Entity::Workout(value.clone()),
            Self::DayEntry(value) => Entity::DayEntry(value.clone()),
            Self::SeriesSet(value) => Entity::SeriesSet(value.clone()),
        }
    }
}

/// Full current contents of one collection, as delivered by a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionSnapshot {
    Cycles(Vec<Cycle>),
    Workouts(Vec<Workout>),
    DayEntries(Vec<DayEntry>),
    SeriesSets(Vec<SeriesSet>),
}

impl CollectionSnapshot {
    /// Empty snapshot for `collection`.
    pub fn empty(collection: Collection) -> Self {
        match collection {
            Collection::Cycles => Self::Cycles(Vec::new()),
            Collection::Workouts => Self::Workouts(Vec::new()),
            Collection::DayEntries => Self::DayEntries(Vec::new()),
            Collection::SeriesSets => Self::SeriesSets(Vec::new()),
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Self::Cycles(_) => Collection::Cycles,
            Self::Workouts(_) => Collection::Workouts,
            Self::DayEntries(_) => Collection::DayEntries,
            Self::SeriesSets(_) => Collection::SeriesSets,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Cycles(items) => items.len(),
            Self::Workouts(items) => items.len(),
            Self::DayEntries(items) => items.len(),
            Self::SeriesSets(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids contained in the snapshot, in snapshot order.
    pub fn ids(&self) -> Vec<DocId> {
        match self {
            Self::Cycles(items) => items.iter().map(|item| item.id.clone()).collect(),
            Self::Workouts(items) => items.iter().map(|item| item.id.clone()).collect(),
            Self::DayEntries(items) => items.iter().map(|item| item.id.clone()).collect(),
            Self::SeriesSets(items) => items.iter().map(|item| item.id.clone()).collect(),
        }
    }
}
