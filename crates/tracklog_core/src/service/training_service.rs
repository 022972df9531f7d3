//! Training-log use-case service.
//!
//! # Responsibility
//! - Validate raw form fields and write entities through the store.
//! - Write a day entry together with its series in one batch.
//! - Route deletes of owning entities through the cascade orchestrator.
//! - Import and export whole data sets.
//!
//! # Invariants
//! - Updates replace every field of the target wholesale and keep its id.
//! - Series of one day entry are indexed `1..=n` in submission order.
//! - Parent links are not checked on create; cascade delete alone keeps
//!   the hierarchy consistent.

use crate::cascade::{BatchWriteError, CascadeDeleter, CascadeError, DeletionReport};
use crate::model::collection::{Collection, CollectionSnapshot, Entity};
use crate::model::dataset::TrainingDataSet;
use crate::model::scope::UserScope;
use crate::model::series::SeriesSet;
use crate::model::training::{Cycle, DayEntry, Workout};
use crate::service::fields::{
    CycleFields, DayEntryFields, SeriesFields, ValidationError, WorkoutFields,
};
use crate::store::{DocumentStore, StoreError, WriteBatch};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    /// Update or lookup target does not exist in the store.
    NotFound { collection: Collection, id: String },
    Store(StoreError),
    BatchWrite(BatchWriteError),
    /// The day entry already uses the largest series index.
    SeriesIndexExhausted { day_entry_id: String },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "{collection}/{id} not found"),
            Self::Store(err) => write!(f, "{err}"),
            Self::BatchWrite(err) => write!(f, "{err}"),
            Self::SeriesIndexExhausted { day_entry_id } => {
                write!(f, "day entry {day_entry_id} has no series index left")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } | Self::SeriesIndexExhausted { .. } => None,
            Self::Store(err) => Some(err),
            Self::BatchWrite(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<CascadeError> for ServiceError {
    fn from(value: CascadeError) -> Self {
        match value {
            CascadeError::Read(err) => Self::Store(err),
            CascadeError::BatchWrite(err) => Self::BatchWrite(err),
        }
    }
}

/// Training service facade over one store and one user scope.
pub struct TrainingService<S> {
    store: S,
    scope: UserScope,
}

impl<S: DocumentStore> TrainingService<S> {
    pub fn new(store: S, scope: UserScope) -> Self {
        Self { store, scope }
    }

    pub fn scope(&self) -> &UserScope {
        &self.scope
    }

    pub fn create_cycle(&self, fields: &CycleFields) -> ServiceResult<Cycle> {
        let input = fields.validate()?;
        let cycle = Cycle::new(input.name, input.start_date, input.end_date);
        self.put(cycle.clone())?;
        Ok(cycle)
    }

    pub fn update_cycle(&self, id: &str, fields: &CycleFields) -> ServiceResult<Cycle> {
        let input = fields.validate()?;
        self.ensure_exists(Collection::Cycles, id)?;
        let cycle = Cycle {
            id: id.to_string(),
            name: input.name,
            start_date: input.start_date,
            end_date: input.end_date,
        };
        self.put(cycle.clone())?;
        Ok(cycle)
    }

    pub fn create_workout(&self, fields: &WorkoutFields) -> ServiceResult<Workout> {
        let input = fields.validate()?;
        let workout = Workout::new(input.cycle_id, input.name, input.kind);
        self.put(workout.clone())?;
        Ok(workout)
    }

    pub fn update_workout(&self, id: &str, fields: &WorkoutFields) -> ServiceResult<Workout> {
        let input = fields.validate()?;
        self.ensure_exists(Collection::Workouts, id)?;
        let workout = Workout {
            id: id.to_string(),
            cycle_id: input.cycle_id,
            name: input.name,
            kind: input.kind,
        };
        self.put(workout.clone())?;
        Ok(workout)
    }

    pub fn create_day_entry(&self, fields: &DayEntryFields) -> ServiceResult<DayEntry> {
        let (entry, _) = self.create_day_entry_with_series(fields, &[])?;
        Ok(entry)
    }

    /// Writes a day entry and its series in one batch.
    ///
    /// Blank series cards are skipped; the rest are indexed `1..=n`.
    pub fn create_day_entry_with_series(
        &self,
        fields: &DayEntryFields,
        series: &[SeriesFields],
    ) -> ServiceResult<(DayEntry, Vec<SeriesSet>)> {
        let input = fields.validate()?;
        let entry = DayEntry::new(input.workout_id, input.date, input.notes);
        let series_sets = build_series(&entry.id, series)?;

        let mut batch = WriteBatch::new();
        batch.put(entry.clone());
        for series_set in &series_sets {
            batch.put(series_set.clone());
        }
        self.store.commit(&self.scope, &batch)?;

        info!(
            "event=day_entry_create module=service status=ok day_entry_id={} series={}",
            entry.id,
            series_sets.len()
        );
        Ok((entry, series_sets))
    }

    pub fn update_day_entry(&self, id: &str, fields: &DayEntryFields) -> ServiceResult<DayEntry> {
        let input = fields.validate()?;
        self.ensure_exists(Collection::DayEntries, id)?;
        let entry = DayEntry {
            id: id.to_string(),
            workout_id: input.workout_id,
            date: input.date,
            notes: input.notes,
        };
        self.put(entry.clone())?;
        Ok(entry)
    }

    /// Appends one series after the current last index of its day entry.
    pub fn create_series_set(
        &self,
        day_entry_id: &str,
        fields: &SeriesFields,
    ) -> ServiceResult<SeriesSet> {
        let body = fields.validate()?;
        let next_index = self
            .series_of(day_entry_id)?
            .iter()
            .map(|series| series.index)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| index_exhausted(day_entry_id))?;
        let series = SeriesSet::new(day_entry_id, next_index, body);
        self.put(series.clone())?;
        Ok(series)
    }

    /// Replaces the payload of one series, keeping its owner and index.
    pub fn update_series_set(&self, id: &str, fields: &SeriesFields) -> ServiceResult<SeriesSet> {
        let body = fields.validate()?;
        let Some(Entity::SeriesSet(existing)) =
            self.store
                .fetch_entity(&self.scope, Collection::SeriesSets, id)?
        else {
            return Err(not_found(Collection::SeriesSets, id));
        };
        let series = SeriesSet { body, ..existing };
        self.put(series.clone())?;
        Ok(series)
    }

    /// Replaces every series of a day entry in one batch.
    pub fn replace_series(
        &self,
        day_entry_id: &str,
        series: &[SeriesFields],
    ) -> ServiceResult<Vec<SeriesSet>> {
        let replacement = build_series(day_entry_id, series)?;
        self.ensure_exists(Collection::DayEntries, day_entry_id)?;

        let mut batch = WriteBatch::new();
        let previous =
            self.store
                .child_ids(&self.scope, Collection::SeriesSets, day_entry_id)?;
        for id in &previous {
            batch.delete(Collection::SeriesSets, id.clone());
        }
        for series_set in &replacement {
            batch.put(series_set.clone());
        }
        self.store.commit(&self.scope, &batch)?;

        info!(
            "event=series_replace module=service status=ok day_entry_id={day_entry_id} removed={} written={}",
            previous.len(),
            replacement.len()
        );
        Ok(replacement)
    }

    /// Removes one series. Series own nothing, so no cascade is needed.
    pub fn delete_series_set(&self, id: &str) -> ServiceResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(Collection::SeriesSets, id);
        self.store.commit(&self.scope, &batch)?;
        Ok(())
    }

    pub fn delete_cycle(&self, id: &str) -> ServiceResult<DeletionReport> {
        Ok(self.deleter().delete_cycle(id)?)
    }

    pub fn delete_workout(&self, id: &str) -> ServiceResult<DeletionReport> {
        Ok(self.deleter().delete_workout(id)?)
    }

    pub fn delete_day_entry(&self, id: &str) -> ServiceResult<DeletionReport> {
        Ok(self.deleter().delete_day_entry(id)?)
    }

    /// Writes every document of `data` in one batch, replacing same-id
    /// documents. Returns the number of documents written.
    pub fn import_dataset(&self, data: TrainingDataSet) -> ServiceResult<usize> {
        let mut batch = WriteBatch::new();
        for entity in data.into_entities() {
            batch.put(entity);
        }
        self.store.commit(&self.scope, &batch)?;
        info!(
            "event=dataset_import module=service status=ok documents={}",
            batch.len()
        );
        Ok(batch.len())
    }

    /// Reads every collection of the scope back into a data set.
    pub fn export_dataset(&self) -> ServiceResult<TrainingDataSet> {
        let mut data = TrainingDataSet::default();
        for collection in Collection::ALL {
            data.absorb(self.store.fetch_collection(&self.scope, collection)?);
        }
        info!(
            "event=dataset_export module=service status=ok documents={}",
            data.document_count()
        );
        Ok(data)
    }

    fn deleter(&self) -> CascadeDeleter<&S> {
        CascadeDeleter::new(&self.store, self.scope.clone())
    }

    fn put(&self, entity: impl Into<Entity>) -> ServiceResult<()> {
        let entity = entity.into();
        let collection = entity.collection();
        let mut batch = WriteBatch::new();
        batch.put(entity);
        self.store.commit(&self.scope, &batch)?;
        info!("event=entity_put module=service status=ok collection={collection}");
        Ok(())
    }

    fn ensure_exists(&self, collection: Collection, id: &str) -> ServiceResult<()> {
        match self.store.fetch_entity(&self.scope, collection, id)? {
            Some(_) => Ok(()),
            None => Err(not_found(collection, id)),
        }
    }

    fn series_of(&self, day_entry_id: &str) -> ServiceResult<Vec<SeriesSet>> {
        let CollectionSnapshot::SeriesSets(items) = self
            .store
            .fetch_collection(&self.scope, Collection::SeriesSets)?
        else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter(|series| series.day_entry_id == day_entry_id)
            .collect())
    }
}

fn build_series(day_entry_id: &str, fields: &[SeriesFields]) -> ServiceResult<Vec<SeriesSet>> {
    let mut series = Vec::new();
    for card in fields.iter().filter(|card| !card.is_blank()) {
        let index = u32::try_from(series.len() + 1)
            .map_err(|_| index_exhausted(day_entry_id))?;
        series.push(SeriesSet::new(day_entry_id, index, card.validate()?));
    }
    Ok(series)
}

fn index_exhausted(day_entry_id: &str) -> ServiceError {
    ServiceError::SeriesIndexExhausted {
        day_entry_id: day_entry_id.to_string(),
    }
}

fn not_found(collection: Collection, id: &str) -> ServiceError {
    ServiceError::NotFound {
        collection,
        id: id.to_string(),
    }
}
