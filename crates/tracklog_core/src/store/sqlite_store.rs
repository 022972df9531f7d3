//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist the four collections as flat tables keyed by `(user_scope, id)`.
//! - Commit write batches inside one immediate transaction.
//! - Publish full collection snapshots to subscribers after each commit.
//!
//! # Invariants
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Subscribers are notified only after a successful commit.

use crate::db::migrations::latest_version;
use crate::model::collection::{Collection, CollectionSnapshot, Entity};
use crate::model::scope::UserScope;
use crate::model::series::{GymSeries, SeriesBody, SeriesSet, TrackSeries};
use crate::model::training::{Cycle, DayEntry, DocId, TrainingType, Workout, DATE_FORMAT};
use crate::store::hub::{Subscription, SubscriptionEvent, SubscriptionHub};
use crate::store::{DocumentStore, StoreError, StoreResult, WriteBatch, WriteOp};
use chrono::NaiveDate;
use log::{error, info, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Instant;

const CYCLE_SELECT_SQL: &str = "SELECT id, name, start_date, end_date FROM cycles";
const WORKOUT_SELECT_SQL: &str = "SELECT id, cycle_id, name, type FROM workouts";
const DAY_ENTRY_SELECT_SQL: &str = "SELECT id, workout_id, date, notes FROM day_entries";
const SERIES_SELECT_SQL: &str = "SELECT
    id,
    day_entry_id,
    idx,
    type,
    run_time,
    distance_meters,
    recovery_seconds,
    is_last,
    reps,
    weight
FROM series_sets";

/// SQLite document store borrowing a migrated connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    hub: Rc<SubscriptionHub>,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Creates a store from a connection returned by `open_db*`.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self {
            conn,
            hub: SubscriptionHub::new(),
        })
    }

    /// Subscription registry shared by every subscription of this store.
    pub fn hub(&self) -> &Rc<SubscriptionHub> {
        &self.hub
    }

    fn publish_changes(&self, scope: &UserScope, collections: &BTreeSet<Collection>) {
        for &collection in collections {
            if !self.hub.has_listeners(scope, collection) {
                continue;
            }
            let event = match self.fetch_collection(scope, collection) {
                Ok(snapshot) => SubscriptionEvent::Snapshot(snapshot),
                Err(err) => {
                    warn!(
                        "event=snapshot_publish module=store status=error collection={collection} error={err}"
                    );
                    SubscriptionEvent::Error(err.to_string())
                }
            };
            self.hub.publish(scope, collection, &event);
        }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn fetch_collection(
        &self,
        scope: &UserScope,
        collection: Collection,
    ) -> StoreResult<CollectionSnapshot> {
        let snapshot = match collection {
            Collection::Cycles => CollectionSnapshot::Cycles(query_rows(
                self.conn,
                &format!(
                    "{CYCLE_SELECT_SQL} WHERE user_scope = ?1 ORDER BY start_date ASC, id ASC;"
                ),
                scope,
                None,
                parse_cycle_row,
            )?),
            Collection::Workouts => CollectionSnapshot::Workouts(query_rows(
                self.conn,
                &format!("{WORKOUT_SELECT_SQL} WHERE user_scope = ?1 ORDER BY id ASC;"),
                scope,
                None,
                parse_workout_row,
            )?),
            Collection::DayEntries => CollectionSnapshot::DayEntries(query_rows(
                self.conn,
                &format!("{DAY_ENTRY_SELECT_SQL} WHERE user_scope = ?1 ORDER BY date DESC, id ASC;"),
                scope,
                None,
                parse_day_entry_row,
            )?),
            Collection::SeriesSets => CollectionSnapshot::SeriesSets(query_rows(
                self.conn,
                &format!(
                    "{SERIES_SELECT_SQL} WHERE user_scope = ?1 ORDER BY day_entry_id ASC, idx ASC, id ASC;"
                ),
                scope,
                None,
                parse_series_row,
            )?),
        };
        Ok(snapshot)
    }

    fn fetch_entity(
        &self,
        scope: &UserScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<Entity>> {
        let entity = match collection {
            Collection::Cycles => query_rows(
                self.conn,
                &format!("{CYCLE_SELECT_SQL} WHERE user_scope = ?1 AND id = ?2;"),
                scope,
                Some(id),
                parse_cycle_row,
            )?
            .pop()
            .map(Entity::Cycle),
            Collection::Workouts => query_rows(
                self.conn,
                &format!("{WORKOUT_SELECT_SQL} WHERE user_scope = ?1 AND id = ?2;"),
                scope,
                Some(id),
                parse_workout_row,
            )?
            .pop()
            .map(Entity::Workout),
            Collection::DayEntries => query_rows(
                self.conn,
                &format!("{DAY_ENTRY_SELECT_SQL} WHERE user_scope = ?1 AND id = ?2;"),
                scope,
                Some(id),
                parse_day_entry_row,
            )?
            .pop()
            .map(Entity::DayEntry),
            Collection::SeriesSets => query_rows(
                self.conn,
                &format!("{SERIES_SELECT_SQL} WHERE user_scope = ?1 AND id = ?2;"),
                scope,
                Some(id),
                parse_series_row,
            )?
            .pop()
            .map(Entity::SeriesSet),
        };
        Ok(entity)
    }

    fn child_ids(
        &self,
        scope: &UserScope,
        collection: Collection,
        parent_id: &str,
    ) -> StoreResult<Vec<DocId>> {
        let parent_column = parent_column(collection).ok_or(StoreError::NoParent(collection))?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id FROM {} WHERE user_scope = ?1 AND {parent_column} = ?2 ORDER BY id ASC;",
            table_name(collection)
        ))?;
        let mut rows = stmt.query(params![scope.as_str(), parent_id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    fn commit(&self, scope: &UserScope, batch: &WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let started_at = Instant::now();
        let result = (|| -> StoreResult<()> {
            let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
            for op in batch.ops() {
                apply_op(&tx, scope, op)?;
            }
            tx.commit()?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                info!(
                    "event=batch_commit module=store status=ok ops={} duration_ms={}",
                    batch.len(),
                    started_at.elapsed().as_millis()
                );
                self.publish_changes(scope, &batch.touched_collections());
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=batch_commit module=store status=error ops={} duration_ms={} error={err}",
                    batch.len(),
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    fn subscribe(&self, scope: &UserScope, collection: Collection) -> StoreResult<Subscription> {
        let initial = self.fetch_collection(scope, collection)?;
        let subscription = self.hub.register(scope, collection);
        self.hub
            .deliver_to(subscription.id(), SubscriptionEvent::Snapshot(initial));
        Ok(subscription)
    }
}

fn query_rows<T>(
    conn: &Connection,
    sql: &str,
    scope: &UserScope,
    id: Option<&str>,
    parse: fn(&Row<'_>) -> StoreResult<T>,
) -> StoreResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = match id {
        Some(id) => stmt.query(params![scope.as_str(), id])?,
        None => stmt.query(params![scope.as_str()])?,
    };
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }
    Ok(items)
}

fn apply_op(conn: &Connection, scope: &UserScope, op: &WriteOp) -> StoreResult<()> {
    match op {
        WriteOp::Put(entity) => put_entity(conn, scope, entity),
        WriteOp::Delete { collection, id } => {
            conn.execute(
                &format!(
                    "DELETE FROM {} WHERE user_scope = ?1 AND id = ?2;",
                    table_name(*collection)
                ),
                params![scope.as_str(), id],
            )?;
            Ok(())
        }
    }
}

fn put_entity(conn: &Connection, scope: &UserScope, entity: &Entity) -> StoreResult<()> {
    match entity {
        Entity::Cycle(cycle) => conn.execute(
            "INSERT INTO cycles (user_scope, id, name, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_scope, id) DO UPDATE SET
                name = excluded.name,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                scope.as_str(),
                cycle.id,
                cycle.name,
                format_date(cycle.start_date),
                format_date(cycle.end_date),
            ],
        )?,
        Entity::Workout(workout) => conn.execute(
            "INSERT INTO workouts (user_scope, id, cycle_id, name, type)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_scope, id) DO UPDATE SET
                cycle_id = excluded.cycle_id,
                name = excluded.name,
                type = excluded.type,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                scope.as_str(),
                workout.id,
                workout.cycle_id,
                workout.name,
                workout.kind.as_str(),
            ],
        )?,
        Entity::DayEntry(entry) => conn.execute(
            "INSERT INTO day_entries (user_scope, id, workout_id, date, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_scope, id) DO UPDATE SET
                workout_id = excluded.workout_id,
                date = excluded.date,
                notes = excluded.notes,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                scope.as_str(),
                entry.id,
                entry.workout_id,
                format_date(entry.date),
                entry.notes,
            ],
        )?,
        Entity::SeriesSet(series) => {
            let (run_time, distance_meters, recovery_seconds, is_last, reps, weight) =
                match &series.body {
                    SeriesBody::Track(track) => (
                        Some(track.run_time()),
                        track.distance_meters(),
                        track.recovery_seconds(),
                        track.is_last(),
                        None,
                        None,
                    ),
                    SeriesBody::Gym(gym) => (
                        None,
                        None,
                        None,
                        false,
                        Some(gym.reps.as_str()),
                        Some(gym.weight.as_str()),
                    ),
                };
            conn.execute(
                "INSERT INTO series_sets (
                    user_scope,
                    id,
                    day_entry_id,
                    idx,
                    type,
                    run_time,
                    distance_meters,
                    recovery_seconds,
                    is_last,
                    reps,
                    weight
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT (user_scope, id) DO UPDATE SET
                    day_entry_id = excluded.day_entry_id,
                    idx = excluded.idx,
                    type = excluded.type,
                    run_time = excluded.run_time,
                    distance_meters = excluded.distance_meters,
                    recovery_seconds = excluded.recovery_seconds,
                    is_last = excluded.is_last,
                    reps = excluded.reps,
                    weight = excluded.weight,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![
                    scope.as_str(),
                    series.id,
                    series.day_entry_id,
                    series.index,
                    series.kind().as_str(),
                    run_time,
                    distance_meters,
                    recovery_seconds,
                    is_last,
                    reps,
                    weight,
                ],
            )?
        }
    };
    Ok(())
}

fn parse_cycle_row(row: &Row<'_>) -> StoreResult<Cycle> {
    Ok(Cycle {
        id: row.get("id")?,
        name: row.get("name")?,
        start_date: parse_date(&row.get::<_, String>("start_date")?, "cycles.start_date")?,
        end_date: parse_date(&row.get::<_, String>("end_date")?, "cycles.end_date")?,
    })
}

fn parse_workout_row(row: &Row<'_>) -> StoreResult<Workout> {
    let type_text: String = row.get("type")?;
    let kind = TrainingType::parse(&type_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid workout type `{type_text}` in workouts.type"))
    })?;
    Ok(Workout {
        id: row.get("id")?,
        cycle_id: row.get("cycle_id")?,
        name: row.get("name")?,
        kind,
    })
}

fn parse_day_entry_row(row: &Row<'_>) -> StoreResult<DayEntry> {
    Ok(DayEntry {
        id: row.get("id")?,
        workout_id: row.get("workout_id")?,
        date: parse_date(&row.get::<_, String>("date")?, "day_entries.date")?,
        notes: row.get("notes")?,
    })
}

fn parse_series_row(row: &Row<'_>) -> StoreResult<SeriesSet> {
    let id: String = row.get("id")?;
    let index_value: i64 = row.get("idx")?;
    let index = u32::try_from(index_value).map_err(|_| {
        StoreError::InvalidData(format!("invalid index `{index_value}` in series_sets.idx"))
    })?;

    let type_text: String = row.get("type")?;
    let body = match TrainingType::parse(&type_text) {
        Some(TrainingType::Track) => {
            let run_time = row.get::<_, Option<f64>>("run_time")?.ok_or_else(|| {
                StoreError::InvalidData(format!("track series `{id}` has no run_time"))
            })?;
            let recovery_seconds = row
                .get::<_, Option<i64>>("recovery_seconds")?
                .map(|value| {
                    u32::try_from(value).map_err(|_| {
                        StoreError::InvalidData(format!(
                            "invalid recovery `{value}` in series_sets.recovery_seconds"
                        ))
                    })
                })
                .transpose()?;
            let is_last = match row.get::<_, i64>("is_last")? {
                0 => false,
                1 => true,
                other => {
                    return Err(StoreError::InvalidData(format!(
                        "invalid is_last value `{other}` in series_sets.is_last"
                    )));
                }
            };
            SeriesBody::Track(TrackSeries::new(
                run_time,
                row.get("distance_meters")?,
                recovery_seconds,
                is_last,
            ))
        }
        Some(TrainingType::Gym) => SeriesBody::Gym(GymSeries {
            reps: row.get::<_, Option<String>>("reps")?.unwrap_or_default(),
            weight: row.get::<_, Option<String>>("weight")?.unwrap_or_default(),
        }),
        None => {
            return Err(StoreError::InvalidData(format!(
                "invalid series type `{type_text}` in series_sets.type"
            )));
        }
    };

    Ok(SeriesSet {
        id,
        day_entry_id: row.get("day_entry_id")?,
        index,
        body,
    })
}

fn parse_date(value: &str, column: &'static str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| StoreError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

fn table_name(collection: Collection) -> &'static str {
    match collection {
        Collection::Cycles => "cycles",
        Collection::Workouts => "workouts",
        Collection::DayEntries => "day_entries",
        Collection::SeriesSets => "series_sets",
    }
}

fn parent_column(collection: Collection) -> Option<&'static str> {
    match collection {
        Collection::Cycles => None,
        Collection::Workouts => Some("cycle_id"),
        Collection::DayEntries => Some("workout_id"),
        Collection::SeriesSets => Some("day_entry_id"),
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for collection in Collection::ALL {
        let table = table_name(collection);
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
