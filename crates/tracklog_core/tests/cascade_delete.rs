use chrono::NaiveDate;
use tracklog_core::{
    CascadeDeleter, CascadeError, Collection, Cycle, DayEntry, DocumentStore, ReferentialWarning,
    SeriesBody, SeriesSet, SessionContext, SqliteDocumentStore, SyncEngine, TrackSeries,
    TrainingQuery, TrainingType, UserScope, Workout, WriteBatch,
};
use tracklog_core::db::open_db_in_memory;

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1 + offset).unwrap()
}

/// Writes one cycle with `workouts` x `entries` x `series` descendants.
fn seed_tree(
    store: &SqliteDocumentStore<'_>,
    scope: &UserScope,
    workouts: usize,
    entries: usize,
    series: usize,
) -> Cycle {
    let cycle = Cycle::new("Base", day(0), day(20));
    let mut batch = WriteBatch::new();
    batch.put(cycle.clone());
    for w in 0..workouts {
        let workout = Workout::new(cycle.id.clone(), format!("W{w}"), TrainingType::Track);
        batch.put(workout.clone());
        for e in 0..entries {
            let entry = DayEntry::new(workout.id.clone(), day(e as u32), "");
            batch.put(entry.clone());
            for s in 0..series {
                batch.put(SeriesSet::new(
                    entry.id.clone(),
                    s as u32 + 1,
                    SeriesBody::Track(TrackSeries::new(60.0, Some(400.0), Some(120), false)),
                ));
            }
        }
    }
    store.commit(scope, &batch).unwrap();
    cycle
}

fn count(store: &SqliteDocumentStore<'_>, scope: &UserScope, collection: Collection) -> usize {
    store.fetch_collection(scope, collection).unwrap().len()
}

#[test]
fn deleting_a_cycle_removes_exactly_its_subtree() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = UserScope::parse("alice").unwrap();
    let (n, m, k) = (2, 3, 4);

    let doomed = seed_tree(&store, &alice, n, m, k);
    let survivor = seed_tree(&store, &alice, 1, 1, 1);

    let deleter = CascadeDeleter::new(&store, alice.clone());
    let report = deleter.delete_cycle(&doomed.id).unwrap();

    assert_eq!(report.total(), 1 + n + n * m + n * m * k);
    assert_eq!(report.count(Collection::Cycles), 1);
    assert_eq!(report.count(Collection::Workouts), n);
    assert_eq!(report.count(Collection::DayEntries), n * m);
    assert_eq!(report.count(Collection::SeriesSets), n * m * k);

    for collection in Collection::ALL {
        assert_eq!(count(&store, &alice, collection), 1, "{collection}");
    }
    assert!(store
        .fetch_entity(&alice, Collection::Cycles, &survivor.id)
        .unwrap()
        .is_some());
}

#[test]
fn deleting_a_workout_or_day_entry_stops_at_that_level() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = UserScope::parse("alice").unwrap();
    let cycle = seed_tree(&store, &alice, 2, 2, 3);
    let deleter = CascadeDeleter::new(&store, alice.clone());

    let workout_ids = store
        .child_ids(&alice, Collection::Workouts, &cycle.id)
        .unwrap();
    let report = deleter.delete_workout(&workout_ids[0]).unwrap();
    assert_eq!(report.total(), 1 + 2 + 2 * 3);
    assert_eq!(count(&store, &alice, Collection::Cycles), 1);
    assert_eq!(count(&store, &alice, Collection::Workouts), 1);

    let entry_ids = store
        .child_ids(&alice, Collection::DayEntries, &workout_ids[1])
        .unwrap();
    let report = deleter.delete_day_entry(&entry_ids[0]).unwrap();
    assert_eq!(report.total(), 1 + 3);
    assert_eq!(count(&store, &alice, Collection::DayEntries), 1);
    assert_eq!(count(&store, &alice, Collection::SeriesSets), 3);
}

#[test]
fn failed_batch_deletes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = UserScope::parse("alice").unwrap();
    let cycle = seed_tree(&store, &alice, 1, 2, 2);
    conn.execute_batch(
        "CREATE TRIGGER keep_series BEFORE DELETE ON series_sets
         BEGIN
             SELECT RAISE(ABORT, 'series are locked');
         END;",
    )
    .unwrap();

    let deleter = CascadeDeleter::new(&store, alice.clone());
    let err = deleter.delete_cycle(&cycle.id).unwrap_err();
    match err {
        CascadeError::BatchWrite(err) => assert_eq!(err.root.id(), cycle.id),
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(count(&store, &alice, Collection::Cycles), 1);
    assert_eq!(count(&store, &alice, Collection::Workouts), 1);
    assert_eq!(count(&store, &alice, Collection::DayEntries), 2);
    assert_eq!(count(&store, &alice, Collection::SeriesSets), 4);
}

#[test]
fn children_created_between_plan_and_execute_survive_as_flagged_orphans() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = UserScope::parse("alice").unwrap();
    let cycle = seed_tree(&store, &alice, 1, 1, 1);
    let deleter = CascadeDeleter::new(&store, alice.clone());

    let plan = deleter.plan_cycle(&cycle.id).unwrap();
    assert_eq!(plan.total(), 4);

    let late = Workout::new(cycle.id.clone(), "Late", TrainingType::Gym);
    let mut batch = WriteBatch::new();
    batch.put(late.clone());
    store.commit(&alice, &batch).unwrap();

    let report = deleter.execute(&plan).unwrap();
    assert_eq!(report.total(), 4);

    let mut engine = SyncEngine::new(&store);
    engine.start_session(SessionContext::new(alice)).unwrap();
    engine.pump();
    let warnings = TrainingQuery::new(engine.mirror()).referential_warnings();
    assert_eq!(
        warnings,
        vec![ReferentialWarning::OrphanedWorkout {
            workout_id: late.id,
            cycle_id: cycle.id,
        }]
    );
}

#[test]
fn closure_is_read_from_the_store_not_a_stale_mirror() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = UserScope::parse("alice").unwrap();

    let mut engine = SyncEngine::new(&store);
    engine.start_session(SessionContext::new(alice.clone())).unwrap();
    engine.pump();
    let cycle = seed_tree(&store, &alice, 1, 1, 2);
    // Mirror has not been pumped since the writes.
    assert!(engine.mirror().is_empty());

    let report = CascadeDeleter::new(&store, alice.clone())
        .delete_cycle(&cycle.id)
        .unwrap();
    assert_eq!(report.total(), 5);

    engine.pump();
    assert!(engine.mirror().is_empty());
}
