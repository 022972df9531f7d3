use tracklog_core::db::open_db_in_memory;
use tracklog_core::{
    Collection, CycleFields, DayEntryFields, DocumentStore, Entity, SeriesBody, SeriesFields,
    ServiceError, SqliteDocumentStore, TrainingDataSet, TrainingService, UserScope,
    ValidationError, WorkoutFields,
};

fn service<'a>(
    store: &'a SqliteDocumentStore<'a>,
) -> TrainingService<&'a SqliteDocumentStore<'a>> {
    TrainingService::new(store, UserScope::parse("alice").unwrap())
}

fn cycle_fields(name: &str) -> CycleFields {
    CycleFields {
        name: name.to_string(),
        start_date: "2024-04-01".to_string(),
        end_date: "2024-06-30".to_string(),
    }
}

fn track(run_time: &str, recovery: &str, is_last: bool) -> SeriesFields {
    SeriesFields::Track {
        run_time: run_time.to_string(),
        distance_meters: "400".to_string(),
        recovery: recovery.to_string(),
        is_last,
    }
}

#[test]
fn create_and_update_cycle() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);

    let cycle = service.create_cycle(&cycle_fields("Base")).unwrap();
    let updated = service
        .update_cycle(&cycle.id, &cycle_fields("Base II"))
        .unwrap();
    assert_eq!(updated.id, cycle.id);

    let stored = store
        .fetch_entity(service.scope(), Collection::Cycles, &cycle.id)
        .unwrap();
    assert_eq!(stored, Some(Entity::Cycle(updated)));
}

#[test]
fn validation_errors_never_reach_the_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);

    let err = service.create_cycle(&cycle_fields("  ")).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::MissingField("name"))
    ));

    let err = service
        .create_workout(&WorkoutFields {
            cycle_id: "CYC-1".to_string(),
            name: "Laps".to_string(),
            kind: "swim".to_string(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidWorkoutType(_))
    ));

    assert!(service.export_dataset().unwrap().document_count() == 0);
}

#[test]
fn updating_a_missing_entity_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);

    let err = service
        .update_cycle("CYC-404", &cycle_fields("Base"))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            collection: Collection::Cycles,
            ..
        }
    ));
}

#[test]
fn day_entry_with_series_skips_blank_cards_and_drops_last_recovery() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);

    let (entry, series) = service
        .create_day_entry_with_series(
            &DayEntryFields {
                workout_id: "WK-1".to_string(),
                date: "2024-05-01".to_string(),
                notes: "windy".to_string(),
            },
            &[
                track("62.1", "3:00", false),
                track("", "", false),
                track("60.8", "1:30", true),
            ],
        )
        .unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].index, 1);
    assert_eq!(series[1].index, 2);
    let last = series[1].as_track().unwrap();
    assert!(last.is_last());
    assert_eq!(last.recovery_seconds(), None);

    let children = store
        .child_ids(service.scope(), Collection::SeriesSets, &entry.id)
        .unwrap();
    assert_eq!(children.len(), 2);
}

#[test]
fn every_series_write_path_keeps_last_without_recovery() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);
    let entry = service
        .create_day_entry(&DayEntryFields {
            workout_id: "WK-1".to_string(),
            date: "2024-05-01".to_string(),
            notes: String::new(),
        })
        .unwrap();

    let created = service
        .create_series_set(&entry.id, &track("62.1", "3:00", true))
        .unwrap();
    assert_eq!(created.as_track().unwrap().recovery_seconds(), None);

    let appended = service
        .create_series_set(&entry.id, &track("61.0", "2:00", false))
        .unwrap();
    assert_eq!(appended.index, 2);
    assert_eq!(appended.as_track().unwrap().recovery_seconds(), Some(120));

    let updated = service
        .update_series_set(&appended.id, &track("61.0", "2:00", true))
        .unwrap();
    assert_eq!(updated.index, 2);
    let Some(Entity::SeriesSet(stored)) = store
        .fetch_entity(service.scope(), Collection::SeriesSets, &updated.id)
        .unwrap()
    else {
        panic!("expected stored series");
    };
    assert!(stored.as_track().unwrap().is_last());
    assert_eq!(stored.as_track().unwrap().recovery_seconds(), None);
}

#[test]
fn replace_series_swaps_the_whole_list() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);
    let (entry, original) = service
        .create_day_entry_with_series(
            &DayEntryFields {
                workout_id: "WK-1".to_string(),
                date: "2024-05-01".to_string(),
                notes: String::new(),
            },
            &[track("62.1", "3:00", false), track("60.8", "", true)],
        )
        .unwrap();

    let replacement = service
        .replace_series(
            &entry.id,
            &[SeriesFields::Gym {
                reps: "5x5".to_string(),
                weight: "100kg".to_string(),
            }],
        )
        .unwrap();

    let children = store
        .child_ids(service.scope(), Collection::SeriesSets, &entry.id)
        .unwrap();
    assert_eq!(children, vec![replacement[0].id.clone()]);
    assert!(matches!(replacement[0].body, SeriesBody::Gym(_)));
    assert!(!children.contains(&original[0].id));

    service.delete_series_set(&replacement[0].id).unwrap();
    assert!(store
        .child_ids(service.scope(), Collection::SeriesSets, &entry.id)
        .unwrap()
        .is_empty());
}

#[test]
fn import_then_export_returns_the_same_documents() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);
    let data = TrainingDataSet::from_json_str(
        r#"{
            "cycles": [{"id": "CYC-1", "name": "Base", "start_date": "2024-04-01", "end_date": "2024-06-30"}],
            "workouts": [{"id": "WK-1", "cycle_id": "CYC-1", "name": "Squats", "type": "gym"}],
            "dayEntries": [{"id": "DE-1", "workout_id": "WK-1", "date": "2024-05-01"}],
            "seriesSets": [{"id": "S-1", "day_entry_id": "DE-1", "index": 1, "type": "gym", "reps": "5x5", "weight": "100kg"}]
        }"#,
    )
    .unwrap();

    assert_eq!(service.import_dataset(data.clone()).unwrap(), 4);
    assert_eq!(service.export_dataset().unwrap(), data);

    let report = service.delete_cycle("CYC-1").unwrap();
    assert_eq!(report.total(), 4);
    assert_eq!(service.export_dataset().unwrap().document_count(), 0);
}

#[test]
fn unreadable_recovery_is_saved_as_unknown() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);
    let entry = service
        .create_day_entry(&DayEntryFields {
            workout_id: "WK-1".to_string(),
            date: "2024-05-01".to_string(),
            notes: String::new(),
        })
        .unwrap();

    for recovery in ["abc", "3:xx", "2 min"] {
        let series = service
            .create_series_set(&entry.id, &track("62.1", recovery, false))
            .unwrap();
        assert_eq!(series.as_track().unwrap().recovery_seconds(), None);
        assert_eq!(series.to_string(), "62.1s [rec: —]");
    }
}

#[test]
fn appending_after_the_largest_index_fails_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let service = service(&store);
    let data = TrainingDataSet::from_json_str(
        r#"{
            "dayEntries": [{"id": "DE-1", "workout_id": "WK-1", "date": "2024-05-01"}],
            "seriesSets": [{"id": "S-1", "day_entry_id": "DE-1", "index": 4294967295,
                            "type": "gym", "reps": "5x5", "weight": "100kg"}]
        }"#,
    )
    .unwrap();
    service.import_dataset(data).unwrap();

    let err = service
        .create_series_set(
            "DE-1",
            &SeriesFields::Gym {
                reps: "3x8".to_string(),
                weight: "80kg".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::SeriesIndexExhausted { ref day_entry_id } if day_entry_id == "DE-1"
    ));

    let children = store
        .child_ids(service.scope(), Collection::SeriesSets, "DE-1")
        .unwrap();
    assert_eq!(children, vec!["S-1".to_string()]);
}
