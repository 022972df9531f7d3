use chrono::NaiveDate;
use std::cell::RefCell;
use std::rc::Rc;
use tracklog_core::db::open_db_in_memory;
use tracklog_core::store::{StoreResult, Subscription};
use tracklog_core::{
    Collection, CollectionReplaced, CollectionSnapshot, Cycle, DocId, DocumentStore, Entity,
    SessionContext, SqliteDocumentStore, StoreError, SubscriptionEvent, SyncEngine, SyncError,
    SyncState, UserScope, ViewId, WriteBatch,
};

fn scope(value: &str) -> UserScope {
    UserScope::parse(value).unwrap()
}

fn cycle(name: &str) -> Cycle {
    Cycle::new(
        name,
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
    )
}

fn put(store: &SqliteDocumentStore<'_>, scope: &UserScope, entity: impl Into<Entity>) {
    let mut batch = WriteBatch::new();
    batch.put(entity);
    store.commit(scope, &batch).unwrap();
}

#[test]
fn committed_writes_reach_the_mirror_after_pump() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = scope("alice");
    let mut engine = SyncEngine::new(&store);

    engine.start_session(SessionContext::new(alice.clone())).unwrap();
    engine.pump();
    assert_eq!(engine.state(), SyncState::Live);
    assert!(engine.mirror().is_empty());

    let base = cycle("Base");
    put(&store, &alice, base.clone());
    assert!(engine.mirror().cycle(&base.id).is_none());

    let outcome = engine.pump();
    assert_eq!(outcome.applied, 1);
    assert_eq!(engine.mirror().cycle(&base.id), Some(&base));
}

#[test]
fn restarting_a_session_cancels_previous_subscriptions_first() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let mut engine = SyncEngine::new(&store);

    engine.start_session(SessionContext::new(scope("alice"))).unwrap();
    assert_eq!(store.hub().active_count(), Collection::ALL.len());

    engine.start_session(SessionContext::new(scope("alice"))).unwrap();
    assert_eq!(store.hub().active_count(), Collection::ALL.len());
    assert_eq!(engine.open_subscriptions(), Collection::ALL.len());
    assert_eq!(engine.state(), SyncState::Subscribing);
}

#[test]
fn snapshots_queued_before_session_change_are_discarded() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = scope("alice");
    let mut engine = SyncEngine::new(&store);

    engine.start_session(SessionContext::new(alice.clone())).unwrap();
    engine.pump();
    put(&store, &alice, cycle("Base"));

    engine.start_session(SessionContext::new(scope("bob"))).unwrap();
    engine.pump();
    assert_eq!(store.hub().active_count_for(&alice), 0);
    assert!(engine.mirror().is_empty());

    put(&store, &alice, cycle("Peak"));
    engine.end_session();
    assert!(engine.pump().is_idle());
    assert_eq!(engine.state(), SyncState::Detached);
    assert!(engine.mirror().is_empty());
}

#[test]
fn refresh_events_carry_the_current_view() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = scope("alice");
    let seen: Rc<RefCell<Vec<CollectionReplaced>>> = Rc::default();

    let mut engine = SyncEngine::new(&store);
    let sink = Rc::clone(&seen);
    engine.add_hook(move |event: &CollectionReplaced| sink.borrow_mut().push(event.clone()));

    engine
        .start_session(SessionContext::new(alice.clone()).with_view(ViewId::new("cycles")))
        .unwrap();
    engine.pump();
    assert_eq!(seen.borrow().len(), Collection::ALL.len());
    assert!(seen
        .borrow()
        .iter()
        .all(|event| event.active_view == Some(ViewId::new("cycles"))));

    engine.set_active_view(Some(ViewId::new("progression")));
    put(&store, &alice, cycle("Base"));
    engine.pump();

    let last = seen.borrow().last().cloned().unwrap();
    assert_eq!(
        last,
        CollectionReplaced {
            collection: Collection::Cycles,
            entity_count: 1,
            active_view: Some(ViewId::new("progression")),
        }
    );
}

#[test]
fn stream_errors_are_reported_and_not_retried() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let alice = scope("alice");
    let mut engine = SyncEngine::new(&store);
    engine.start_session(SessionContext::new(alice.clone())).unwrap();
    engine.pump();

    store.hub().publish(
        &alice,
        Collection::DayEntries,
        &SubscriptionEvent::Error("stream reset".to_string()),
    );
    let outcome = engine.pump();

    assert_eq!(outcome.applied, 0);
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(
        &outcome.errors[0],
        SyncError::StreamFailed { collection: Collection::DayEntries, message } if message == "stream reset"
    ));
    assert_eq!(engine.state(), SyncState::Live);
    assert!(engine.pump().is_idle());
}

/// Store refusing subscriptions on one collection.
struct RefusingStore<'a> {
    inner: &'a SqliteDocumentStore<'a>,
    refused: Collection,
}

impl DocumentStore for RefusingStore<'_> {
    fn fetch_collection(
        &self,
        scope: &UserScope,
        collection: Collection,
    ) -> StoreResult<CollectionSnapshot> {
        self.inner.fetch_collection(scope, collection)
    }

    fn fetch_entity(
        &self,
        scope: &UserScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<Entity>> {
        self.inner.fetch_entity(scope, collection, id)
    }

    fn child_ids(
        &self,
        scope: &UserScope,
        collection: Collection,
        parent_id: &str,
    ) -> StoreResult<Vec<DocId>> {
        self.inner.child_ids(scope, collection, parent_id)
    }

    fn commit(&self, scope: &UserScope, batch: &WriteBatch) -> StoreResult<()> {
        self.inner.commit(scope, batch)
    }

    fn subscribe(&self, scope: &UserScope, collection: Collection) -> StoreResult<Subscription> {
        if collection == self.refused {
            return Err(StoreError::InvalidData("subscription refused".to_string()));
        }
        self.inner.subscribe(scope, collection)
    }
}

#[test]
fn attach_failure_leaves_engine_detached_with_nothing_open() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    let mut engine = SyncEngine::new(RefusingStore {
        inner: &store,
        refused: Collection::SeriesSets,
    });

    let err = engine
        .start_session(SessionContext::new(scope("alice")))
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::AttachFailed {
            collection: Collection::SeriesSets,
            ..
        }
    ));
    assert_eq!(engine.state(), SyncState::Detached);
    assert_eq!(store.hub().active_count(), 0);
}

#[test]
fn replace_store_detaches_and_rebinds() {
    let first_conn = open_db_in_memory().unwrap();
    let second_conn = open_db_in_memory().unwrap();
    let first = SqliteDocumentStore::try_new(&first_conn).unwrap();
    let second = SqliteDocumentStore::try_new(&second_conn).unwrap();
    let alice = scope("alice");
    put(&second, &alice, cycle("Base"));

    let mut engine = SyncEngine::new(&first);
    engine.start_session(SessionContext::new(alice.clone())).unwrap();
    engine.pump();

    let previous = engine.replace_store(&second);
    assert!(std::ptr::eq(previous, &first));
    assert_eq!(engine.state(), SyncState::Detached);
    assert_eq!(first.hub().active_count(), 0);

    engine.start_session(SessionContext::new(alice)).unwrap();
    engine.pump();
    assert_eq!(engine.mirror().len(Collection::Cycles), 1);
}
