use crate::mirror::MirrorStore;
use crate::model::collection::{Collection, CollectionSnapshot};
use crate::store::{DocumentStore, Subscription, SubscriptionEvent};
use crate::sync::session::{CollectionReplaced, RefreshHook, SessionContext, SyncState, ViewId};
use crate::sync::SyncError;
use log::{info, warn};
use std::collections::BTreeSet;

/// Result of one [`SyncEngine::pump`] call.
#[derive(Debug, Default)]
pub struct PumpOutcome {
    /// Snapshots applied to the mirror.
    pub applied: usize,
    /// Error deliveries, in the order they were drained.
    pub errors: Vec<SyncError>,
}

impl PumpOutcome {
    pub fn is_idle(&self) -> bool {
        self.applied == 0 && self.errors.is_empty()
    }
}

/// Keeps a [`MirrorStore`] in step with one store for one session.
pub struct SyncEngine<S> {
    store: S,
    session: Option<SessionContext>,
    state: SyncState,
    subscriptions: Vec<Subscription>,
    awaiting_first: BTreeSet<Collection>,
    mirror: MirrorStore,
    hooks: Vec<Box<dyn RefreshHook>>,
}

impl<S: DocumentStore> SyncEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            session: None,
            state: SyncState::Detached,
            subscriptions: Vec::new(),
            awaiting_first: BTreeSet::new(),
            mirror: MirrorStore::new(),
            hooks: Vec::new(),
        }
    }

    /// Opens one subscription per collection for `session.user_scope`.
    ///
    /// An already active session is ended first. When any subscription
    /// fails to attach, every subscription opened so far is cancelled and
    /// the engine returns to [`SyncState::Detached`].
    pub fn start_session(&mut self, session: SessionContext) -> Result<(), SyncError> {
        if self.state != SyncState::Detached {
            self.end_session();
        }

        info!(
            "event=sync_session module=sync status=start scope={}",
            session.user_scope
        );
        self.state = SyncState::Subscribing;
        self.awaiting_first = Collection::ALL.into_iter().collect();

        for collection in Collection::ALL {
            match self.store.subscribe(&session.user_scope, collection) {
                Ok(subscription) => self.subscriptions.push(subscription),
                Err(source) => {
                    warn!(
                        "event=sync_session module=sync status=error scope={} collection={collection} error={source}",
                        session.user_scope
                    );
                    self.teardown();
                    return Err(SyncError::AttachFailed { collection, source });
                }
            }
        }

        self.session = Some(session);
        Ok(())
    }

    /// Cancels every subscription and clears the mirror.
    pub fn end_session(&mut self) {
        if self.state == SyncState::Detached {
            return;
        }
        let cancelled = self.subscriptions.len();
        self.teardown();
        info!("event=sync_session module=sync status=ok action=end cancelled={cancelled}");
    }

    /// Rebinds the engine to `store`, ending the current session.
    ///
    /// Returns the previous store.
    pub fn replace_store(&mut self, store: S) -> S {
        self.end_session();
        std::mem::replace(&mut self.store, store)
    }

    /// Drains every queued delivery and applies it to the mirror.
    ///
    /// Each delivery runs to completion, including its refresh hooks,
    /// before the next one is applied.
    pub fn pump(&mut self) -> PumpOutcome {
        let mut outcome = PumpOutcome::default();
        if self.state == SyncState::Detached {
            return outcome;
        }

        let mut deliveries = Vec::new();
        for subscription in &self.subscriptions {
            while let Some(event) = subscription.try_next() {
                deliveries.push((subscription.collection(), event));
            }
        }

        for (collection, event) in deliveries {
            match event {
                SubscriptionEvent::Snapshot(snapshot) => {
                    self.apply_snapshot(snapshot);
                    outcome.applied += 1;
                }
                SubscriptionEvent::Error(message) => {
                    warn!(
                        "event=sync_stream module=sync status=error collection={collection} error={message}"
                    );
                    outcome
                        .errors
                        .push(SyncError::StreamFailed { collection, message });
                }
            }
        }
        outcome
    }

    /// Changes the view identity carried by later refresh events.
    pub fn set_active_view(&mut self, view: Option<ViewId>) {
        if let Some(session) = self.session.as_mut() {
            session.active_view = view;
        }
    }

    pub fn add_hook(&mut self, hook: impl RefreshHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn mirror(&self) -> &MirrorStore {
        &self.mirror
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of subscriptions currently held by the engine.
    pub fn open_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    fn apply_snapshot(&mut self, snapshot: CollectionSnapshot) {
        let collection = snapshot.collection();
        let entity_count = self.mirror.replace_collection(snapshot);

        self.awaiting_first.remove(&collection);
        if self.state == SyncState::Subscribing && self.awaiting_first.is_empty() {
            self.state = SyncState::Live;
            info!("event=sync_live module=sync status=ok");
        }

        let event = CollectionReplaced {
            collection,
            entity_count,
            active_view: self
                .session
                .as_ref()
                .and_then(|session| session.active_view.clone()),
        };
        for hook in &mut self.hooks {
            hook.on_collection_replaced(&event);
        }
    }

    fn teardown(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
        self.awaiting_first.clear();
        self.mirror.clear();
        self.session = None;
        self.state = SyncState::Detached;
    }
}
