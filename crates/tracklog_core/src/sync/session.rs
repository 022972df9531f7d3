//! Session context and refresh notifications.

use crate::model::collection::Collection;
use crate::model::scope::UserScope;
use std::fmt::{Display, Formatter};

/// Identifier of the view the host is currently displaying.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ViewId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explicit per-session state handed to the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_scope: UserScope,
    pub active_view: Option<ViewId>,
}

impl SessionContext {
    pub fn new(user_scope: UserScope) -> Self {
        Self {
            user_scope,
            active_view: None,
        }
    }

    pub fn with_view(mut self, view: ViewId) -> Self {
        self.active_view = Some(view);
        self
    }
}

/// Lifecycle of one sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No subscription is open.
    Detached,
    /// Subscriptions are open; some collection has not delivered yet.
    Subscribing,
    /// Every collection has delivered at least one snapshot.
    Live,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Subscribing => "subscribing",
            Self::Live => "live",
        }
    }
}

impl Display for SyncState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted after a snapshot replaced one mirror collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReplaced {
    pub collection: Collection,
    pub entity_count: usize,
    /// View displayed when the snapshot was applied.
    pub active_view: Option<ViewId>,
}

/// Observer re-rendering derived views after mirror replacement.
pub trait RefreshHook {
    fn on_collection_replaced(&mut self, event: &CollectionReplaced);
}

impl<F> RefreshHook for F
where
    F: FnMut(&CollectionReplaced),
{
    fn on_collection_replaced(&mut self, event: &CollectionReplaced) {
        self(event)
    }
}
