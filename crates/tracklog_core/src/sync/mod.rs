//! Session-scoped synchronization of the mirror against the store.
//!
//! # Responsibility
//! - Open one subscription per collection for the active user scope.
//! - Apply delivered snapshots to the mirror and notify refresh hooks.
//!
//! # Invariants
//! - Every open subscription is cancelled before any new one is opened.
//! - Snapshots of one collection apply in delivery order.
//! - Subscription failures are reported to the caller, never retried.

use crate::model::collection::Collection;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod engine;
mod session;

pub use engine::{PumpOutcome, SyncEngine};
pub use session::{CollectionReplaced, RefreshHook, SessionContext, SyncState, ViewId};

/// Subscription failure surfaced by the sync engine.
#[derive(Debug)]
pub enum SyncError {
    /// The store refused to open a subscription.
    AttachFailed {
        collection: Collection,
        source: StoreError,
    },
    /// An open subscription delivered an error instead of a snapshot.
    StreamFailed {
        collection: Collection,
        message: String,
    },
}

impl SyncError {
    pub fn collection(&self) -> Collection {
        match self {
            Self::AttachFailed { collection, .. } | Self::StreamFailed { collection, .. } => {
                *collection
            }
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AttachFailed { collection, source } => {
                write!(f, "failed to subscribe to `{collection}`: {source}")
            }
            Self::StreamFailed {
                collection,
                message,
            } => write!(f, "subscription to `{collection}` failed: {message}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AttachFailed { source, .. } => Some(source),
            Self::StreamFailed { .. } => None,
        }
    }
}
