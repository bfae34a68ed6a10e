//! Store change notifications.
//!
//! The presentation layer subscribes to a [`RowStore`](crate::store::RowStore)
//! and receives a [`StoreEvent`] for every observable mutation: per-cell
//! changes, signed edited-word deltas on the three aggregate channels, and
//! structural changes (insert/remove/clear). Events are serializable so a UI
//! shell can forward them over IPC.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::row::{Column, TextColumn};

/// Events emitted by row-store mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    /// A cell's value changed.
    CellChanged {
        /// Row index at the time of the change.
        row: usize,
        /// Column of the changed cell.
        column: Column,
    },

    /// The aggregate edited-word total for a text column moved by `delta`.
    ///
    /// Emitted only when the delta is nonzero; a revert emits the negative
    /// of the previously cached magnitude.
    EditedWordsDelta {
        /// Aggregate channel (one per editable text column).
        column: TextColumn,
        /// Signed word-count change.
        delta: i64,
    },

    /// A row was appended or inserted at `row`.
    RowInserted {
        /// Index of the new row.
        row: usize,
    },

    /// The row at `row` was removed; subsequent indices shifted down.
    RowRemoved {
        /// Index the row had before removal.
        row: usize,
    },

    /// The store was emptied.
    Cleared,
}

impl StoreEvent {
    /// Get the event type as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CellChanged { .. } => "CellChanged",
            Self::EditedWordsDelta { .. } => "EditedWordsDelta",
            Self::RowInserted { .. } => "RowInserted",
            Self::RowRemoved { .. } => "RowRemoved",
            Self::Cleared => "Cleared",
        }
    }
}

/// A unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback function type for store events.
///
/// Callbacks receive a reference to the event and should not block for
/// extended periods.
pub type EventCallback = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// Thread-safe registry of store-event subscribers.
///
/// The store emits synchronously from its write path, so a subscriber sees
/// the cell change and its word-count delta in order, with the store already
/// in its post-write state.
pub struct CallbackRegistry {
    /// Map of subscription IDs to callbacks.
    callbacks: RwLock<HashMap<SubscriptionId, EventCallback>>,
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
}

impl CallbackRegistry {
    /// Create a new empty callback registry.
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to store events.
    ///
    /// Returns a subscription ID that can be used to unsubscribe later.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut callbacks = self.callbacks.write().unwrap();
        callbacks.insert(id, callback);
        id
    }

    /// Unsubscribe from store events.
    ///
    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.write().unwrap();
        callbacks.remove(&id).is_some()
    }

    /// Emit an event to all registered callbacks.
    ///
    /// Callbacks are invoked synchronously in an undefined order. A panicking
    /// callback does not affect the others.
    pub fn emit(&self, event: &StoreEvent) {
        let callbacks = self.callbacks.read().unwrap();
        for callback in callbacks.values() {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(event);
            }));
        }
    }

    /// Get the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let callbacks = self.callbacks.read().unwrap();
        callbacks.len()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let callbacks = self.callbacks.read().unwrap();
        f.debug_struct("CallbackRegistry")
            .field("subscriber_count", &callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_and_emit() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let _id = registry.subscribe(Arc::new(move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        registry.emit(&StoreEvent::Cleared);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let id = registry.subscribe(Arc::new(move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));

        registry.emit(&StoreEvent::Cleared);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_panic_isolation() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.subscribe(Arc::new(|_| {
            panic!("subscriber bug");
        }));

        let counter_clone = Arc::clone(&counter);
        registry.subscribe(Arc::new(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        registry.emit(&StoreEvent::RowInserted { row: 0 });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_serialization() {
        let event = StoreEvent::EditedWordsDelta {
            column: TextColumn::Tags,
            delta: -3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("EditedWordsDelta"));

        let parsed: StoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type(), "EditedWordsDelta");
        assert_eq!(parsed, event);
    }
}
