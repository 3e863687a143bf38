//! # Change Feed
//!
//! Live notifications of committed writes.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Database::commit(batch)                                                │
//! │       │  transaction commits                                            │
//! │       ▼                                                                 │
//! │  ChangeFeed::publish({Consumptions, Products})                          │
//! │       │  seq += 1                                                       │
//! │       ▼                                                                 │
//! │  broadcast::Sender<ChangeNotice> ──► subscriber 1 (snapshot watcher)    │
//! │                                  ──► subscriber 2 ...                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sequence number is bumped before the notice goes out, so a reader that
//! loads after observing `seq = n` sees every write up to commit `n`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the notice channel. A receiver that falls further behind
/// gets `Lagged` and should reload everything.
const FEED_CAPACITY: usize = 256;

/// A store whose content changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    Companies,
    Employees,
    Consumptions,
    Trash,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Products => "products",
            Collection::Companies => "companies",
            Collection::Employees => "employees",
            Collection::Consumptions => "consumptions",
            Collection::Trash => "consumptions_trash",
        };
        f.write_str(name)
    }
}

/// Published once per committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeNotice {
    /// Commit sequence number, strictly increasing per database handle.
    pub seq: u64,
    pub collections: BTreeSet<Collection>,
}

impl ChangeNotice {
    pub fn touches(&self, collection: Collection) -> bool {
        self.collections.contains(&collection)
    }
}

/// Commit counter plus broadcast sender.
#[derive(Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeNotice>,
    seq: AtomicU64,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        ChangeFeed {
            sender,
            seq: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.sender.subscribe()
    }

    /// Last published sequence number.
    pub fn current_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Bumps the sequence number and notifies subscribers. Having no
    /// subscriber is not an error.
    pub fn publish(&self, collections: BTreeSet<Collection>) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let receivers = self
            .sender
            .send(ChangeNotice { seq, collections })
            .unwrap_or(0);
        trace!(seq, receivers, "Change notice published");
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers_in_order() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        let first = feed.publish(BTreeSet::from([Collection::Consumptions]));
        let second = feed.publish(BTreeSet::from([Collection::Products, Collection::Consumptions]));
        assert_eq!((first, second), (1, 2));
        assert_eq!(feed.current_seq(), 2);

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.seq, 1);
        assert!(notice.touches(Collection::Consumptions));
        assert!(!notice.touches(Collection::Products));

        let notice = rx.recv().await.unwrap();
        assert!(notice.touches(Collection::Products));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.publish(BTreeSet::new()), 1);
    }
}
