//! Live snapshot feeds for transaction data.
//!
//! Every mutation publishes a fresh "current transaction list" snapshot to
//! the owning user's feed, and the stream endpoint forwards those snapshots
//! to connected clients. Subscribers always observe the latest snapshot, but
//! intermediate snapshots may be skipped when updates arrive faster than they
//! are consumed, so the last write wins.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as DbMutex},
};

use rusqlite::Connection;
use tokio::sync::{Mutex, watch};

use crate::{Error, transaction::Transaction, transaction::list_transactions};

/// A lazily created watch channel per user.
///
/// The value is `None` until the first snapshot for that user is published or
/// seeded, which lets [SnapshotFeed::subscribe] tell a fresh channel apart
/// from one that already carries data.
type Channels = Mutex<HashMap<String, watch::Sender<Option<Vec<Transaction>>>>>;

/// Fan-out of "current transaction list" snapshots, one channel per user.
#[derive(Debug, Default)]
pub struct SnapshotFeed {
    channels: Channels,
}

impl SnapshotFeed {
    /// Create a feed with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot for `user_id` and wake their subscribers.
    ///
    /// Snapshots published while nobody is subscribed are kept, so the next
    /// subscriber starts from the latest published state.
    pub async fn publish(&self, user_id: &str, transactions: Vec<Transaction>) {
        let mut channels = self.channels.lock().await;
        let sender = channels
            .entry(user_id.to_owned())
            .or_insert_with(|| watch::channel(None).0);

        sender.send_replace(Some(transactions));
    }

    /// Subscribe to `user_id`'s snapshots, starting from `current`.
    ///
    /// The receiver's first value is `current`, unless a snapshot was already
    /// published for this user, in which case the published state wins since
    /// it is at least as new as what the caller read.
    pub async fn subscribe(
        &self,
        user_id: &str,
        current: Vec<Transaction>,
    ) -> watch::Receiver<Option<Vec<Transaction>>> {
        let mut channels = self.channels.lock().await;
        let sender = channels
            .entry(user_id.to_owned())
            .or_insert_with(|| watch::channel(None).0);

        if sender.borrow().is_none() {
            sender.send_replace(Some(current));
        }

        sender.subscribe()
    }
}

/// Reload `user_id`'s transactions and publish them to feed subscribers.
///
/// Call this after any mutation so that live clients converge on the new
/// state.
pub async fn publish_snapshot(
    feed: &SnapshotFeed,
    db_connection: &Arc<DbMutex<Connection>>,
    user_id: &str,
) -> Result<(), Error> {
    let transactions = {
        let connection = db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        list_transactions(user_id, &connection)?
    };

    feed.publish(user_id, transactions).await;

    Ok(())
}
