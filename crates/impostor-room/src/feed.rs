//! The per-room subscription manager.
//!
//! A [`RoomFeed`] turns a room's raw change events into a stream of full
//! [`RoomSnapshot`]s. Every event, whatever it says, triggers a fresh
//! read of the room, its roster, and the current round's messages; event
//! payloads are never applied as patches. Because only the newest
//! snapshot matters, they are published through a `watch` channel:
//! a slow reader skips straight to the latest state.

use std::sync::Arc;
use std::time::Duration;

use impostor_protocol::{RoomId, RoomSnapshot};
use impostor_store::{ChangeEvent, SessionStore, StoreError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::FeedConfig;

/// Connection status of a feed, for a status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Subscribing for the first time.
    Connecting,
    /// Subscribed; snapshots are current.
    Live,
    /// The store dropped out; retrying with backoff. The last snapshot
    /// is kept but may be stale.
    Reconnecting,
    /// The room no longer exists. No more snapshots will arrive.
    Closed,
}

/// Reads the full state of a room: the room, its roster, and the
/// messages of the round in progress. `Ok(None)` if the room is gone.
pub async fn read_snapshot<S: SessionStore>(
    store: &S,
    room_id: RoomId,
) -> Result<Option<RoomSnapshot>, StoreError> {
    let Some(room) = store.room(room_id).await? else {
        return Ok(None);
    };
    let players = store.players(room_id).await?;
    // The lobby shows no descriptions; history stays in the store.
    let messages = if room.status.in_round() {
        store.messages(room_id, room.round).await?
    } else {
        Vec::new()
    };
    Ok(Some(RoomSnapshot {
        room,
        players,
        messages,
    }))
}

/// Read-only stream of snapshots for one room.
///
/// Backed by a background task that owns the store subscription. The
/// task is aborted when the feed is dropped.
pub struct RoomFeed {
    room_id: RoomId,
    snapshots: watch::Receiver<Option<RoomSnapshot>>,
    status: watch::Receiver<FeedStatus>,
    task: JoinHandle<()>,
}

impl RoomFeed {
    /// Starts following `room_id`.
    pub fn spawn<S: SessionStore>(store: Arc<S>, room_id: RoomId, config: FeedConfig) -> Self {
        let (snapshot_tx, snapshots) = watch::channel(None);
        let (status_tx, status) = watch::channel(FeedStatus::Connecting);
        let task = tokio::spawn(run_feed(store, room_id, config, snapshot_tx, status_tx));
        Self {
            room_id,
            snapshots,
            status,
            task,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// The most recent snapshot, if one was read yet.
    pub fn latest(&self) -> Option<RoomSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Current connection status.
    pub fn status(&self) -> FeedStatus {
        *self.status.borrow()
    }

    /// A receiver for status changes, for UIs that show an indicator.
    pub fn status_changes(&self) -> watch::Receiver<FeedStatus> {
        self.status.clone()
    }

    /// Waits for a snapshot newer than the last one returned.
    ///
    /// Returns `None` once the room is closed.
    pub async fn next(&mut self) -> Option<RoomSnapshot> {
        loop {
            self.snapshots.changed().await.ok()?;
            if let Some(snapshot) = self.snapshots.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }
}

impl Drop for RoomFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// What ended one subscription.
enum Interrupted {
    /// The room is gone; stop for good.
    Closed,
    /// The store failed; re-subscribe after a delay.
    Retry(StoreError),
}

async fn run_feed<S: SessionStore>(
    store: Arc<S>,
    room_id: RoomId,
    config: FeedConfig,
    snapshots: watch::Sender<Option<RoomSnapshot>>,
    status: watch::Sender<FeedStatus>,
) {
    let mut delay = config.retry_initial;
    loop {
        match follow(&*store, room_id, &snapshots, &status).await {
            Interrupted::Closed => break,
            Interrupted::Retry(error) => {
                // A subscription that got as far as Live starts a new backoff.
                if *status.borrow() == FeedStatus::Live {
                    delay = config.retry_initial;
                }
                tracing::warn!(%room_id, %error, ?delay, "room feed interrupted, retrying");
                let _ = status.send(FeedStatus::Reconnecting);
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, config.retry_max);
            }
        }
    }

    tracing::debug!(%room_id, "room feed closed");
    let _ = status.send(FeedStatus::Closed);
}

/// Subscribes, publishes an initial snapshot, then one per event.
async fn follow<S: SessionStore>(
    store: &S,
    room_id: RoomId,
    snapshots: &watch::Sender<Option<RoomSnapshot>>,
    status: &watch::Sender<FeedStatus>,
) -> Interrupted {
    // Subscribe before the first read so no change can slip in between.
    let mut events = match store.subscribe(room_id).await {
        Ok(events) => events,
        Err(StoreError::RoomMissing(_)) => return Interrupted::Closed,
        Err(error) => return Interrupted::Retry(error),
    };

    if let Err(interrupted) = refresh(store, room_id, snapshots).await {
        return interrupted;
    }
    let _ = status.send(FeedStatus::Live);

    loop {
        match events.recv().await {
            Ok(ChangeEvent::RoomClosed { .. }) => return Interrupted::Closed,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(%room_id, skipped, "room feed lagged, re-reading");
            }
            Err(broadcast::error::RecvError::Closed) => {
                // The sender is gone; find out whether the room still is.
                if let Err(interrupted) = refresh(store, room_id, snapshots).await {
                    return interrupted;
                }
                return Interrupted::Retry(StoreError::Unavailable(
                    "change feed closed".into(),
                ));
            }
        }
        if let Err(interrupted) = refresh(store, room_id, snapshots).await {
            return interrupted;
        }
    }
}

async fn refresh<S: SessionStore>(
    store: &S,
    room_id: RoomId,
    snapshots: &watch::Sender<Option<RoomSnapshot>>,
) -> Result<(), Interrupted> {
    match read_snapshot(store, room_id).await {
        Ok(Some(snapshot)) => {
            snapshots.send_replace(Some(snapshot));
            Ok(())
        }
        Ok(None) => Err(Interrupted::Closed),
        Err(error) => Err(Interrupted::Retry(error)),
    }
}

fn next_delay(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}
