use super::PlaybackProgress;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::info;

type SubscriptionId = u64;

struct Subscription {
    tx: tokio_mpsc::UnboundedSender<PlaybackProgress>,
}

/// Handle for subscribing to playback transitions
#[derive(Clone)]
pub struct PlaybackProgressHandle {
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>>,
    next_id: Arc<AtomicU64>,
}

impl PlaybackProgressHandle {
    /// Create a new progress handle and spawn the task that fans updates out
    pub fn new(
        mut progress_rx: tokio_mpsc::UnboundedReceiver<PlaybackProgress>,
        runtime_handle: tokio::runtime::Handle,
    ) -> Self {
        let subscriptions: Arc<Mutex<HashMap<SubscriptionId, Subscription>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let subscriptions_clone = subscriptions.clone();

        runtime_handle.spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                let mut subs = match subscriptions_clone.lock() {
                    Ok(subs) => subs,
                    Err(poisoned) => poisoned.into_inner(),
                };

                // A failed send means the receiver was dropped
                subs.retain(|_, subscription| subscription.tx.send(progress.clone()).is_ok());
            }
            info!("Playback progress channel closed, exiting");
        });

        Self {
            subscriptions,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe to all playback transitions.
    ///
    /// The subscription is removed once the receiver is dropped.
    pub fn subscribe_all(&self) -> tokio_mpsc::UnboundedReceiver<PlaybackProgress> {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let mut subs = match self.subscriptions.lock() {
            Ok(subs) => subs,
            Err(poisoned) => poisoned.into_inner(),
        };
        subs.insert(id, Subscription { tx });
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        match self.subscriptions.lock() {
            Ok(subs) => subs.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
