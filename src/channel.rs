//! In-process message channel.
//!
//! Named sub-channels decouple adapter cadence from processing cadence.
//! Publishing is fire-and-forget: a full or closed channel logs the loss
//! and drops that message, never blocking or signalling the producer.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::warn;

/// Publishing half of a named sub-channel.
pub struct SubChannel<T> {
    name: &'static str,
    tx: mpsc::Sender<T>,
}

impl<T> Clone for SubChannel<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<T> SubChannel<T> {
    /// Publish without waiting. Failures are logged and the message dropped.
    pub fn publish(&self, item: T) {
        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Channel {} is full, dropping message", self.name);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Channel {} is closed, dropping message", self.name);
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Consuming half of a named sub-channel.
pub struct SubReceiver<T> {
    name: &'static str,
    rx: mpsc::Receiver<T>,
}

impl<T> SubReceiver<T> {
    /// Receive the next message, or `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Wrap the receiver for a pool of consumers.
    pub fn into_shared(self) -> SharedReceiver<T> {
        SharedReceiver {
            name: self.name,
            rx: Arc::new(Mutex::new(self.rx)),
        }
    }
}

/// Clonable receiver handle; workers take turns draining the channel.
pub struct SharedReceiver<T> {
    name: &'static str,
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for SharedReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> SharedReceiver<T> {
    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Create a named bounded sub-channel.
pub fn sub_channel<T>(name: &'static str, capacity: usize) -> (SubChannel<T>, SubReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (SubChannel { name, tx }, SubReceiver { name, rx })
}
