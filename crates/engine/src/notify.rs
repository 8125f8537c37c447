//! Notification dispatch.
//!
//! The reminder pass never talks to a messaging API directly: it enqueues
//! [`Notification`]s on a [`Dispatcher`], and a background worker delivers
//! each of them through a [`NotificationChannel`] in its own task, retrying
//! according to a [`RetryPolicy`].

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    task::{JoinHandle, JoinSet},
};

use crate::DispatchError;

/// One outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub destination: String,
    pub message: String,
}

impl Notification {
    pub fn new(destination: &str, message: &str) -> Self {
        Self {
            destination: destination.to_string(),
            message: message.to_string(),
        }
    }
}

/// An external messaging channel (e.g. a chat bot API).
pub trait NotificationChannel: Send + Sync + 'static {
    fn send(
        &self,
        destination: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per notification, including the first one.
    pub max_attempts: u32,
    /// Delay between two attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

/// Deliver one notification, retrying on failure.
///
/// Returns the last error once `max_attempts` is exhausted.
pub async fn deliver<C: NotificationChannel>(
    channel: &C,
    notification: &Notification,
    policy: RetryPolicy,
) -> Result<(), DispatchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match channel
            .send(&notification.destination, &notification.message)
            .await
        {
            Ok(()) => {
                tracing::debug!("notification delivered to {}", notification.destination);
                return Ok(());
            }
            Err(err) if attempt < max_attempts => {
                tracing::warn!(
                    "delivery to {} failed (attempt {attempt}/{max_attempts}): {err}",
                    notification.destination
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(
                    "giving up on delivery to {} after {attempt} attempts: {err}",
                    notification.destination
                );
                return Err(err);
            }
        }
    }
}

/// Handle to the notification queue.
///
/// Cloning is cheap. The worker stops once every handle has been dropped and
/// the in-flight deliveries are done.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    queue: mpsc::UnboundedSender<Notification>,
}

impl Dispatcher {
    /// Start the delivery worker on the current tokio runtime.
    pub fn spawn<C: NotificationChannel>(
        channel: C,
        policy: RetryPolicy,
    ) -> (Self, JoinHandle<()>) {
        let (queue, mut rx) = mpsc::unbounded_channel::<Notification>();
        let channel = Arc::new(channel);

        let worker = tokio::spawn(async move {
            let mut deliveries = JoinSet::new();
            while let Some(notification) = rx.recv().await {
                let channel = Arc::clone(&channel);
                deliveries.spawn(async move {
                    // Failures are logged by `deliver`.
                    let _ = deliver(channel.as_ref(), &notification, policy).await;
                });
                while deliveries.try_join_next().is_some() {}
            }
            while deliveries.join_next().await.is_some() {}
            tracing::info!("notification dispatcher stopped");
        });

        (Self { queue }, worker)
    }

    /// Queue a notification without waiting for its delivery.
    pub fn enqueue(&self, notification: Notification) -> Result<(), DispatchError> {
        self.queue
            .send(notification)
            .map_err(|_| DispatchError::QueueClosed)
    }
}
