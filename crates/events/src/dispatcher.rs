//! Fire-and-forget notification sending.
//!
//! [`NotificationDispatcher::dispatch`] moves delivery onto a spawned task so
//! request handlers never wait on SMTP. The returned [`DeliveryHandle`]
//! separates "enqueued" from "delivered": dropping it leaves the send
//! running, awaiting it yields the final [`DeliveryOutcome`].

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::delivery::email::Mailer;
use crate::notification::Notification;

/// Final result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Handle to an in-flight delivery.
#[derive(Debug)]
pub struct DeliveryHandle(JoinHandle<DeliveryOutcome>);

impl DeliveryHandle {
    /// Wait for the delivery task to finish.
    pub async fn outcome(self) -> DeliveryOutcome {
        match self.0.await {
            Ok(outcome) => outcome,
            Err(e) => DeliveryOutcome::Failed(format!("delivery task aborted: {e}")),
        }
    }
}

/// Sends [`Notification`]s through a shared [`Mailer`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Queue a notification for background delivery.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, notification: Notification) -> DeliveryHandle {
        let mailer = Arc::clone(&self.mailer);
        DeliveryHandle(tokio::spawn(async move {
            deliver(mailer.as_ref(), &notification).await
        }))
    }

    /// Deliver a notification inline and report the outcome.
    pub async fn send_now(&self, notification: &Notification) -> DeliveryOutcome {
        deliver(self.mailer.as_ref(), notification).await
    }
}

async fn deliver(mailer: &dyn Mailer, notification: &Notification) -> DeliveryOutcome {
    match mailer
        .send(&notification.to, &notification.subject, &notification.body)
        .await
    {
        Ok(()) => DeliveryOutcome::Delivered,
        Err(e) => {
            tracing::error!(
                to = %notification.to,
                subject = %notification.subject,
                kind = notification.kind.as_str(),
                reference = notification.reference.as_deref().unwrap_or("-"),
                error = %e,
                "Notification delivery failed",
            );
            DeliveryOutcome::Failed(e.to_string())
        }
    }
}
