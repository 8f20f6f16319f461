//! Outbound customer and studio notifications.
//!
//! - [`delivery`] -- the [`Mailer`] capability and its SMTP implementation.
//! - [`notification`] -- plain-text message builders for purchase
//!   confirmations, milestone rewards, welcome mail and chat transcripts.
//! - [`NotificationDispatcher`] -- sends notifications off the request path
//!   and hands back a [`DeliveryHandle`] for callers that need the outcome.

pub mod delivery;
pub mod dispatcher;
pub mod notification;

pub use delivery::email::{DisabledMailer, EmailConfig, EmailError, Mailer, SmtpMailer};
pub use dispatcher::{DeliveryHandle, DeliveryOutcome, NotificationDispatcher};
pub use notification::{Notification, NotificationKind, TranscriptLine};
