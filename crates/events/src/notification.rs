//! Plain-text notification builders.

use rust_decimal::Decimal;
use studio_core::money::format_amount;
use studio_core::types::Timestamp;

/// What a notification is about. Carried into delivery logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Welcome,
    PurchaseConfirmation,
    MilestoneReward,
    ChatTranscript,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::PurchaseConfirmation => "purchase_confirmation",
            Self::MilestoneReward => "milestone_reward",
            Self::ChatTranscript => "chat_transcript",
        }
    }
}

/// A fully rendered email ready for a [`crate::Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub kind: NotificationKind,
    /// Identifier of the event that triggered the email: the order id, the
    /// voucher code, or the conversation id.
    pub reference: Option<String>,
}

/// One line of a chat transcript.
#[derive(Debug, Clone)]
pub struct TranscriptLine {
    pub speaker: String,
    pub at: Timestamp,
    pub text: String,
}

const SIGNATURE: &str = "Tysun Mike Productions";

fn greeting(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hi {name},"),
        None => "Hi there,".to_string(),
    }
}

fn utc(at: Timestamp) -> String {
    at.format("%B %-d, %Y at %-I:%M %p UTC").to_string()
}

impl Notification {
    /// Sent once after a new account is created.
    pub fn welcome(to: &str, name: Option<&str>) -> Self {
        let body = format!(
            "{}\n\nWelcome to {SIGNATURE}! Your account is ready.\n\n\
             Every project you complete with us counts toward loyalty rewards. \
             Track your progress and vouchers from your dashboard.\n\n{SIGNATURE}",
            greeting(name)
        );
        Self {
            to: to.to_string(),
            subject: format!("Welcome to {SIGNATURE}"),
            body,
            kind: NotificationKind::Welcome,
            reference: None,
        }
    }

    /// Receipt for a captured payment.
    pub fn purchase_confirmation(
        to: &str,
        package_name: &str,
        package_price: Decimal,
        consultation_time: Timestamp,
        order_id: &str,
    ) -> Self {
        let body = format!(
            "Thank you for your purchase!\n\n\
             Here are your order details:\n\
             - Package: {package_name}\n\
             - Price: ${}\n\
             - Consultation Time: {}\n\
             - Order ID: {order_id}\n\n\
             We look forward to speaking with you!\n\n{SIGNATURE}",
            format_amount(package_price),
            utc(consultation_time),
        );
        Self {
            to: to.to_string(),
            subject: "Your Purchase Confirmation".to_string(),
            body,
            kind: NotificationKind::PurchaseConfirmation,
            reference: Some(order_id.to_string()),
        }
    }

    /// Announces a voucher granted for reaching a project milestone.
    pub fn milestone_reward(
        to: &str,
        name: Option<&str>,
        projects_completed: i32,
        reward: &str,
        voucher_code: &str,
        expires_at: Timestamp,
    ) -> Self {
        let body = format!(
            "{}\n\nCongratulations on completing {projects_completed} projects with us! \
             As a thank you, you've earned a voucher for: {reward}.\n\n\
             Your voucher code is: {voucher_code}\n\
             It is valid until {}.\n\n\
             We appreciate your business!\n\n{SIGNATURE}",
            greeting(name),
            expires_at.format("%B %-d, %Y"),
        );
        Self {
            to: to.to_string(),
            subject: "You've earned a reward!".to_string(),
            body,
            kind: NotificationKind::MilestoneReward,
            reference: Some(voucher_code.to_string()),
        }
    }

    /// Forwards a finished assistant conversation to the studio inbox.
    pub fn chat_transcript(
        inbox: &str,
        conversation_id: &str,
        visitor_name: &str,
        visitor_email: Option<&str>,
        lines: &[TranscriptLine],
    ) -> Self {
        let started = lines.first().map(|l| utc(l.at)).unwrap_or_default();
        let ended = lines.last().map(|l| utc(l.at)).unwrap_or_default();
        let transcript: Vec<String> = lines
            .iter()
            .map(|l| format!("[{}] {}:\n{}\n", utc(l.at), l.speaker, l.text))
            .collect();

        let body = format!(
            "New chatbot conversation received!\n\n\
             User: {visitor_name}\n\
             Email: {}\n\
             Started: {started}\n\
             Ended: {ended}\n\
             Messages: {}\n\n\
             CONVERSATION:\n{}\n\
             ---\n\
             This conversation was sent automatically from the website assistant.",
            visitor_email.unwrap_or("Not provided"),
            lines.len(),
            transcript.join("\n"),
        );
        Self {
            to: inbox.to_string(),
            subject: format!("New Chatbot Conversation from {visitor_name}"),
            body,
            kind: NotificationKind::ChatTranscript,
            reference: Some(conversation_id.to_string()),
        }
    }
}
