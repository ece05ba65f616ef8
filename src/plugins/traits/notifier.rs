use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::EmailAddress;
use crate::utils::error::Result;

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub destination: EmailAddress,
    pub sender: EmailAddress,
    pub subject: String,
    pub html_body: String,
}

/// Something worth telling the recipient about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// The target element is present, says "add to cart" and is not locked.
    InStock {
        url: String,
        button_text: String,
        checked_at: DateTime<Utc>,
    },
    /// The product page answered with a 5xx status.
    ServerError {
        status: u16,
        status_text: String,
        url: String,
        occurred_at: DateTime<Utc>,
    },
    /// The fetch could not complete at all.
    RuntimeError {
        kind: String,
        message: String,
        url: String,
        execution_id: String,
        occurred_at: DateTime<Utc>,
    },
}

impl NotificationEvent {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationEvent::InStock { .. } => "in_stock",
            NotificationEvent::ServerError { .. } => "server_error",
            NotificationEvent::RuntimeError { .. } => "runtime_error",
        }
    }
}

/// Email delivery capability. Returns the provider's delivery id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<String>;
}
