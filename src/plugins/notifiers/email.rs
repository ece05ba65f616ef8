use crate::config::{EmailAddress, SmtpSettings};
use crate::plugins::traits::{EmailSender, NotificationEvent, OutgoingEmail};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

const FROM_NAME: &str = "Stock Watcher";

/// Delivers mail through an SMTP relay (by default the SES endpoint of the
/// configured region).
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailSender {
    pub fn from_settings(smtp: &SmtpSettings) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| AppError::Notification(format!("Invalid SMTP relay {}: {}", smtp.host, e)))?
            .port(smtp.port);

        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        let message = build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::Notification(format!("SMTP delivery failed: {}", e)))?;

        Ok(response.message().collect::<Vec<_>>().join(" "))
    }
}

fn build_message(email: &OutgoingEmail) -> Result<Message> {
    let from = Mailbox::new(
        Some(FROM_NAME.to_string()),
        email
            .sender
            .as_str()
            .parse::<Address>()
            .map_err(|e| AppError::Notification(format!("Invalid sender address: {}", e)))?,
    );
    let to = email
        .destination
        .as_str()
        .parse::<Mailbox>()
        .map_err(|e| AppError::Notification(format!("Invalid recipient address: {}", e)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(email.html_body.clone())
        .map_err(|e| AppError::Notification(format!("Failed to build email: {}", e)))
}

/// Renders notification events and hands them to an [`EmailSender`].
#[derive(Clone)]
pub struct EmailNotifier {
    sender: Arc<dyn EmailSender>,
    from: EmailAddress,
    to: EmailAddress,
}

impl EmailNotifier {
    pub fn new(sender: Arc<dyn EmailSender>, from: EmailAddress, to: EmailAddress) -> Self {
        Self { sender, from, to }
    }

    pub async fn notify(&self, event: &NotificationEvent) -> Result<String> {
        let email = OutgoingEmail {
            destination: self.to.clone(),
            sender: self.from.clone(),
            subject: format_subject(event),
            html_body: format_html_body(event),
        };
        self.sender.send(&email).await
    }
}

pub fn format_subject(event: &NotificationEvent) -> String {
    match event {
        NotificationEvent::InStock { .. } => "Stock check: Item is in stock!".to_string(),
        NotificationEvent::ServerError { .. } => "Stock check: Server error detected".to_string(),
        NotificationEvent::RuntimeError { .. } => "Stock check: Error during execution".to_string(),
    }
}

pub fn format_html_body(event: &NotificationEvent) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; }
        .header { background: #f0f0f0; padding: 15px; border-radius: 5px; font-size: 18px; font-weight: bold; }
        .details { margin: 15px 0; padding: 10px; border-radius: 5px; }
        .in-stock { background: #e8f5e8; border-left: 4px solid #4CAF50; }
        .error { background: #fdecea; border-left: 4px solid #f44336; }
        .button { display: inline-block; padding: 8px 15px; background: #007cba; color: white; text-decoration: none; border-radius: 3px; }
    </style>
</head>
<body>
"#,
    );

    match event {
        NotificationEvent::InStock {
            url,
            button_text,
            checked_at,
        } => {
            html.push_str(&format!(
                r#"    <div class="header">The item is available to buy</div>
    <div class="details in-stock">
        <strong>Button text:</strong> {}<br>
        <strong>Checked at:</strong> {}
    </div>
    <a href="{}" class="button">Open product page</a>
"#,
                escape_html(button_text),
                checked_at.to_rfc3339(),
                escape_html(url),
            ));
        }
        NotificationEvent::ServerError {
            status,
            status_text,
            url,
            occurred_at,
        } => {
            html.push_str(&format!(
                r#"    <div class="header">The product page returned a server error</div>
    <div class="details error">
        <strong>Status:</strong> {} {}<br>
        <strong>URL:</strong> {}<br>
        <strong>Time:</strong> {}
    </div>
"#,
                status,
                escape_html(status_text),
                escape_html(url),
                occurred_at.to_rfc3339(),
            ));
        }
        NotificationEvent::RuntimeError {
            kind,
            message,
            url,
            execution_id,
            occurred_at,
        } => {
            html.push_str(&format!(
                r#"    <div class="header">The stock check failed to run</div>
    <div class="details error">
        <strong>Error type:</strong> {}<br>
        <strong>Message:</strong> {}<br>
        <strong>URL:</strong> {}<br>
        <strong>Execution id:</strong> {}<br>
        <strong>Time:</strong> {}
    </div>
"#,
                escape_html(kind),
                escape_html(message),
                escape_html(url),
                escape_html(execution_id),
                occurred_at.to_rfc3339(),
            ));
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
