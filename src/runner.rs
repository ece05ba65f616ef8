use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;
use url::Url;

use crate::config::Settings;
use crate::element_finder::evaluate_availability;
use crate::models::{HandlerResponse, InvocationEvent};
use crate::plugins::notifiers::{EmailNotifier, SmtpEmailSender};
use crate::plugins::traits::{EmailSender, NotificationEvent};
use crate::scraper::{FetchOutcome, PageFetcher, ReqwestTransport};
use crate::utils::error::{AppError, Result};

/// Invocations slower than this get an extra warning.
pub const SLOW_EXECUTION_THRESHOLD: Duration = Duration::from_secs(20);

pub const EMPTY_RESPONSE_MESSAGE: &str = "Received empty response from target URL";

/// Runs one fetch → evaluate → notify cycle per invocation.
pub struct StockCheckRunner {
    target_url: Url,
    target_element_id: String,
    fetcher: PageFetcher,
    notifier: EmailNotifier,
}

impl StockCheckRunner {
    pub fn new(settings: &Settings, fetcher: PageFetcher, sender: Arc<dyn EmailSender>) -> Self {
        Self {
            target_url: settings.target_url.clone(),
            target_element_id: settings.target_element_id.clone(),
            fetcher,
            notifier: EmailNotifier::new(sender, settings.sender.clone(), settings.recipient.clone()),
        }
    }

    /// Wires the production HTTP transport and SMTP sender.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        let sender = Arc::new(SmtpEmailSender::from_settings(&settings.smtp)?);
        Ok(Self::new(settings, PageFetcher::new(transport), sender))
    }

    /// Runs one check. Never fails: every error is folded into the response.
    pub async fn invoke(&self, event: &InvocationEvent) -> HandlerResponse {
        let execution_id = event.execution_id();
        let span = tracing::info_span!("invocation", execution_id = %execution_id);

        async {
            let started = Instant::now();
            tracing::info!(phase = "start", url = %self.target_url, "Stock check started");

            let response = match AssertUnwindSafe(self.run()).catch_unwind().await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => self.handle_runtime_error(e, &execution_id).await,
                Err(panic) => {
                    let error = AppError::Internal(format!("check panicked: {}", panic_message(&*panic)));
                    self.handle_runtime_error(error, &execution_id).await
                }
            };

            let elapsed = started.elapsed();
            let duration_ms = elapsed.as_millis() as u64;
            match &response {
                HandlerResponse::Success { notified, check } => tracing::info!(
                    phase = "done",
                    outcome = response.outcome(),
                    notified,
                    exists = check.exists,
                    locked = check.locked,
                    duration_ms,
                    "Stock check completed"
                ),
                HandlerResponse::FetchFailure { message } => tracing::warn!(
                    phase = "done",
                    outcome = response.outcome(),
                    message = %message,
                    duration_ms,
                    "Stock check completed without a usable page"
                ),
                HandlerResponse::RuntimeFailure { error } => tracing::error!(
                    phase = "done",
                    outcome = response.outcome(),
                    error = %error,
                    duration_ms,
                    "Stock check failed"
                ),
            }

            if is_slow(elapsed) {
                tracing::warn!(
                    phase = "slow",
                    duration_ms,
                    threshold_ms = SLOW_EXECUTION_THRESHOLD.as_millis() as u64,
                    "Slow execution"
                );
            }

            response
        }
        .instrument(span)
        .await
    }

    async fn run(&self) -> Result<HandlerResponse> {
        let markup = match self.fetcher.fetch(&self.target_url).await? {
            FetchOutcome::Page(markup) => markup,
            FetchOutcome::HttpStatus { status, status_text } => {
                let message = format!(
                    "Failed to fetch page: {} {} ({})",
                    status, status_text, self.target_url
                );

                if status >= 500 {
                    let event = NotificationEvent::ServerError {
                        status,
                        status_text,
                        url: self.target_url.to_string(),
                        occurred_at: Utc::now(),
                    };
                    self.notify_best_effort(&event).await;
                }

                return Ok(HandlerResponse::FetchFailure { message });
            }
            // Blank 2xx bodies are reported without an email.
            FetchOutcome::EmptyBody => {
                return Ok(HandlerResponse::FetchFailure {
                    message: EMPTY_RESPONSE_MESSAGE.to_string(),
                });
            }
        };

        let check = evaluate_availability(&markup, &self.target_element_id);
        tracing::info!(
            phase = "evaluated",
            exists = check.exists,
            says_add_to_cart = check.says_add_to_cart,
            locked = check.locked,
            text = %check.text,
            "Target element evaluated"
        );

        let notified = if check.is_available() {
            let event = NotificationEvent::InStock {
                url: self.target_url.to_string(),
                button_text: check.text.clone(),
                checked_at: Utc::now(),
            };
            self.notify_best_effort(&event).await
        } else {
            false
        };

        Ok(HandlerResponse::Success { notified, check })
    }

    async fn handle_runtime_error(&self, error: AppError, execution_id: &str) -> HandlerResponse {
        tracing::error!(
            phase = "error",
            kind = error.kind(),
            timed_out = error.is_timeout(),
            error = %error,
            "Stock check raised an error"
        );

        let event = NotificationEvent::RuntimeError {
            kind: error.kind().to_string(),
            message: error.to_string(),
            url: self.target_url.to_string(),
            execution_id: execution_id.to_string(),
            occurred_at: Utc::now(),
        };
        self.notify_best_effort(&event).await;

        HandlerResponse::RuntimeFailure {
            error: error.to_string(),
        }
    }

    /// Sends `event`, returning whether delivery succeeded. Failures are logged only.
    async fn notify_best_effort(&self, event: &NotificationEvent) -> bool {
        match self.notifier.notify(event).await {
            Ok(delivery_id) => {
                tracing::info!(notification = event.label(), delivery_id = %delivery_id, "Notification sent");
                true
            }
            Err(e) => {
                tracing::error!(notification = event.label(), error = %e, "Failed to send notification");
                false
            }
        }
    }
}

/// Whether an invocation took long enough to warrant the slow-execution warning.
pub fn is_slow(elapsed: Duration) -> bool {
    elapsed > SLOW_EXECUTION_THRESHOLD
}

fn panic_message<'a>(payload: &'a (dyn Any + Send + 'static)) -> &'a str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
