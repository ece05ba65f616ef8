// Integration tests for Stock Watcher
// These drive the real reqwest transport against a wiremock product page.

pub mod runner_tests;

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stock_watcher::{
    AppError, Settings, StockCheckRunner,
    config::RawSettings,
    plugins::traits::{EmailSender, OutgoingEmail},
    scraper::{PageFetcher, ReqwestTransport},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const PRODUCT_PATH: &str = "/products/widget";

/// Email sender that records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|e| e.subject).collect()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, AppError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        if self.fail {
            return Err(AppError::Notification("simulated delivery failure".to_string()));
        }
        Ok(format!("test-delivery-{}", sent.len()))
    }
}

/// Settings pointing at the product page served by `server`.
pub fn test_settings(server_uri: &str) -> Settings {
    Settings::from_raw(RawSettings {
        target_url: Some(format!("{}{}", server_uri, PRODUCT_PATH)),
        to_email: Some("alerts@example.com".to_string()),
        from_email: Some("watcher@example.com".to_string()),
        ..Default::default()
    })
    .expect("test settings are valid")
}

pub fn test_fetcher(timeout: Duration) -> PageFetcher {
    let transport = ReqwestTransport::new().expect("reqwest client builds");
    PageFetcher::new(Arc::new(transport)).with_timeout(timeout)
}

pub fn test_runner(server_uri: &str, sender: Arc<RecordingSender>) -> StockCheckRunner {
    StockCheckRunner::new(
        &test_settings(server_uri),
        test_fetcher(Duration::from_secs(5)),
        sender,
    )
}

/// Starts a mock server whose product page answers with `template`.
pub async fn serve_product_page(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

pub fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(format!(
            "<!DOCTYPE html><html><head><title>Widget</title></head><body>{}</body></html>",
            body
        ))
}
