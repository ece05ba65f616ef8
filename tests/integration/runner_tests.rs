use super::*;
use stock_watcher::{CheckResult, HandlerResponse, InvocationEvent};

async fn run_against(template: ResponseTemplate, sender: Arc<RecordingSender>) -> HandlerResponse {
    let server = serve_product_page(template).await;
    test_runner(&server.uri(), sender)
        .invoke(&InvocationEvent::with_source("integration-test"))
        .await
}

#[tokio::test]
async fn test_scenario_in_stock() {
    let sender = Arc::new(RecordingSender::default());

    let response = run_against(html_page(r#"<button id="add">Add to Cart</button>"#), sender.clone()).await;

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({
            "ok": true,
            "notified": true,
            "exists": true,
            "text": "Add to Cart",
            "saysAddToCart": true,
            "locked": false
        })
    );

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Stock check: Item is in stock!");
    assert_eq!(sent[0].destination.as_str(), "alerts@example.com");
    assert_eq!(sent[0].sender.as_str(), "watcher@example.com");
    assert!(sent[0].html_body.contains(PRODUCT_PATH));
}

#[tokio::test]
async fn test_scenario_disabled_button() {
    let sender = Arc::new(RecordingSender::default());

    let response = run_against(
        html_page(r#"<button id="add" disabled>Add to Cart</button>"#),
        sender.clone(),
    )
    .await;

    assert_eq!(
        response,
        HandlerResponse::Success {
            notified: false,
            check: CheckResult {
                exists: true,
                text: "Add to Cart".to_string(),
                says_add_to_cart: true,
                locked: true,
            },
        }
    );
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_scenario_no_button() {
    let sender = Arc::new(RecordingSender::default());

    let response = run_against(html_page("<div>No add button here</div>"), sender.clone()).await;

    assert_eq!(
        response,
        HandlerResponse::Success {
            notified: false,
            check: CheckResult::missing(),
        }
    );
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_sold_out_class_on_real_page() {
    let sender = Arc::new(RecordingSender::default());

    let response = run_against(
        html_page(
            r#"<form action="/cart/add" method="post">
                 <input type="hidden" name="id" value="42">
                 <button id="add" type="submit" class="product-form__cart-submit btn--soldout">
                   <span>Add to cart</span>
                 </button>
               </form>"#,
        ),
        sender.clone(),
    )
    .await;

    match response {
        HandlerResponse::Success { notified, check } => {
            assert!(!notified);
            assert!(check.exists);
            assert!(check.says_add_to_cart);
            assert!(check.locked);
        }
        other => panic!("unexpected response: {other:?}"),
    }
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_server_error_sends_one_error_email() {
    let sender = Arc::new(RecordingSender::default());

    let response = run_against(ResponseTemplate::new(500), sender.clone()).await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["ok"], false);
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("500"));
    assert!(message.contains("Internal Server Error"));
    assert!(json.get("error").is_none());

    assert_eq!(sender.subjects(), vec!["Stock check: Server error detected".to_string()]);
    assert!(sender.sent()[0].html_body.contains("500"));
}

#[tokio::test]
async fn test_client_error_sends_nothing() {
    let sender = Arc::new(RecordingSender::default());

    let response = run_against(ResponseTemplate::new(403), sender.clone()).await;

    assert!(matches!(response, HandlerResponse::FetchFailure { ref message } if message.contains("403")));
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_empty_body_sends_nothing() {
    let sender = Arc::new(RecordingSender::default());

    let response = run_against(ResponseTemplate::new(200), sender.clone()).await;

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({ "ok": false, "message": "Received empty response from target URL" })
    );
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_timeout_becomes_runtime_failure() {
    let sender = Arc::new(RecordingSender::default());
    let server = serve_product_page(html_page("slow").set_delay(Duration::from_secs(10))).await;

    let runner = StockCheckRunner::new(
        &test_settings(&server.uri()),
        test_fetcher(Duration::from_millis(200)),
        sender.clone(),
    );
    let response = runner.invoke(&InvocationEvent::with_source("timeout-test")).await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["ok"], false);
    assert!(json["error"].as_str().unwrap().contains("aborted"));

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Stock check: Error during execution");
    assert!(sent[0].html_body.contains("timeout"));
    assert!(sent[0].html_body.contains("timeout-test"));
}

#[tokio::test]
async fn test_delivery_failure_is_not_a_check_failure() {
    let sender = Arc::new(RecordingSender::failing());

    let response = run_against(html_page(r#"<button id="add">Add to Cart</button>"#), sender.clone()).await;

    match response {
        HandlerResponse::Success { notified, check } => {
            assert!(!notified);
            assert!(check.is_available());
        }
        other => panic!("unexpected response: {other:?}"),
    }
    assert_eq!(sender.sent().len(), 1);
}

#[tokio::test]
async fn test_repeated_invocations_are_independent() {
    let sender = Arc::new(RecordingSender::default());
    let server = serve_product_page(html_page(r#"<button id="add">Add to Cart</button>"#)).await;
    let runner = test_runner(&server.uri(), sender.clone());

    let first = runner.invoke(&InvocationEvent::default()).await;
    let second = runner.invoke(&InvocationEvent::default()).await;

    assert_eq!(first, second);
    assert_eq!(sender.sent().len(), 2);
}
