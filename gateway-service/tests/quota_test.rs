//! Quota gate integration tests: exhaustion, denial, reset, concurrency.

mod common;

use chrono::{DateTime, Utc};
use common::TestApp;
use futures::future::join_all;
use gateway_service::models::RequestAllowance;
use uuid::Uuid;

fn account_id(account: &serde_json::Value) -> Uuid {
    Uuid::parse_str(account["id"].as_str().expect("account id should be a string"))
        .expect("account id should be a UUID")
}

#[tokio::test]
async fn free_allowance_exhausts_and_denies_with_reset_info() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("exhaust@example.com").await;

    for i in 0..5 {
        let response = app.post_prompt(&token, "mock", "mock-echo", "hello").await;
        assert_eq!(
            response.status().as_u16(),
            200,
            "request {} should be admitted",
            i + 1
        );
    }

    // The allowance is spent and a reset is now on the books.
    let profile = app.me(&token).await;
    assert_eq!(profile["requests_remaining"], 0);
    assert!(!profile["requests_reset_at"].is_null());

    // The sixth request is denied and told when to come back.
    let denied = app.post_prompt(&token, "mock", "mock-echo", "hello").await;
    assert_eq!(denied.status().as_u16(), 429);
    assert!(denied.headers().contains_key("retry-after"));

    let body: serde_json::Value = denied.json().await.expect("Failed to parse JSON");
    assert_eq!(body["subscription_tier"], "free");
    let first_reset = body["next_reset"]
        .as_str()
        .expect("denial should carry the reset time")
        .to_string();

    // Denial consumes nothing and never moves the reset.
    let denied_again = app.post_prompt(&token, "mock", "mock-echo", "hello").await;
    assert_eq!(denied_again.status().as_u16(), 429);
    let body: serde_json::Value = denied_again.json().await.expect("Failed to parse JSON");
    assert_eq!(body["next_reset"], first_reset.as_str());

    let profile = app.me(&token).await;
    assert_eq!(profile["requests_remaining"], 0);
}

#[tokio::test]
async fn elapsed_reset_refills_the_allowance() {
    let app = TestApp::spawn().await;
    let (token, account) = app.register("refill@example.com").await;
    let id = account_id(&account);

    for _ in 0..5 {
        let response = app.post_prompt(&token, "mock", "mock-echo", "hello").await;
        assert_eq!(response.status().as_u16(), 200);
    }

    // Rewind the reset so the next request finds it in the past.
    app.accounts
        .update(id, &mut |account| {
            account.requests_reset_at = Some(Utc::now() - chrono::Duration::hours(1));
        })
        .await
        .expect("store update should succeed");

    let response = app.post_prompt(&token, "mock", "mock-echo", "hello").await;
    assert_eq!(
        response.status().as_u16(),
        200,
        "an elapsed reset should admit the request"
    );

    // Refilled to 5 and the admitted request consumed one.
    let profile = app.me(&token).await;
    assert_eq!(profile["requests_remaining"], 4);

    let next_reset: DateTime<Utc> = profile["requests_reset_at"]
        .as_str()
        .expect("refill should schedule a new reset")
        .parse()
        .expect("reset timestamp should parse");
    assert!(next_reset > Utc::now());
}

#[tokio::test]
async fn unlimited_allowance_is_never_metered() {
    let app = TestApp::spawn().await;
    let (token, account) = app.register("unlimited@example.com").await;
    let id = account_id(&account);

    app.accounts
        .update(id, &mut |account| {
            account.requests_remaining = RequestAllowance::Unlimited;
        })
        .await
        .expect("store update should succeed");

    for _ in 0..8 {
        let response = app.post_prompt(&token, "mock", "mock-echo", "hello").await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let profile = app.me(&token).await;
    assert!(profile["requests_remaining"].is_null());
    assert!(profile["requests_reset_at"].is_null());
}

#[tokio::test]
async fn concurrent_requests_never_overdraw() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("concurrent@example.com").await;

    // Six requests race for five remaining units.
    let requests = (0..6).map(|_| app.post_prompt(&token, "mock", "mock-echo", "race"));
    let responses = join_all(requests).await;

    let admitted = responses
        .iter()
        .filter(|r| r.status().as_u16() == 200)
        .count();
    let denied = responses
        .iter()
        .filter(|r| r.status().as_u16() == 429)
        .count();

    assert_eq!(admitted, 5, "every unit is spent exactly once");
    assert_eq!(denied, 1, "the overdraw attempt is denied");

    let profile = app.me(&token).await;
    assert_eq!(profile["requests_remaining"], 0);
}
