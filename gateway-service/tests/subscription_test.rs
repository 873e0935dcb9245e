//! Subscription and payment integration tests.
//!
//! Stripe stays in simulated-intent mode (no API key in the test config),
//! so card flows run entirely in-process; webhooks are signed with the
//! test webhook secret.

mod common;

use common::{TestApp, TEST_WEBHOOK_SECRET};
use gateway_service::services::payments::stripe::sign_payload;

async fn subscribe(
    app: &TestApp,
    token: &str,
    tier: &str,
    method: Option<&str>,
) -> reqwest::Response {
    let mut payload = serde_json::json!({ "tier": tier });
    if let Some(method) = method {
        payload["payment_method"] = serde_json::json!(method);
    }

    app.client
        .post(format!("{}/api/subscriptions", app.address))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute subscribe request")
}

async fn deliver_webhook(app: &TestApp, event_type: &str, intent_id: &str) -> reqwest::Response {
    let payload = serde_json::json!({
        "type": event_type,
        "data": { "object": { "id": intent_id } }
    })
    .to_string();

    let signature =
        sign_payload(TEST_WEBHOOK_SECRET, &payload).expect("payload signing should succeed");

    app.client
        .post(format!("{}/api/payments/webhook", app.address))
        .header("x-webhook-signature", signature)
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .expect("Failed to execute webhook request")
}

#[tokio::test]
async fn card_subscription_activates_on_webhook() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("card@example.com").await;

    let response = subscribe(&app, &token, "premium", Some("card")).await;
    assert_eq!(response.status().as_u16(), 202);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "payment_required");
    assert_eq!(body["subscription"]["status"], "past_due");
    assert_eq!(body["payment"]["status"], "pending");
    assert!(
        body["client_secret"].as_str().is_some(),
        "card flow should hand back a client secret"
    );

    let intent_id = body["payment"]["reference"]["intent_id"]
        .as_str()
        .expect("card payment should reference an intent")
        .to_string();
    let payment_id = body["payment"]["id"]
        .as_str()
        .expect("payment should have an id")
        .to_string();

    // The plan is not applied until the payment settles.
    let profile = app.me(&token).await;
    assert_eq!(profile["tier"], "free");

    let webhook = deliver_webhook(&app, "payment_intent.succeeded", &intent_id).await;
    assert_eq!(webhook.status().as_u16(), 200);

    // Now the account is on premium with a fresh allowance.
    let profile = app.me(&token).await;
    assert_eq!(profile["tier"], "premium");
    assert_eq!(profile["requests_remaining"], 1000);
    assert!(profile["requests_reset_at"].is_null());

    let current: serde_json::Value = app
        .client
        .get(format!("{}/api/subscriptions/current", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(current["status"], "active");

    let payment: serde_json::Value = app
        .client
        .get(format!("{}/api/payments/{}", app.address, payment_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(payment["status"], "completed");

    // Redelivery of the same webhook is a no-op, not an error.
    let replay = deliver_webhook(&app, "payment_intent.succeeded", &intent_id).await;
    assert_eq!(replay.status().as_u16(), 200);
}

#[tokio::test]
async fn webhook_with_bad_signature_is_rejected() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("badsig@example.com").await;

    let response = subscribe(&app, &token, "premium", Some("card")).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let intent_id = body["payment"]["reference"]["intent_id"]
        .as_str()
        .expect("card payment should reference an intent");

    let payload = serde_json::json!({
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": intent_id } }
    })
    .to_string();

    let response = app
        .client
        .post(format!("{}/api/payments/webhook", app.address))
        .header("x-webhook-signature", "deadbeef")
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);

    // The account is untouched.
    let profile = app.me(&token).await;
    assert_eq!(profile["tier"], "free");
}

#[tokio::test]
async fn failed_payment_leaves_subscription_past_due() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("declined@example.com").await;

    let response = subscribe(&app, &token, "basic", Some("card")).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let intent_id = body["payment"]["reference"]["intent_id"]
        .as_str()
        .expect("card payment should reference an intent")
        .to_string();
    let payment_id = body["payment"]["id"]
        .as_str()
        .expect("payment should have an id")
        .to_string();

    let webhook = deliver_webhook(&app, "payment_intent.payment_failed", &intent_id).await;
    assert_eq!(webhook.status().as_u16(), 200);

    let profile = app.me(&token).await;
    assert_eq!(profile["tier"], "free");

    let payment: serde_json::Value = app
        .client
        .get(format!("{}/api/payments/{}", app.address, payment_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(payment["status"], "failed");

    let current: serde_json::Value = app
        .client
        .get(format!("{}/api/subscriptions/current", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(current["status"], "past_due");
}

#[tokio::test]
async fn bitcoin_subscription_quotes_a_deposit() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("btc@example.com").await;

    let response = subscribe(&app, &token, "basic", Some("bitcoin")).await;
    assert_eq!(response.status().as_u16(), 202);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "payment_required");
    assert!(
        body.get("client_secret").is_none(),
        "bitcoin flow has no client secret"
    );

    let reference = &body["payment"]["reference"];
    assert_eq!(reference["type"], "bitcoin_deposit");
    assert_eq!(reference["address"], "bc1qtestaddress");
    // 9.99 USD at the fixed 50000 USD/BTC test rate.
    assert_eq!(reference["amount_btc"], "0.0001998");
}

#[tokio::test]
async fn paid_plan_requires_a_payment_method() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("nomethod@example.com").await;

    let response = subscribe(&app, &token, "premium", None).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn selecting_the_current_tier_conflicts() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("sametier@example.com").await;

    let response = subscribe(&app, &token, "free", None).await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn unknown_tier_is_rejected() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("unknowntier@example.com").await;

    let response = subscribe(&app, &token, "platinum", Some("card")).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn current_subscription_is_404_without_one() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("nosub@example.com").await;

    let response = app
        .client
        .get(format!("{}/api/subscriptions/current", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn cancel_drops_the_account_to_free() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("cancel@example.com").await;

    // Activate premium through the card flow.
    let response = subscribe(&app, &token, "premium", Some("card")).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let intent_id = body["payment"]["reference"]["intent_id"]
        .as_str()
        .expect("card payment should reference an intent");
    deliver_webhook(&app, "payment_intent.succeeded", intent_id).await;

    let response = app
        .client
        .delete(format!("{}/api/subscriptions/current", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let canceled: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(canceled["status"], "canceled");

    // Back on free with the free allowance.
    let profile = app.me(&token).await;
    assert_eq!(profile["tier"], "free");
    assert_eq!(profile["requests_remaining"], 5);

    // The canceled record is retained but no longer current.
    let response = app
        .client
        .get(format!("{}/api/subscriptions/current", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}
