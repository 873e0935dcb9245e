//! Plan and model catalog integration tests.

mod common;

use common::TestApp;

#[tokio::test]
async fn plans_are_public_and_ordered_cheapest_first() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/api/plans", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);

    let plans: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let plans = plans.as_array().expect("plans should be an array");
    assert_eq!(plans.len(), 4);

    assert_eq!(plans[0]["tier"], "free");
    assert_eq!(plans[0]["price"], "0");
    assert_eq!(plans[0]["requests_per_day"], 5);

    assert_eq!(plans[1]["tier"], "basic");
    assert_eq!(plans[1]["price"], "9.99");

    // Unlimited allowance serializes as null.
    assert_eq!(plans[3]["tier"], "enterprise");
    assert!(plans[3]["requests_per_day"].is_null());
}

#[tokio::test]
async fn provider_models_are_listed_in_catalog_order() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/api/models/openai", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);

    let models: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let models = models.as_array().expect("models should be an array");
    assert!(!models.is_empty());
    assert_eq!(models[0]["id"], "gpt-4o");
    assert_eq!(models[0]["name"], "GPT-4o");
    assert!(
        models[0].get("upstream").is_none(),
        "upstream model names are internal"
    );
}

#[tokio::test]
async fn unknown_provider_catalog_is_404() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/api/models/grok", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}
