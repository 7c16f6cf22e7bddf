//! Guest cart lines survive sign-in and reach the backend cart.

#![allow(clippy::unwrap_used)]

use brewery_integration_tests::TestApp;
use reqwest::StatusCode;

async fn cart_count(app: &TestApp, client: &reqwest::Client) -> String {
    client
        .get(app.url("/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
        .trim()
        .to_string()
}

async fn add_to_cart(app: &TestApp, client: &reqwest::Client, slug: &str, quantity: &str) {
    let response = client
        .post(app.url("/cart/add"))
        .form(&[("slug", slug), ("quantity", quantity)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_guest_lines_are_pushed_on_sign_in() {
    let app = TestApp::spawn().await;
    let client = app.client();
    app.verify_age(&client).await;

    app.backend.seed_remote_cart(2, 1);
    add_to_cart(&app, &client, "fog-line-hazy-ipa", "2").await;
    assert_eq!(cart_count(&app, &client).await, "2");
    assert_eq!(app.backend.cart_item_posts(), 0);

    app.sign_in(&client).await;

    assert_eq!(cart_count(&app, &client).await, "3");
    assert_eq!(app.backend.cart_item_posts(), 1);
    let remote = app.backend.remote_cart();
    assert!(remote.contains(&(1, 2)));
    assert!(remote.contains(&(2, 1)));
}

#[tokio::test]
async fn test_remote_line_wins_for_the_same_product() {
    let app = TestApp::spawn().await;
    let client = app.client();
    app.verify_age(&client).await;

    app.backend.seed_remote_cart(1, 5);
    add_to_cart(&app, &client, "fog-line-hazy-ipa", "2").await;

    app.sign_in(&client).await;

    assert_eq!(cart_count(&app, &client).await, "5");
    assert_eq!(app.backend.cart_item_posts(), 0);
    assert_eq!(app.backend.remote_cart(), vec![(1, 5)]);
}

#[tokio::test]
async fn test_unknown_product_is_not_added() {
    let app = TestApp::spawn().await;
    let client = app.client();
    app.verify_age(&client).await;

    let response = client
        .post(app.url("/cart/add"))
        .header("HX-Request", "true")
        .form(&[("slug", "no-such-beer"), ("quantity", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(cart_count(&app, &client).await, "0");
}
