//! Sign-in redirects and what happens when the backend revokes a session.

#![allow(clippy::unwrap_used)]

use brewery_integration_tests::{TEST_EMAIL, TEST_PASSWORD, TestApp};
use reqwest::StatusCode;

fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_failed_refresh_signs_the_user_out() {
    let app = TestApp::spawn().await;
    let client = app.client();
    app.verify_age(&client).await;
    app.sign_in(&client).await;
    app.backend.reject_refreshes();

    let response = client.get(app.url("/account")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Faccount");
    assert_eq!(app.backend.refresh_calls(), 1);

    // The auth is gone from the session, so no further refresh is attempted.
    let response = client
        .get(app.url("/notifications/unread-count"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.text().await.unwrap().contains("notification-badge"));
    assert_eq!(app.backend.refresh_calls(), 1);

    let page = client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Your session expired. Please sign in again."));
    assert!(page.contains(r#"href="/auth/login">Sign in"#));

    // Shown once.
    let page = client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!page.contains("Your session expired"));
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let app = TestApp::spawn().await;
    let client = app.client();
    app.verify_age(&client).await;

    let response = client
        .post(app.url("/auth/login"))
        .form(&[
            ("email", TEST_EMAIL),
            ("password", TEST_PASSWORD),
            ("next", "/\t/evil.example"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}
