//! Concurrent requests with an expired access token share one refresh.

#![allow(clippy::unwrap_used)]

use brewery_integration_tests::TestApp;
use reqwest::StatusCode;

#[tokio::test]
async fn test_concurrent_requests_refresh_once() {
    let app = TestApp::spawn().await;
    let client = app.client();
    app.verify_age(&client).await;
    app.sign_in(&client).await;
    assert_eq!(app.backend.refresh_calls(), 0);

    let requests = (0..8).map(|_| {
        client
            .get(app.url("/notifications/unread-count"))
            .header("HX-Request", "true")
            .send()
    });
    let responses = futures_join_all(requests).await;

    for response in responses {
        let response = response.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.text().await.unwrap().contains(">2<"));
    }
    assert_eq!(app.backend.refresh_calls(), 1);

    // The refreshed token is stored; later requests do not refresh again.
    let response = client
        .get(app.url("/notifications/unread-count"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.backend.refresh_calls(), 1);
}

/// Drive every future to completion on the current task set.
async fn futures_join_all<F>(futures: impl Iterator<Item = F>) -> Vec<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut outputs = Vec::with_capacity(handles.len());
    for handle in handles {
        outputs.push(handle.await.unwrap());
    }
    outputs
}
