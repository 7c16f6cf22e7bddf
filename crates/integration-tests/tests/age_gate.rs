//! Age gate: every page except the exempt ones needs a confirmed age.

#![allow(clippy::unwrap_used)]

use brewery_integration_tests::TestApp;
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
async fn test_unverified_visitor_is_sent_to_gate_with_next() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client.get(app.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/age-verification?next=%2F");

    let response = client
        .get(app.url("/products?q=stout"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        location(&response),
        "/age-verification?next=%2Fproducts%3Fq%3Dstout"
    );
}

#[tokio::test]
async fn test_htmx_requests_get_hx_redirect() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .get(app.url("/cart/count"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers().get("hx-redirect").unwrap(),
        "/age-verification?next=%2Fcart%2Fcount"
    );
}

#[tokio::test]
async fn test_exempt_paths_skip_the_gate() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = client.get(app.url("/pages/faq")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(app.url("/age-verification")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("21 or older"));
}

#[tokio::test]
async fn test_confirming_age_unlocks_the_site() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(app.url("/age-verification"))
        .form(&[("answer", "yes"), ("next", "/taproom")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/taproom");

    let response = client.get(app.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Hopwright"));
}

#[tokio::test]
async fn test_declining_leaves_the_site() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(app.url("/age-verification"))
        .form(&[("answer", "no"), ("next", "/")])
        .send()
        .await
        .unwrap();
    assert!(location(&response).starts_with("https://"));

    let response = client.get(app.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_gate_ignores_offsite_next() {
    let app = TestApp::spawn().await;
    let client = app.client();

    for next in [
        "//evil.example/phish",
        "/\t/evil.example",
        "/\r\n/evil.example",
        "/\\evil.example",
    ] {
        let response = client
            .post(app.url("/age-verification"))
            .form(&[("answer", "yes"), ("next", next)])
            .send()
            .await
            .unwrap();
        assert_eq!(location(&response), "/", "next={next:?}");
    }
}
