mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use portal_service::models::{Event, SiteGlobals};

#[tokio::test]
async fn test_events_returned_for_authenticated_member() {
    let app = TestApp::spawn();
    app.content.events.lock().unwrap().push(Event {
        id: 1,
        title: Some("Annual General Meeting".to_string()),
        date: Some("2025-09-18".to_string()),
        location: Some("Village Hall".to_string()),
        description: Some("All members welcome.".to_string()),
    });

    let cookie = app.session_cookie_for("alice@example.com");
    let response = app.get_with_cookie("/api/events", &cookie).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["title"], "Annual General Meeting");
    assert_eq!(body[0]["location"], "Village Hall");
}

#[tokio::test]
async fn test_dashboard_includes_site_globals() {
    let app = TestApp::spawn();
    *app.content.globals.lock().unwrap() = SiteGlobals {
        site_title: Some("Committee Portal".to_string()),
        site_description: Some("Committee resources and meeting papers".to_string()),
    };

    let cookie = app.session_cookie_for("alice@example.com");
    let response = app.get_with_cookie("/", &cookie).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["site"]["site_title"], "Committee Portal");
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_content_failure_maps_to_bad_gateway() {
    let app = TestApp::spawn();
    let cookie = app.session_cookie_for("alice@example.com");

    // Authenticate first so the allow-list is cached, then fail the repository
    let response = app.get_with_cookie("/", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.content.set_failing(true);
    let response = app.get_with_cookie("/api/events", &cookie).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
