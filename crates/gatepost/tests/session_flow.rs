//! End-to-end session flow tests against a small axum app.

use axum::{
    Json, Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use gatepost::auth::{AuthState, CurrentIdentity, session_middleware};
use gatepost::capability::CapabilitySet;
use gatepost::identity::Identity;
use gatepost::keys::SecretKeyPair;

async fn whoami(user: CurrentIdentity) -> Json<Value> {
    Json(json!({
        "authenticated": user.is_authenticated(),
        "id": user.id,
        "display_name": user.display_name(),
        "can_edit_resource": user.can_edit_resource(),
        "can_view_users": user.can_view_users(),
        "can_invite_users": user.can_invite_users(),
    }))
}

async fn edit_resource(user: CurrentIdentity) -> StatusCode {
    if user.can_edit_resource() {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::FORBIDDEN
    }
}

fn test_state() -> AuthState {
    let dir = tempfile::tempdir().unwrap();
    let keys = SecretKeyPair::load_or_generate(dir.path()).unwrap();
    AuthState::new(&keys)
}

fn test_app(state: &AuthState) -> Router {
    Router::new()
        .route("/whoami", get(whoami))
        .route("/resource", post(edit_resource))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
}

/// The cookie-pair portion of a Set-Cookie value, for a request Cookie header.
fn cookie_pair(set_cookie: &str) -> &str {
    set_cookie.split(';').next().unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method(Method::GET);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_anonymous_request_flows_through() {
    let state = test_state();
    let response = test_app(&state)
        .oneshot(get_request("/whoami", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["authenticated"], false);
    assert_eq!(json["id"], Uuid::nil().to_string());
    assert_eq!(json["can_edit_resource"], false);
    assert_eq!(json["can_view_users"], false);
    assert_eq!(json["can_invite_users"], false);
}

#[tokio::test]
async fn test_issued_cookie_round_trips_through_middleware() {
    let state = test_state();
    let identity = Identity::new(Uuid::new_v4(), CapabilitySet::VOLUNTEER, "Ada Lovelace");
    let set_cookie = state.issue_session_cookie(&identity).unwrap();

    let response = test_app(&state)
        .oneshot(get_request("/whoami", Some(cookie_pair(&set_cookie))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["id"], identity.id.to_string());
    assert_eq!(json["display_name"], "Ada Lovelace");
    assert_eq!(json["can_edit_resource"], true);
    assert_eq!(json["can_invite_users"], true);
    assert_eq!(json["can_view_users"], false);
}

#[tokio::test]
async fn test_capability_gate_in_delegate_handler() {
    let state = test_state();
    let admin = Identity::new(Uuid::new_v4(), CapabilitySet::ADMINISTRATOR, "Root");
    let set_cookie = state.issue_session_cookie(&admin).unwrap();

    // Administrators can view users but not edit resources.
    let response = test_app(&state)
        .oneshot(
            Request::builder()
                .uri("/resource")
                .method(Method::POST)
                .header(header::COOKIE, cookie_pair(&set_cookie))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tampered_cookie_rejected_without_reaching_delegate() {
    let state = test_state();
    let identity = Identity::new(Uuid::new_v4(), CapabilitySet::VOLUNTEER, "Ada");
    let set_cookie = state.issue_session_cookie(&identity).unwrap();

    // Corrupt one character of the token.
    let pair = cookie_pair(&set_cookie);
    let mut tampered: Vec<char> = pair.chars().collect();
    let last = tampered.len() - 1;
    tampered[last] = if tampered[last] == 'A' { 'B' } else { 'A' };
    let tampered: String = tampered.into_iter().collect();

    for _ in 0..3 {
        let response = test_app(&state)
            .oneshot(get_request("/whoami", Some(&tampered)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error_code"], "malformed_session_cookie");
        // The diagnostic never echoes the token back.
        assert!(!json["error"].as_str().unwrap().contains(&tampered));
    }
}

#[tokio::test]
async fn test_revocation_invalidates_valid_cookie() {
    let state = test_state();
    let identity = Identity::new(Uuid::new_v4(), CapabilitySet::ADMINISTRATOR, "Root");
    let set_cookie = state.issue_session_cookie(&identity).unwrap();
    let app = test_app(&state);

    let response = app
        .clone()
        .oneshot(get_request("/whoami", Some(cookie_pair(&set_cookie))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    state.revocations().revoke(identity.id);

    let response = app
        .oneshot(get_request("/whoami", Some(cookie_pair(&set_cookie))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error_code"], "revoked_identity");
}

#[tokio::test]
async fn test_logout_cookie_clears_session() {
    let state = test_state();
    let cleared = state.clear_session_cookie();
    assert!(cleared.contains("Max-Age=0"));

    // A cleared cookie carries an empty token; the middleware rejects it
    // rather than treating it as anonymous, which is what forces clients to
    // actually drop the cookie.
    let response = test_app(&state)
        .oneshot(get_request("/whoami", Some(cookie_pair(&cleared))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_cross_contaminate() {
    let state = test_state();
    let app = test_app(&state);

    let mut tasks = Vec::new();
    for n in 0..32 {
        let app = app.clone();
        let name = format!("user-{n}");
        let identity = Identity::new(Uuid::new_v4(), CapabilitySet::VOLUNTEER, name.clone());
        let set_cookie = state.issue_session_cookie(&identity).unwrap();

        tasks.push(tokio::spawn(async move {
            let response = app
                .oneshot(get_request("/whoami", Some(cookie_pair(&set_cookie))))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["display_name"], name);
            assert_eq!(json["id"], identity.id.to_string());
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}

#[tokio::test]
async fn test_keys_persist_across_restart() {
    let dir = tempfile::tempdir().unwrap();

    // First "process" issues a cookie.
    let keys = SecretKeyPair::load_or_generate(dir.path()).unwrap();
    let state = AuthState::new(&keys);
    let identity = Identity::new(Uuid::new_v4(), CapabilitySet::VOLUNTEER, "Ada");
    let set_cookie = state.issue_session_cookie(&identity).unwrap();

    // Second "process" reloads the same key files and still accepts it.
    let keys = SecretKeyPair::load_or_generate(dir.path()).unwrap();
    let restarted = AuthState::new(&keys);
    let response = test_app(&restarted)
        .oneshot(get_request("/whoami", Some(cookie_pair(&set_cookie))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["display_name"], "Ada");
}
