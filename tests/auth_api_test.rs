mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::{setup_app, signed_init_data, user_json, InMemoryUsers};
use oil_miniapp_backend::{models::settings::Settings, middleware::auth::SessionClaims};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn login(router: &Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/telegram")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn valid_init_data_registers_and_issues_token() {
    let app = setup_app(InMemoryUsers::default());
    let user = user_json(4242, "Ann", Some("ann"));
    let init_data = signed_init_data(&[("auth_date", "1700000000"), ("user", &user)]);

    let before = chrono::Utc::now().timestamp();
    let (status, body) = login(&app.router, json!({ "initData": init_data })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["tgId"], 4242);
    assert_eq!(body["user"]["nickName"], "Ann");
    assert_eq!(body["user"]["referralCode"].as_str().unwrap().len(), 8);
    let expires_in = body["expiresIn"].as_i64().unwrap();
    assert!(expires_in >= before + 3600 && expires_in <= before + 3602);

    let claims: SessionClaims = app
        .sessions
        .decode(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.user.id, 4242);
    assert_eq!(app.users.count(), 1);
}

#[tokio::test]
async fn second_login_returns_same_user() {
    let app = setup_app(InMemoryUsers::default());
    let user = user_json(7, "Bob", None);
    let init_data = signed_init_data(&[("auth_date", "1700000000"), ("user", &user)]);

    let (_, first) = login(&app.router, json!({ "initData": init_data })).await;
    let (status, second) = login(&app.router, json!({ "initData": init_data })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["id"], second["user"]["id"]);
    assert_eq!(first["user"]["referralCode"], second["user"]["referralCode"]);
    assert_eq!(app.users.count(), 1);
}

#[tokio::test]
async fn tampered_init_data_is_rejected() {
    let app = setup_app(InMemoryUsers::default());
    let user = user_json(7, "Bob", None);
    let init_data = signed_init_data(&[("auth_date", "1700000000"), ("user", &user)])
        .replace("1700000000", "1700000001");

    let (status, body) = login(&app.router, json!({ "initData": init_data })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_init_data");
    assert_eq!(app.users.count(), 0);
}

#[tokio::test]
async fn empty_init_data_fails_validation() {
    let app = setup_app(InMemoryUsers::default());
    let (status, _) = login(&app.router, json!({ "initData": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn init_data_without_user_is_a_bad_request() {
    let app = setup_app(InMemoryUsers::default());
    let init_data = signed_init_data(&[("auth_date", "1700000000")]);
    let (status, _) = login(&app.router, json!({ "initData": init_data })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn referral_code_credits_both_players_and_notifies_referrer() {
    let users = InMemoryUsers::with_settings(Settings {
        referral_reward: 500,
        referrer_reward: 1000,
    });
    users.insert(1, "INVITE01", 2);
    let app = setup_app(users);

    let user = user_json(2, "Carl", Some("carl"));
    let init_data = signed_init_data(&[("auth_date", "1700000000"), ("user", &user)]);
    let (status, body) = login(
        &app.router,
        json!({ "initData": init_data, "referralCode": "INVITE01" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["balance"], 500);
    assert_eq!(body["user"]["EnterReferralCode"], "INVITE01");
    assert_eq!(app.users.get(1).unwrap().balance, 1000);

    let sent = app.bot.sent.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![(
            1,
            "Congratulations🥳\nYour friend @carl has successfully joined!".to_string()
        )]
    );
}

#[tokio::test]
async fn start_param_is_used_when_body_has_no_code() {
    let users = InMemoryUsers::with_settings(Settings {
        referral_reward: 10,
        referrer_reward: 20,
    });
    users.insert(1, "INVITE01", 1);
    let app = setup_app(users);

    let user = user_json(3, "Dina", None);
    let init_data = signed_init_data(&[
        ("auth_date", "1700000000"),
        ("start_param", "INVITE01"),
        ("user", &user),
    ]);
    let (status, body) = login(&app.router, json!({ "initData": init_data })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["balance"], 10);
    assert_eq!(app.users.get(1).unwrap().balance, 20);
    let sent = app.bot.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("Your friend Dina has"));
}
