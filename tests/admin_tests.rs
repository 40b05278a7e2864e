mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TEST_ADMIN_KEY, bearer, error_code, login, register, request, spawn_app};

#[tokio::test]
async fn admin_routes_reject_missing_or_wrong_key() {
    let t = spawn_app().await;

    let (status, body) = request(&t.app, "POST", "/admin/sessions/purge", &[], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "UNAUTHENTICATED");

    let (status, _) = request(
        &t.app,
        "POST",
        "/admin/sessions/purge",
        &[("x-admin-key", "wrong")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A valid bearer token is not an admin credential.
    register(&t.app, "user@x.com", "pw123", "U").await;
    let (_, body) = login(&t.app, "user@x.com", "pw123").await;
    let auth_header = bearer(body["token"].as_str().unwrap());
    let (status, _) = request(
        &t.app,
        "POST",
        "/admin/sessions/purge",
        &[("authorization", &auth_header)],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    t.cleanup();
}

#[tokio::test]
async fn purge_all_invalidates_every_outstanding_token() {
    let t = spawn_app().await;
    register(&t.app, "p1@x.com", "pw123", "P1").await;
    register(&t.app, "p2@x.com", "pw123", "P2").await;
    let (_, b1) = login(&t.app, "p1@x.com", "pw123").await;
    let (_, b2) = login(&t.app, "p2@x.com", "pw123").await;

    let (status, body) = request(
        &t.app,
        "POST",
        "/admin/sessions/purge",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Two registration sessions plus two logins.
    assert_eq!(body["deleted"], 4);

    for token_body in [b1, b2] {
        let auth_header = bearer(token_body["token"].as_str().unwrap());
        let (status, body) = request(
            &t.app,
            "GET",
            "/auth/me",
            &[("authorization", &auth_header)],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), "SESSION_NOT_FOUND");
    }

    t.cleanup();
}

#[tokio::test]
async fn purge_for_one_account_leaves_others_alone() {
    let t = spawn_app().await;
    register(&t.app, "gone@x.com", "pw123", "Gone").await;
    register(&t.app, "kept@x.com", "pw123", "Kept").await;
    let (_, gone) = login(&t.app, "gone@x.com", "pw123").await;
    let (_, kept) = login(&t.app, "kept@x.com", "pw123").await;

    let (status, _) = request(
        &t.app,
        "POST",
        "/admin/sessions/purge-account",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        Some(json!({ "email": "gone@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let gone_auth = bearer(gone["token"].as_str().unwrap());
    let (status, _) = request(
        &t.app,
        "GET",
        "/auth/me",
        &[("authorization", &gone_auth)],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let kept_auth = bearer(kept["token"].as_str().unwrap());
    let (status, _) = request(
        &t.app,
        "GET",
        "/auth/me",
        &[("authorization", &kept_auth)],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Unknown email is a 404, not a silent no-op.
    let (status, body) = request(
        &t.app,
        "POST",
        "/admin/sessions/purge-account",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        Some(json!({ "email": "nobody@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "ACCOUNT_NOT_FOUND");

    t.cleanup();
}

#[tokio::test]
async fn list_logins_reports_email_and_subscription() {
    let t = spawn_app().await;
    register(&t.app, "zz@x.com", "pw123", "Z").await;
    register(&t.app, "aa@x.com", "pw123", "A").await;

    let (status, body) = request(
        &t.app,
        "GET",
        "/admin/logins",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logins = body["logins"].as_array().unwrap();
    assert_eq!(logins.len(), 2);
    assert_eq!(logins[0]["email"], "aa@x.com");
    assert_eq!(logins[1]["email"], "zz@x.com");
    assert!(logins[0].get("password_hash").is_none());

    t.cleanup();
}

#[tokio::test]
async fn external_id_link_and_lookup() {
    let t = spawn_app().await;
    register(&t.app, "ext@x.com", "pw123", "Ext").await;
    register(&t.app, "other@x.com", "pw123", "Other").await;

    let (status, _) = request(
        &t.app,
        "POST",
        "/admin/external-id",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        Some(json!({ "email": "ext@x.com", "external_id": "tg-1001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The same external id cannot be linked to a second account.
    let (status, body) = request(
        &t.app,
        "POST",
        "/admin/external-id",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        Some(json!({ "email": "other@x.com", "external_id": "tg-1001" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "EXTERNAL_ID_TAKEN");

    let (status, profile) = request(
        &t.app,
        "POST",
        "/admin/external-id/lookup",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        Some(json!({ "external_id": "tg-1001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "ext@x.com");
    assert!(profile.get("password_hash").is_none());

    let (status, _) = request(
        &t.app,
        "POST",
        "/admin/external-id/lookup",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        Some(json!({ "external_id": "tg-9999" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    t.cleanup();
}

#[tokio::test]
async fn a_connection_cap_below_one_is_rejected() {
    let t = spawn_app().await;
    register(&t.app, "floor@x.com", "pw123", "Floor").await;

    for bad in [0, -3] {
        let (status, body) = request(
            &t.app,
            "POST",
            "/admin/max-connections",
            &[("x-admin-key", TEST_ADMIN_KEY)],
            Some(json!({ "email": "floor@x.com", "max_connections": bad })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "VALIDATION");
    }

    // The stored cap is untouched by the rejected writes.
    let account = t
        .state
        .account_store
        .find_by_email("floor@x.com")
        .await
        .expect("lookup failed")
        .expect("missing account");
    assert_eq!(account.max_connections, 20);

    t.cleanup();
}

#[tokio::test]
async fn subscription_can_be_set_and_cleared() {
    let t = spawn_app().await;
    register(&t.app, "s@x.com", "pw123", "S").await;

    let past = (chrono::Utc::now() - chrono::Duration::days(2)).to_rfc3339();
    let (status, _) = request(
        &t.app,
        "POST",
        "/admin/subscription",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        Some(json!({ "email": "s@x.com", "subscribed_until": past })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(&t.app, "s@x.com", "pw123").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "SUBSCRIPTION_EXPIRED");

    // Clearing the expiry lifts the gate.
    let (status, _) = request(
        &t.app,
        "POST",
        "/admin/subscription",
        &[("x-admin-key", TEST_ADMIN_KEY)],
        Some(json!({ "email": "s@x.com", "subscribed_until": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = login(&t.app, "s@x.com", "pw123").await;
    assert_eq!(status, StatusCode::OK);

    t.cleanup();
}
