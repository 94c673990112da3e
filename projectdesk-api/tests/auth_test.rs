/// Integration tests for accounts and sessions
///
/// - Registration and sign-up
/// - Login, cookie sessions and logout
/// - Failed login lockout
/// - Staff directory administration

mod common;

use axum::http::{header, Method, StatusCode};
use common::{TestContext, TEST_PASSWORD};
use projectdesk_shared::models::user::Role;
use serde_json::json;

#[tokio::test]
async fn test_register_then_sign_up() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.user(Role::Admin).await.unwrap();
    let email = ctx.email("finance");

    let response = ctx
        .post(
            "/v1/users",
            &admin,
            json!({
                "first_name": "ada",
                "last_name": "lovelace",
                "email": email,
                "role": "Finance",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["user"]["signed_up"], false);

    let lookup = format!("/v1/users/lookup?email={}", email);
    let response = ctx.send(Method::GET, &lookup, None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["signed_up"], false);

    let response = ctx
        .send(
            Method::PUT,
            "/v1/users/signup",
            None,
            Some(json!({ "email": email, "password": TEST_PASSWORD, "confirm_password": "different" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["details"][0]["field"], "confirm_password");

    // Contains the last name
    let response = ctx
        .send(
            Method::PUT,
            "/v1/users/signup",
            None,
            Some(json!({ "email": email, "password": "Lovelace#2024", "confirm_password": "Lovelace#2024" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["details"][0]["field"], "password");

    let signup = json!({ "email": email, "password": TEST_PASSWORD, "confirm_password": TEST_PASSWORD });
    let response = ctx
        .send(Method::PUT, "/v1/users/signup", None, Some(signup.clone()))
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["user"]["signed_up"], true);

    let response = ctx.send(Method::PUT, "/v1/users/signup", None, Some(signup)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_registration_rules() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.user(Role::Admin).await.unwrap();
    let ceo = ctx.user(Role::Ceo).await.unwrap();
    let email = ctx.email("dup");

    let body = json!({
        "first_name": "grace",
        "last_name": "hopper",
        "email": email,
        "role": "CEO",
    });

    let response = ctx.post("/v1/users", &ceo, body.clone()).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = ctx.post("/v1/users", &admin, body.clone()).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = ctx.post("/v1/users", &admin, body).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = ctx
        .post(
            "/v1/users",
            &admin,
            json!({
                "first_name": "Grace",
                "last_name": "hopper2",
                "email": "not-an-email",
                "role": "CEO",
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["details"].as_array().unwrap().len(), 3);

    let response = ctx
        .send(Method::GET, "/v1/users/lookup", None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let ctx = TestContext::new().await.unwrap();
    let ceo = ctx.signed_up_user(Role::Ceo).await.unwrap();

    let response = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": ceo.user.email, "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["user"]["role"], "CEO");
    assert!(response.body.get("token").is_none());

    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("authToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=7200"));

    let response = ctx.get("/v1/auth/me", &ceo).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["email"], ceo.user.email.as_str());

    let response = ctx.send(Method::POST, "/v1/auth/logout", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_login_requires_completed_sign_up() {
    let ctx = TestContext::new().await.unwrap();
    let pending = ctx.user(Role::Developer).await.unwrap();

    let response = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": pending.user.email, "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body["message"],
        "Account not fully set up. Please complete sign-up."
    );

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.signed_up_user(Role::Finance).await.unwrap();
    let wrong = json!({ "email": user.user.email, "password": "Wr0ng!Password" });

    for _ in 0..2 {
        let response = ctx
            .send(Method::POST, "/v1/auth/login", None, Some(wrong.clone()))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = ctx
        .send(Method::POST, "/v1/auth/login", None, Some(wrong))
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers.contains_key(header::RETRY_AFTER));
    assert!(response.body["message"]
        .as_str()
        .unwrap()
        .contains("15 minutes"));

    // The right password does not bypass the lock
    let response = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": user.user.email, "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_staff_directory() {
    let ctx = TestContext::new().await.unwrap();
    let admin = ctx.user(Role::Admin).await.unwrap();
    let lead_email = ctx.email("tl");

    let response = ctx
        .post(
            "/v1/team-leads",
            &admin,
            json!({ "first_name": "linus", "last_name": "torvalds", "email": lead_email }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let team_lead_id = response.body["team_lead"]["team_lead_id"].as_i64().unwrap();

    let response = ctx
        .put(
            &format!("/v1/team-leads/{}", team_lead_id),
            &admin,
            json!({ "last_name": "benedict" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["team_lead"]["first_name"], "linus");
    assert_eq!(response.body["team_lead"]["last_name"], "benedict");

    let response = ctx
        .post(
            "/v1/developers",
            &admin,
            json!({
                "first_name": "ken",
                "last_name": "thompson",
                "email": ctx.email("dev"),
                "expertise": "C",
                "department": "Systems",
                "team_lead_id": i32::MAX,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .post(
            "/v1/developers",
            &admin,
            json!({
                "first_name": "ken",
                "last_name": "thompson",
                "email": ctx.email("dev"),
                "expertise": "C",
                "department": "Systems",
                "team_lead_id": team_lead_id,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["developer"]["assigned_team_lead"], team_lead_id);

    let response = ctx
        .put("/v1/developers/2147483647", &admin, json!({ "expertise": "Go" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = ctx.get("/v1/developers", &admin).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["developers"].is_array());

    ctx.cleanup().await.unwrap();
}
