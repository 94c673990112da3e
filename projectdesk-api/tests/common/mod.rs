//! Common test utilities for integration tests
//!
//! Every test builds its own `TestContext`. Rows it creates carry a per-context
//! tag in their email so tests can share one database and clean up after
//! themselves.
//!
//! Requires `DATABASE_URL` to point at a PostgreSQL server. `JWT_SECRET`
//! falls back to a fixed test key.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use projectdesk_api::app::{build_router, AppState};
use projectdesk_api::config::Config;
use projectdesk_shared::auth::jwt::{create_token, Claims, SessionUser};
use projectdesk_shared::auth::middleware::SESSION_COOKIE;
use projectdesk_shared::auth::password::hash_password;
use projectdesk_shared::auth::throttle::MemoryAttemptStore;
use projectdesk_shared::db::migrations::{ensure_database_exists, run_migrations};
use projectdesk_shared::models::developer::{CreateDeveloper, Developer};
use projectdesk_shared::models::team_lead::{CreateTeamLead, TeamLead};
use projectdesk_shared::models::user::{CreateRegisteredUser, RegisteredUser, Role};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Password that satisfies the strength rules for the generated names
pub const TEST_PASSWORD: &str = "Str0ng!Passw0rd";

/// A registered user with a ready-made session token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user: RegisteredUser,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> i32 {
        self.user.reg_id
    }

    /// `Cookie` header value carrying the session
    pub fn cookie(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.token)
    }
}

/// A Developer login together with its directory entry
#[derive(Debug, Clone)]
pub struct TestDeveloper {
    pub login: TestUser,
    pub profile: Developer,
}

impl TestDeveloper {
    pub fn id(&self) -> i32 {
        self.profile.developer_id
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
    tag: String,
    counter: AtomicUsize,
}

/// Response status with the parsed JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestContext {
    /// Connects, migrates and builds a router with an in-memory throttle
    pub async fn new() -> anyhow::Result<Self> {
        if std::env::var("JWT_SECRET").is_err() {
            std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);
        }
        let config = Config::from_env()?;

        ensure_database_exists(&config.database.url).await?;
        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let attempts = Arc::new(MemoryAttemptStore::new(config.throttle_policy()));
        let app = build_router(AppState::new(db.clone(), config.clone(), attempts));

        Ok(Self {
            db,
            app,
            config,
            tag: Uuid::new_v4().simple().to_string(),
            counter: AtomicUsize::new(0),
        })
    }

    /// Unique email scoped to this context
    pub fn email(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}@example.com", prefix, n, self.tag)
    }

    /// Registers a user with a role and signs a session for them
    ///
    /// The user has no password; use [`TestContext::signed_up_user`] for
    /// login tests.
    pub async fn user(&self, role: Role) -> anyhow::Result<TestUser> {
        let user = RegisteredUser::create(
            &self.db,
            CreateRegisteredUser {
                first_name: "test".to_string(),
                last_name: "user".to_string(),
                email: self.email(&role.as_str().replace(' ', "").to_lowercase()),
                role,
            },
        )
        .await?;

        self.session_for(user)
    }

    /// Registers a user who has completed sign-up with [`TEST_PASSWORD`]
    pub async fn signed_up_user(&self, role: Role) -> anyhow::Result<TestUser> {
        let registered = self.user(role).await?;
        let hash = hash_password(TEST_PASSWORD)?;
        let user = RegisteredUser::complete_sign_up(&self.db, &registered.user.email, &hash)
            .await?
            .ok_or_else(|| anyhow::anyhow!("sign-up did not apply"))?;

        self.session_for(user)
    }

    pub fn session_for(&self, user: RegisteredUser) -> anyhow::Result<TestUser> {
        let claims = Claims::new(SessionUser::from(&user));
        let token = create_token(&claims, &self.config.jwt.secret)?;
        Ok(TestUser { user, token })
    }

    /// Team lead directory entry
    pub async fn team_lead_entry(&self) -> anyhow::Result<TeamLead> {
        Ok(TeamLead::create(
            &self.db,
            CreateTeamLead {
                first_name: "team".to_string(),
                last_name: "lead".to_string(),
                email: self.email("lead"),
            },
        )
        .await?)
    }

    /// Developer login plus a directory entry with the same email
    pub async fn developer(&self) -> anyhow::Result<TestDeveloper> {
        let team_lead = self.team_lead_entry().await?;
        let login = self.user(Role::Developer).await?;

        let profile = Developer::create(
            &self.db,
            CreateDeveloper {
                first_name: "dev".to_string(),
                last_name: "eloper".to_string(),
                email: login.user.email.clone(),
                expertise: "Rust".to_string(),
                department: "Engineering".to_string(),
                team_lead_id: team_lead.team_lead_id,
            },
        )
        .await?;

        Ok(TestDeveloper { login, profile })
    }

    /// Sends a request through the router
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        as_user: Option<&TestUser>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = as_user {
            builder = builder.header(header::COOKIE, user.cookie());
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, as_user: &TestUser) -> TestResponse {
        self.send(Method::GET, uri, Some(as_user), None).await
    }

    pub async fn post(&self, uri: &str, as_user: &TestUser, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(as_user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, as_user: &TestUser, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(as_user), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, as_user: &TestUser, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(as_user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, as_user: &TestUser) -> TestResponse {
        self.send(Method::DELETE, uri, Some(as_user), None).await
    }

    /// Proposes one project for `developer` and returns its id
    pub async fn propose(&self, team_lead: &TestUser, developer: &TestDeveloper) -> i32 {
        let response = self
            .post(
                "/v1/projects",
                team_lead,
                serde_json::json!({
                    "name": "Billing",
                    "description": "Invoices and receipts",
                    "duration": "3 months",
                    "developer_ids": [developer.id()],
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        project_id(&response.body["projects"][0])
    }

    /// Proposes a project and has a CEO approve it
    pub async fn approved_project(&self, team_lead: &TestUser, developer: &TestDeveloper) -> i32 {
        let id = self.propose(team_lead, developer).await;
        let ceo = self.user(Role::Ceo).await.expect("ceo");

        let response = self
            .put(
                &format!("/v1/projects/{}/review", id),
                &ceo,
                serde_json::json!({ "status": "Approved" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        id
    }

    /// Creates a module on an approved project and returns its id
    pub async fn module(&self, developer: &TestDeveloper, project_id: i32) -> i32 {
        let response = self
            .post(
                "/v1/modules",
                &developer.login,
                serde_json::json!({
                    "project_id": project_id,
                    "name": "Invoice export",
                    "description": "CSV export of invoices",
                    "start_date": "2024-03-01",
                    "end_date": "2024-03-15",
                    "cost": 250000,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["module"]["module_id"]
            .as_i64()
            .expect("module id") as i32
    }

    /// Deletes every row this context created
    ///
    /// Projects cascade to modules and finance records.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let pattern = format!("%{}%", self.tag);

        sqlx::query(
            "DELETE FROM project WHERE created_by IN (SELECT reg_id FROM reg_users WHERE email LIKE $1)",
        )
        .bind(&pattern)
        .execute(&self.db)
        .await?;
        sqlx::query("DELETE FROM developer WHERE email LIKE $1")
            .bind(&pattern)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM team_lead WHERE email LIKE $1")
            .bind(&pattern)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM reg_users WHERE email LIKE $1")
            .bind(&pattern)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

pub fn project_id(project: &Value) -> i32 {
    project["project_id"].as_i64().expect("project id") as i32
}
