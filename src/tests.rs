//! Integration tests for the league admin backend.

use std::sync::Arc;

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use reqwest::{redirect::Policy, Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::{IdentityClient, SessionKeys, SESSION_COOKIE};
use crate::config::Config;
use crate::db::{init_database, SqlGateway};
use crate::{create_router, AppState};

const SESSION_SECRET: &str = "test-session-secret";
const IDENTITY_KEY: &str = "sk_test_identity";
const ADMIN: &str = "user_admin";
const MEMBER: &str = "user_member";

/// Stand-in for the identity provider's user API.
async fn spawn_identity_provider() -> String {
    async fn get_user(
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, StatusCode> {
        let expected = format!("Bearer {}", IDENTITY_KEY);
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        match id.as_str() {
            "user_admin" => Ok(Json(json!({ "id": id, "public_metadata": { "role": "admin" } }))),
            "user_member" => Ok(Json(json!({ "id": id, "public_metadata": { "role": "member" } }))),
            "user_plain" => Ok(Json(json!({ "id": id, "public_metadata": {} }))),
            _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    let app = Router::new().route("/users/{id}", get(get_user));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    sessions: SessionKeys,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let identity_url = spawn_identity_provider().await;
        Self::with_identity(Some(identity_url)).await
    }

    async fn with_identity(identity_url: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let gateway = Arc::new(SqlGateway::new(pool));

        // Create config
        let config = Config {
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            session_secret: Some(SESSION_SECRET.to_string()),
            identity_url: identity_url.clone(),
            identity_secret_key: Some(IDENTITY_KEY.to_string()),
        };

        let state = AppState {
            gateway,
            identity: Arc::new(
                IdentityClient::new(identity_url, Some(IDENTITY_KEY.to_string())).unwrap(),
            ),
            sessions: Arc::new(SessionKeys::new(Some(SESSION_SECRET))),
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::builder().redirect(Policy::none()).build().unwrap(),
            base_url,
            sessions: SessionKeys::new(Some(SESSION_SECRET)),
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self, user_id: &str) -> String {
        self.sessions.issue(user_id, 3600).unwrap()
    }

    fn as_user(&self, request: RequestBuilder, user_id: &str) -> RequestBuilder {
        request.bearer_auth(self.token(user_id))
    }

    async fn get_as(&self, path: &str, user_id: &str) -> Response {
        self.as_user(self.client.get(self.url(path)), user_id)
            .send()
            .await
            .unwrap()
    }

    /// Create a row as admin and return its `data`.
    async fn create(&self, tab: &str, body: Value) -> Value {
        let resp = self
            .as_user(self.client.post(self.url(&format!("/admin/api/{}", tab))), ADMIN)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "creating {} failed", tab);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }

    async fn rows(&self, tab: &str, query: &str) -> Vec<Value> {
        let resp = self
            .get_as(&format!("/admin/api/{}{}", tab, query), ADMIN)
            .await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].as_array().unwrap().clone()
    }
}

fn location(resp: &Response) -> &str {
    resp.headers()["location"].to_str().unwrap()
}

fn league_body(name: &str, city_id: &Value, sport_id: &Value, status: &str) -> Value {
    json!({
        "name": name,
        "city_id": city_id,
        "sport_id": sport_id,
        "max_teams": 16,
        "start_date": "2025-09-01T00:00:00Z",
        "end_date": "2025-11-30T00:00:00Z",
        "registration_deadline": "2025-08-15T00:00:00Z",
        "status": status
    })
}

// ============================================================================
// Access gate
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_admin_without_session_redirects_to_sign_in() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/admin"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 307);
    assert_eq!(location(&resp), "/sign-in");
}

#[tokio::test]
async fn test_invalid_session_redirects_to_sign_in() {
    let fixture = TestFixture::new().await;

    let forged = SessionKeys::new(Some("not-the-secret"))
        .issue(ADMIN, 3600)
        .unwrap();
    let resp = fixture
        .client
        .get(fixture.url("/admin"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 307);
    assert_eq!(location(&resp), "/sign-in");
}

#[tokio::test]
async fn test_non_admin_is_sent_home() {
    let fixture = TestFixture::new().await;

    for user in [MEMBER, "user_plain"] {
        let resp = fixture.get_as("/admin", user).await;
        assert_eq!(resp.status(), 307, "{} should be redirected", user);
        assert_eq!(location(&resp), "/");
    }

    let resp = fixture.get_as("/admin/api/cities", MEMBER).await;
    assert_eq!(resp.status(), 307);
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
async fn test_admin_sees_dashboard() {
    let fixture = TestFixture::new().await;

    let resp = fixture.get_as("/admin", ADMIN).await;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["tab"], "cities");
    assert_eq!(body["data"]["loading"], false);
    assert_eq!(body["data"]["error"], Value::Null);
    assert_eq!(body["data"]["rows"], json!([]));
    assert_eq!(
        body["data"]["nav"],
        json!([
            { "label": "Home", "href": "/", "active": false },
            { "label": "Admin", "href": "/admin", "active": true }
        ])
    );
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/admin"))
        .header("cookie", format!("{}={}", SESSION_COOKIE, fixture.token(ADMIN)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_identity_failure_is_sent_home() {
    let fixture = TestFixture::new().await;

    // The identity provider answers 500 for unknown users
    let resp = fixture.get_as("/admin", "user_unknown").await;
    assert_eq!(resp.status(), 307);
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
async fn test_unconfigured_identity_closes_admin() {
    let fixture = TestFixture::with_identity(None).await;

    let resp = fixture.get_as("/admin", ADMIN).await;
    assert_eq!(resp.status(), 307);
    assert_eq!(location(&resp), "/");

    // Signed-in routes outside /admin do not need the identity service
    let resp = fixture.get_as("/api/leagues", ADMIN).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_files_bypass_the_gate() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/favicon.ico"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_league_listing_requires_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/leagues"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 307);
    assert_eq!(location(&resp), "/sign-in");

    let resp = fixture.get_as("/api/leagues", MEMBER).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], json!([]));
}

// ============================================================================
// Public views
// ============================================================================

#[tokio::test]
async fn test_sign_in_handoff() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/sign-in"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["action"], "sign-in");
    assert_eq!(body["data"]["signed_in"], false);
    assert!(body["data"]["provider_url"].as_str().unwrap().starts_with("http://"));

    let resp = fixture.get_as("/sign-up", MEMBER).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["action"], "sign-up");
    assert_eq!(body["data"]["signed_in"], true);
}

#[tokio::test]
async fn test_landing_groups_leagues_by_status() {
    let fixture = TestFixture::new().await;

    let la = fixture
        .create("cities", json!({ "name": "Los Angeles", "state": "CA", "country": "USA" }))
        .await;
    let chicago = fixture
        .create("cities", json!({ "name": "Chicago", "state": "IL", "country": "USA" }))
        .await;
    let soccer = fixture
        .create("sports", json!({ "name": "Soccer", "players_per_team": 11 }))
        .await;

    fixture
        .create("leagues", league_body("Summer Cup", &la["id"], &soccer["id"], "upcoming"))
        .await;
    fixture
        .create("leagues", league_body("Spring League", &chicago["id"], &soccer["id"], "current"))
        .await;
    fixture
        .create("leagues", league_body("Winter Classic", &chicago["id"], &soccer["id"], "past"))
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let leagues = &body["data"]["leagues"];
    assert_eq!(body["data"]["signed_in"], false);
    assert_eq!(leagues["upcoming"][0]["name"], "Summer Cup");
    assert_eq!(leagues["upcoming"][0]["cities"]["name"], "Los Angeles");
    assert_eq!(leagues["current"][0]["name"], "Spring League");
    assert_eq!(leagues["past"][0]["sports"]["name"], "Soccer");

    let resp = fixture
        .client
        .get(fixture.url("/?city=chic"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let leagues = &body["data"]["leagues"];
    assert_eq!(leagues["upcoming"], json!([]));
    assert_eq!(leagues["current"].as_array().unwrap().len(), 1);
    assert_eq!(leagues["past"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_league_listing_filters_by_status() {
    let fixture = TestFixture::new().await;

    let city = fixture.create("cities", json!({ "name": "Miami" })).await;
    let sport = fixture
        .create("sports", json!({ "name": "Basketball", "players_per_team": 5 }))
        .await;
    fixture
        .create("leagues", league_body("Open", &city["id"], &sport["id"], "upcoming"))
        .await;
    fixture
        .create("leagues", league_body("Closed", &city["id"], &sport["id"], "past"))
        .await;

    let resp = fixture.get_as("/api/leagues?status=past", MEMBER).await;
    let body: Value = resp.json().await.unwrap();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Closed"]);

    let resp = fixture.get_as("/api/leagues?status=cancelled", MEMBER).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ============================================================================
// Admin CRUD
// ============================================================================

#[tokio::test]
async fn test_city_crud() {
    let fixture = TestFixture::new().await;

    fixture.create("cities", json!({ "name": "Chicago" })).await;
    let austin = fixture
        .create("cities", json!({ "name": "Austin", "state": "TX", "country": "USA" }))
        .await;
    assert!(austin["id"].as_i64().unwrap() > 0);
    assert!(austin["created_at"].is_string());

    // Newest first, and exactly once
    let rows = fixture.rows("cities", "").await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "Austin");

    let rows = fixture.rows("cities", "?q=AUS").await;
    assert_eq!(rows.len(), 1);

    let id = austin["id"].as_i64().unwrap();
    let resp = fixture
        .as_user(
            fixture.client.patch(fixture.url(&format!("/admin/api/cities/{}", id))),
            ADMIN,
        )
        .json(&json!({ "state": "Texas" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["state"], "Texas");
    assert_eq!(body["data"]["name"], "Austin");

    let resp = fixture
        .as_user(
            fixture.client.delete(fixture.url(&format!("/admin/api/cities/{}", id))),
            ADMIN,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], id);

    let rows = fixture.rows("cities", "").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Chicago");
}

#[tokio::test]
async fn test_create_league_joins_names_and_applies_defaults() {
    let fixture = TestFixture::new().await;

    let city = fixture.create("cities", json!({ "name": "Chicago" })).await;
    let sport = fixture
        .create("sports", json!({ "name": "Basketball", "players_per_team": "5" }))
        .await;
    assert_eq!(sport["players_per_team"], 5);

    let mut body = league_body("Fall Tournament", &city["id"], &sport["id"], "upcoming");
    body.as_object_mut().unwrap().remove("status");
    let league = fixture.create("leagues", body).await;

    assert_eq!(league["status"], "upcoming");
    assert_eq!(league["image"], "https://i.imgur.com/rq0aY15.png");
    assert_eq!(league["cities"]["name"], "Chicago");
    assert_eq!(league["sports"]["name"], "Basketball");

    let resp = fixture.get_as("/admin?tab=leagues&q=fall", ADMIN).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["tab"], "leagues");
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["rows"][0]["cities"]["name"], "Chicago");
}

#[tokio::test]
async fn test_create_rejects_invalid_drafts() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/admin/api/cities")), ADMIN)
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/admin/api/teams")), ADMIN)
        .json(&json!({ "name": "Bulls" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    assert!(fixture.rows("cities", "").await.is_empty());
}

#[tokio::test]
async fn test_league_with_unknown_city_is_not_stored() {
    let fixture = TestFixture::new().await;

    let sport = fixture
        .create("sports", json!({ "name": "Hockey", "players_per_team": 6 }))
        .await;
    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/admin/api/leagues")), ADMIN)
        .json(&league_body("Ghost League", &json!(999), &sport["id"], "upcoming"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "REMOTE_ERROR");
    assert_eq!(body["error"]["message"], "Error adding league");

    assert!(fixture.rows("leagues", "").await.is_empty());
}

#[tokio::test]
async fn test_failed_delete_keeps_the_row() {
    let fixture = TestFixture::new().await;

    let city = fixture.create("cities", json!({ "name": "Denver" })).await;
    let sport = fixture
        .create("sports", json!({ "name": "Rugby", "players_per_team": 15 }))
        .await;
    fixture
        .create("leagues", league_body("Mile High", &city["id"], &sport["id"], "current"))
        .await;

    let resp = fixture
        .as_user(
            fixture
                .client
                .delete(fixture.url(&format!("/admin/api/cities/{}", city["id"]))),
            ADMIN,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Error deleting city");

    let rows = fixture.rows("cities", "").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Denver");
}

#[tokio::test]
async fn test_missing_rows_are_not_found() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .as_user(fixture.client.patch(fixture.url("/admin/api/sports/77")), ADMIN)
        .json(&json!({ "name": "Polo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .as_user(fixture.client.delete(fixture.url("/admin/api/sports/77")), ADMIN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_entry_form_creates_and_redirects() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/admin/sports/new")), ADMIN)
        .form(&[
            ("name", "Volleyball"),
            ("description", "Indoor"),
            ("players_per_team", "6"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin?tab=sports");

    let rows = fixture.rows("sports", "").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["players_per_team"], 6);

    let resp = fixture
        .as_user(fixture.client.post(fixture.url("/admin/sports/new")), ADMIN)
        .form(&[("name", "Polo"), ("players_per_team", "four")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "players_per_team: must be an integer");
    assert_eq!(fixture.rows("sports", "").await.len(), 1);
}
