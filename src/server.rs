// Stockroom - Web server
// REST surface over the shared database handle. Success responses are the
// bare JSON encoding of the payload; failures all flow through `ApiError`.

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::api::{LoginRequest, LoginResponse, MeResponse, TestResponse, UserInfo, TEST_MESSAGE};
use crate::auth::SessionStore;
use crate::db::Database;
use crate::entities::{EntityKind, Material, NamedEntity};
use crate::error::ApiError;
use crate::schema;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState {
            db,
            sessions: SessionStore::new(),
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/repair-men
async fn list_repair_men(
    State(state): State<AppState>,
) -> Result<Json<Vec<NamedEntity>>, ApiError> {
    Ok(Json(state.db.list_all(EntityKind::Repairman).await?))
}

/// GET /api/buyers
async fn list_buyers(State(state): State<AppState>) -> Result<Json<Vec<NamedEntity>>, ApiError> {
    Ok(Json(state.db.list_all(EntityKind::Buyer).await?))
}

/// GET /api/suppliers
async fn list_suppliers(State(state): State<AppState>) -> Result<Json<Vec<NamedEntity>>, ApiError> {
    Ok(Json(state.db.list_all(EntityKind::Supplier).await?))
}

/// GET /api/materials
async fn list_materials(State(state): State<AppState>) -> Result<Json<Vec<Material>>, ApiError> {
    Ok(Json(state.db.list_materials().await?))
}

/// GET /api/units - Units of measure in declaration order
async fn list_units() -> Result<Json<Vec<&'static str>>, ApiError> {
    Ok(Json(schema::enumeration_values(schema::UNITS_OF_MEASURE)?))
}

/// GET /api/test - Liveness probe
async fn api_test() -> Json<TestResponse> {
    Json(TestResponse {
        message: TEST_MESSAGE.to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /api/me - Identity behind the presented session token
async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<MeResponse>, ApiError> {
    let user = authenticated_user(&state, &headers)?;
    Ok(Json(MeResponse {
        id: user.id,
        name: user.username,
    }))
}

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let account = state
        .db
        .find_user(&request.username)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    if !account.verify_password(&request.password) {
        return Err(ApiError::InvalidCredentials);
    }

    let user = UserInfo {
        id: account.id,
        username: account.username,
        role: account.role,
    };
    let token = state.sessions.issue(user.clone());
    info!("session opened for {}", user.username);

    Ok(Json(LoginResponse {
        token: Some(token),
        user: Some(user),
    }))
}

/// POST /api/logout
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthenticated)?;
    if state.sessions.revoke(token) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::Unauthenticated)
    }
}

fn authenticated_user(state: &AppState, headers: &HeaderMap) -> Result<UserInfo, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthenticated)?;
    state
        .sessions
        .resolve(token)
        .ok_or(ApiError::Unauthenticated)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

// ============================================================================
// Router
// ============================================================================

pub fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/repair-men", get(list_repair_men))
        .route("/buyers", get(list_buyers))
        .route("/suppliers", get(list_suppliers))
        .route("/materials", get(list_materials))
        .route("/units", get(list_units))
        .route("/test", get(api_test))
        .route("/me", get(me))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::api::ErrorBody;
    use crate::db::{insert_entity, insert_material, insert_user};
    use crate::entities::User;
    use crate::error::StoreError;
    use crate::schema::{Role, UnitOfMeasure};

    fn empty_state() -> AppState {
        AppState::new(Database::open_in_memory(Duration::from_secs(5)).unwrap())
    }

    fn seeded_state() -> AppState {
        let state = empty_state();
        state
            .db
            .with_conn(|conn| {
                for name in ["Petro Kovalenko", "Olena Shevchenko"] {
                    insert_entity(conn, EntityKind::Repairman, &NamedEntity::new(name))?;
                }
                for name in ["Budmat Trading", "OfficeMart"] {
                    insert_entity(conn, EntityKind::Buyer, &NamedEntity::new(name))?;
                }
                for name in ["Dnipro Metals", "TechPostach"] {
                    insert_entity(conn, EntityKind::Supplier, &NamedEntity::new(name))?;
                }
                insert_material(conn, &Material::new("Copper wire", UnitOfMeasure::Meter))?;
                insert_material(conn, &Material::new("Hydraulic oil", UnitOfMeasure::Liter))?;
                insert_user(conn, &User::new("admin", "sup3rs3cret", Role::Admin))
            })
            .unwrap();
        state
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn send_get(state: &AppState, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        send(state, request).await
    }

    async fn send_get_auth(state: &AppState, path: &str, token: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .uri(path)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        send(state, request).await
    }

    async fn send_post(
        state: &AppState,
        path: &str,
        payload: serde_json::Value,
    ) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        send(state, request).await
    }

    async fn login_token(state: &AppState) -> String {
        let (status, body) = send_post(
            state,
            "/api/login",
            json!({"username": "admin", "password": "sup3rs3cret"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let login: LoginResponse = serde_json::from_slice(&body).unwrap();
        login.token.expect("login should issue a token")
    }

    #[tokio::test]
    async fn empty_lists_serialize_as_bare_arrays() {
        let state = empty_state();
        for path in [
            "/api/repair-men",
            "/api/buyers",
            "/api/suppliers",
            "/api/materials",
        ] {
            let (status, body) = send_get(&state, path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, b"[]");
        }
    }

    #[tokio::test]
    async fn seeded_entities_come_back_with_ids_and_names() {
        let state = seeded_state();
        let (status, body) = send_get(&state, "/api/repair-men").await;
        assert_eq!(status, StatusCode::OK);

        let entities: Vec<NamedEntity> = serde_json::from_slice(&body).unwrap();
        assert_eq!(entities.len(), 2);

        let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"Petro Kovalenko"));
        assert!(names.contains(&"Olena Shevchenko"));

        let ids: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn units_listing_preserves_declaration_order() {
        let state = empty_state();
        let (status, body) = send_get(&state, "/api/units").await;
        assert_eq!(status, StatusCode::OK);

        let units: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(units, ["PIECE", "METER", "KILOGRAM", "LITER", "SET", "PACK"]);
    }

    #[tokio::test]
    async fn materials_expose_uppercase_unit_tokens() {
        let state = seeded_state();
        let (status, body) = send_get(&state, "/api/materials").await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let units: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["unit"].as_str().unwrap())
            .collect();
        assert!(units.contains(&"METER"));
        assert!(units.contains(&"LITER"));
    }

    #[tokio::test]
    async fn test_endpoint_reports_health_with_timestamp() {
        let state = empty_state();
        let (status, body) = send_get(&state, "/api/test").await;
        assert_eq!(status, StatusCode::OK);

        let payload: TestResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.message, "API is working correctly");
        assert!(chrono::DateTime::parse_from_rfc3339(&payload.timestamp).is_ok());
    }

    #[tokio::test]
    async fn me_without_session_is_unauthorized() {
        let state = empty_state();
        let (status, body) = send_get(&state, "/api/me").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, "Not authenticated");
    }

    #[tokio::test]
    async fn stale_tokens_do_not_resolve() {
        let state = empty_state();
        let (status, _) = send_get_auth(&state, "/api/me", "not-a-real-token").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_issues_session_usable_for_me() {
        let state = seeded_state();
        let (status, body) = send_post(
            &state,
            "/api/login",
            json!({"username": "admin", "password": "sup3rs3cret"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let login: LoginResponse = serde_json::from_slice(&body).unwrap();
        let token = login.token.expect("token expected");
        let user = login.user.expect("user expected");
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, Role::Admin);

        let (status, body) = send_get_auth(&state, "/api/me", &token).await;
        assert_eq!(status, StatusCode::OK);
        let identity: MeResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(identity.name, "admin");
        assert_eq!(identity.id, user.id);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected_uniformly() {
        let state = seeded_state();
        for payload in [
            json!({"username": "admin", "password": "wrong"}),
            json!({"username": "ghost", "password": "sup3rs3cret"}),
        ] {
            let (status, body) = send_post(&state, "/api/login", payload).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);

            let error: ErrorBody = serde_json::from_slice(&body).unwrap();
            assert_eq!(error.error, "Invalid username or password");
        }
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let state = seeded_state();
        let token = login_token(&state).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/logout")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send_get_auth(&state, "/api/me", &token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn store_failures_map_to_500_with_error_body() {
        let state = empty_state();
        state
            .db
            .with_conn(|conn| {
                conn.execute("DROP TABLE repair_men", [])
                    .map_err(StoreError::from)
            })
            .unwrap();

        let (status, body) = send_get(&state, "/api/repair-men").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, "Failed to load data");
    }

    #[tokio::test]
    async fn unreachable_store_maps_to_500_with_error_body() {
        let state = empty_state();

        // Poison the connection lock so every query sees the store as gone
        let shared = state.db.conn.clone();
        std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("poisoning the connection lock");
        })
        .join()
        .unwrap_err();

        let (status, body) = send_get(&state, "/api/suppliers").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error, "Service temporarily unavailable");
    }
}
