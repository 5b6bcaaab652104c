// Directory REST API with Axum
//
// Plain JSON bodies, no envelope: list endpoints return arrays, the detail
// endpoint returns the company object, and failures return {"error": "..."}.

use crate::db;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Run a store query under the connection lock, logging failures.
fn with_db<T>(
    state: &AppState,
    what: &str,
    query: impl FnOnce(&Connection) -> anyhow::Result<T>,
) -> Result<T, ApiError> {
    let conn = state.db.lock().map_err(|_| {
        error!("database lock poisoned while getting {}", what);
        ApiError::Internal("Database unavailable".to_string())
    })?;

    query(&conn).map_err(|e| {
        error!(error = %e, "Error getting {}", what);
        ApiError::Internal(format!("Error getting {}", what))
    })
}

/// `limit` is dropped rather than rejected when it isn't a number SQLite
/// accepts.
#[derive(Debug, Default, Deserialize)]
pub struct CompanyParams {
    search: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FounderParams {
    search: Option<String>,
    company: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json("OK")
}

/// GET /api/companies - Company profiles, optionally searched and limited
async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<CompanyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params
        .limit
        .as_deref()
        .and_then(|l| l.trim().parse::<i64>().ok())
        .and_then(|l| usize::try_from(l).ok());

    let companies = with_db(&state, "companies", |conn| {
        db::list_companies(conn, params.search.as_deref(), limit)
    })?;

    Ok(Json(companies))
}

/// GET /api/companies/:id - One company with its linked founders
async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    match with_db(&state, "company", |conn| db::get_company(conn, id))? {
        Some(company) => Ok(Json(company)),
        None => Err(ApiError::NotFound("Company not found")),
    }
}

/// GET /api/founders (and the older /api/members) - Founders by company
async fn list_founders(
    State(state): State<AppState>,
    Query(params): Query<FounderParams>,
) -> Result<impl IntoResponse, ApiError> {
    let founders = with_db(&state, "founders", |conn| {
        db::list_founders(conn, params.search.as_deref(), params.company.as_deref())
    })?;

    Ok(Json(founders))
}

/// GET /api/stats - Totals, batch counts and top companies
async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = with_db(&state, "stats", db::get_stats)?;
    Ok(Json(stats))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/companies", get(list_companies))
        .route("/companies/:id", get(get_company))
        .route("/founders", get(list_founders))
        .route("/members", get(list_founders))
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_companies, insert_founders, setup_database, CompanyRecord, FounderRecord};
    use crate::models::{Company, Founder, Stats};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn seeded_app() -> Router {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let company = |name: &str, batch: &str, slug: &str| CompanyRecord {
            name: name.to_string(),
            batch: Some(batch.to_string()),
            description: None,
            website: None,
            location: None,
            industry: None,
            is_hiring: Some("1".to_string()),
            yc_url: Some(format!("https://www.ycombinator.com/companies/{}", slug)),
        };
        insert_companies(
            &conn,
            &[
                company("Acme\nSan Francisco, CA, USA", "W21", "acme"),
                company("Zeta", "S20", "zeta"),
            ],
        )
        .unwrap();

        let founder = |company_name: &str, name: &str| FounderRecord {
            company_name: company_name.to_string(),
            name: name.to_string(),
            role: None,
            previous_company: None,
            linkedin_url: None,
            twitter_url: None,
            yc_profile_url: None,
            bio: None,
            email: None,
        };
        insert_founders(&conn, &[founder("Acme", "Al"), founder("Acme", "Ann")]).unwrap();

        router(AppState::new(conn))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(seeded_app(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_companies_list_and_search() {
        let (status, body) = get_json(seeded_app(), "/api/companies").await;
        assert_eq!(status, StatusCode::OK);

        let companies: Vec<Company> = serde_json::from_value(body).unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].name, "Acme");

        let (_, body) = get_json(seeded_app(), "/api/companies?search=zet&limit=5").await;
        let companies: Vec<Company> = serde_json::from_value(body).unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Zeta");
    }

    #[tokio::test]
    async fn test_companies_bad_limit_is_ignored() {
        let (status, body) = get_json(seeded_app(), "/api/companies?limit=lots").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_companies_out_of_range_limit_is_ignored() {
        let (status, body) = get_json(seeded_app(), "/api/companies?limit=18446744073709551615").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));

        let (status, body) = get_json(seeded_app(), "/api/companies?limit=-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_company_without_founders_has_empty_array() {
        let (status, body) = get_json(seeded_app(), "/api/companies/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Zeta");
        assert_eq!(body["founders"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_company_detail_and_not_found() {
        let (status, body) = get_json(seeded_app(), "/api/companies/1").await;
        assert_eq!(status, StatusCode::OK);

        let company: Company = serde_json::from_value(body).unwrap();
        assert_eq!(company.display_name(), "Acme");
        assert_eq!(company.founders.len(), 2);

        let (status, body) = get_json(seeded_app(), "/api/companies/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Company not found");
    }

    #[tokio::test]
    async fn test_founders_and_members_alias() {
        let (_, founders) = get_json(seeded_app(), "/api/founders?search=ann").await;
        let founders: Vec<Founder> = serde_json::from_value(founders).unwrap();
        assert_eq!(founders.len(), 1);
        assert_eq!(founders[0].name, "Ann");

        let (status, members) = get_json(seeded_app(), "/api/members").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(members.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_stats() {
        let (status, body) = get_json(seeded_app(), "/api/stats").await;
        assert_eq!(status, StatusCode::OK);

        let stats: Stats = serde_json::from_value(body).unwrap();
        assert_eq!(stats.total_companies, 2);
        assert_eq!(stats.total_founders, 2);
        assert_eq!(stats.companies_with_founders, 1);
        assert_eq!(stats.batch_stats.len(), 2);
    }
}
