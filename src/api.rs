// Address Book - REST API
// Axum routes over a shared EntityStore

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ApiConfig;
use crate::entities::Entity;
use crate::error::{StoreError, StoreResult};
use crate::query::{EntityQuery, QueryPage};
use crate::retry::{DirectWrite, SucceedOnAttempt, TracingObserver, WritePath};
use crate::store::EntityStore;
use crate::timestamp::parse_timestamp;

/// Upper bound (exclusive) for the simulated succeeding attempt
const SIMULATED_OUTAGE_RANGE: u32 = 5;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EntityStore>,
    pub config: ApiConfig,
    /// Overrides the write path chosen from `config` on every create
    pub write_path: Option<Arc<dyn WritePath>>,
}

impl AppState {
    pub fn new(store: Arc<EntityStore>, config: ApiConfig) -> Self {
        AppState {
            store,
            config,
            write_path: None,
        }
    }

    pub fn with_write_path(mut self, write_path: Arc<dyn WritePath>) -> Self {
        self.write_path = Some(write_path);
        self
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Store errors rendered as HTTP responses
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::DuplicateId(_)
            | StoreError::RetriesExhausted { .. }
            | StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(ApiResponse::<()>::err(self.0.to_string()))).into_response()
    }
}

// ============================================================================
// Query string
// ============================================================================

fn decode_component(raw: &str) -> StoreResult<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .map_err(|e| StoreError::Validation(format!("malformed query string: {e}")))
}

fn parse_number(name: &str, value: &str) -> StoreResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| StoreError::Validation(format!("invalid {name}: {value}")))
}

fn parse_date(name: &str, value: &str) -> StoreResult<Option<chrono::DateTime<chrono::Utc>>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_timestamp(value)
        .map(Some)
        .ok_or_else(|| StoreError::Validation(format!("invalid {name}: {value}")))
}

/// Build an [`EntityQuery`] from a raw query string.
///
/// Parameter names are matched ignoring case. `countries` takes one country
/// per occurrence and may repeat; commas are part of the name. Unknown
/// parameters are ignored.
pub fn parse_query(raw: Option<&str>, default_page_size: u32) -> StoreResult<EntityQuery> {
    let mut query = EntityQuery {
        page_size: default_page_size,
        ..Default::default()
    };

    let pairs = raw.unwrap_or_default().split('&').filter(|pair| !pair.is_empty());

    for pair in pairs {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        let value = decode_component(value)?;

        match key.to_lowercase().as_str() {
            "search" => query.search = Some(value),
            "gender" => query.gender = Some(value),
            "startdate" => query.start_date = parse_date("startDate", &value)?,
            "enddate" => query.end_date = parse_date("endDate", &value)?,
            "countries" if !value.trim().is_empty() => query.countries.push(value),
            "pagenumber" => query.page_number = parse_number("pageNumber", &value)?,
            "pagesize" => query.page_size = parse_number("pageSize", &value)?,
            "sortby" => query.sort_by = Some(value),
            "sortorder" => query.sort_order = Some(value),
            _ => {}
        }
    }

    Ok(query)
}

// ============================================================================
// API Handlers
// ============================================================================

/// Unbindable entity payloads are client errors like any other
fn entity_payload(payload: Result<Json<Entity>, JsonRejection>) -> Result<Entity, ApiError> {
    payload
        .map(|Json(entity)| entity)
        .map_err(|rejection| StoreError::Validation(rejection.body_text()).into())
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/entity - Filter, sort and paginate entities
async fn list_entities(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<QueryPage>, ApiError> {
    let query = parse_query(raw.as_deref(), state.config.default_page_size)?;
    Ok(Json(query.apply(state.store.list_all())))
}

/// GET /api/entity/:id - Get one entity
async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Entity>, ApiError> {
    state
        .store
        .read(&id)
        .map(Json)
        .ok_or_else(|| StoreError::NotFound(id).into())
}

/// POST /api/entity - Create an entity (with retries)
async fn create_entity(
    State(state): State<AppState>,
    payload: Result<Json<Entity>, JsonRejection>,
) -> Result<Response, ApiError> {
    let entity = entity_payload(payload)?;

    let outage;
    let write_path: &dyn WritePath = if let Some(path) = &state.write_path {
        path.as_ref()
    } else if state.config.simulate_outages {
        outage = SucceedOnAttempt::random(SIMULATED_OUTAGE_RANGE);
        &outage
    } else {
        &DirectWrite
    };

    let stored = state
        .store
        .create_with_retry(entity, write_path, Some(&TracingObserver))
        .await
        .map_err(|e| {
            if e.is_client_error() {
                warn!("Create rejected: {}", e);
            } else {
                error!("Create failed: {}", e);
            }
            ApiError(e)
        })?;

    info!("Created entity {}", stored.id);
    let location = format!("/api/entity/{}", stored.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(stored)).into_response())
}

/// PUT /api/entity/:id - Replace an entity
async fn update_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Entity>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let entity = entity_payload(payload)?;
    if id != entity.id {
        return Err(StoreError::Validation("Entity ID mismatch".to_string()).into());
    }

    state.store.update(entity);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/entity/:id - Remove an entity
async fn delete_entity(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.store.delete(&id);
    StatusCode::NO_CONTENT
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/entity", get(list_entities).post(create_entity))
        .route(
            "/entity/:id",
            get(get_entity).put(update_entity).delete(delete_entity),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_query_defaults() {
        let query = parse_query(None, 3).unwrap();
        assert_eq!(query, EntityQuery::default());

        let custom = parse_query(Some(""), 7).unwrap();
        assert_eq!(custom.page_size, 7);
        assert_eq!(custom.page_number, 1);
    }

    #[test]
    fn test_parse_query_all_parameters() {
        let raw = "search=Main+Street&Gender=male&startDate=1980-01-01&endDate=2000-06-30T00%3A00%3A00Z\
                   &countries=Peru&countries=Chile&countries=&pageNumber=2&PAGESIZE=5\
                   &sortBy=createdDate&sortOrder=desc&unknown=1";
        let query = parse_query(Some(raw), 3).unwrap();

        assert_eq!(query.search.as_deref(), Some("Main Street"));
        assert_eq!(query.gender.as_deref(), Some("male"));
        assert_eq!(query.start_date, Some(Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(query.end_date, Some(Utc.with_ymd_and_hms(2000, 6, 30, 0, 0, 0).unwrap()));
        assert_eq!(query.countries, vec!["Peru", "Chile"]);
        assert_eq!(query.page_number, 2);
        assert_eq!(query.page_size, 5);
        assert_eq!(query.sort_by.as_deref(), Some("createdDate"));
        assert_eq!(query.sort_order.as_deref(), Some("desc"));
    }

    #[test]
    fn test_parse_query_country_keeps_commas() {
        let query = parse_query(Some("countries=Korea,%20Republic%20of&countries=Peru"), 3).unwrap();
        assert_eq!(query.countries, vec!["Korea, Republic of", "Peru"]);
    }

    #[test]
    fn test_parse_query_rejects_bad_values() {
        assert!(matches!(
            parse_query(Some("pageNumber=-1"), 3),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            parse_query(Some("pageSize=lots"), 3),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            parse_query(Some("startDate=yesterday"), 3),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_query_blank_date_is_unset() {
        let query = parse_query(Some("startDate=&endDate="), 3).unwrap();
        assert!(query.start_date.is_none());
        assert!(query.end_date.is_none());
    }
}
