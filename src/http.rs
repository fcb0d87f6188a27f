//! Axum HTTP surface.
//!
//! Thin glue over [`DirectoryStore`]: decode the request, take the store
//! lock, run one query, map the error to a status code. Routes mirror the
//! store operations one-to-one.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    Activity, ActivityCreate, Bounds, Building, BuildingCreate, DirectoryError, DirectoryStore,
    GeoPoint, Organization, OrganizationCreate, OrganizationFilter, Result,
};

/// Shared handler state. The store sits behind a mutex; every request takes
/// it for the duration of one short query.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<DirectoryStore>>,
}

impl AppState {
    pub fn new(store: DirectoryStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut DirectoryStore) -> Result<R>) -> Result<R> {
        let mut guard = self
            .store
            .lock()
            .map_err(|_| DirectoryError::Internal("store lock poisoned".to_string()))?;
        f(&mut guard)
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/buildings", get(list_buildings).post(create_building))
        .route("/buildings/:id", get(get_building))
        .route("/activities", get(list_activities).post(create_activity))
        .route("/activities/:id", get(get_activity))
        .route(
            "/organizations",
            get(list_organizations).post(create_organization),
        )
        .route("/organizations/geo/radius", get(organizations_in_radius))
        .route("/organizations/geo/bbox", get(organizations_in_bbox))
        .route("/organizations/:id", get(get_organization))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Error Mapping
// ============================================================================

fn status_for(err: &DirectoryError) -> StatusCode {
    match err {
        DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        DirectoryError::MissingReference { .. }
        | DirectoryError::InvalidPhone { .. }
        | DirectoryError::InvalidBounds
        | DirectoryError::InvalidRadius { .. }
        | DirectoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DirectoryError::Storage(_)
        | DirectoryError::Migration(_)
        | DirectoryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!("request failed: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "orgdir".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_buildings(State(state): State<AppState>) -> Result<Json<Vec<Building>>> {
    state.with_store(|s| s.list_buildings()).map(Json)
}

async fn get_building(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Building>> {
    state.with_store(|s| s.get_building(id)).map(Json)
}

async fn create_building(
    State(state): State<AppState>,
    Json(payload): Json<BuildingCreate>,
) -> Result<(StatusCode, Json<Building>)> {
    state
        .with_store(|s| s.create_building(&payload))
        .map(|b| (StatusCode::CREATED, Json(b)))
}

async fn list_activities(State(state): State<AppState>) -> Result<Json<Vec<Activity>>> {
    state.with_store(|s| s.list_activities()).map(Json)
}

async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Activity>> {
    state.with_store(|s| s.get_activity(id)).map(Json)
}

async fn create_activity(
    State(state): State<AppState>,
    Json(payload): Json<ActivityCreate>,
) -> Result<(StatusCode, Json<Activity>)> {
    state
        .with_store(|s| s.create_activity(&payload))
        .map(|a| (StatusCode::CREATED, Json(a)))
}

/// Query parameters of `GET /organizations`.
#[derive(Debug, Deserialize)]
struct OrgListQuery {
    building_id: Option<i64>,
    name: Option<String>,
    activity_id: Option<i64>,
    #[serde(default)]
    include_children: bool,
}

async fn list_organizations(
    State(state): State<AppState>,
    Query(q): Query<OrgListQuery>,
) -> Result<Json<Vec<Organization>>> {
    let filter = OrganizationFilter {
        building_id: q.building_id,
        name: q.name,
        activity_id: q.activity_id,
        include_children: q.include_children,
        bounds: None,
    };
    state.with_store(|s| s.list_organizations(&filter)).map(Json)
}

async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Organization>> {
    state.with_store(|s| s.get_organization(id)).map(Json)
}

async fn create_organization(
    State(state): State<AppState>,
    Json(payload): Json<OrganizationCreate>,
) -> Result<(StatusCode, Json<Organization>)> {
    state
        .with_store(|s| s.create_organization(&payload))
        .map(|org| (StatusCode::CREATED, Json(org)))
}

/// Query parameters of `GET /organizations/geo/radius`.
#[derive(Debug, Deserialize)]
struct RadiusQuery {
    lat: f64,
    lon: f64,
    radius_m: f64,
}

async fn organizations_in_radius(
    State(state): State<AppState>,
    Query(q): Query<RadiusQuery>,
) -> Result<Json<Vec<Organization>>> {
    state
        .with_store(|s| s.organizations_in_radius(GeoPoint::new(q.lat, q.lon), q.radius_m))
        .map(Json)
}

/// Query parameters of `GET /organizations/geo/bbox`.
#[derive(Debug, Deserialize)]
struct BboxQuery {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

async fn organizations_in_bbox(
    State(state): State<AppState>,
    Query(q): Query<BboxQuery>,
) -> Result<Json<Vec<Organization>>> {
    let bounds = Bounds {
        min_lat: q.min_lat,
        min_lon: q.min_lon,
        max_lat: q.max_lat,
        max_lon: q.max_lon,
    };
    state.with_store(|s| s.organizations_in_bbox(bounds)).map(Json)
}
