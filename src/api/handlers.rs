//! Route handlers and shared application state
//!
//! | Method | Path               | Description                                  |
//! |--------|--------------------|----------------------------------------------|
//! | GET    | /api/trs           | Sections with interval footage aggregates    |
//! | GET    | /api/wells         | Wells around the fixed anchor section        |
//! | GET    | /api/layers/:layer | Any named layer                              |
//! | GET    | /api/get_wells     | Precomputed wells GeoJSON snapshot           |
//! | GET    | /api/geojson       | Section grid snapshot                        |
//! | GET    | /api/get_rigs      | Rigs first seen after the cutoff date        |
//! | GET    | /api/health        | Liveness plus database reachability          |

use crate::error::AtlasError;
use crate::geojson::{feature_count, FeatureSource};
use crate::layers::{self, Layer, LayerParams, RawLayerParams};
use crate::static_files::StaticStore;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub features: Arc<dyn FeatureSource>,
    pub store: StaticStore,
    pub max_radius_miles: f64,
    pub rig_cutoff_date: String,
}

async fn serve_layer(
    state: &AppState,
    layer: Layer,
    raw: &RawLayerParams,
) -> Result<Json<Value>, AtlasError> {
    let params = LayerParams::from_raw(raw, state.max_radius_miles)?;
    let query = layers::build(layer, &params);
    let collection = state.features.feature_collection(&query).await?;

    info!(
        layer = %layer,
        radius_miles = params.radius_miles,
        center_trs = %params.center_trs,
        basin = %params.basin,
        features = feature_count(&collection),
        "layer served"
    );
    Ok(Json(collection))
}

/// GET /api/trs?radius=10&center_trs=14-04N-65W&basin=DJ
pub async fn get_trs(
    State(state): State<AppState>,
    Query(raw): Query<RawLayerParams>,
) -> Result<Json<Value>, AtlasError> {
    serve_layer(&state, Layer::Trs, &raw).await
}

/// GET /api/wells?radius=10
pub async fn get_wells(
    State(state): State<AppState>,
    Query(raw): Query<RawLayerParams>,
) -> Result<Json<Value>, AtlasError> {
    serve_layer(&state, Layer::Wells, &raw).await
}

/// GET /api/layers/:layer
///
/// Unknown names fail before any query runs.
pub async fn get_layer(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(raw): Query<RawLayerParams>,
) -> Result<Json<Value>, AtlasError> {
    let layer: Layer = name.parse()?;
    serve_layer(&state, layer, &raw).await
}

/// GET /api/get_wells
pub async fn get_well_snapshot(State(state): State<AppState>) -> Result<Json<Value>, AtlasError> {
    state.store.wells_snapshot().await.map(Json)
}

/// GET /api/geojson
pub async fn get_section_snapshot(
    State(state): State<AppState>,
) -> Result<Json<Value>, AtlasError> {
    state.store.section_snapshot().await.map(Json)
}

/// GET /api/get_rigs
pub async fn get_rigs(
    State(state): State<AppState>,
) -> Result<Json<Vec<Map<String, Value>>>, AtlasError> {
    state
        .store
        .rigs_after(&state.rig_cutoff_date)
        .await
        .map(Json)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db_connected: bool,
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = state.features.ping().await;

    Json(HealthResponse {
        status: if db_ok {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        db_connected: db_ok,
    })
}
