//! REST API module using Axum

pub mod handlers;

pub use handlers::AppState;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the CORS layer for the `/api` surface.
///
/// With no configured origins any origin may read the API. Otherwise only
/// the listed origins are allowed.
pub fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match origins {
        Some(list) => {
            let allowed: Vec<HeaderValue> = list.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!(origins = ?list, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        None => base.allow_origin(Any),
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Spatial layers
        .route("/trs", get(handlers::get_trs))
        .route("/wells", get(handlers::get_wells))
        .route("/layers/:layer", get(handlers::get_layer))
        // Static snapshots
        .route("/get_wells", get(handlers::get_well_snapshot))
        .route("/geojson", get(handlers::get_section_snapshot))
        .route("/get_rigs", get(handlers::get_rigs))
        // Health
        .route("/health", get(handlers::get_health))
}

/// Create the complete application router.
pub fn create_app(state: AppState, cors_origins: Option<&[String]>) -> Router {
    Router::new()
        .nest(
            "/api",
            api_routes().layer(build_cors_layer(cors_origins)),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AtlasError;
    use crate::geojson::{empty_collection, FeatureSource};
    use crate::layers::{BindValue, Layer, LayerQuery};
    use crate::static_files::StaticStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// Records every statement it is asked to run.
    #[derive(Default)]
    struct RecordingSource {
        queries: Mutex<Vec<LayerQuery>>,
        response: Option<Value>,
    }

    #[async_trait]
    impl FeatureSource for RecordingSource {
        async fn feature_collection(&self, query: &LayerQuery) -> Result<Value, AtlasError> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(self.response.clone().unwrap_or_else(empty_collection))
        }

        async fn ping(&self) -> bool {
            false
        }
    }

    fn app_with(source: Arc<RecordingSource>, data_dir: &std::path::Path) -> Router {
        let state = AppState {
            features: source,
            store: StaticStore::new(data_dir),
            max_radius_miles: 100.0,
            rig_cutoff_date: "2022-01-01".to_string(),
        };
        create_app(state, None)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_trs_binds_request_parameters() {
        let source = Arc::new(RecordingSource::default());
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::clone(&source), dir.path());

        let (status, body) = get_json(app, "/api/trs?radius=5&center_trs=02-05N-66W&basin=DJ").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"type": "FeatureCollection", "features": []}));

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].layer, Layer::Trs);
        assert_eq!(queries[0].binds[0], BindValue::Text("02-05N-66W".to_string()));
        assert_eq!(queries[0].binds[2], BindValue::Float(5.0 * 1609.34));
    }

    #[tokio::test]
    async fn test_wells_defaults_radius() {
        let source = Arc::new(RecordingSource::default());
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = get_json(app_with(Arc::clone(&source), dir.path()), "/api/wells").await;
        assert_eq!(status, StatusCode::OK);

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries[0].layer, Layer::Wells);
        assert_eq!(queries[0].binds[2], BindValue::Float(10.0 * 1609.34 * 1.5));
    }

    #[tokio::test]
    async fn test_unknown_layer_never_reaches_database() {
        let source = Arc::new(RecordingSource::default());
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            get_json(app_with(Arc::clone(&source), dir.path()), "/api/layers/parcels").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "UNKNOWN_LAYER");
        assert!(source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_named_layer_route() {
        let source = Arc::new(RecordingSource {
            response: Some(json!({"type": "FeatureCollection", "features": [{"type": "Feature"}]})),
            ..RecordingSource::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            get_json(app_with(Arc::clone(&source), dir.path()), "/api/layers/wells?radius=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["features"].as_array().unwrap().len(), 1);
        assert_eq!(source.queries.lock().unwrap()[0].layer, Layer::Wells);
    }

    #[tokio::test]
    async fn test_malformed_radius_is_bad_request() {
        let source = Arc::new(RecordingSource::default());
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            get_json(app_with(Arc::clone(&source), dir.path()), "/api/trs?radius=ten").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert!(source.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rigs_and_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rigs.csv"),
            "rig,first_date\nA,2021-12-31\nB,2022-01-01\nC,2022-06-01\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("wells.geojson"),
            r#"{"type":"FeatureCollection","features":[]}"#,
        )
        .unwrap();

        let source = Arc::new(RecordingSource::default());
        let (status, rigs) =
            get_json(app_with(Arc::clone(&source), dir.path()), "/api/get_rigs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rigs, json!([{"rig": "C", "first_date": "2022-06-01"}]));

        let (status, wells) =
            get_json(app_with(Arc::clone(&source), dir.path()), "/api/get_wells").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(wells["type"], "FeatureCollection");

        let (status, body) =
            get_json(app_with(Arc::clone(&source), dir.path()), "/api/geojson").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_health_reports_degraded_database() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            get_json(app_with(Arc::new(RecordingSource::default()), dir.path()), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["db_connected"], false);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::new(RecordingSource::default()), dir.path());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header("Origin", "https://maps.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }
}
