//! GeoJSON envelope wrapper
//!
//! Any layer statement is injected as a subquery and shaped server-side into
//! one `FeatureCollection`, so a request costs exactly one round trip:
//!
//! - `geometry`   = `ST_AsGeoJSON(geom)::jsonb`
//! - `properties` = every other column, minus the structural `gid` and `geom`
//!
//! The result is always a well-formed collection, including when the inner
//! query matches nothing.

use crate::error::AtlasError;
use crate::layers::{BindValue, LayerQuery};
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::debug;

/// Columns that describe the row itself rather than the feature.
pub const STRUCTURAL_COLUMNS: [&str; 2] = ["gid", "geom"];

/// Wrap a row-producing statement into a single FeatureCollection query.
pub fn wrap(inner_sql: &str) -> String {
    format!(
        r"SELECT jsonb_build_object(
    'type', 'FeatureCollection',
    'features', COALESCE(jsonb_agg(features.feature), '[]'::jsonb)
)
FROM (
    SELECT jsonb_build_object(
        'type', 'Feature',
        'geometry', ST_AsGeoJSON(inputs.geom)::jsonb,
        'properties', to_jsonb(inputs) - 'gid' - 'geom'
    ) AS feature
    FROM ({inner_sql}) inputs
) features"
    )
}

pub fn empty_collection() -> Value {
    json!({ "type": "FeatureCollection", "features": [] })
}

/// Coerce whatever the engine returned into a well-formed FeatureCollection.
///
/// A missing or null document becomes the empty collection, a null feature
/// list becomes `[]`, and structural columns are stripped from properties.
pub fn normalize(result: Option<Value>) -> Value {
    let Some(Value::Object(mut collection)) = result else {
        return empty_collection();
    };

    collection.insert("type".to_string(), Value::from("FeatureCollection"));
    let features = match collection.remove("features") {
        Some(Value::Array(features)) => features,
        _ => Vec::new(),
    };

    let features: Vec<Value> = features
        .into_iter()
        .map(|mut feature| {
            if let Some(Value::Object(props)) = feature.get_mut("properties") {
                for column in STRUCTURAL_COLUMNS {
                    props.remove(column);
                }
            }
            feature
        })
        .collect();

    collection.insert("features".to_string(), Value::Array(features));
    Value::Object(collection)
}

pub fn feature_count(collection: &Value) -> usize {
    collection["features"].as_array().map_or(0, Vec::len)
}

/// Executes layer statements and returns FeatureCollections.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn feature_collection(&self, query: &LayerQuery) -> Result<Value, AtlasError>;

    /// Cheap liveness probe for the health endpoint.
    async fn ping(&self) -> bool;
}

/// PostGIS-backed [`FeatureSource`].
#[derive(Clone)]
pub struct PgFeatureSource {
    pool: PgPool,
}

impl PgFeatureSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl FeatureSource for PgFeatureSource {
    async fn feature_collection(&self, query: &LayerQuery) -> Result<Value, AtlasError> {
        let sql = wrap(query.sql);

        // Held for exactly one statement; dropping it returns it to the pool
        // on success, error and empty results alike.
        let mut conn = self.pool.acquire().await.map_err(AtlasError::Connection)?;

        let mut statement = sqlx::query_scalar::<sqlx::Postgres, Option<Value>>(&sql);
        for bind in &query.binds {
            statement = match bind {
                BindValue::Text(text) => statement.bind(text.clone()),
                BindValue::Float(number) => statement.bind(*number),
            };
        }

        let row = statement
            .fetch_optional(&mut *conn)
            .await
            .map_err(AtlasError::from_sqlx)?;

        let collection = normalize(row.flatten());
        debug!(
            layer = %query.layer,
            features = feature_count(&collection),
            "layer query complete"
        );
        Ok(collection)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}
