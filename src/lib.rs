//! Basin Atlas: TRS section and well GeoJSON over HTTP
//!
//! ## Architecture
//!
//! - **Layers**: named PostGIS statements (`trs`, `wells`) with bound parameters
//! - **GeoJSON**: wraps any layer statement into a single FeatureCollection query
//! - **Static files**: wells/section snapshots and the filtered rig listing
//! - **API**: Axum routes under `/api`

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod geojson;
pub mod layers;
pub mod static_files;

pub use config::AtlasConfig;
pub use error::AtlasError;
pub use geojson::{FeatureSource, PgFeatureSource};
pub use layers::{build, Layer, LayerParams, LayerQuery};
