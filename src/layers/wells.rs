//! `wells` layer: well shapes with attributes near the fixed anchor section.
//!
//! The anchor never follows `center_trs`/`basin` overrides; only the radius
//! is honored, widened by [`RADIUS_FACTOR`].
//!
//! Binds: `$1` anchor TRS key, `$2` anchor basin, `$3` radius in meters.

use super::{BindValue, Layer, LayerParams, LayerQuery, DEFAULT_BASIN, DEFAULT_CENTER_TRS};

pub const RADIUS_FACTOR: f64 = 1.5;

pub(super) const SQL: &str = r"
WITH center_point AS (
    SELECT ST_SetSRID(ST_MakePoint(lon, lat), 4326) AS geom
    FROM shape.section
    WHERE trs = $1 AND basin = $2
    LIMIT 1
)
SELECT
    sw.*,
    dw.well_name,
    dw.env_operator AS operator,
    dw.well_status,
    dw.first_prod_date
FROM shape.wells sw
JOIN data.wells dw ON sw.well_id = dw.well_id
CROSS JOIN center_point
WHERE ST_DWithin(sw.geom::geography, center_point.geom::geography, $3::float8, true)
";

pub(super) fn build(params: &LayerParams) -> LayerQuery {
    LayerQuery {
        layer: Layer::Wells,
        sql: SQL,
        binds: vec![
            BindValue::Text(DEFAULT_CENTER_TRS.to_string()),
            BindValue::Text(DEFAULT_BASIN.to_string()),
            BindValue::Float(params.radius_meters() * RADIUS_FACTOR),
        ],
    }
}
