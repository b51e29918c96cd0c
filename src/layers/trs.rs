//! `trs` layer: sections around a reference section with per-interval
//! producing-well footage and cross-section interval averages.
//!
//! Binds: `$1` center TRS key, `$2` basin, `$3` radius in meters,
//! `$4` producing well status, `$5` interval excluded from averages.

use super::{BindValue, Layer, LayerParams, LayerQuery, EXCLUDED_AVERAGE_INTERVAL, PRODUCING_STATUS};

/// Footage rule: a well lying wholly inside a section contributes its declared
/// lateral length (geodesic length when none is declared); a well crossing the
/// section boundary contributes only the geodesic length of the clipped part.
pub(super) const SQL: &str = r"
WITH center AS (
    SELECT ST_SetSRID(ST_MakePoint(c.lon, c.lat), 4326)::geography AS geog
    FROM shape.section c
    WHERE c.trs = $1 AND c.basin = $2
    LIMIT 1
),
sections AS (
    SELECT s.*
    FROM shape.section s
    CROSS JOIN center
    WHERE s.basin = $2
      AND ST_DWithin(s.geom::geography, center.geog, $3::float8, true)
),
well_footages AS (
    SELECT
        s.trs,
        dw.interval,
        COUNT(DISTINCT sw.well_id) AS well_count,
        SUM(CASE
            WHEN ST_Within(sw.geom, s.geom)
                THEN COALESCE(dw.lateral_length, ST_Length(sw.geom::geography))
            ELSE ST_Length(ST_Intersection(sw.geom, s.geom)::geography)
        END) AS total_footage
    FROM sections s
    JOIN shape.wells sw ON ST_Intersects(sw.geom, s.geom)
    JOIN data.wells dw ON sw.well_id = dw.well_id
    WHERE dw.well_status = $4
    GROUP BY s.trs, dw.interval
),
section_footages AS (
    SELECT
        s.basin, s.tr, s.section, s.trs, s.lat, s.lon, s.geom,
        jsonb_object_agg(
            wf.interval,
            jsonb_build_object(
                'footage', ROUND(wf.total_footage::numeric, 2),
                'well_count', wf.well_count
            )
        ) FILTER (WHERE wf.interval IS NOT NULL) AS interval_footages,
        SUM(wf.total_footage) AS total_well_footage,
        SUM(wf.well_count) AS total_well_count
    FROM sections s
    LEFT JOIN well_footages wf ON s.trs = wf.trs
    GROUP BY s.basin, s.tr, s.section, s.trs, s.lat, s.lon, s.geom
),
average_footages AS (
    SELECT
        e.key AS interval,
        AVG((e.value->>'footage')::numeric) AS avg_footage,
        AVG((e.value->>'well_count')::numeric) AS avg_well_count
    FROM section_footages sf
    CROSS JOIN LATERAL jsonb_each(sf.interval_footages) AS e(key, value)
    WHERE sf.interval_footages IS NOT NULL
      AND e.key IS NOT NULL
      AND e.key <> $5
    GROUP BY e.key
),
interval_averages AS (
    SELECT COALESCE(
        jsonb_object_agg(
            af.interval,
            jsonb_build_object(
                'footage', ROUND(af.avg_footage, 2),
                'well_count', ROUND(af.avg_well_count, 2)
            )
        ),
        '{}'::jsonb
    ) AS avg_interval_footages
    FROM average_footages af
)
SELECT sf.*, ia.avg_interval_footages
FROM section_footages sf
CROSS JOIN interval_averages ia
";

pub(super) fn build(params: &LayerParams) -> LayerQuery {
    LayerQuery {
        layer: Layer::Trs,
        sql: SQL,
        binds: vec![
            BindValue::Text(params.center_trs.clone()),
            BindValue::Text(params.basin.clone()),
            BindValue::Float(params.radius_meters()),
            BindValue::Text(PRODUCING_STATUS.to_string()),
            BindValue::Text(EXCLUDED_AVERAGE_INTERVAL.to_string()),
        ],
    }
}
