//! Map layer query builder
//!
//! Turns a layer name plus request parameters into a bound PostGIS statement.
//! Values never reach the SQL text; every parameter travels as a positional
//! bind in [`LayerQuery::binds`].
//!
//! | Layer   | Center                                  | Search radius      |
//! |---------|-----------------------------------------|--------------------|
//! | `trs`   | centroid of `center_trs` in `basin`     | `radius` miles     |
//! | `wells` | centroid of the fixed anchor section    | `radius * 1.5` mi  |

mod trs;
mod wells;

use crate::error::AtlasError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Meters per statute mile, as used by every distance predicate.
pub const METERS_PER_MILE: f64 = 1609.34;

pub const DEFAULT_RADIUS_MILES: f64 = 10.0;
pub const DEFAULT_CENTER_TRS: &str = "14-04N-65W";
pub const DEFAULT_BASIN: &str = "DJ";

/// Interval code left out of the cross-section averages.
pub const EXCLUDED_AVERAGE_INTERVAL: &str = "COL";

/// Well status counted toward section footage.
pub const PRODUCING_STATUS: &str = "PRODUCING";

/// Named query variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Trs,
    Wells,
}

impl Layer {
    pub const ALL: [Self; 2] = [Self::Trs, Self::Wells];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Trs => "trs",
            Self::Wells => "wells",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layer {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|layer| layer.name() == s)
            .ok_or_else(|| AtlasError::UnknownLayer(s.to_string()))
    }
}

fn trs_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // SS-TTN-RRW, e.g. 14-04N-65W
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,2}-\d{2,3}[NS]-\d{2,3}[EW]$").expect("valid TRS regex"))
}

fn basin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9 _-]{1,64}$").expect("valid basin regex"))
}

/// Validated layer parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParams {
    pub radius_miles: f64,
    pub center_trs: String,
    pub basin: String,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            radius_miles: DEFAULT_RADIUS_MILES,
            center_trs: DEFAULT_CENTER_TRS.to_string(),
            basin: DEFAULT_BASIN.to_string(),
        }
    }
}

/// Raw, unvalidated parameters as they arrive on the query string.
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct RawLayerParams {
    pub radius: Option<String>,
    pub center_trs: Option<String>,
    pub basin: Option<String>,
}

impl LayerParams {
    /// Validate raw request parameters, filling defaults for absent ones.
    ///
    /// Radii above `max_radius_miles` are clamped down to it.
    pub fn from_raw(raw: &RawLayerParams, max_radius_miles: f64) -> Result<Self, AtlasError> {
        let mut params = Self::default();

        if let Some(radius) = raw.radius.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let value: f64 = radius
                .parse()
                .map_err(|_| AtlasError::malformed("radius", format!("'{radius}' is not a number")))?;
            if !value.is_finite() || value <= 0.0 {
                return Err(AtlasError::malformed(
                    "radius",
                    format!("must be a positive number of miles, got {radius}"),
                ));
            }
            if value > max_radius_miles {
                tracing::debug!(requested = value, max = max_radius_miles, "clamping radius");
            }
            params.radius_miles = value.min(max_radius_miles);
        }

        if let Some(trs) = raw.center_trs.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let trs = trs.to_ascii_uppercase();
            if !trs_pattern().is_match(&trs) {
                return Err(AtlasError::malformed(
                    "center_trs",
                    format!("'{trs}' is not a section key like 14-04N-65W"),
                ));
            }
            params.center_trs = trs;
        }

        if let Some(basin) = raw.basin.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !basin_pattern().is_match(basin) {
                return Err(AtlasError::malformed("basin", format!("'{basin}' is not a basin name")));
            }
            params.basin = basin.to_string();
        }

        Ok(params)
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_miles * METERS_PER_MILE
    }
}

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Float(f64),
}

/// A statement ready for the envelope wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerQuery {
    pub layer: Layer,
    /// Row-producing SQL with `$n` placeholders.
    pub sql: &'static str,
    /// Values for `$1..$n`, in order.
    pub binds: Vec<BindValue>,
}

/// Build the statement for a layer.
pub fn build(layer: Layer, params: &LayerParams) -> LayerQuery {
    match layer {
        Layer::Trs => trs::build(params),
        Layer::Wells => wells::build(params),
    }
}

/// Parse a layer name and build its statement in one step.
pub fn build_named(name: &str, params: &LayerParams) -> Result<LayerQuery, AtlasError> {
    Ok(build(name.parse()?, params))
}
