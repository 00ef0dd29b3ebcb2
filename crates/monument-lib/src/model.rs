//! Catalogue data model
//!
//! Plain value types shared by the query, clustering, selection and export
//! modules. Everything here is immutable once built; sessions replace values
//! wholesale instead of merging them.

use crate::style::Category;
use serde::{Deserialize, Serialize};

/// Stable catalogue identifier of a monument
pub type PoiId = u64;

/// Geographic extent and zoom of the map viewport at the end of a gesture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
    pub zoom: u8,
}

impl ViewportBounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64, zoom: u8) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
            zoom,
        }
    }

    /// Return a copy with ordered corners and coordinates clamped to the globe.
    ///
    /// Rendering surfaces may report corners in screen order, with min and max
    /// swapped. A box crossing the antimeridian is not split; swapping its
    /// longitudes yields the complementary span.
    pub fn normalized(self) -> Self {
        let (min_lon, max_lon) = ordered(self.min_lon, self.max_lon);
        let (min_lat, max_lat) = ordered(self.min_lat, self.max_lat);
        Self {
            min_lon: min_lon.clamp(-180.0, 180.0),
            min_lat: min_lat.clamp(-90.0, 90.0),
            max_lon: max_lon.clamp(-180.0, 180.0),
            max_lat: max_lat.clamp(-90.0, 90.0),
            zoom: self.zoom,
        }
    }

    /// `minLon,minLat,maxLon,maxLat` as expected by the catalogue `bbox` parameter
    pub fn bbox_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }

    /// Check whether a point lies inside the bounds (edges included)
    #[inline]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

#[inline]
fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Aggregate monument count for one administrative region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region_name: String,
    pub country_code: Option<String>,
    pub total_count: u64,
    pub centroid_lon: f64,
    pub centroid_lat: f64,
}

/// A monument marker as returned by the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: PoiId,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_tag: String,
    #[serde(default)]
    pub type_tag: String,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl PointOfInterest {
    /// Internal marker tuple, latitude first
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }

    /// Closed category used for styling
    pub fn category(&self) -> Category {
        Category::from_tag(&self.category_tag)
    }
}

/// One stop of a route, in the order it will be visited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: PoiId,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub description: Option<String>,
}

impl From<&PointOfInterest> for Stop {
    fn from(poi: &PointOfInterest) -> Self {
        let parts: Vec<&str> = [
            poi.category_tag.as_str(),
            poi.type_tag.as_str(),
            poi.municipality.as_deref().unwrap_or_default(),
        ]
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

        Self {
            id: poi.id,
            lat: poi.lat,
            lon: poi.lon,
            name: poi.name.clone(),
            description: (!parts.is_empty()).then(|| parts.join(" - ")),
        }
    }
}

/// Immutable snapshot of the catalogue filters active for one query
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    pub country: Option<String>,
    pub region: Option<String>,
    pub province: Option<String>,
    pub municipality: Option<String>,
    pub category: Option<String>,
    pub type_tag: Option<String>,
    pub text: Option<String>,
}

impl FilterSet {
    /// Query pairs in a fixed order; blank values are left out
    pub fn to_query(&self) -> Vec<(String, String)> {
        [
            ("pais", &self.country),
            ("region", &self.region),
            ("provincia", &self.province),
            ("municipio", &self.municipality),
            ("categoria", &self.category),
            ("tipo", &self.type_tag),
            ("q", &self.text),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key.to_string(), v.to_string()))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.to_query().is_empty()
    }
}

/// Non-blocking message surfaced by a session after a soft failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Info(message) | Self::Warning(message) => message,
        }
    }
}
