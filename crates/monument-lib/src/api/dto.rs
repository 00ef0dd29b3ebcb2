//! Wire formats of the catalogue API
//!
//! These types mirror the JSON the backend sends and are converted into the
//! crate's own model right after decoding. Features without a usable point
//! geometry are skipped with a warning rather than failing the whole payload.

use crate::{PoiId, PointOfInterest, RegionSummary, Stop};
use serde::{Deserialize, Serialize};

/// Id or count sent either as a JSON number or as a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawNumber {
    Number(u64),
    Text(String),
}

impl RawNumber {
    pub(crate) fn parse(&self) -> Option<u64> {
        match self {
            Self::Number(id) => Some(*id),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection<P> {
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<P>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature<P> {
    pub geometry: Option<Geometry>,
    pub properties: P,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

impl Geometry {
    /// `[lon, lat, ...]` of a point geometry
    pub(crate) fn point(&self) -> Option<(f64, f64)> {
        let coords = self.coordinates.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MonumentProperties {
    pub id: RawNumber,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
    #[serde(default)]
    pub imagen: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegionProperties {
    pub region: String,
    #[serde(default)]
    pub pais: Option<String>,
    pub total: RawNumber,
}

/// Monument as returned by list endpoints (`/monumentos`, `/monumentos/radio`)
#[derive(Debug, Deserialize)]
pub(crate) struct MonumentRecord {
    pub id: RawNumber,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
    #[serde(default)]
    pub imagen: Option<String>,
    #[serde(default, alias = "lat")]
    pub latitud: Option<f64>,
    #[serde(default, alias = "lng", alias = "lon")]
    pub longitud: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody {
    Page {
        #[serde(alias = "items")]
        data: Vec<MonumentRecord>,
        #[serde(default)]
        total: Option<RawNumber>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        limit: Option<u32>,
    },
    Bare(Vec<MonumentRecord>),
}

#[derive(Debug, Serialize)]
pub(crate) struct OptimizeRequest {
    pub paradas: Vec<StopPayload>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StopPayload {
    pub id: PoiId,
    pub lat: f64,
    pub lng: f64,
}

impl From<&Stop> for StopPayload {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id,
            lat: stop.lat,
            lng: stop.lon,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptimizeResponse {
    pub orden_optimizado: Vec<usize>,
    #[serde(default)]
    pub geometria: Option<LineGeometry>,
    #[serde(default)]
    pub distancia_km: f64,
    #[serde(default)]
    pub duracion_min: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LineGeometry {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveRouteRequest<'a> {
    pub nombre: &'a str,
    pub monumentos: Vec<PoiId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveRouteResponse {
    pub id: RawNumber,
}

impl Feature<MonumentProperties> {
    pub(crate) fn into_poi(self) -> Option<PointOfInterest> {
        let Some(id) = self.properties.id.parse() else {
            tracing::warn!(id = ?self.properties.id, "Skipping feature with invalid id");
            return None;
        };
        let Some((lon, lat)) = self.geometry.as_ref().and_then(Geometry::point) else {
            tracing::warn!(id, "Skipping feature without point geometry");
            return None;
        };

        let p = self.properties;
        Some(PointOfInterest {
            id,
            lon,
            lat,
            name: p.nombre.unwrap_or_default(),
            category_tag: p.categoria.unwrap_or_default(),
            type_tag: p.tipo.unwrap_or_default(),
            municipality: p.municipio,
            thumbnail_url: p.imagen,
        })
    }
}

impl Feature<RegionProperties> {
    pub(crate) fn into_summary(self) -> Option<RegionSummary> {
        let Some(total_count) = self.properties.total.parse() else {
            tracing::warn!(region = %self.properties.region, total = ?self.properties.total, "Skipping region with invalid total");
            return None;
        };
        let Some((lon, lat)) = self.geometry.as_ref().and_then(Geometry::point) else {
            tracing::warn!(region = %self.properties.region, "Skipping region without point geometry");
            return None;
        };

        Some(RegionSummary {
            region_name: self.properties.region,
            country_code: self.properties.pais,
            total_count,
            centroid_lon: lon,
            centroid_lat: lat,
        })
    }
}

impl MonumentRecord {
    pub(crate) fn into_poi(self) -> Option<PointOfInterest> {
        let id = self.id.parse()?;
        let (Some(lat), Some(lon)) = (self.latitud, self.longitud) else {
            tracing::warn!(id, "Skipping monument without coordinates");
            return None;
        };

        Some(PointOfInterest {
            id,
            lon,
            lat,
            name: self.nombre.unwrap_or_default(),
            category_tag: self.categoria.unwrap_or_default(),
            type_tag: self.tipo.unwrap_or_default(),
            municipality: self.municipio,
            thumbnail_url: self.imagen,
        })
    }
}
