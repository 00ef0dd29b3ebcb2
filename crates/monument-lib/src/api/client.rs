//! Catalogue API client
//!
//! Every method is a single request/response exchange (plus the radius search
//! fallback) and keeps no state between calls. Filters are passed in as an
//! immutable snapshot, so a response always matches the filters it was asked for.

use super::HttpTransport;
use super::dto::{
    FeatureCollection, ListBody, MonumentProperties, OptimizeRequest, OptimizeResponse,
    RawNumber, RegionProperties, SaveRouteRequest, SaveRouteResponse, StopPayload,
};
use crate::config::MIN_NEARBY_RESULTS;
use crate::{
    CatalogueError, EngineConfig, FilterSet, PoiId, PointOfInterest, RegionSummary, Result,
    ReqwestTransport, RouteOptimizer, RouteResult, Stop, ViewportBounds, utils,
};

use geo::{Coord, LineString};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::future::Future;

/// Spatial queries used by the map session.
pub trait SpatialQueryClient: Send + Sync {
    /// Monuments inside `bounds`, at most `limit` of them.
    fn query_bbox(
        &self,
        filters: &FilterSet,
        bounds: &ViewportBounds,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<PointOfInterest>>> + Send;

    /// One aggregate per region for the filtered catalogue.
    fn query_regional_summary(
        &self,
        filters: &FilterSet,
    ) -> impl Future<Output = Result<Vec<RegionSummary>>> + Send;
}

/// One page of a list search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub items: Vec<PointOfInterest>,
    /// Total matches across all pages (falls back to the page size when unknown)
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Client for the monument catalogue REST API
pub struct CatalogueClient<T = ReqwestTransport> {
    transport: T,
    min_nearby_results: usize,
}

impl CatalogueClient<ReqwestTransport> {
    /// Create a client talking to the API configured in `config`
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(ReqwestTransport::from_config(config)?)
            .with_min_nearby_results(config.min_nearby_results))
    }
}

impl<T: HttpTransport> CatalogueClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            min_nearby_results: MIN_NEARBY_RESULTS,
        }
    }

    /// Set how many radius results are enough to skip the broad fallback search
    pub fn with_min_nearby_results(mut self, min_nearby_results: usize) -> Self {
        self.min_nearby_results = min_nearby_results;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Paginated list search (pages start at 1)
    pub async fn search(
        &self,
        filters: &FilterSet,
        page: u32,
        limit: u32,
        sort: Option<&str>,
    ) -> Result<SearchPage> {
        let mut query = filters.to_query();
        query.push(("page".to_string(), page.max(1).to_string()));
        query.push(("limit".to_string(), limit.to_string()));
        if let Some(sort) = sort {
            query.push(("sort".to_string(), sort.to_string()));
        }

        let body: ListBody = self.get_json("/monumentos", &query).await?;
        let (records, total, served_page, served_limit) = match body {
            ListBody::Page {
                data,
                total,
                page,
                limit,
            } => (data, total.as_ref().and_then(RawNumber::parse), page, limit),
            ListBody::Bare(data) => (data, None, None, None),
        };
        let items: Vec<PointOfInterest> =
            records.into_iter().filter_map(|r| r.into_poi()).collect();
        let page_result = SearchPage {
            total: total.unwrap_or(items.len() as u64),
            page: served_page.unwrap_or(page.max(1)),
            limit: served_limit.unwrap_or(limit),
            items,
        };

        tracing::debug!(
            page = page_result.page,
            items = page_result.items.len(),
            total = page_result.total,
            "search page received"
        );
        Ok(page_result)
    }

    /// Monuments within `km` of (`lat`, `lng`)
    ///
    /// When the radius search yields fewer than the configured minimum, a broad
    /// search with the same filters tops the list up to `limit`: radius hits
    /// first, then the closest broad hits, without duplicates. A failing fallback
    /// keeps the radius results.
    pub async fn nearby(
        &self,
        filters: &FilterSet,
        lat: f64,
        lng: f64,
        km: f64,
        limit: usize,
    ) -> Result<Vec<PointOfInterest>> {
        let mut query = filters.to_query();
        query.extend([
            ("lat".to_string(), lat.to_string()),
            ("lng".to_string(), lng.to_string()),
            ("km".to_string(), km.to_string()),
            ("limit".to_string(), limit.to_string()),
        ]);

        let body: ListBody = self.get_json("/monumentos/radio", &query).await?;
        let records = match body {
            ListBody::Page { data, .. } | ListBody::Bare(data) => data,
        };
        let mut results: Vec<PointOfInterest> =
            records.into_iter().filter_map(|r| r.into_poi()).collect();
        results.truncate(limit);

        if results.len() >= self.min_nearby_results || results.len() >= limit {
            return Ok(results);
        }

        tracing::debug!(
            found = results.len(),
            min = self.min_nearby_results,
            "radius search too sparse, falling back to broad search"
        );
        let broad_limit = u32::try_from(limit).unwrap_or(u32::MAX);
        match self.search(filters, 1, broad_limit, None).await {
            Ok(mut page) => {
                let center = (lat, lng);
                page.items.sort_by(|a, b| {
                    utils::haversine_km(center, a.position())
                        .total_cmp(&utils::haversine_km(center, b.position()))
                });
                let mut seen: HashSet<PoiId> = results.iter().map(|p| p.id).collect();
                for poi in page.items {
                    if results.len() >= limit {
                        break;
                    }
                    if seen.insert(poi.id) {
                        results.push(poi);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "broad search fallback failed, keeping radius results");
            }
        }
        Ok(results)
    }

    /// Persist a named route and return its catalogue id
    pub async fn save_route(&self, name: &str, stops: &[Stop]) -> Result<PoiId> {
        let request = SaveRouteRequest {
            nombre: name,
            monumentos: stops.iter().map(|s| s.id).collect(),
        };
        let body = serde_json::to_value(&request)?;
        let bytes = self.transport.post_json("/rutas", &body).await?;
        let response: SaveRouteResponse = decode(&bytes)?;

        let id = response.id.parse().ok_or_else(|| {
            CatalogueError::Decode(format!("invalid route id {:?}", response.id))
        })?;
        tracing::info!(route_id = id, stops = stops.len(), "route saved");
        Ok(id)
    }

    /// URL of the rendered itinerary of a saved route
    pub fn itinerary_pdf_url(&self, route_id: PoiId) -> String {
        format!("{}/rutas/{}/pdf", self.transport.base_url(), route_id)
    }

    async fn get_json<D: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<D> {
        let bytes = self.transport.get(path, query).await?;
        decode(&bytes)
    }
}

fn decode<D: DeserializeOwned>(bytes: &[u8]) -> Result<D> {
    serde_json::from_slice(bytes).map_err(|e| CatalogueError::Decode(e.to_string()))
}

impl<T: HttpTransport> SpatialQueryClient for CatalogueClient<T> {
    async fn query_bbox(
        &self,
        filters: &FilterSet,
        bounds: &ViewportBounds,
        limit: usize,
    ) -> Result<Vec<PointOfInterest>> {
        let mut query = vec![
            ("bbox".to_string(), bounds.bbox_param()),
            ("limit".to_string(), limit.to_string()),
        ];
        query.extend(filters.to_query());

        let collection: FeatureCollection<MonumentProperties> =
            self.get_json("/geojson", &query).await?;
        let mut pois: Vec<PointOfInterest> = collection
            .features
            .into_iter()
            .filter_map(|feature| feature.into_poi())
            .collect();
        pois.truncate(limit);

        tracing::debug!(markers = pois.len(), limit, zoom = bounds.zoom, "bbox query answered");
        Ok(pois)
    }

    async fn query_regional_summary(&self, filters: &FilterSet) -> Result<Vec<RegionSummary>> {
        let query = filters.to_query();
        let collection: FeatureCollection<RegionProperties> =
            self.get_json("/ccaa-resumen", &query).await?;
        let regions: Vec<RegionSummary> = collection
            .features
            .into_iter()
            .filter_map(|feature| feature.into_summary())
            .collect();

        tracing::debug!(regions = regions.len(), "regional summary answered");
        Ok(regions)
    }
}

impl<T: HttpTransport> RouteOptimizer for CatalogueClient<T> {
    async fn optimize(&self, stops: &[Stop]) -> Result<RouteResult> {
        if stops.len() < 2 {
            return Err(CatalogueError::Validation(format!(
                "optimization needs at least 2 stops, got {}",
                stops.len()
            )));
        }

        let request = OptimizeRequest {
            paradas: stops.iter().map(StopPayload::from).collect(),
        };
        let body = serde_json::to_value(&request)?;
        let bytes = self.transport.post_json("/rutas/optimizar", &body).await?;
        let response: OptimizeResponse = decode(&bytes)?;

        let ordered_stop_ids = permuted_ids(stops, &response.orden_optimizado)?;
        let geometry = response
            .geometria
            .map(|g| {
                g.coordinates
                    .into_iter()
                    .map(|[lon, lat]| Coord { x: lon, y: lat })
                    .collect::<LineString<f64>>()
            })
            .filter(|line| !line.0.is_empty());

        tracing::info!(
            stops = stops.len(),
            distance_km = response.distancia_km,
            duration_min = response.duracion_min,
            "route optimized"
        );
        Ok(RouteResult {
            ordered_stop_ids,
            geometry,
            distance_km: response.distancia_km,
            duration_min: response.duracion_min,
        })
    }
}

/// Map an index permutation of `stops` onto their ids
fn permuted_ids(stops: &[Stop], order: &[usize]) -> Result<Vec<PoiId>> {
    if order.len() != stops.len() {
        return Err(CatalogueError::Consistency {
            reason: format!(
                "optimizer returned {} indices for {} stops",
                order.len(),
                stops.len()
            ),
        });
    }

    let mut seen = vec![false; stops.len()];
    order
        .iter()
        .map(|&index| match seen.get_mut(index) {
            Some(flag) if !*flag => {
                *flag = true;
                Ok(stops[index].id)
            }
            Some(_) => Err(CatalogueError::Consistency {
                reason: format!("index {index} repeated in optimizer order"),
            }),
            None => Err(CatalogueError::Consistency {
                reason: format!("index {index} out of range"),
            }),
        })
        .collect()
}
