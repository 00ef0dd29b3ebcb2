//! Map session
//!
//! [`MapSession`] ties the bounds tracker, the active filters and the displayed
//! data layer together. It performs no I/O itself: each event returns at most
//! one [`FetchRequest`], the caller runs it (see [`fetch`] and
//! [`MapSession::drive`]) and hands the result back through
//! [`MapSession::resolve`]. Failed or stale responses never replace the layer
//! that is currently displayed.

use crate::api::SpatialQueryClient;
use crate::bounds::{BoundsTracker, FetchPlan, FetchTicket, Resolution};
use crate::cluster::{self, ClusterConfig, ClusterOrMarker, PixelViewport};
use crate::lod::LodMode;
use crate::{
    CatalogueError, EngineConfig, FilterSet, Notice, PointOfInterest, RegionSummary, Result,
};

use std::sync::Arc;

/// Data currently shown on the map
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MapLayer {
    /// Nothing loaded yet
    #[default]
    Empty,
    Regions(Vec<RegionSummary>),
    Markers(Vec<PointOfInterest>),
}

/// Payload of a completed fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResponse {
    Regions(Vec<RegionSummary>),
    Markers(Vec<PointOfInterest>),
}

/// A fetch to run: the tracker ticket plus the filters it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub filters: Arc<FilterSet>,
}

/// Run `request` against `client`
pub async fn fetch<C: SpatialQueryClient>(
    client: &C,
    request: &FetchRequest,
) -> Result<FetchResponse> {
    match request.ticket.plan {
        FetchPlan::RegionalSummary => client
            .query_regional_summary(&request.filters)
            .await
            .map(FetchResponse::Regions),
        FetchPlan::Markers { limit } => client
            .query_bbox(&request.filters, &request.ticket.bounds, limit)
            .await
            .map(FetchResponse::Markers),
    }
}

/// Viewport-driven data state of one map
#[derive(Debug, Clone)]
pub struct MapSession {
    tracker: BoundsTracker,
    filters: Arc<FilterSet>,
    layer: MapLayer,
    notice: Option<Notice>,
    cluster_config: ClusterConfig,
}

impl MapSession {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tracker: BoundsTracker::new(),
            filters: Arc::new(FilterSet::default()),
            layer: MapLayer::Empty,
            notice: None,
            cluster_config: config.cluster.clone(),
        }
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = Arc::new(filters);
        self
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn mode(&self) -> LodMode {
        self.tracker.mode()
    }

    pub fn layer(&self) -> &MapLayer {
        &self.layer
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Handle the end of a pan or zoom gesture
    pub fn viewport_settled(&mut self, bounds: crate::ViewportBounds) -> Option<FetchRequest> {
        let ticket = self.tracker.on_viewport_settled(bounds)?;
        Some(self.request(ticket))
    }

    /// Replace the active filters and refetch the latest viewport
    pub fn set_filters(&mut self, filters: FilterSet) -> Option<FetchRequest> {
        if *self.filters == filters {
            return None;
        }
        tracing::debug!(filters = ?filters, "filters changed");
        self.filters = Arc::new(filters);
        let ticket = self.tracker.refresh()?;
        Some(self.request(ticket))
    }

    /// Accept the outcome of `request`, returning a follow-up fetch if one is needed
    pub fn resolve(
        &mut self,
        request: &FetchRequest,
        result: Result<FetchResponse>,
    ) -> Option<FetchRequest> {
        let token = request.ticket.token;
        let response = match result {
            Ok(response) => response,
            Err(error) => return self.fetch_failed(token, &error),
        };

        match self.tracker.resolve(token) {
            Resolution::Apply => {
                self.apply(response);
                None
            }
            Resolution::Discard { follow_up } => follow_up.map(|ticket| self.request(ticket)),
        }
    }

    /// Run `request` and every follow-up it triggers until the session is settled
    pub async fn drive<C: SpatialQueryClient>(&mut self, client: &C, request: FetchRequest) {
        let mut next = Some(request);
        while let Some(request) = next.take() {
            let result = fetch(client, &request).await;
            next = self.resolve(&request, result);
        }
    }

    /// Render items for the latest viewport
    ///
    /// Regional summaries are not clustered; they render one glyph per region.
    pub fn rendered(&self) -> Vec<ClusterOrMarker> {
        let (MapLayer::Markers(markers), Some(bounds)) =
            (&self.layer, self.tracker.latest_bounds())
        else {
            return Vec::new();
        };
        cluster::cluster(
            markers,
            &PixelViewport::from_bounds(bounds),
            &self.cluster_config,
        )
    }

    fn request(&self, ticket: FetchTicket) -> FetchRequest {
        FetchRequest {
            ticket,
            filters: Arc::clone(&self.filters),
        }
    }

    fn apply(&mut self, response: FetchResponse) {
        self.layer = match response {
            FetchResponse::Regions(regions) => {
                tracing::debug!(regions = regions.len(), "regional summary displayed");
                MapLayer::Regions(regions)
            }
            FetchResponse::Markers(markers) => {
                tracing::debug!(markers = markers.len(), "markers displayed");
                MapLayer::Markers(markers)
            }
        };
        self.notice = None;
    }

    fn fetch_failed(&mut self, token: u64, error: &CatalogueError) -> Option<FetchRequest> {
        if !self.tracker.is_live(token) {
            tracing::debug!(token, error = %error, "superseded fetch failed");
            return None;
        }
        tracing::warn!(token, error = %error, "fetch failed, keeping displayed data");
        self.notice = Some(Notice::Warning(
            "Could not refresh the map, showing the last loaded data".to_string(),
        ));
        let ticket = self.tracker.fail(token)?;
        Some(self.request(ticket))
    }
}
