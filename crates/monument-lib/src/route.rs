//! Route planning session
//!
//! A [`RoutePlanner`] owns the selection of one planning session together
//! with the optimized route computed for it. Any change of the stop list drops
//! the route, so an exported or saved route always matches the stops shown.
//!
//! Optimization is split into [`RoutePlanner::begin_optimization`] and
//! [`RoutePlanner::finish_optimization`] so the planner stays usable while the
//! solver call is pending. The ticket remembers the selection version it was
//! issued for; a result for an older version is dropped.

use crate::api::{CatalogueClient, HttpTransport};
use crate::export::{self, ExportDocument, ExportFormat};
use crate::selection::{MAX_STOPS, SelectAllOutcome, SelectionStore, ToggleOutcome};
use crate::{CatalogueError, Notice, PoiId, PointOfInterest, Result, Stop};

use geo::LineString;
use std::future::Future;

/// Outcome of a successful optimization
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    /// The selected ids in visiting order
    pub ordered_stop_ids: Vec<PoiId>,
    /// Road geometry, x = longitude, y = latitude
    pub geometry: Option<LineString<f64>>,
    pub distance_km: f64,
    pub duration_min: f64,
}

impl RouteResult {
    /// Short human readable metrics, e.g. `12.3 km · 45 min`
    pub fn summary(&self) -> String {
        format!("{:.1} km · {:.0} min", self.distance_km, self.duration_min)
    }
}

/// External solver that orders stops
pub trait RouteOptimizer: Send + Sync {
    /// Compute the visiting order of `stops` (at least two of them).
    fn optimize(&self, stops: &[Stop]) -> impl Future<Output = Result<RouteResult>> + Send;
}

/// Snapshot of the stops handed to the optimizer
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationTicket {
    version: u64,
    stops: Vec<Stop>,
}

impl OptimizationTicket {
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }
}

/// What [`RoutePlanner::finish_optimization`] did with a solver result
#[derive(Debug)]
pub enum OptimizationOutcome {
    /// The selection was reordered and the route stored
    Applied,
    /// The selection changed while the solver was running; result dropped
    Stale,
    /// The solver failed or returned an inconsistent order; stop order kept
    Failed(CatalogueError),
}

/// Selection, route and status of one planning session
#[derive(Debug, Clone)]
pub struct RoutePlanner {
    name: String,
    selection: SelectionStore,
    route: Option<RouteResult>,
    notice: Option<Notice>,
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new("Route")
    }
}

impl RoutePlanner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selection: SelectionStore::new(),
            route: None,
            notice: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    /// Current optimized route, if the stop list has not changed since
    pub fn route(&self) -> Option<&RouteResult> {
        self.route.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn stops(&self) -> Vec<Stop> {
        self.selection.stops()
    }

    pub fn toggle(&mut self, poi: &PointOfInterest) -> ToggleOutcome {
        let outcome = self.selection.toggle(poi);
        match outcome {
            ToggleOutcome::CapacityReached => self.notice = Some(capacity_notice()),
            ToggleOutcome::Added | ToggleOutcome::Removed => self.invalidate(),
        }
        outcome
    }

    pub fn select_all<'a, I>(&mut self, candidates: I) -> SelectAllOutcome
    where
        I: IntoIterator<Item = &'a PointOfInterest>,
    {
        let outcome = self.selection.select_all(candidates);
        if outcome.added > 0 {
            self.invalidate();
        }
        if outcome.capacity_reached() {
            self.notice = Some(capacity_notice());
        }
        outcome
    }

    pub fn clear(&mut self) {
        self.selection.clear();
        self.invalidate();
    }

    pub fn remove(&mut self, id: PoiId) -> bool {
        let removed = self.selection.remove(id);
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Move the stop at `from` to `to`; false when either index is out of range
    pub fn move_stop(&mut self, from: usize, to: usize) -> bool {
        let before = self.selection.version();
        let moved = self.selection.move_stop(from, to);
        if self.selection.version() != before {
            self.invalidate();
        }
        moved
    }

    pub fn move_up(&mut self, index: usize) -> bool {
        index > 0 && self.move_stop(index, index - 1)
    }

    pub fn move_down(&mut self, index: usize) -> bool {
        index
            .checked_add(1)
            .is_some_and(|to| self.move_stop(index, to))
    }

    /// Snapshot the stops for an optimizer call
    pub fn begin_optimization(&self) -> Result<OptimizationTicket> {
        if self.selection.len() < 2 {
            return Err(CatalogueError::Validation(format!(
                "optimization needs at least 2 stops, {} selected",
                self.selection.len()
            )));
        }
        Ok(OptimizationTicket {
            version: self.selection.version(),
            stops: self.selection.stops(),
        })
    }

    /// Apply the optimizer result for `ticket`
    pub fn finish_optimization(
        &mut self,
        ticket: OptimizationTicket,
        result: Result<RouteResult>,
    ) -> OptimizationOutcome {
        if ticket.version != self.selection.version() {
            tracing::debug!(
                ticket_version = ticket.version,
                current_version = self.selection.version(),
                "dropping optimization result for an outdated selection"
            );
            return OptimizationOutcome::Stale;
        }

        let route = match result {
            Ok(route) => route,
            Err(e) => return self.optimization_failed(e),
        };
        if let Err(e) = self.selection.apply_permutation(&route.ordered_stop_ids) {
            return self.optimization_failed(e);
        }

        tracing::info!(
            stops = route.ordered_stop_ids.len(),
            summary = %route.summary(),
            "optimized route applied"
        );
        self.notice = None;
        self.route = Some(route);
        OptimizationOutcome::Applied
    }

    /// Run a full optimization round trip against `optimizer`
    pub async fn optimize_with<O: RouteOptimizer>(
        &mut self,
        optimizer: &O,
    ) -> Result<OptimizationOutcome> {
        let ticket = self.begin_optimization()?;
        let result = optimizer.optimize(ticket.stops()).await;
        Ok(self.finish_optimization(ticket, result))
    }

    /// Export the stops in their current order, with the route geometry if any
    pub fn export(&self, format: ExportFormat) -> Result<ExportDocument> {
        #[cfg(feature = "profiling")]
        profiling::scope!("route::export");

        if self.selection.is_empty() {
            return Err(CatalogueError::Validation(
                "nothing to export, the route has no stops".to_string(),
            ));
        }
        let stops = self.selection.stops();
        let geometry = self.route.as_ref().and_then(|r| r.geometry.as_ref());
        Ok(export::export(format, &self.name, &stops, geometry))
    }

    /// Persist the route in the catalogue and return its id
    pub async fn save_with<T: HttpTransport>(&self, client: &CatalogueClient<T>) -> Result<PoiId> {
        if self.selection.is_empty() {
            return Err(CatalogueError::Validation(
                "nothing to save, the route has no stops".to_string(),
            ));
        }
        client.save_route(&self.name, &self.selection.stops()).await
    }

    fn optimization_failed(&mut self, error: CatalogueError) -> OptimizationOutcome {
        tracing::warn!(error = %error, "route optimization failed, keeping stop order");
        self.notice = Some(Notice::Info(format!(
            "Route optimization unavailable, stops kept in their current order ({error})"
        )));
        OptimizationOutcome::Failed(error)
    }

    fn invalidate(&mut self) {
        if self.route.take().is_some() {
            tracing::debug!("stop list changed, optimized route dropped");
        }
    }
}

fn capacity_notice() -> Notice {
    Notice::Info(format!("A route holds at most {MAX_STOPS} stops"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use std::sync::Mutex;

    fn poi(id: PoiId, lat: f64, lon: f64) -> PointOfInterest {
        PointOfInterest {
            id,
            lon,
            lat,
            name: format!("Monument {id}"),
            category_tag: "Arquitectura civil".to_string(),
            type_tag: String::new(),
            municipality: None,
            thumbnail_url: None,
        }
    }

    fn two_stop_planner() -> RoutePlanner {
        let mut planner = RoutePlanner::new("Test");
        planner.toggle(&poi(1, 41.65, -0.88));
        planner.toggle(&poi(2, 41.0, -1.0));
        planner
    }

    fn swapped_route() -> RouteResult {
        RouteResult {
            ordered_stop_ids: vec![2, 1],
            geometry: Some(LineString::new(vec![
                Coord { x: -1.0, y: 41.0 },
                Coord { x: -0.88, y: 41.65 },
            ])),
            distance_km: 78.44,
            duration_min: 61.6,
        }
    }

    /// Answers with a fixed result and records the stops it was given
    struct FixedOptimizer {
        order: Vec<usize>,
        calls: Mutex<Vec<Vec<PoiId>>>,
    }

    impl RouteOptimizer for FixedOptimizer {
        async fn optimize(&self, stops: &[Stop]) -> Result<RouteResult> {
            self.calls
                .lock()
                .unwrap()
                .push(stops.iter().map(|s| s.id).collect());
            Ok(RouteResult {
                ordered_stop_ids: self.order.iter().map(|&i| stops[i].id).collect(),
                geometry: None,
                distance_km: 10.0,
                duration_min: 12.0,
            })
        }
    }

    struct FailingOptimizer;

    impl RouteOptimizer for FailingOptimizer {
        async fn optimize(&self, _stops: &[Stop]) -> Result<RouteResult> {
            Err(CatalogueError::Network("solver timed out".to_string()))
        }
    }

    #[test]
    fn test_summary_format() {
        assert_eq!(swapped_route().summary(), "78.4 km · 62 min");
    }

    #[test]
    fn test_optimization_swaps_two_stops() {
        let mut planner = two_stop_planner();
        let ticket = planner.begin_optimization().unwrap();
        assert_eq!(ticket.stops().len(), 2);

        let outcome = planner.finish_optimization(ticket, Ok(swapped_route()));
        assert!(matches!(outcome, OptimizationOutcome::Applied));
        assert_eq!(planner.selection().ids(), vec![2, 1]);
        assert!(planner.route().is_some());
    }

    #[test]
    fn test_optimization_requires_two_stops() {
        let mut planner = RoutePlanner::new("Solo");
        planner.toggle(&poi(1, 41.65, -0.88));
        assert!(matches!(
            planner.begin_optimization(),
            Err(CatalogueError::Validation(_))
        ));
    }

    #[test]
    fn test_result_for_changed_selection_is_stale() {
        let mut planner = two_stop_planner();
        let ticket = planner.begin_optimization().unwrap();
        planner.toggle(&poi(3, 42.0, -0.5));

        let outcome = planner.finish_optimization(ticket, Ok(swapped_route()));
        assert!(matches!(outcome, OptimizationOutcome::Stale));
        assert_eq!(planner.selection().ids(), vec![1, 2, 3]);
        assert!(planner.route().is_none());
    }

    #[test]
    fn test_failed_optimization_keeps_order() {
        let mut planner = two_stop_planner();
        let ticket = planner.begin_optimization().unwrap();
        let outcome = planner
            .finish_optimization(ticket, Err(CatalogueError::Network("offline".to_string())));

        assert!(matches!(outcome, OptimizationOutcome::Failed(CatalogueError::Network(_))));
        assert_eq!(planner.selection().ids(), vec![1, 2]);
        assert!(matches!(planner.notice(), Some(Notice::Info(_))));
    }

    #[test]
    fn test_inconsistent_permutation_is_rejected() {
        let mut planner = two_stop_planner();
        let ticket = planner.begin_optimization().unwrap();
        let bad = RouteResult {
            ordered_stop_ids: vec![2, 9],
            ..swapped_route()
        };

        let outcome = planner.finish_optimization(ticket, Ok(bad));
        assert!(matches!(
            outcome,
            OptimizationOutcome::Failed(CatalogueError::Consistency { .. })
        ));
        assert_eq!(planner.selection().ids(), vec![1, 2]);
        assert!(planner.route().is_none());
    }

    #[test]
    fn test_mutations_invalidate_route() {
        let mut planner = two_stop_planner();
        let ticket = planner.begin_optimization().unwrap();
        planner.finish_optimization(ticket, Ok(swapped_route()));
        assert!(planner.route().is_some());

        assert!(planner.move_down(0));
        assert!(planner.route().is_none());
        assert_eq!(planner.selection().ids(), vec![1, 2]);

        let ticket = planner.begin_optimization().unwrap();
        planner.finish_optimization(ticket, Ok(swapped_route()));
        assert!(planner.remove(1));
        assert!(planner.route().is_none());
    }

    #[test]
    fn test_move_bounds() {
        let mut planner = two_stop_planner();
        assert!(!planner.move_up(0));
        assert!(!planner.move_down(1));
        assert!(planner.move_up(1));
        assert_eq!(planner.selection().ids(), vec![2, 1]);
    }

    #[test]
    fn test_capacity_sets_notice() {
        let mut planner = RoutePlanner::new("Full");
        let pois: Vec<PointOfInterest> = (0..30).map(|i| poi(i, 41.0, -1.0)).collect();

        let outcome = planner.select_all(&pois);
        assert_eq!(outcome.added, MAX_STOPS);
        assert_eq!(outcome.rejected, 5);
        assert!(matches!(planner.take_notice(), Some(Notice::Info(_))));

        assert_eq!(planner.toggle(&poi(99, 41.0, -1.0)), ToggleOutcome::CapacityReached);
        assert_eq!(planner.selection().len(), MAX_STOPS);
        assert!(planner.notice().is_some());
    }

    #[test]
    fn test_export_requires_stops() {
        let planner = RoutePlanner::new("Empty");
        assert!(matches!(
            planner.export(ExportFormat::Gpx),
            Err(CatalogueError::Validation(_))
        ));
    }

    #[test]
    fn test_export_includes_route_geometry() {
        let mut planner = two_stop_planner();
        let before = planner.export(ExportFormat::Gpx).unwrap();
        assert!(!String::from_utf8_lossy(&before.bytes).contains("<trk>"));

        let ticket = planner.begin_optimization().unwrap();
        planner.finish_optimization(ticket, Ok(swapped_route()));
        let after = planner.export(ExportFormat::Gpx).unwrap();
        let text = String::from_utf8(after.bytes).unwrap();
        assert!(text.contains("<trkpt lat=\"41.0\" lon=\"-1.0\"/>"));
        assert!(text.find("Monument 2").unwrap() < text.find("Monument 1").unwrap());
    }

    #[tokio::test]
    async fn test_optimize_with_applies_order() {
        let mut planner = two_stop_planner();
        planner.toggle(&poi(3, 42.0, -0.5));
        let optimizer = FixedOptimizer {
            order: vec![2, 0, 1],
            calls: Mutex::new(Vec::new()),
        };

        let outcome = planner.optimize_with(&optimizer).await.unwrap();
        assert!(matches!(outcome, OptimizationOutcome::Applied));
        assert_eq!(planner.selection().ids(), vec![3, 1, 2]);
        assert_eq!(optimizer.calls.lock().unwrap()[0], vec![1, 2, 3]);
        assert_eq!(planner.route().map(RouteResult::summary).as_deref(), Some("10.0 km · 12 min"));
    }

    #[tokio::test]
    async fn test_optimize_with_failure_is_soft() {
        let mut planner = two_stop_planner();
        let outcome = planner.optimize_with(&FailingOptimizer).await.unwrap();
        assert!(matches!(outcome, OptimizationOutcome::Failed(_)));
        assert_eq!(planner.selection().ids(), vec![1, 2]);
        assert!(planner.export(ExportFormat::Kml).is_ok());
    }
}
