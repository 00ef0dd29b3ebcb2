//! Screen-space marker clustering
//!
//! Markers are projected to pixel coordinates at the viewport zoom and grouped
//! greedily: each marker joins the first-created cluster whose anchor lies
//! within the configured pixel radius, otherwise it anchors a new cluster.
//! Anchors are never moved, so the grouping only depends on the input order and
//! the viewport, and repeated calls give identical output.
//!
//! A grid of radius-sized cells keeps the neighbour search local; only the 3x3
//! cells around a marker can hold an anchor within range.

use crate::style::MarkerStyle;
use crate::{PoiId, PointOfInterest, ViewportBounds, utils};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Clustering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum distance in pixels between a marker and its cluster anchor
    pub radius_px: f64,
    /// From this zoom upwards every marker is shown individually
    pub disable_at_zoom: u8,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_px: 80.0,
            disable_at_zoom: 17,
        }
    }
}

/// Pixel frame of the visible map at one zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelViewport {
    pub bounds: ViewportBounds,
    /// World pixel coordinates of the north-west corner
    pub origin: (f64, f64),
    /// Width and height in pixels
    pub size: (f64, f64),
}

impl PixelViewport {
    pub fn from_bounds(bounds: ViewportBounds) -> Self {
        let bounds = bounds.normalized();
        let origin = utils::wgs84_to_world_pixel(bounds.max_lat, bounds.min_lon, bounds.zoom);
        let far = utils::wgs84_to_world_pixel(bounds.min_lat, bounds.max_lon, bounds.zoom);
        Self {
            bounds,
            origin,
            size: (far.0 - origin.0, far.1 - origin.1),
        }
    }

    /// Screen position of a (lat, lon) pair relative to the viewport origin
    #[inline]
    pub fn to_screen(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (x, y) = utils::wgs84_to_world_pixel(lat, lon, self.bounds.zoom);
        (x - self.origin.0, y - self.origin.1)
    }
}

/// A single marker ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerView {
    pub poi: PointOfInterest,
    pub screen: (f64, f64),
    pub style: MarkerStyle,
}

/// A group of markers rendered as one glyph
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub count: usize,
    /// Mean position of the members
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    /// Mean screen position of the members
    pub screen: (f64, f64),
    pub member_ids: SmallVec<[PoiId; 8]>,
}

impl Cluster {
    pub fn label(&self) -> String {
        count_label(self.count)
    }
}

/// Render item produced by [`cluster`]
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterOrMarker {
    Marker(MarkerView),
    Cluster(Cluster),
}

impl ClusterOrMarker {
    /// Number of monuments represented by this item
    pub fn count(&self) -> usize {
        match self {
            Self::Marker(_) => 1,
            Self::Cluster(cluster) => cluster.count,
        }
    }
}

/// Display label for a cluster size: `999`, `1k`, `2k`, ...
///
/// Display only: sizes of 1000 and above are rounded to the nearest thousand.
pub fn count_label(count: usize) -> String {
    if count < 1000 {
        count.to_string()
    } else {
        format!("{}k", (count as f64 / 1000.0).round())
    }
}

struct Group {
    anchor: (f64, f64),
    members: SmallVec<[usize; 8]>,
}

/// Group the markers visible in `viewport`
pub fn cluster(
    markers: &[PointOfInterest],
    viewport: &PixelViewport,
    config: &ClusterConfig,
) -> Vec<ClusterOrMarker> {
    #[cfg(feature = "profiling")]
    profiling::scope!("cluster::cluster");

    let projected: Vec<Option<(f64, f64)>> = markers
        .par_iter()
        .map(|poi| {
            viewport
                .bounds
                .contains(poi.lon, poi.lat)
                .then(|| viewport.to_screen(poi.lat, poi.lon))
        })
        .collect();

    if viewport.bounds.zoom >= config.disable_at_zoom || config.radius_px <= 0.0 {
        return markers
            .iter()
            .zip(&projected)
            .filter_map(|(poi, screen)| {
                screen.map(|screen| ClusterOrMarker::Marker(marker_view(poi, screen)))
            })
            .collect();
    }

    let radius = config.radius_px;
    let radius_sq = radius * radius;
    let mut groups: Vec<Group> = Vec::new();
    let mut grid: HashMap<(i64, i64), SmallVec<[usize; 4]>> = HashMap::new();

    for (index, screen) in projected.iter().enumerate() {
        let Some(screen) = *screen else {
            continue;
        };
        let cell = grid_cell(screen, radius);

        let mut nearest: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = grid.get(&(cell.0 + dx, cell.1 + dy)) else {
                    continue;
                };
                for &group in candidates {
                    let anchor = groups[group].anchor;
                    let dist_sq = (anchor.0 - screen.0).powi(2) + (anchor.1 - screen.1).powi(2);
                    if dist_sq <= radius_sq && nearest.is_none_or(|best| group < best) {
                        nearest = Some(group);
                    }
                }
            }
        }

        match nearest {
            Some(group) => groups[group].members.push(index),
            None => {
                grid.entry(cell).or_default().push(groups.len());
                groups.push(Group {
                    anchor: screen,
                    members: smallvec::smallvec![index],
                });
            }
        }
    }

    tracing::trace!(
        markers = markers.len(),
        groups = groups.len(),
        zoom = viewport.bounds.zoom,
        "markers clustered"
    );

    groups
        .into_iter()
        .map(|group| {
            if let [only] = group.members.as_slice() {
                let screen = projected[*only].unwrap_or(group.anchor);
                return ClusterOrMarker::Marker(marker_view(&markers[*only], screen));
            }
            ClusterOrMarker::Cluster(summarize(&group, markers, &projected))
        })
        .collect()
}

#[inline]
fn grid_cell(screen: (f64, f64), radius: f64) -> (i64, i64) {
    (
        (screen.0 / radius).floor() as i64,
        (screen.1 / radius).floor() as i64,
    )
}

fn marker_view(poi: &PointOfInterest, screen: (f64, f64)) -> MarkerView {
    MarkerView {
        poi: poi.clone(),
        screen,
        style: poi.category().style(),
    }
}

fn summarize(
    group: &Group,
    markers: &[PointOfInterest],
    projected: &[Option<(f64, f64)>],
) -> Cluster {
    let count = group.members.len();
    let n = count as f64;
    let (mut lat, mut lon, mut x, mut y) = (0.0, 0.0, 0.0, 0.0);
    for &member in &group.members {
        let poi = &markers[member];
        let screen = projected[member].unwrap_or(group.anchor);
        lat += poi.lat;
        lon += poi.lon;
        x += screen.0;
        y += screen.1;
    }

    Cluster {
        count,
        centroid_lat: lat / n,
        centroid_lon: lon / n,
        screen: (x / n, y / n),
        member_ids: group.members.iter().map(|&m| markers[m].id).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn viewport(zoom: u8) -> PixelViewport {
        PixelViewport::from_bounds(ViewportBounds::new(-2.0, 40.0, 1.0, 43.0, zoom))
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(1), "1");
        assert_eq!(count_label(999), "999");
        assert_eq!(count_label(1000), "1k");
        assert_eq!(count_label(1499), "1k");
        assert_eq!(count_label(1500), "2k");
        assert_eq!(count_label(12_345), "12k");
    }

    #[test]
    fn test_pixel_viewport_origin_is_north_west() {
        let vp = viewport(8);
        let (x, y) = vp.to_screen(43.0, -2.0);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
        assert!(vp.size.0 > 0.0 && vp.size.1 > 0.0);
    }

    #[test]
    fn test_nearby_markers_are_grouped() {
        let markers = vec![
            poi(1, 41.650, -0.880),
            poi(2, 41.651, -0.881),
            poi(3, 41.652, -0.879),
        ];
        let items = cluster(&markers, &viewport(8), &ClusterConfig::default());
        assert_eq!(items.len(), 1);

        let ClusterOrMarker::Cluster(group) = &items[0] else {
            panic!("expected a cluster");
        };
        assert_eq!(group.count, 3);
        assert_eq!(group.label(), "3");
        assert_eq!(group.member_ids.as_slice(), &[1, 2, 3]);
        assert!((group.centroid_lat - 41.651).abs() < 1e-9);
    }

    #[test]
    fn test_distant_markers_stay_individual() {
        let markers = vec![poi(1, 41.65, -0.88), poi(2, 40.5, 0.5)];
        let items = cluster(&markers, &viewport(9), &ClusterConfig::default());
        assert_eq!(items.len(), 2);
        assert!(
            items
                .iter()
                .all(|item| matches!(item, ClusterOrMarker::Marker(_)))
        );
    }

    #[test]
    fn test_clustering_disabled_at_high_zoom() {
        let markers = vec![poi(1, 41.6500, -0.8800), poi(2, 41.6501, -0.8801)];
        let vp = PixelViewport::from_bounds(ViewportBounds::new(-0.9, 41.6, -0.8, 41.7, 17));
        let items = cluster(&markers, &vp, &ClusterConfig::default());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_markers_outside_viewport_are_skipped() {
        let markers = vec![poi(1, 41.65, -0.88), poi(2, 48.85, 2.35)];
        let items = cluster(&markers, &viewport(9), &ClusterConfig::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items.iter().map(ClusterOrMarker::count).sum::<usize>(), 1);
    }

    #[test]
    fn test_clustering_is_deterministic_and_conserves_counts() {
        let markers: Vec<PointOfInterest> = (0..500)
            .map(|i| {
                let t = i as f64;
                poi(i, 40.2 + (t * 0.37).sin().abs() * 2.6, -1.8 + (t * 0.11).cos().abs() * 2.6)
            })
            .collect();
        let vp = viewport(7);
        let config = ClusterConfig::default();

        let first = cluster(&markers, &vp, &config);
        let second = cluster(&markers, &vp, &config);
        assert_eq!(first, second);
        assert_eq!(first.iter().map(ClusterOrMarker::count).sum::<usize>(), 500);
    }

    #[test]
    fn test_marker_view_carries_category_style() {
        let markers = vec![poi(1, 41.65, -0.88)];
        let items = cluster(&markers, &viewport(9), &ClusterConfig::default());
        let ClusterOrMarker::Marker(view) = &items[0] else {
            panic!("expected a marker");
        };
        assert_eq!(view.style.glyph, "building");
    }
}
