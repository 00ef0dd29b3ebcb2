//! Level-of-detail selection
//!
//! Low zoom levels show one aggregate per region; from [`DETAIL_ZOOM`] upwards
//! individual monuments are fetched, capped by a zoom-banded limit. The same
//! threshold is used in both directions, so a gesture that hovers around it may
//! switch modes on every settle.

use serde::{Deserialize, Serialize};

/// Zoom at which the map switches from regional summaries to individual markers
pub const DETAIL_ZOOM: u8 = 7;

/// Fetch limit bands as (minimum zoom, limit), highest band first
const FETCH_LIMIT_BANDS: [(u8, usize); 3] = [(10, 10_000), (8, 5_000), (6, 3_000)];

/// Fetch limit below the lowest band
const MIN_FETCH_LIMIT: usize = 1_500;

/// Granularity of the data shown on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LodMode {
    /// One aggregate count per administrative region
    #[default]
    Summary,
    /// Individual monument markers inside the viewport
    Detail,
}

/// Result of a mode decision for one viewport settle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodDecision {
    pub mode: LodMode,
    /// Maximum number of markers to request (detail mode only)
    pub fetch_limit: Option<usize>,
    /// Whether `mode` differs from the mode passed in
    pub changed: bool,
}

/// Maximum number of markers to request at a zoom level
pub fn fetch_limit(zoom: u8) -> usize {
    FETCH_LIMIT_BANDS
        .iter()
        .find(|(min_zoom, _)| zoom >= *min_zoom)
        .map_or(MIN_FETCH_LIMIT, |(_, limit)| *limit)
}

/// Decide the mode for `zoom`, given the mode currently displayed
pub fn decide(zoom: u8, current: LodMode) -> LodDecision {
    let mode = match current {
        LodMode::Summary if zoom >= DETAIL_ZOOM => LodMode::Detail,
        LodMode::Detail if zoom < DETAIL_ZOOM => LodMode::Summary,
        unchanged => unchanged,
    };

    LodDecision {
        mode,
        fetch_limit: (mode == LodMode::Detail).then(|| fetch_limit(zoom)),
        changed: mode != current,
    }
}
