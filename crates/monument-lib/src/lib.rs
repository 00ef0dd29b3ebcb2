//! Monument Library - Viewport Data Engine and Route Planner for Heritage Catalogues
//!
//! This library decides what to fetch while a map viewport moves over a large
//! monument catalogue, groups the resulting markers for rendering, and lets a user
//! build an ordered, capped list of stops that can be optimized by an external
//! solver and exported to GPX or KML.
//!
//! # Architecture
//!
//! - **[`lod`]**: Summary/detail mode switching and zoom-banded fetch limits
//! - **[`BoundsTracker`]**: Viewport settle events, request tokens, stale-response rejection
//! - **[`CatalogueClient`]**: Bounding-box, regional summary, search and radius queries
//! - **[`cluster`]**: Screen-space marker clustering
//! - **[`SelectionStore`]**: Ordered, deduplicated selection capped at [`MAX_STOPS`]
//! - **[`RoutePlanner`]**: Route session tying selection, optimizer and export together
//! - **[`export`]**: GPX 1.1 and KML 2.2 document generation
//! - **[`MapSession`]**: Map-side session tying bounds tracking, queries and clustering together
//!
//! Everything is driven from a single event loop. Network calls are the only
//! suspension points; state machines hand out tickets before a call and accept the
//! result afterwards, so responses that arrive late are detected and dropped.

pub mod api;
mod bounds;
pub mod cluster;
mod config;
pub mod export;
pub mod lod;
mod model;
mod route;
mod selection;
mod session;
pub mod style;
pub mod utils;

// Public API exports
pub use api::{CatalogueClient, HttpTransport, ReqwestTransport, SearchPage, SpatialQueryClient};
pub use bounds::{BoundsTracker, FetchPlan, FetchTicket, Resolution};
pub use cluster::{Cluster, ClusterConfig, ClusterOrMarker, MarkerView, PixelViewport};
pub use config::EngineConfig;
pub use export::{ExportDocument, ExportFormat};
pub use lod::{LodDecision, LodMode};
pub use model::{FilterSet, Notice, PoiId, PointOfInterest, RegionSummary, Stop, ViewportBounds};
pub use route::{
    OptimizationOutcome, OptimizationTicket, RouteOptimizer, RoutePlanner, RouteResult,
};
pub use selection::{MAX_STOPS, SelectAllOutcome, SelectionEntry, SelectionStore, ToggleOutcome};
pub use session::{FetchRequest, FetchResponse, MapLayer, MapSession, fetch};

/// Error types for the catalogue engine
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response payload: {0}")]
    Decode(String),

    #[error("Consistency error: {reason}")]
    Consistency { reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogueError {
    /// True for failures that originate at the network boundary.
    ///
    /// Callers keep showing the previous state when this returns true.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogueError>;
