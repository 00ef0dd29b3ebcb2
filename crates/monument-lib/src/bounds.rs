//! Viewport bounds tracking with request tokens
//!
//! The tracker receives one event per viewport settle and decides whether a
//! catalogue fetch should start. At most one fetch is live at a time: settles that
//! arrive while a fetch is outstanding are recorded but not fetched. When the live
//! fetch resolves, its token is compared with the tracker state; a response that
//! no longer matches the latest settled viewport is discarded and a single
//! follow-up fetch is issued for the final viewport instead.
//!
//! A summary/detail transition always fetches immediately in the new mode. The
//! new ticket supersedes the outstanding one, whose response is then dropped on
//! arrival because its token is no longer live.

use crate::ViewportBounds;
use crate::lod::{self, LodMode};

/// What a ticket asks the catalogue for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// Per-region aggregates (independent of the viewport extent)
    RegionalSummary,
    /// Markers inside the ticket bounds, capped at `limit`
    Markers { limit: usize },
}

/// Permission to run one catalogue fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub token: u64,
    pub bounds: ViewportBounds,
    pub plan: FetchPlan,
}

/// Verdict on a response that has just arrived
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The response belongs to the latest viewport and may replace displayed state
    Apply,
    /// The response is stale and must be dropped; run `follow_up` if present
    Discard { follow_up: Option<FetchTicket> },
}

#[derive(Debug, Clone)]
struct InFlight {
    token: u64,
    plan: FetchPlan,
    /// Settle sequence number the fetch was issued for
    settle: u64,
}

/// Turns viewport settle events into catalogue fetch tickets
#[derive(Debug, Clone, Default)]
pub struct BoundsTracker {
    mode: LodMode,
    last_token: u64,
    settles: u64,
    latest: Option<ViewportBounds>,
    in_flight: Option<InFlight>,
    summary_loaded: bool,
}

impl BoundsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode of the data currently requested
    #[inline]
    pub fn mode(&self) -> LodMode {
        self.mode
    }

    /// Most recent settled viewport (normalized)
    #[inline]
    pub fn latest_bounds(&self) -> Option<ViewportBounds> {
        self.latest
    }

    /// Whether a live fetch is outstanding
    #[inline]
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether `token` belongs to the outstanding fetch
    #[inline]
    pub fn is_live(&self, token: u64) -> bool {
        self.in_flight.as_ref().is_some_and(|f| f.token == token)
    }

    /// Record a viewport settle and return a ticket if a fetch should start now
    pub fn on_viewport_settled(&mut self, bounds: ViewportBounds) -> Option<FetchTicket> {
        let bounds = bounds.normalized();
        self.settles += 1;
        self.latest = Some(bounds);

        let decision = lod::decide(bounds.zoom, self.mode);
        self.mode = decision.mode;

        if decision.changed {
            tracing::debug!(zoom = bounds.zoom, mode = ?self.mode, "level of detail changed");
            self.summary_loaded = false;
            return Some(self.issue(bounds));
        }

        if let Some(in_flight) = &self.in_flight {
            tracing::trace!(
                token = in_flight.token,
                zoom = bounds.zoom,
                "fetch in flight, viewport settle deferred"
            );
            return None;
        }

        match self.mode {
            LodMode::Summary if self.summary_loaded => None,
            _ => Some(self.issue(bounds)),
        }
    }

    /// Force a fetch for the latest viewport, e.g. after the filters changed
    ///
    /// Any outstanding fetch is superseded.
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        let bounds = self.latest?;
        self.summary_loaded = false;
        Some(self.issue(bounds))
    }

    /// Judge a response that arrived for `token`
    pub fn resolve(&mut self, token: u64) -> Resolution {
        let Some(in_flight) = self.in_flight.take_if(|f| f.token == token) else {
            tracing::debug!(token, "discarding superseded response");
            return Resolution::Discard { follow_up: None };
        };

        let fresh = match in_flight.plan {
            // Summaries do not depend on the extent, only on the mode still being summary
            FetchPlan::RegionalSummary => self.mode == LodMode::Summary,
            FetchPlan::Markers { .. } => in_flight.settle == self.settles,
        };

        if fresh {
            if in_flight.plan == FetchPlan::RegionalSummary {
                self.summary_loaded = true;
            }
            return Resolution::Apply;
        }

        tracing::debug!(token, "discarding stale response, fetching latest viewport");
        Resolution::Discard {
            follow_up: self.follow_up(),
        }
    }

    /// Release the guard after a failed fetch for `token`
    ///
    /// Returns a follow-up ticket when newer viewports settled while it was pending.
    pub fn fail(&mut self, token: u64) -> Option<FetchTicket> {
        let in_flight = self.in_flight.take_if(|f| f.token == token)?;
        if in_flight.settle == self.settles {
            return None;
        }
        self.follow_up()
    }

    fn follow_up(&mut self) -> Option<FetchTicket> {
        let bounds = self.latest?;
        match self.mode {
            LodMode::Summary if self.summary_loaded => None,
            _ => Some(self.issue(bounds)),
        }
    }

    fn issue(&mut self, bounds: ViewportBounds) -> FetchTicket {
        self.last_token += 1;
        let plan = match self.mode {
            LodMode::Detail => FetchPlan::Markers {
                limit: lod::fetch_limit(bounds.zoom),
            },
            LodMode::Summary => FetchPlan::RegionalSummary,
        };

        self.in_flight = Some(InFlight {
            token: self.last_token,
            plan,
            settle: self.settles,
        });

        tracing::debug!(token = self.last_token, zoom = bounds.zoom, ?plan, "fetch issued");
        FetchTicket {
            token: self.last_token,
            bounds,
            plan,
        }
    }
}
