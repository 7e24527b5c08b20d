//! Viewport and filter driven retrieval of destination prices.
//!
//! Every event builds a fresh [`SearchRequest`], swaps it in and spawns one
//! request on the runtime; nothing is debounced, retried or cancelled.
//! Completions come back over a channel and are applied on the caller's
//! thread by [`FetchOrchestrator::poll`], so all state changes happen in the
//! event loop.

mod client;
mod dates;
mod demo;

pub use client::{FlightApi, HttpFlightApi, DEPARTURE_AIRPORT_PATH, DESTINATION_PRICE_PATH};
pub use dates::{month_options, DatesFilter, TripDuration, MONTH_NAMES};
pub use demo::DemoFlightApi;

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::destinations::Destination;
use crate::error::ApiError;
use crate::geo::{Bounds, LatLng};

/// What the backend is asked for. Immutable: updates produce a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub departure_airport_id: Option<String>,
    pub search_area: Bounds,
    pub dates: DatesFilter,
}

impl SearchRequest {
    /// Starting request before the map has reported its first viewport
    pub fn initial(departure_airport_id: Option<String>, dates: DatesFilter) -> Self {
        Self {
            departure_airport_id,
            search_area: Bounds::new(LatLng::new(85.0, -180.0), LatLng::new(-85.0, 180.0)),
            dates,
        }
    }

    pub fn with_search_area(&self, search_area: Bounds) -> Self {
        Self {
            search_area: search_area.normalized(),
            ..self.clone()
        }
    }

    pub fn with_filter(&self, change: FilterChange) -> Self {
        match change {
            FilterChange::Departure(departure_airport_id) => Self {
                departure_airport_id,
                ..self.clone()
            },
            FilterChange::Dates(dates) => Self {
                dates,
                ..self.clone()
            },
        }
    }

    /// Query string sent with the price lookup. Month `-1` means any month.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(7);
        if let Some(id) = &self.departure_airport_id {
            pairs.push(("departureAirportId", id.clone()));
        }
        let area = &self.search_area;
        pairs.push(("nwLat", area.north_west.lat.to_string()));
        pairs.push(("nwLng", area.north_west.lng.to_string()));
        pairs.push(("seLat", area.south_east.lat.to_string()));
        pairs.push(("seLng", area.south_east.lng.to_string()));
        let month = self.dates.month.map(i64::from).unwrap_or(-1);
        pairs.push(("month", month.to_string()));
        pairs.push(("duration", self.dates.duration.code().to_string()));
        pairs
    }
}

/// A change coming from the search controls
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChange {
    Departure(Option<String>),
    Dates(DatesFilter),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success(Arc<Vec<Destination>>),
    Error(String),
}

/// Which responses may update state when requests overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOrdering {
    /// Only the newest request's response is applied
    LatestOnly,
    /// Responses apply in arrival order; a slow old one can win
    ArrivalOrder,
}

struct Completion {
    id: u64,
    result: Result<Vec<Destination>, ApiError>,
}

pub struct FetchOrchestrator {
    api: Arc<dyn FlightApi>,
    runtime: Handle,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    request: Arc<SearchRequest>,
    state: FetchState,
    /// Last successful result; survives later errors
    destinations: Arc<Vec<Destination>>,
    is_loading: bool,
    latest_id: u64,
    ordering: ResponseOrdering,
}

impl FetchOrchestrator {
    pub fn new(api: Arc<dyn FlightApi>, runtime: Handle, initial: SearchRequest, ordering: ResponseOrdering) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            api,
            runtime,
            completions_tx,
            completions_rx,
            request: Arc::new(initial),
            state: FetchState::Idle,
            destinations: Arc::new(Vec::new()),
            is_loading: false,
            latest_id: 0,
            ordering,
        }
    }

    /// Map moved or zoomed: refetch for the new (normalised) area
    pub fn on_viewport_changed(&mut self, bounds: Bounds) -> u64 {
        let next = self.request.with_search_area(bounds);
        self.submit(next)
    }

    /// Departure or dates changed: refetch for the current area
    pub fn on_filter_changed(&mut self, change: FilterChange) -> u64 {
        let next = self.request.with_filter(change);
        self.submit(next)
    }

    fn submit(&mut self, request: SearchRequest) -> u64 {
        self.latest_id += 1;
        let id = self.latest_id;

        // Loading indicator follows the departure, not the network.
        self.is_loading = request.departure_airport_id.is_some();
        self.state = FetchState::Loading;
        self.request = Arc::new(request);

        info!(
            request_id = id,
            departure = self.request.departure_airport_id.as_deref().unwrap_or("-"),
            area = ?self.request.search_area,
            "fetching destinations"
        );

        let api = Arc::clone(&self.api);
        let request = Arc::clone(&self.request);
        let tx = self.completions_tx.clone();
        self.runtime.spawn(async move {
            let result = api.destination_prices(&request).await;
            // Receiver only goes away on shutdown
            let _ = tx.send(Completion { id, result });
        });

        id
    }

    /// Apply every completion that has arrived. Returns true if state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.completions_rx.try_recv() {
            changed |= self.apply(completion);
        }
        changed
    }

    /// Wait for the next completion and apply it
    pub async fn next_completion(&mut self) -> bool {
        match self.completions_rx.recv().await {
            Some(completion) => self.apply(completion),
            None => false,
        }
    }

    fn apply(&mut self, completion: Completion) -> bool {
        let Completion { id, result } = completion;
        if self.ordering == ResponseOrdering::LatestOnly && id != self.latest_id {
            debug!(request_id = id, latest = self.latest_id, "discarding stale response");
            return false;
        }

        self.is_loading = false;
        match result {
            Ok(found) => {
                info!(request_id = id, count = found.len(), "destinations received");
                self.destinations = Arc::new(found);
                self.state = FetchState::Success(Arc::clone(&self.destinations));
            }
            Err(err) => {
                warn!(request_id = id, error = %err, "destination fetch failed");
                self.state = FetchState::Error(err.to_string());
            }
        }
        true
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Destinations to draw: the latest successful result
    pub fn destinations(&self) -> &Arc<Vec<Destination>> {
        &self.destinations
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            FetchState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }
}
