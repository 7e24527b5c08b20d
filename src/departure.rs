//! Resolves the departure airport code into coordinates for the origin
//! marker without blocking rendering.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::fetch::FlightApi;
use crate::geo::LatLng;

struct Resolution {
    code: String,
    result: Result<Option<Vec<f64>>, ApiError>,
}

pub struct DepartureResolver {
    api: Arc<dyn FlightApi>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<Resolution>,
    rx: mpsc::UnboundedReceiver<Resolution>,
    coords: LatLng,
    /// Code of the last lookup issued; repeated calls with it are no-ops
    last_requested: Option<String>,
}

impl DepartureResolver {
    /// `fallback` is shown until a lookup succeeds
    pub fn new(api: Arc<dyn FlightApi>, runtime: Handle, fallback: LatLng) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            runtime,
            tx,
            rx,
            coords: fallback,
            last_requested: None,
        }
    }

    /// Called on every render pass; only a code change starts a lookup.
    /// Returns true when a lookup was issued.
    pub fn resolve(&mut self, code: &str) -> bool {
        if code.is_empty() || self.last_requested.as_deref() == Some(code) {
            return false;
        }
        self.last_requested = Some(code.to_string());
        debug!(code, "resolving departure airport");

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let code = code.to_string();
        self.runtime.spawn(async move {
            let result = api.departure_airport(&code).await;
            let _ = tx.send(Resolution { code, result });
        });
        true
    }

    /// Apply finished lookups. Returns true if the coordinates moved.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(resolution) = self.rx.try_recv() {
            changed |= self.apply(resolution);
        }
        changed
    }

    pub async fn next_resolution(&mut self) -> bool {
        match self.rx.recv().await {
            Some(resolution) => self.apply(resolution),
            None => false,
        }
    }

    fn apply(&mut self, Resolution { code, result }: Resolution) -> bool {
        if self.last_requested.as_deref() != Some(code.as_str()) {
            debug!(%code, latest = ?self.last_requested, "discarding stale departure lookup");
            return false;
        }
        match result {
            Ok(Some(values)) if values.len() == 2 => {
                self.coords = LatLng::new(values[0], values[1]);
                debug!(%code, lat = values[0], lng = values[1], "departure resolved");
                true
            }
            Ok(other) => {
                debug!(%code, ?other, "departure lookup returned no coordinates");
                false
            }
            Err(err) => {
                warn!(%code, error = %err, "departure lookup failed");
                false
            }
        }
    }

    pub fn coords(&self) -> LatLng {
        self.coords
    }
}
