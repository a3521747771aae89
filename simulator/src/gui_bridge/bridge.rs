use crate::gui_bridge::model::BridgeModel;
use anyhow::Context;
use ldrcore::telemetry::PipelineCounters;
use ldrcore::Snapshot;
use log::info;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

type SharedModel = Arc<RwLock<BridgeModel>>;

/// JSON endpoint serving the newest snapshot to an external plotter.
#[derive(Clone, Default)]
pub struct GuiBridge {
    state: SharedModel,
}

impl GuiBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());

        let snapshot_route = warp::path("snapshot")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| {
                let model = state.read().unwrap_or_else(PoisonError::into_inner);
                match model.snapshot.as_ref() {
                    Some(snapshot) => warp::reply::json(snapshot.as_ref()).into_response(),
                    None => warp::reply::with_status(
                        warp::reply::json(&json!({"status": "waiting"})),
                        StatusCode::SERVICE_UNAVAILABLE,
                    )
                    .into_response(),
                }
            });

        let counters_route = warp::path("counters")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter)
            .map(|state: SharedModel| {
                let model = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&model.counters).into_response()
            });

        snapshot_route.or(counters_route).unify()
    }

    /// Binds `addr` and serves the routes on the current tokio runtime until
    /// it shuts down. Returns the bound address.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<SocketAddr> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding HTTP bridge to {}", addr))?;
        info!("[bridge] serving http://{}/snapshot", bound);
        tokio::spawn(server);
        Ok(bound)
    }

    pub fn publish(&self, snapshot: Arc<Snapshot>, counters: PipelineCounters) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.snapshot = Some(snapshot);
        guard.counters = counters;
    }

    #[cfg(test)]
    pub fn model(&self) -> BridgeModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
