use crate::generator::profile::{build_pings, GeneratorConfig};
use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::runner::Runner;
use log::{error, info, warn};
use serde_json::json;
use sonarcore::Ping;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

#[derive(Debug, Default)]
struct BridgeState {
    model: VisualizationModel,
    pings: Vec<Ping>,
}

type SharedState = Arc<RwLock<BridgeState>>;

/// Hosts the HTTP endpoints the viewer polls.
#[derive(Default)]
pub struct GuiBridge {
    state: SharedState,
}

impl GuiBridge {
    /// Shared state only; no listener. Use [`GuiBridge::serve`] to expose it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the HTTP listener on a background thread.
    pub fn serve(runner: Arc<Runner>) -> Self {
        let bridge = Self::new();
        let state_for_filter = bridge.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());

        let payload_route = warp::path("payload")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedState| {
                let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&guard.model)
            });

        let pings_route = warp::path("pings")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedState| {
                let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&guard.pings)
            });

        let generator_route = warp::path("ingest-config")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig, state: SharedState, runner: Arc<Runner>| async move {
                    match build_pings(&config).and_then(|pings| {
                        let result = runner.execute(&pings)?;
                        Ok((pings, result))
                    }) {
                        Ok((pings, result)) => {
                            let mut model =
                                VisualizationModel::from_result(&result, "Regenerated sequence");
                            model.scenario = config.scenario.clone();
                            if let Some(name) = config.scenario.as_ref() {
                                info!(
                                    "[GUI] scenario {} -> {} pings, bottom coverage {:.0}%",
                                    name,
                                    result.pings,
                                    result.bottom_coverage()
                                );
                            }
                            Self::store(&state, model, pings);
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "pings": result.pings,
                                    "description": config.description.clone().unwrap_or_default()
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            warn!("ingest-config error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = payload_route.or(pings_route).or(generator_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(gui_bind_address()).await;
            });
        });

        bridge
    }

    fn store(state: &SharedState, model: VisualizationModel, pings: Vec<Ping>) {
        let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
        guard.model = model;
        guard.pings = pings;
    }

    pub fn publish(&self, model: &VisualizationModel, pings: &[Ping]) {
        info!(
            "[GUI] pings: {}, columns rendered: {}, bottom holds: {}",
            model.ping_count, model.metrics.columns_rendered, model.metrics.bottom_holds
        );
        Self::store(&self.state, model.clone(), pings.to_vec());
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.model.status = message.to_string();
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> (VisualizationModel, usize) {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (guard.model.clone(), guard.pings.len())
    }
}
