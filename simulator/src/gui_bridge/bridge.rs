use crate::generator::profile::{build_log_from_config, GeneratorConfig};
use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::runner::{Runner, WorkflowResult};
use anyhow::Result;
use log::{info, warn};
use serde_json::json;
use std::{
    borrow::Cow,
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, hyper::body::Bytes, Filter};

fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

type SharedModel = Arc<RwLock<VisualizationModel>>;

fn model_from_result(runner: &Runner, result: &WorkflowResult) -> VisualizationModel {
    VisualizationModel {
        simulation: result.simulation.clone(),
        overlay: runner.config().overlay.clone(),
        status: result.summary(),
        event_count: result.event_count,
        counts: result.counts,
    }
}

/// Invalid UTF-8 is replaced rather than rejected; the affected lines simply
/// fail to normalize.
fn ingest_bytes(runner: &Runner, body: &[u8]) -> WorkflowResult {
    let raw = String::from_utf8_lossy(body);
    if let Cow::Owned(_) = raw {
        warn!("ingest body is not valid UTF-8; invalid bytes replaced");
    }
    runner.execute(&raw)
}

fn store(state: &SharedModel, model: VisualizationModel) {
    let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
    *guard = model;
}

/// Bridge that serves the latest replay over HTTP and rebuilds it from
/// incoming logs.
pub struct GuiBridge {
    state: SharedModel,
    runner: Arc<Runner>,
}

impl GuiBridge {
    /// Creates the bridge without binding a socket.
    pub fn detached(runner: Arc<Runner>) -> Self {
        let model = VisualizationModel {
            overlay: runner.config().overlay.clone(),
            status: "Waiting for a simulation log...".into(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(model)),
            runner,
        }
    }

    /// Creates the bridge and starts serving on 127.0.0.1:9000 from a
    /// background thread.
    pub fn serve(runner: Arc<Runner>) -> Result<Self> {
        let bridge = Self::detached(runner);
        let state_for_filter = bridge.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner_for_filter = bridge.runner.clone();
        let runner_filter = warp::any().map(move || runner_for_filter.clone());

        let get_route = warp::path("simulation")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| {
                let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&*guard)
            });

        let ingest_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::bytes())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .and_then(
                |body: Bytes, state: SharedModel, runner: Arc<Runner>| async move {
                    let result = ingest_bytes(&runner, &body);
                    info!("ingest: {}", result.summary());
                    let has_data = result.simulation.is_some();
                    store(&state, model_from_result(&runner, &result));
                    Ok::<_, warp::Rejection>(warp::reply::with_status(
                        warp::reply::json(&json!({
                            "status": "ok",
                            "events": result.event_count,
                            "dropped": result.counts.dropped,
                            "has_data": has_data
                        })),
                        StatusCode::OK,
                    ))
                },
            );

        let generator_route = warp::path("ingest-config")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig, state: SharedModel, runner: Arc<Runner>| async move {
                    match build_log_from_config(&config) {
                        Ok(raw) => {
                            let result = runner.execute(&raw);
                            if let Some(name) = config.scenario.as_ref() {
                                info!("scenario {} -> {}", name, result.summary());
                            }
                            store(&state, model_from_result(&runner, &result));
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "events": result.event_count,
                                    "description": config.description.clone().unwrap_or_default()
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            warn!("ingest-config error: {}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        let runtime = Builder::new_current_thread().enable_all().build()?;
        thread::spawn(move || {
            let routes = get_route.or(ingest_route).or(generator_route);
            runtime.block_on(async move {
                warp::serve(routes).run(gui_bind_address()).await;
            });
        });

        Ok(bridge)
    }

    pub fn publish(&self, result: &WorkflowResult) {
        let model = model_from_result(&self.runner, result);
        info!("[GUI] {}", model.status);
        store(&self.state, model);
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.status = message.to_string();
    }

    pub fn snapshot(&self) -> VisualizationModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
