//! FleetZone Console - live terminal dashboard for the FleetZone backend
//!
//! Reconciles two delivery channels into one bounded view:
//! - REST polling of /metrics, /alerts and /iot/devices on fixed intervals
//! - MQTT push events (detections, alerts, sensor/actuator telemetry)
//!
//! Pollers and the push listener feed the reconciliation store; every state
//! change re-projects the view model and repaints the terminal. Pressing
//! Enter toggles the windowed device panel between collapsed and expanded.

mod config;
mod fetch;
mod models;
mod push;
mod render;
mod state;
mod store;
mod view;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::fetch::FetchClient;
use crate::push::LinkTracker;
use crate::store::DashboardStore;
use crate::view::ViewPreferences;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    info!("🛵 FleetZone console starting");
    let cfg = config::load_config().await;

    let (store, hints) = DashboardStore::new();
    let redraw = store.redraw_signal();
    let store = state::new_shared(store);
    let prefs = state::new_shared(ViewPreferences {
        show_all_devices: cfg.show_all_devices,
    });
    let _toggle_task = spawn_toggle_listener(prefs.clone(), redraw.clone());

    let link = LinkTracker::new(redraw.clone());
    let _push_task = push::spawn_push_listener(cfg.mqtt.clone(), store.clone(), link.clone());

    let client = FetchClient::new(
        &cfg.api.base_url,
        Duration::from_secs(cfg.api.request_timeout_secs.max(1)),
    )
    .context("building fetch client")?;
    let _poll_task = fetch::spawn_pollers(client, store.clone(), hints, cfg.poll.clone());

    info!(
        "polling {} (metrics {}s / alerts {}s / devices {}s), push via {}:{}",
        cfg.api.base_url,
        cfg.poll.metrics_secs,
        cfg.poll.alerts_secs,
        cfg.poll.devices_secs,
        cfg.mqtt.host,
        cfg.mqtt.port,
    );

    loop {
        redraw.notified().await;
        let view = {
            let guard = store.lock();
            let current_prefs = *prefs.lock();
            view::project(&guard, &current_prefs)
        };
        render::paint(&view, link.status(), link.reconnects());
    }
}

/// Enter toggles the device panel, the terminal stand-in for the dashboard's
/// show-more button.
fn spawn_toggle_listener(
    prefs: state::Shared<ViewPreferences>,
    redraw: std::sync::Arc<tokio::sync::Notify>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        use tokio::io::AsyncBufReadExt;
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            prefs.lock().toggle_devices();
            redraw.notify_one();
        }
    })
}
