//! REST polling side of the console.
//!
//! One `FetchClient` method per backend endpoint, plus a single scheduler
//! task that owns the three per-class interval timers and the store's
//! re-fetch hint channel. Running every fetch inline in that task means two
//! fetches of the same class can never overlap; the request timeout on the
//! client bounds how long a hung backend can stall a tick.

use std::time::Duration;

use reqwest::header::ACCEPT;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::PollConf;
use crate::models::{Alert, AlertWire, Device, DeviceWire, MetricsSnapshot, MetricsWire};
use crate::state::Shared;
use crate::store::{DashboardStore, RefetchHint, ResourceClass};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

pub struct FetchClient {
    http: reqwest::Client,
    base: String,
}

impl FetchClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, route: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base, route);
        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }

    pub async fn metrics(&self) -> Result<MetricsSnapshot, FetchError> {
        let wire: MetricsWire = self.get_json("/metrics").await?;
        Ok(MetricsSnapshot::from_wire(wire))
    }

    pub async fn devices(&self) -> Result<Vec<Device>, FetchError> {
        let wire: Vec<DeviceWire> = self.get_json("/iot/devices").await?;
        Ok(wire.into_iter().map(Device::from_wire).collect())
    }

    pub async fn alerts(&self) -> Result<Vec<Alert>, FetchError> {
        let wire: Vec<AlertWire> = self.get_json("/alerts").await?;
        Ok(wire.into_iter().map(Alert::from_wire).collect())
    }
}

/// Spawns the poll scheduler. Each class ticks on its own cadence; a push
/// event can additionally pull a class's fetch forward via the hint channel.
pub fn spawn_pollers(
    client: FetchClient,
    store: Shared<DashboardStore>,
    mut hints: mpsc::UnboundedReceiver<RefetchHint>,
    conf: PollConf,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut metrics_tick = interval(Duration::from_secs(conf.metrics_secs.max(1)));
        let mut alerts_tick = interval(Duration::from_secs(conf.alerts_secs.max(1)));
        let mut devices_tick = interval(Duration::from_secs(conf.devices_secs.max(1)));
        metrics_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        alerts_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        devices_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = metrics_tick.tick() => poll_metrics(&client, &store).await,
                _ = alerts_tick.tick() => poll_alerts(&client, &store).await,
                _ = devices_tick.tick() => poll_devices(&client, &store).await,
                hint = hints.recv() => match hint {
                    Some(first) => {
                        // A burst of push events queues duplicate hints;
                        // drain and coalesce before fetching once.
                        let mut refetch_metrics = first == RefetchHint::Metrics;
                        let mut refetch_devices = first == RefetchHint::Devices;
                        while let Ok(more) = hints.try_recv() {
                            match more {
                                RefetchHint::Metrics => refetch_metrics = true,
                                RefetchHint::Devices => refetch_devices = true,
                            }
                        }
                        if refetch_metrics {
                            debug!("eager metrics refetch after push event");
                            poll_metrics(&client, &store).await;
                        }
                        if refetch_devices {
                            debug!("eager device refetch after telemetry");
                            poll_devices(&client, &store).await;
                        }
                    }
                    None => break,
                },
            }
        }
    })
}

pub(crate) async fn poll_metrics(client: &FetchClient, store: &Shared<DashboardStore>) {
    match client.metrics().await {
        Ok(snapshot) => store.lock().apply_metrics_snapshot(snapshot),
        Err(e) => {
            warn!("metrics fetch failed: {e}");
            store.lock().record_fetch_failure(ResourceClass::Metrics);
        }
    }
}

pub(crate) async fn poll_alerts(client: &FetchClient, store: &Shared<DashboardStore>) {
    match client.alerts().await {
        Ok(alerts) => store.lock().apply_alert_snapshot(alerts),
        Err(e) => {
            warn!("alert fetch failed: {e}");
            store.lock().record_fetch_failure(ResourceClass::Alerts);
        }
    }
}

pub(crate) async fn poll_devices(client: &FetchClient, store: &Shared<DashboardStore>) {
    match client.devices().await {
        Ok(devices) => store.lock().apply_device_snapshot(devices),
        Err(e) => {
            warn!("device fetch failed: {e}");
            store.lock().record_fetch_failure(ResourceClass::Devices);
        }
    }
}
