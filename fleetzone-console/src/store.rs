//! Reconciliation store: the single owner of everything the console knows.
//!
//! Two delivery channels feed it. Pollers hand over full-replacement
//! snapshots (metrics, devices, the complete alert list); the push listener
//! hands over incremental events (one detection, one alert, one telemetry
//! reading). Snapshots supersede all prior state for their class, push events
//! prepend into bounded newest-first sequences. Either way the store stays
//! within fixed presentation limits and tracks per-class health so a failing
//! source degrades only its own panel.
//!
//! The store owns no transport. When a push event implies that a snapshot
//! class is out of date it emits a [`RefetchHint`] on a channel the poll
//! scheduler listens to, and every mutation pings a redraw [`Notify`] the
//! render loop waits on.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use crate::models::{Alert, Detection, Device, MetricsSnapshot, TelemetryEvent};

/// Newest alerts kept for display.
pub const MAX_ALERTS: usize = 10;
/// Newest detections kept for display.
pub const MAX_DETECTIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Metrics,
    Alerts,
    Devices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Ok,
    Error,
}

/// Per-class outcome of the most recent fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthBoard {
    pub metrics: Health,
    pub alerts: Health,
    pub devices: Health,
}

/// "Something changed, poll again" signal emitted toward the scheduler.
/// Push events move faster than the poll intervals; polling stays the source
/// of truth for the snapshot classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchHint {
    Metrics,
    Devices,
}

pub struct DashboardStore {
    metrics: Option<MetricsSnapshot>,
    devices: Vec<Device>,
    alerts: VecDeque<Alert>,
    detections: VecDeque<Detection>,
    health: HealthBoard,
    hints: mpsc::UnboundedSender<RefetchHint>,
    redraw: Arc<Notify>,
}

impl DashboardStore {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RefetchHint>) {
        let (hints, hint_rx) = mpsc::unbounded_channel();
        let store = Self {
            metrics: None,
            devices: Vec::new(),
            alerts: VecDeque::new(),
            detections: VecDeque::new(),
            health: HealthBoard {
                metrics: Health::Ok,
                alerts: Health::Ok,
                devices: Health::Ok,
            },
            hints,
            redraw: Arc::new(Notify::new()),
        };
        (store, hint_rx)
    }

    /// Handle the render loop waits on; pinged after every state change.
    pub fn redraw_signal(&self) -> Arc<Notify> {
        self.redraw.clone()
    }

    pub fn apply_metrics_snapshot(&mut self, snapshot: MetricsSnapshot) {
        self.metrics = Some(snapshot);
        self.health.metrics = Health::Ok;
        self.touch();
    }

    pub fn apply_device_snapshot(&mut self, devices: Vec<Device>) {
        self.devices = devices;
        self.health.devices = Health::Ok;
        self.touch();
    }

    /// Replaces the alert sequence wholesale. The backend returns newest
    /// first; the bound is re-applied here rather than trusted.
    pub fn apply_alert_snapshot(&mut self, alerts: Vec<Alert>) {
        self.alerts = alerts.into_iter().collect();
        self.alerts.truncate(MAX_ALERTS);
        self.health.alerts = Health::Ok;
        self.touch();
    }

    /// Marks a class unhealthy. Device and alert data is retained so their
    /// panels keep showing the last known rows while degraded.
    pub fn record_fetch_failure(&mut self, class: ResourceClass) {
        match class {
            ResourceClass::Metrics => self.health.metrics = Health::Error,
            ResourceClass::Alerts => self.health.alerts = Health::Error,
            ResourceClass::Devices => self.health.devices = Health::Error,
        }
        self.touch();
    }

    pub fn ingest_push_detection(&mut self, detection: Detection) {
        self.detections.push_front(detection);
        self.detections.truncate(MAX_DETECTIONS);
        self.hint(RefetchHint::Metrics);
        self.touch();
    }

    pub fn ingest_push_alert(&mut self, alert: Alert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(MAX_ALERTS);
        self.hint(RefetchHint::Metrics);
        self.touch();
    }

    /// Telemetry is not device-shaped, so it never touches the device
    /// collection; it only signals that the topology may have moved.
    pub fn ingest_push_telemetry(&mut self, _event: TelemetryEvent) {
        self.hint(RefetchHint::Devices);
    }

    pub fn metrics(&self) -> Option<&MetricsSnapshot> {
        self.metrics.as_ref()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn alerts(&self) -> &VecDeque<Alert> {
        &self.alerts
    }

    pub fn detections(&self) -> &VecDeque<Detection> {
        &self.detections
    }

    pub fn health(&self) -> HealthBoard {
        self.health
    }

    fn hint(&self, hint: RefetchHint) {
        // Receiver may be gone (tests, shutdown); the hint is best-effort.
        let _ = self.hints.send(hint);
    }

    fn touch(&self) {
        self.redraw.notify_one();
    }
}
