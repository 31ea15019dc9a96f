//! View projection: a pure function of (store state, preferences) that
//! produces a render-ready [`ViewModel`]. No I/O, no clock reads beyond the
//! timestamps already stored, so projecting the same state twice yields an
//! identical result.

use serde::Serialize;

use crate::models::{Alert, Detection, Device, DeviceType, MetricsSnapshot};
use crate::store::{DashboardStore, Health};

/// Sensor rows shown while the device panel is windowed.
pub const SENSOR_WINDOW: usize = 6;
/// Actuator rows shown while the device panel is windowed.
pub const ACTUATOR_WINDOW: usize = 3;

/// UI-scoped toggle state. Never derived from server data and never reset by
/// a reconciliation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewPreferences {
    pub show_all_devices: bool,
}

impl ViewPreferences {
    /// One global flag: expanding sensors expands actuators too.
    pub fn toggle_devices(&mut self) {
        self.show_all_devices = !self.show_all_devices;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub metrics: MetricsPanel,
    pub devices: DevicePanel,
    pub alerts: AlertsPanel,
    pub detections: DetectionsPanel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MetricsPanel {
    /// No successful fetch yet.
    Waiting,
    /// The last fetch failed; the whole KPI strip shows the error placeholder.
    Error,
    Ready(MetricsView),
}

/// KPI strip values, already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub total_events: String,
    pub unique_motos: String,
    pub avg_fps: String,
    pub detection_rate: String,
    pub unique_classes: String,
    pub active_alerts: String,
    pub device_count: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevicePanel {
    /// Last device fetch failed; rows below are last-known-good.
    pub degraded: bool,
    pub sensors: DeviceSection<SensorCard>,
    pub actuators: DeviceSection<ActuatorCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSection<T> {
    pub total: usize,
    pub cards: Vec<T>,
    /// Rows beyond the visibility window.
    pub hidden: usize,
    /// Whether a show-more/show-less affordance applies to this section.
    pub expandable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorCard {
    pub device_id: String,
    pub location: String,
    pub online: bool,
    pub battery_pct: u8,
    pub battery: BatteryTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActuatorCard {
    pub device_id: String,
    pub location: String,
    pub status: String,
    pub engaged: bool,
    pub last_action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryTier {
    High,
    Medium,
    Low,
}

impl BatteryTier {
    pub fn classify(pct: u8) -> Self {
        if pct > 50 {
            BatteryTier::High
        } else if pct > 20 {
            BatteryTier::Medium
        } else {
            BatteryTier::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn classify(confidence: f64) -> Self {
        if confidence > 0.7 {
            ConfidenceTier::High
        } else if confidence > 0.4 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassBadge {
    Motorbike,
    Bicycle,
    Car,
    Other,
}

impl ClassBadge {
    pub fn classify(class_name: &str) -> Self {
        match class_name {
            "motorbike" => ClassBadge::Motorbike,
            "bicycle" => ClassBadge::Bicycle,
            "car" => ClassBadge::Car,
            _ => ClassBadge::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertsPanel {
    pub degraded: bool,
    pub body: PanelBody<AlertRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionsPanel {
    pub body: PanelBody<DetectionRow>,
}

/// An empty sequence projects to an explicit placeholder, never to nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "rows", rename_all = "lowercase")]
pub enum PanelBody<T> {
    Empty,
    Rows(Vec<T>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRow {
    pub alert_type: String,
    pub message: String,
    pub severity: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRow {
    pub time: String,
    pub frame: u64,
    pub class_name: String,
    pub badge: ClassBadge,
    pub confidence_pct: String,
    pub confidence: ConfidenceTier,
    pub area: String,
    pub fps: String,
}

pub fn project(store: &DashboardStore, prefs: &ViewPreferences) -> ViewModel {
    ViewModel {
        metrics: project_metrics(store),
        devices: project_devices(store, prefs),
        alerts: project_alerts(store),
        detections: project_detections(store),
    }
}

fn project_metrics(store: &DashboardStore) -> MetricsPanel {
    if store.health().metrics == Health::Error {
        return MetricsPanel::Error;
    }
    let Some(snapshot) = store.metrics() else {
        return MetricsPanel::Waiting;
    };
    MetricsPanel::Ready(format_metrics(snapshot, store.devices().len()))
}

fn format_metrics(snapshot: &MetricsSnapshot, device_count: usize) -> MetricsView {
    MetricsView {
        total_events: group_thousands(snapshot.total_events),
        unique_motos: snapshot.unique_motos.to_string(),
        avg_fps: format!("{:.1}", snapshot.avg_fps_last_60),
        detection_rate: format!("{:.2}", snapshot.avg_detection_rate),
        unique_classes: snapshot.unique_classes.to_string(),
        active_alerts: snapshot.active_alerts.to_string(),
        device_count: device_count.to_string(),
    }
}

fn project_devices(store: &DashboardStore, prefs: &ViewPreferences) -> DevicePanel {
    let sensors: Vec<&Device> = store
        .devices()
        .iter()
        .filter(|d| d.device_type == DeviceType::Sensor)
        .collect();
    let actuators: Vec<&Device> = store
        .devices()
        .iter()
        .filter(|d| d.device_type == DeviceType::Actuator)
        .collect();

    DevicePanel {
        degraded: store.health().devices == Health::Error,
        sensors: section(&sensors, SENSOR_WINDOW, prefs.show_all_devices, sensor_card),
        actuators: section(&actuators, ACTUATOR_WINDOW, prefs.show_all_devices, actuator_card),
    }
}

fn section<T>(
    devices: &[&Device],
    window: usize,
    show_all: bool,
    card: fn(&Device) -> T,
) -> DeviceSection<T> {
    let total = devices.len();
    let shown = if show_all { total } else { total.min(window) };
    DeviceSection {
        total,
        cards: devices[..shown].iter().copied().map(card).collect(),
        hidden: total - shown,
        expandable: total > window,
    }
}

fn sensor_card(device: &Device) -> SensorCard {
    SensorCard {
        device_id: device.device_id.clone(),
        location: device.location.clone(),
        online: device.status == "active",
        battery_pct: device.battery_level,
        battery: BatteryTier::classify(device.battery_level),
    }
}

fn actuator_card(device: &Device) -> ActuatorCard {
    ActuatorCard {
        device_id: device.device_id.clone(),
        location: device.location.clone(),
        status: device.status.clone(),
        engaged: device.status != "idle",
        last_action: device.last_action.clone(),
    }
}

fn project_alerts(store: &DashboardStore) -> AlertsPanel {
    let rows: Vec<AlertRow> = store.alerts().iter().map(alert_row).collect();
    AlertsPanel {
        degraded: store.health().alerts == Health::Error,
        body: if rows.is_empty() {
            PanelBody::Empty
        } else {
            PanelBody::Rows(rows)
        },
    }
}

fn alert_row(alert: &Alert) -> AlertRow {
    AlertRow {
        alert_type: alert.alert_type.clone(),
        message: alert.message.clone(),
        severity: alert.severity.clone(),
        time: clock_time(&alert.created_at),
    }
}

fn project_detections(store: &DashboardStore) -> DetectionsPanel {
    let rows: Vec<DetectionRow> = store.detections().iter().map(detection_row).collect();
    DetectionsPanel {
        body: if rows.is_empty() {
            PanelBody::Empty
        } else {
            PanelBody::Rows(rows)
        },
    }
}

fn detection_row(detection: &Detection) -> DetectionRow {
    DetectionRow {
        time: clock_time(&detection.created_at),
        frame: detection.frame,
        class_name: detection.class_name.clone(),
        badge: ClassBadge::classify(&detection.class_name),
        confidence_pct: format!("{:.1}%", detection.confidence * 100.0),
        confidence: ConfidenceTier::classify(detection.confidence),
        area: group_thousands(detection.area),
        fps: format!("{:.1}", detection.fps),
    }
}

/// Clock-time display for a backend timestamp. The backend emits naive
/// ISO-8601 without an offset, so RFC3339 parsing gets a naive fallback and
/// anything unparseable is shown verbatim.
fn clock_time(timestamp: &str) -> String {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(timestamp) {
        return parsed.format("%H:%M:%S").to_string();
    }
    if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%H:%M:%S").to_string();
    }
    timestamp.to_string()
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Alert, Detection, Device, MetricsSnapshot};
    use crate::store::{DashboardStore, ResourceClass};

    fn sensor(id: &str, battery: u8) -> Device {
        Device {
            device_id: id.into(),
            device_type: DeviceType::Sensor,
            location: "Garage A".into(),
            status: "active".into(),
            battery_level: battery,
            last_action: None,
        }
    }

    fn actuator(id: &str, status: &str) -> Device {
        Device {
            device_id: id.into(),
            device_type: DeviceType::Actuator,
            location: "Gate 1".into(),
            status: status.into(),
            battery_level: 0,
            last_action: Some("unlock".into()),
        }
    }

    fn metrics() -> MetricsSnapshot {
        MetricsSnapshot {
            total_events: 1234567,
            unique_motos: 12,
            avg_fps_last_60: 24.3456,
            avg_detection_rate: 0.87,
            unique_classes: 4,
            active_alerts: 2,
        }
    }

    #[test]
    fn projection_is_idempotent() {
        let (mut store, _rx) = DashboardStore::new();
        store.apply_metrics_snapshot(metrics());
        store.apply_device_snapshot(vec![sensor("s1", 80), actuator("a1", "busy")]);
        store.ingest_push_detection(Detection {
            created_at: "2025-06-01T10:00:00".into(),
            frame: 1,
            class_name: "motorbike".into(),
            confidence: 0.92,
            area: 2500,
            fps: 24.0,
        });
        store.ingest_push_alert(Alert {
            alert_type: "high_confidence".into(),
            message: "confirmed".into(),
            severity: "info".into(),
            created_at: "2025-06-01T10:00:01".into(),
        });

        let prefs = ViewPreferences::default();
        assert_eq!(project(&store, &prefs), project(&store, &prefs));
    }

    #[test]
    fn eight_sensors_window_to_six_with_two_hidden() {
        let (mut store, _rx) = DashboardStore::new();
        let sensors: Vec<Device> = (0..8).map(|n| sensor(&format!("s{n}"), 75)).collect();
        store.apply_device_snapshot(sensors);

        let view = project(&store, &ViewPreferences::default());
        assert_eq!(view.devices.sensors.total, 8);
        assert_eq!(view.devices.sensors.cards.len(), 6);
        assert_eq!(view.devices.sensors.hidden, 2);
        assert!(view.devices.sensors.expandable);
    }

    #[test]
    fn show_all_expands_both_sections_at_once() {
        let (mut store, _rx) = DashboardStore::new();
        let mut devices: Vec<Device> = (0..8).map(|n| sensor(&format!("s{n}"), 75)).collect();
        devices.extend((0..5).map(|n| actuator(&format!("a{n}"), "busy")));
        store.apply_device_snapshot(devices);

        let collapsed = project(&store, &ViewPreferences { show_all_devices: false });
        assert_eq!(collapsed.devices.actuators.cards.len(), 3);
        assert_eq!(collapsed.devices.actuators.hidden, 2);

        let expanded = project(&store, &ViewPreferences { show_all_devices: true });
        assert_eq!(expanded.devices.sensors.cards.len(), 8);
        assert_eq!(expanded.devices.sensors.hidden, 0);
        assert_eq!(expanded.devices.actuators.cards.len(), 5);
        assert_eq!(expanded.devices.actuators.hidden, 0);
        // The affordance stays so the view can offer "show less".
        assert!(expanded.devices.sensors.expandable);
        assert!(expanded.devices.actuators.expandable);
    }

    #[test]
    fn battery_tier_boundaries_are_exact() {
        assert_eq!(BatteryTier::classify(51), BatteryTier::High);
        assert_eq!(BatteryTier::classify(50), BatteryTier::Medium);
        assert_eq!(BatteryTier::classify(21), BatteryTier::Medium);
        assert_eq!(BatteryTier::classify(20), BatteryTier::Low);
        assert_eq!(BatteryTier::classify(0), BatteryTier::Low);
    }

    #[test]
    fn metrics_error_overrides_the_whole_panel() {
        let (mut store, _rx) = DashboardStore::new();
        store.apply_metrics_snapshot(metrics());
        store.record_fetch_failure(ResourceClass::Metrics);

        let view = project(&store, &ViewPreferences::default());
        assert_eq!(view.metrics, MetricsPanel::Error);

        store.apply_metrics_snapshot(metrics());
        let view = project(&store, &ViewPreferences::default());
        assert!(matches!(view.metrics, MetricsPanel::Ready(_)));
    }

    #[test]
    fn metrics_waits_before_the_first_fetch() {
        let (store, _rx) = DashboardStore::new();
        let view = project(&store, &ViewPreferences::default());
        assert_eq!(view.metrics, MetricsPanel::Waiting);
    }

    #[test]
    fn metrics_values_use_fixed_precision() {
        let (mut store, _rx) = DashboardStore::new();
        store.apply_metrics_snapshot(metrics());
        store.apply_device_snapshot(vec![sensor("s1", 80)]);

        let view = project(&store, &ViewPreferences::default());
        let MetricsPanel::Ready(kpis) = view.metrics else {
            panic!("expected ready metrics");
        };
        assert_eq!(kpis.total_events, "1,234,567");
        assert_eq!(kpis.avg_fps, "24.3");
        assert_eq!(kpis.detection_rate, "0.87");
        assert_eq!(kpis.device_count, "1");
    }

    #[test]
    fn empty_sequences_project_explicit_placeholders() {
        let (store, _rx) = DashboardStore::new();
        let view = project(&store, &ViewPreferences::default());
        assert_eq!(view.alerts.body, PanelBody::Empty);
        assert!(!view.alerts.degraded);
        assert_eq!(view.detections.body, PanelBody::Empty);
    }

    #[test]
    fn degraded_alert_panel_still_shows_retained_rows() {
        let (mut store, _rx) = DashboardStore::new();
        store.apply_alert_snapshot(vec![Alert {
            alert_type: "low_confidence".into(),
            message: "weak detection".into(),
            severity: "warning".into(),
            created_at: "2025-06-01T10:00:00".into(),
        }]);
        store.record_fetch_failure(ResourceClass::Alerts);

        let view = project(&store, &ViewPreferences::default());
        assert!(view.alerts.degraded);
        let PanelBody::Rows(rows) = view.alerts.body else {
            panic!("expected retained rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time, "10:00:00");
    }

    #[test]
    fn confidence_tiers_match_the_badge_thresholds() {
        assert_eq!(ConfidenceTier::classify(0.71), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::classify(0.7), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::classify(0.41), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::classify(0.4), ConfidenceTier::Low);
    }

    #[test]
    fn detection_rows_are_formatted_for_display() {
        let (mut store, _rx) = DashboardStore::new();
        store.ingest_push_detection(Detection {
            created_at: "2025-06-01T10:02:03.123456".into(),
            frame: 42,
            class_name: "bicycle".into(),
            confidence: 0.876,
            area: 12500,
            fps: 23.97,
        });

        let view = project(&store, &ViewPreferences::default());
        let PanelBody::Rows(rows) = view.detections.body else {
            panic!("expected detection rows");
        };
        assert_eq!(rows[0].time, "10:02:03");
        assert_eq!(rows[0].badge, ClassBadge::Bicycle);
        assert_eq!(rows[0].confidence_pct, "87.6%");
        assert_eq!(rows[0].confidence, ConfidenceTier::High);
        assert_eq!(rows[0].area, "12,500");
        assert_eq!(rows[0].fps, "24.0");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
