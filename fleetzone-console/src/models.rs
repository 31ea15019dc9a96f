//! Wire payloads and validated domain records for the FleetZone backend.
//!
//! The backend is loose about optional fields: counters can be absent, pushed
//! alerts name their type field `type` and may carry no timestamp at all.
//! Every payload therefore lands in a `*Wire` struct first and is converted
//! through `from_wire`, which produces a fully populated record. Formatting
//! and arithmetic downstream never meet a missing field.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Aggregate detection metrics, replaced wholesale on each successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_events: u64,
    pub unique_motos: u64,
    pub avg_fps_last_60: f64,
    pub avg_detection_rate: f64,
    pub unique_classes: u64,
    pub active_alerts: u64,
}

#[derive(Debug, Deserialize)]
pub struct MetricsWire {
    pub total_events: Option<u64>,
    pub unique_motos: Option<u64>,
    pub avg_fps_last_60: Option<f64>,
    pub avg_detection_rate: Option<f64>,
    pub unique_classes: Option<u64>,
    pub active_alerts: Option<u64>,
}

impl MetricsSnapshot {
    pub fn from_wire(raw: MetricsWire) -> Self {
        Self {
            total_events: raw.total_events.unwrap_or(0),
            unique_motos: raw.unique_motos.unwrap_or(0),
            avg_fps_last_60: raw.avg_fps_last_60.unwrap_or(0.0),
            avg_detection_rate: raw.avg_detection_rate.unwrap_or(0.0),
            unique_classes: raw.unique_classes.unwrap_or(0),
            active_alerts: raw.active_alerts.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Sensor,
    Actuator,
    Other,
}

/// One IoT device row. The device list is a full-replacement collection keyed
/// by `device_id`; a poll tick swaps the entire set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub device_id: String,
    pub device_type: DeviceType,
    pub location: String,
    pub status: String,
    /// 0-100, meaningful for sensors only.
    pub battery_level: u8,
    pub last_action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceWire {
    pub device_id: Option<String>,
    pub device_type: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub battery_level: Option<f64>,
    pub last_action: Option<String>,
}

impl Device {
    pub fn from_wire(raw: DeviceWire) -> Self {
        let device_type = match raw.device_type.as_deref() {
            Some("sensor") => DeviceType::Sensor,
            Some("actuator") => DeviceType::Actuator,
            _ => DeviceType::Other,
        };
        Self {
            device_id: raw.device_id.unwrap_or_else(|| "unknown".into()),
            device_type,
            location: raw.location.unwrap_or_default(),
            status: raw.status.unwrap_or_else(|| "unknown".into()),
            battery_level: raw.battery_level.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8,
            last_action: raw.last_action,
        }
    }
}

/// One alert, newest-first in the bounded alert sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub alert_type: String,
    pub message: String,
    pub severity: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct AlertWire {
    // Polled rows say `alert_type`, pushed events say `type`.
    #[serde(alias = "type")]
    pub alert_type: Option<String>,
    pub message: Option<String>,
    pub severity: Option<String>,
    pub created_at: Option<String>,
}

impl Alert {
    pub fn from_wire(raw: AlertWire) -> Self {
        Self {
            alert_type: raw.alert_type.unwrap_or_else(|| "alert".into()),
            message: raw.message.unwrap_or_default(),
            severity: raw.severity.unwrap_or_else(|| "info".into()),
            // Pushed alerts carry no timestamp; stamp receipt time.
            created_at: raw.created_at.unwrap_or_else(|| Utc::now().to_rfc3339()),
        }
    }
}

/// One detection event. Detections only arrive over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub created_at: String,
    pub frame: u64,
    pub class_name: String,
    pub confidence: f64,
    pub area: u64,
    pub fps: f64,
}

#[derive(Debug, Deserialize)]
pub struct DetectionWire {
    pub created_at: Option<String>,
    pub frame: Option<u64>,
    pub class_name: Option<String>,
    pub confidence: Option<f64>,
    pub area: Option<u64>,
    pub fps: Option<f64>,
}

impl Detection {
    pub fn from_wire(raw: DetectionWire) -> Self {
        Self {
            created_at: raw.created_at.unwrap_or_else(|| Utc::now().to_rfc3339()),
            frame: raw.frame.unwrap_or(0),
            class_name: raw.class_name.unwrap_or_else(|| "unknown".into()),
            confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            area: raw.area.unwrap_or(0),
            fps: raw.fps.unwrap_or(0.0),
        }
    }
}

/// Raw sensor/actuator telemetry. Not device-shaped, so it never mutates the
/// device collection directly; it only hints that the topology may have moved.
#[derive(Debug, Clone)]
pub struct TelemetryEvent {
    pub device_type: DeviceType,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metrics_missing_counters_default_to_zero() {
        let raw: MetricsWire = serde_json::from_value(json!({ "total_events": 42 })).unwrap();
        let snapshot = MetricsSnapshot::from_wire(raw);
        assert_eq!(snapshot.total_events, 42);
        assert_eq!(snapshot.unique_motos, 0);
        assert_eq!(snapshot.avg_fps_last_60, 0.0);
        assert_eq!(snapshot.active_alerts, 0);
    }

    #[test]
    fn device_battery_is_rounded_and_clamped() {
        let raw: DeviceWire = serde_json::from_value(json!({
            "device_id": "sensor-01",
            "device_type": "sensor",
            "location": "Garage A",
            "status": "active",
            "battery_level": 87.6
        }))
        .unwrap();
        let device = Device::from_wire(raw);
        assert_eq!(device.device_type, DeviceType::Sensor);
        assert_eq!(device.battery_level, 88);

        let raw: DeviceWire = serde_json::from_value(json!({
            "device_id": "sensor-02",
            "device_type": "sensor",
            "battery_level": 130.0
        }))
        .unwrap();
        assert_eq!(Device::from_wire(raw).battery_level, 100);
    }

    #[test]
    fn unknown_device_type_maps_to_other() {
        let raw: DeviceWire =
            serde_json::from_value(json!({ "device_id": "x", "device_type": "gateway" })).unwrap();
        assert_eq!(Device::from_wire(raw).device_type, DeviceType::Other);
    }

    #[test]
    fn pushed_alert_shape_is_normalized() {
        let raw: AlertWire = serde_json::from_value(json!({
            "type": "low_confidence",
            "message": "Detection below threshold",
            "severity": "warning"
        }))
        .unwrap();
        let alert = Alert::from_wire(raw);
        assert_eq!(alert.alert_type, "low_confidence");
        assert_eq!(alert.severity, "warning");
        assert!(!alert.created_at.is_empty());
    }

    #[test]
    fn detection_confidence_is_clamped_to_unit_range() {
        let raw: DetectionWire =
            serde_json::from_value(json!({ "frame": 7, "confidence": 1.4 })).unwrap();
        let detection = Detection::from_wire(raw);
        assert_eq!(detection.frame, 7);
        assert_eq!(detection.confidence, 1.0);
        assert_eq!(detection.class_name, "unknown");
    }
}
