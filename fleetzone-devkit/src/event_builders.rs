/*!
Canned FleetZone payloads for tests and local development.

Each builder returns exactly the JSON shape the backend emits, including its
quirks: pushed alerts say `type` instead of `alert_type` and carry no
timestamp, telemetry readings are not device-shaped.
*/

use chrono::Utc;
use serde_json::{json, Value};

pub struct PayloadBuilder;

impl PayloadBuilder {
    /// Pushed detection event, as mirrored onto `fleetzone/detections@v1`.
    pub fn detection(frame: u64, class_name: &str, confidence: f64) -> Value {
        json!({
            "created_at": Utc::now().to_rfc3339(),
            "frame": frame,
            "class_name": class_name,
            "confidence": confidence,
            "area": 2500,
            "fps": 24.0
        })
    }

    /// Pushed alert event, as mirrored onto `fleetzone/alerts@v1`. Note the
    /// backend's pushed shape: `type`, no `created_at`.
    pub fn alert(alert_type: &str, message: &str, severity: &str) -> Value {
        json!({
            "type": alert_type,
            "message": message,
            "severity": severity
        })
    }

    /// Sensor telemetry reading, as mirrored onto `fleetzone/iot/sensor@v1`.
    pub fn sensor_telemetry(device_id: &str, battery_level: f64) -> Value {
        json!({
            "device_id": device_id,
            "location": "Garage A",
            "is_active": true,
            "timestamp": Utc::now().to_rfc3339(),
            "battery_level": battery_level,
            "signal_strength": 0.8
        })
    }

    /// Actuator telemetry reading, as mirrored onto `fleetzone/iot/actuator@v1`.
    pub fn actuator_telemetry(device_id: &str, status: &str) -> Value {
        json!({
            "device_id": device_id,
            "location": "Gate 1",
            "status": status,
            "timestamp": Utc::now().to_rfc3339(),
            "power_level": 0.9
        })
    }

    /// One row of the `/iot/devices` response.
    pub fn device_row(
        device_id: &str,
        device_type: &str,
        location: &str,
        status: &str,
        battery_level: f64,
    ) -> Value {
        json!({
            "device_id": device_id,
            "device_type": device_type,
            "location": location,
            "status": status,
            "battery_level": battery_level,
            "last_seen": Utc::now().to_rfc3339()
        })
    }

    /// Body of the `/metrics` response.
    pub fn metrics_body(
        total_events: u64,
        unique_motos: u64,
        avg_fps_last_60: f64,
        avg_detection_rate: f64,
        unique_classes: u64,
        active_alerts: u64,
    ) -> Value {
        json!({
            "total_events": total_events,
            "unique_motos": unique_motos,
            "avg_fps_last_60": avg_fps_last_60,
            "avg_detection_rate": avg_detection_rate,
            "unique_classes": unique_classes,
            "active_alerts": active_alerts
        })
    }
}
