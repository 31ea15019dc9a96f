//! MQTT push side of the console.
//!
//! The backend mirrors every live event onto the broker: one topic per event
//! kind. Detections and alerts are real payloads and go straight into the
//! store; sensor/actuator telemetry is only a "topology moved" hint that
//! schedules a device re-fetch. Connect/disconnect lifecycle never touches
//! domain state, it only feeds the [`LinkTracker`] the renderer reads.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::config::MqttConf;
use crate::models::{Alert, AlertWire, Detection, DetectionWire, DeviceType, TelemetryEvent};
use crate::state::Shared;
use crate::store::DashboardStore;

pub const TOPIC_DETECTIONS: &str = "fleetzone/detections@v1";
pub const TOPIC_ALERTS: &str = "fleetzone/alerts@v1";
pub const TOPIC_SENSOR: &str = "fleetzone/iot/sensor@v1";
pub const TOPIC_ACTUATOR: &str = "fleetzone/iot/actuator@v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Connecting => "connecting",
            LinkStatus::Connected => "connected",
            LinkStatus::Reconnecting => "reconnecting",
            LinkStatus::Disconnected => "disconnected",
        }
    }
}

/// Presentation-only connectivity state of the push channel.
#[derive(Clone)]
pub struct LinkTracker {
    status: Arc<parking_lot::Mutex<LinkStatus>>,
    reconnects: Arc<AtomicU32>,
    redraw: Arc<Notify>,
}

impl LinkTracker {
    pub fn new(redraw: Arc<Notify>) -> Self {
        Self {
            status: Arc::new(parking_lot::Mutex::new(LinkStatus::Connecting)),
            reconnects: Arc::new(AtomicU32::new(0)),
            redraw,
        }
    }

    pub fn mark_connected(&self) {
        self.set(LinkStatus::Connected);
    }

    pub fn mark_disconnected(&self) {
        self.set(LinkStatus::Disconnected);
    }

    pub fn mark_reconnecting(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
        self.set(LinkStatus::Reconnecting);
    }

    pub fn status(&self) -> LinkStatus {
        *self.status.lock()
    }

    pub fn reconnects(&self) -> u32 {
        self.reconnects.load(Ordering::Relaxed)
    }

    fn set(&self, status: LinkStatus) {
        *self.status.lock() = status;
        self.redraw.notify_one();
    }
}

pub fn spawn_push_listener(
    conf: MqttConf,
    store: Shared<DashboardStore>,
    link: LinkTracker,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut opts = MqttOptions::new(&conf.client_id, &conf.host, conf.port);
        opts.set_keep_alive(Duration::from_secs(15));
        let (client, mut eventloop) = AsyncClient::new(opts, 10);

        for topic in [TOPIC_DETECTIONS, TOPIC_ALERTS, TOPIC_SENSOR, TOPIC_ACTUATOR] {
            if let Err(e) = client.subscribe(topic, QoS::AtLeastOnce).await {
                error!("subscribe {topic} failed: {e:?}");
                return;
            }
        }

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    debug!("push channel connected");
                    link.mark_connected();
                }
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    if let Err(e) = handle_publish(&publish.topic, &publish.payload, &store) {
                        warn!("bad payload on {}: {e}", publish.topic);
                    }
                }
                Ok(Event::Incoming(Incoming::Disconnect)) => {
                    link.mark_disconnected();
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("push channel error: {e:?}");
                    link.mark_reconnecting();
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    })
}

/// Decodes one pushed message and applies it to the store. Split out of the
/// event loop so payload handling is testable without a broker.
pub fn handle_publish(topic: &str, payload: &[u8], store: &Shared<DashboardStore>) -> Result<()> {
    match topic {
        TOPIC_DETECTIONS => {
            let wire: DetectionWire = serde_json::from_slice(payload)?;
            store.lock().ingest_push_detection(Detection::from_wire(wire));
        }
        TOPIC_ALERTS => {
            let wire: AlertWire = serde_json::from_slice(payload)?;
            store.lock().ingest_push_alert(Alert::from_wire(wire));
        }
        TOPIC_SENSOR | TOPIC_ACTUATOR => {
            let payload: serde_json::Value = serde_json::from_slice(payload)?;
            let device_type = if topic == TOPIC_SENSOR {
                DeviceType::Sensor
            } else {
                DeviceType::Actuator
            };
            let event = TelemetryEvent { device_type, payload };
            debug!("{:?} telemetry: {}", event.device_type, event.payload);
            store.lock().ingest_push_telemetry(event);
        }
        other => {
            warn!("ignoring message on unexpected topic {other}");
        }
    }
    Ok(())
}
