use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiConf,
    #[serde(default)]
    pub mqtt: MqttConf,
    #[serde(default)]
    pub poll: PollConf,
    /// Start with every device row expanded instead of the windowed view.
    #[serde(default)]
    pub show_all_devices: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConf {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    pub client_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollConf {
    pub metrics_secs: u64,
    pub alerts_secs: u64,
    pub devices_secs: u64,
}

impl Default for ApiConf {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for MqttConf {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            client_id: "fleetzone-console".into(),
        }
    }
}

impl Default for PollConf {
    fn default() -> Self {
        Self {
            metrics_secs: 2,
            alerts_secs: 5,
            devices_secs: 3,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api: ApiConf::default(),
            mqtt: MqttConf::default(),
            poll: PollConf::default(),
            show_all_devices: false,
        }
    }
}

pub async fn load_config() -> ConsoleConfig {
    let path = std::env::var("FLEETZONE_CONSOLE_CONFIG").unwrap_or_else(|_| "console.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return ConsoleConfig::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            warn!("invalid config {path}: {e}");
            ConsoleConfig::default()
        })
    } else {
        warn!("no {path}, using default config");
        ConsoleConfig::default()
    }
}
