//! Terminal render sink. Takes an already-projected [`ViewModel`] and paints
//! it; nothing here reads the store or the network.

use crate::push::LinkStatus;
use crate::view::{
    ActuatorCard, AlertsPanel, DetectionsPanel, DevicePanel, MetricsPanel, PanelBody, SensorCard,
    ViewModel,
};

pub fn paint(view: &ViewModel, link: LinkStatus, reconnects: u32) {
    let now = chrono::Local::now().format("%H:%M:%S").to_string();
    print!("{}", render_to_string(view, link, reconnects, &now));
}

fn render_to_string(view: &ViewModel, link: LinkStatus, reconnects: u32, now: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n[{now}] FleetZone | link: {}{}\n",
        link.as_str(),
        if reconnects > 0 {
            format!(" ({reconnects} reconnects)")
        } else {
            String::new()
        }
    ));
    render_metrics(&mut out, &view.metrics);
    render_devices(&mut out, &view.devices);
    render_alerts(&mut out, &view.alerts);
    render_detections(&mut out, &view.detections);
    out
}

fn render_metrics(out: &mut String, panel: &MetricsPanel) {
    match panel {
        MetricsPanel::Waiting => out.push_str("  metrics: waiting for first fetch\n"),
        MetricsPanel::Error => out.push_str("  metrics: ERROR\n"),
        MetricsPanel::Ready(kpis) => out.push_str(&format!(
            "  events {} | motos {} | fps {} | rate {} | classes {} | alerts {} | devices {}\n",
            kpis.total_events,
            kpis.unique_motos,
            kpis.avg_fps,
            kpis.detection_rate,
            kpis.unique_classes,
            kpis.active_alerts,
            kpis.device_count,
        )),
    }
}

fn render_devices(out: &mut String, panel: &DevicePanel) {
    let marker = if panel.degraded { " [stale]" } else { "" };
    out.push_str(&format!("  Sensors ({}){marker}\n", panel.sensors.total));
    if panel.sensors.cards.is_empty() {
        out.push_str("    none connected\n");
    }
    for card in &panel.sensors.cards {
        out.push_str(&sensor_line(card));
    }
    if panel.sensors.hidden > 0 {
        out.push_str(&format!("    ... and {} more\n", panel.sensors.hidden));
    }
    if panel.actuators.total > 0 {
        out.push_str(&format!("  Actuators ({}){marker}\n", panel.actuators.total));
        for card in &panel.actuators.cards {
            out.push_str(&actuator_line(card));
        }
        if panel.actuators.hidden > 0 {
            out.push_str(&format!("    ... and {} more\n", panel.actuators.hidden));
        }
    }
}

fn sensor_line(card: &SensorCard) -> String {
    format!(
        "    {} {:<12} {:<16} battery {:>3}% ({:?})\n",
        if card.online { "*" } else { "-" },
        card.device_id,
        card.location,
        card.battery_pct,
        card.battery,
    )
}

fn actuator_line(card: &ActuatorCard) -> String {
    format!(
        "    {} {:<12} {:<16} status {}{}\n",
        if card.engaged { "*" } else { "-" },
        card.device_id,
        card.location,
        card.status,
        card.last_action
            .as_deref()
            .map(|a| format!(" (last: {a})"))
            .unwrap_or_default(),
    )
}

fn render_alerts(out: &mut String, panel: &AlertsPanel) {
    out.push_str(if panel.degraded {
        "  Alerts [stale]\n"
    } else {
        "  Alerts\n"
    });
    match &panel.body {
        PanelBody::Empty => out.push_str("    no active alerts\n"),
        PanelBody::Rows(rows) => {
            for row in rows {
                out.push_str(&format!(
                    "    [{}] {}: {} ({})\n",
                    row.severity, row.alert_type, row.message, row.time
                ));
            }
        }
    }
}

fn render_detections(out: &mut String, panel: &DetectionsPanel) {
    out.push_str("  Detections\n");
    match &panel.body {
        PanelBody::Empty => out.push_str("    none yet\n"),
        PanelBody::Rows(rows) => {
            for row in rows {
                out.push_str(&format!(
                    "    {} frame {:>6} {:<10} {:>6} conf area {:>9} fps {}\n",
                    row.time, row.frame, row.class_name, row.confidence_pct, row.area, row.fps
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DashboardStore;
    use crate::view::{project, ViewPreferences};

    #[test]
    fn empty_store_renders_placeholders_not_blanks() {
        let (store, _rx) = DashboardStore::new();
        let view = project(&store, &ViewPreferences::default());
        let text = render_to_string(&view, LinkStatus::Connecting, 0, "10:00:00");
        assert!(text.contains("waiting for first fetch"));
        assert!(text.contains("no active alerts"));
        assert!(text.contains("none yet"));
        assert!(text.contains("link: connecting"));
    }

    #[test]
    fn metrics_error_renders_the_placeholder_line() {
        let (mut store, _rx) = DashboardStore::new();
        store.record_fetch_failure(crate::store::ResourceClass::Metrics);
        let view = project(&store, &ViewPreferences::default());
        let text = render_to_string(&view, LinkStatus::Connected, 2, "10:00:00");
        assert!(text.contains("metrics: ERROR"));
        assert!(text.contains("(2 reconnects)"));
    }
}
