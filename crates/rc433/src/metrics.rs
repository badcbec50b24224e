use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct SwitchMetrics {
    pub frames_sent: IntCounter,
    pub codes_sent: IntCounter,
    pub switches_acked: IntCounter,
    pub switches_unacked: IntCounter,
    pub devices_loaded: IntGauge,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub rc: SwitchMetrics,
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let counter = |name: &str, help: &str| {
            IntCounter::new(name, help).map_err(|e| format!("metrics init error: {e}"))
        };
        let frames_sent = counter("rc433_tristate_frames", "Total tri-state frames transmitted")?;
        let codes_sent = counter("rc433_codes_sent", "Total decimal code send attempts")?;
        let switches_acked = counter("rc433_switch_acked", "Switch requests acknowledged")?;
        let switches_unacked = counter(
            "rc433_switch_unacked",
            "Switch requests with no acknowledged attempt",
        )?;
        let devices_loaded = IntGauge::new("rc433_devices_loaded", "Number of devices loaded")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let rc = SwitchMetrics {
            frames_sent,
            codes_sent,
            switches_acked,
            switches_unacked,
            devices_loaded,
        };
        let _ = registry.register(Box::new(rc.frames_sent.clone()));
        let _ = registry.register(Box::new(rc.codes_sent.clone()));
        let _ = registry.register(Box::new(rc.switches_acked.clone()));
        let _ = registry.register(Box::new(rc.switches_unacked.clone()));
        let _ = registry.register(Box::new(rc.devices_loaded.clone()));
        Ok(Self { registry, rc })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_text_lists_counters() {
        let hub = MetricsHub::new().unwrap();
        hub.rc.frames_sent.inc_by(10);
        hub.rc.devices_loaded.set(3);
        let text = hub.encode_text();
        assert!(text.contains("rc433_tristate_frames 10"));
        assert!(text.contains("rc433_devices_loaded 3"));
    }
}
