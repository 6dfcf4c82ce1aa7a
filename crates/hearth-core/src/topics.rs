//! Broker topic formatting and inbound classification.
//!
//! Every topic is rooted at `device/<serial>`. Inbound subscriptions carry
//! the `action` and `schedule_update` suffixes; outbound reports go to
//! `status/<name>`, `sensor/<name>` and the `ping` keepalive topic.

use core::fmt::Write;

/// Upper bound for a fully formatted topic: `device/` + 64-byte serial +
/// suffix.
pub const TOPIC_MAX: usize = 128;

pub type Topic = heapless::String<TOPIC_MAX>;

/// All device traffic uses exactly-once delivery.
pub const QOS_EXACTLY_ONCE: u8 = 2;

pub const ACTION_SUFFIX: &str = "action";
pub const SCHEDULE_UPDATE_SUFFIX: &str = "schedule_update";
pub const PING_SUFFIX: &str = "ping";

/// Inbound topics the device reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    /// `device/<serial>/action`: immediate action request.
    Action,
    /// `device/<serial>/schedule_update`: scheduled-action update.
    ScheduleUpdate,
}

/// Format `device/<serial>/<suffix>`.
pub fn device_topic(serial: &str, suffix: &str) -> Topic {
    let mut topic = Topic::new();
    let _ = write!(topic, "device/{serial}/{suffix}");
    topic
}

/// Format `device/<serial>/<kind>/<name>` for status and sensor reports.
pub fn report_topic(serial: &str, kind: &str, name: &str) -> Topic {
    let mut topic = Topic::new();
    let _ = write!(topic, "device/{serial}/{kind}/{name}");
    topic
}

/// Classify an inbound topic by its suffix; anything else is not for us.
pub fn classify(topic: &str) -> Option<InboundKind> {
    if topic.ends_with(ACTION_SUFFIX) {
        Some(InboundKind::Action)
    } else if topic.ends_with(SCHEDULE_UPDATE_SUFFIX) {
        Some(InboundKind::ScheduleUpdate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_device_topics() {
        assert_eq!(
            device_topic("A1B2", ACTION_SUFFIX).as_str(),
            "device/A1B2/action"
        );
        assert_eq!(
            report_topic("A1B2", "sensor", "temperature").as_str(),
            "device/A1B2/sensor/temperature"
        );
        assert_eq!(
            report_topic("A1B2", "status", "power").as_str(),
            "device/A1B2/status/power"
        );
    }

    #[test]
    fn classifies_inbound_suffixes() {
        assert_eq!(classify("device/A1B2/action"), Some(InboundKind::Action));
        assert_eq!(
            classify("device/A1B2/schedule_update"),
            Some(InboundKind::ScheduleUpdate)
        );
        assert_eq!(classify("device/A1B2/sensor/temperature"), None);
        assert_eq!(classify("device/A1B2/ping"), None);
    }
}
