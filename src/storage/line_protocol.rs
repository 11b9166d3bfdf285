//! InfluxDB line protocol encoding for notification log points

use crate::config::InfluxConfig;
use crate::data::MonitorEvent;

/// Escape a measurement name (commas and spaces)
fn escape_measurement(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a tag key, tag value or field key (commas, equals signs and spaces)
fn escape_key(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Quote a string field value (double quotes and backslashes)
fn quote_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Encode one event as a single point without a timestamp; the server assigns it.
///
/// `id` is a plain number so it lands in the same float field older
/// writers created.
///
/// `twitter,tweet=monitor id=-1,status="down",content="...",error="..."`
pub fn encode_event(config: &InfluxConfig, event: &MonitorEvent) -> String {
    format!(
        "{measurement},{tag_key}={tag_value} id={id},status={status},content={content},error={error}",
        measurement = escape_measurement(&config.event_measurement),
        tag_key = escape_key(&config.event_tag.0),
        tag_value = escape_key(&config.event_tag.1),
        id = event.outcome.wire_id(),
        status = quote_field(event.status.as_str()),
        content = quote_field(&event.content),
        error = quote_field(event.outcome.error().unwrap_or("")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DispatchOutcome, PowerState};
    use std::time::Duration;

    fn config() -> InfluxConfig {
        InfluxConfig {
            base_url: "http://localhost:8086".to_string(),
            org: "home".to_string(),
            token: "t".to_string(),
            bucket_power: "power".to_string(),
            bucket_events: "twitter".to_string(),
            sensor_measurement: "lab".to_string(),
            sensor_window: Duration::from_secs(2),
            event_measurement: "twitter".to_string(),
            event_tag: ("tweet".to_string(), "monitor".to_string()),
        }
    }

    #[test]
    fn test_encode_delivered() {
        let event = MonitorEvent::new(
            PowerState::Live,
            "Power Status: live",
            DispatchOutcome::Delivered { id: 42 },
        );
        assert_eq!(
            encode_event(&config(), &event),
            r#"twitter,tweet=monitor id=42,status="live",content="Power Status: live",error="""#
        );
    }

    #[test]
    fn test_encode_failed_escapes_strings() {
        let event = MonitorEvent::new(
            PowerState::Down,
            "say \"down\"\nC:\\",
            DispatchOutcome::Failed {
                reason: "status 403: \"duplicate\"".to_string(),
            },
        );
        let line = encode_event(&config(), &event);

        assert!(line.starts_with("twitter,tweet=monitor id=-1,status=\"down\","));
        assert!(line.contains(r#"content="say \"down\"
C:\\""#));
        assert!(line.ends_with(r#"error="status 403: \"duplicate\"""#));
    }

    #[test]
    fn test_escape_keys() {
        assert_eq!(escape_measurement("power log,x"), "power\\ log\\,x");
        assert_eq!(escape_key("a=b c"), "a\\=b\\ c");
    }
}
