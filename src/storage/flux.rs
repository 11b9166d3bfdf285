//! Flux query builders for the monitor's fixed set of questions

use std::time::Duration;

use crate::config::InfluxConfig;

/// Render a duration as a Flux duration literal (`6h`, `90m`, `2s`)
pub fn duration_literal(duration: Duration) -> String {
    let secs = duration.as_secs().max(1);
    if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Quote a value as a Flux string literal
fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Latest sensor `status` inside the recency window.
///
/// The window tolerates a little skew between the sensor writing and us reading.
pub fn last_sensor_state(config: &InfluxConfig) -> String {
    format!(
        r#"from(bucket: {bucket})
  |> range(start: -{window}, stop: now())
  |> filter(fn: (r) => r["_measurement"] == {measurement})
  |> filter(fn: (r) => r["_field"] == "status")
  |> group()
  |> last()"#,
        bucket = string_literal(&config.bucket_power),
        window = duration_literal(config.sensor_window),
        measurement = string_literal(&config.sensor_measurement),
    )
}

/// Latest notified `status` within the last day
pub fn last_acknowledged_state(config: &InfluxConfig) -> String {
    format!(
        r#"from(bucket: {bucket})
  |> range(start: -1d)
  |> filter(fn: (r) => r["_measurement"] == {measurement})
  |> filter(fn: (r) => r["_field"] == "status")
  |> filter(fn: (r) => r[{tag_key}] == {tag_value})
  |> group()
  |> last()"#,
        bucket = string_literal(&config.bucket_events),
        measurement = string_literal(&config.event_measurement),
        tag_key = string_literal(&config.event_tag.0),
        tag_value = string_literal(&config.event_tag.1),
    )
}

/// Number of `down` events inside the lookback
pub fn count_down_events(config: &InfluxConfig, lookback: Duration) -> String {
    format!(
        r#"from(bucket: {bucket})
  |> range(start: -{lookback})
  |> filter(fn: (r) => r["_measurement"] == {measurement})
  |> filter(fn: (r) => r["_field"] == "status")
  |> filter(fn: (r) => r[{tag_key}] == {tag_value})
  |> filter(fn: (r) => r["_value"] == "down")
  |> group()
  |> count()
  |> yield(name: "count")"#,
        bucket = string_literal(&config.bucket_events),
        lookback = duration_literal(lookback),
        measurement = string_literal(&config.event_measurement),
        tag_key = string_literal(&config.event_tag.0),
        tag_value = string_literal(&config.event_tag.1),
    )
}

/// Timestamp of the newest event of any status
pub fn last_event_time(config: &InfluxConfig) -> String {
    format!(
        r#"from(bucket: {bucket})
  |> range(start: 0, stop: now())
  |> filter(fn: (r) => r["_measurement"] == {measurement})
  |> filter(fn: (r) => r[{tag_key}] == {tag_value})
  |> keep(columns: ["_time"])
  |> group()
  |> sort(columns: ["_time"], desc: true)
  |> limit(n: 1)"#,
        bucket = string_literal(&config.bucket_events),
        measurement = string_literal(&config.event_measurement),
        tag_key = string_literal(&config.event_tag.0),
        tag_value = string_literal(&config.event_tag.1),
    )
}
