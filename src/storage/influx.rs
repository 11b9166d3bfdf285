//! InfluxDB v2 HTTP adapter

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use super::csv::{parse_records, FluxRecord};
use super::flux;
use super::gateway::{GatewayError, TimeSeriesGateway};
use super::line_protocol::encode_event;
use crate::config::InfluxConfig;
use crate::data::{MonitorEvent, PowerState, Signal};

/// Gateway backed by the InfluxDB v2 query and write APIs
#[derive(Debug, Clone)]
pub struct InfluxGateway {
    http_client: reqwest::Client,
    config: InfluxConfig,
    timeout: Duration,
}

impl InfluxGateway {
    pub fn new(config: InfluxConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
            timeout,
        })
    }

    pub fn config(&self) -> &InfluxConfig {
        &self.config
    }

    /// Check the server answers `/ping`
    pub async fn ping(&self) -> Result<(), GatewayError> {
        let url = format!("{}/ping", self.config.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(GatewayError::Status {
                status: response.status().as_u16(),
                message: "ping failed".to_string(),
            });
        }

        Ok(())
    }

    /// Run a Flux query and decode its rows
    pub async fn query(&self, flux: &str) -> Result<Vec<FluxRecord>, GatewayError> {
        let url = format!("{}/api/v2/query", self.config.base_url);
        let body = serde_json::json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "header": true,
                "annotations": [],
                "delimiter": ",",
            }
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("org", self.config.org.as_str())])
            .header(AUTHORIZATION, format!("Token {}", self.config.token))
            .header(ACCEPT, "application/csv")
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        parse_records(&text)
    }

    /// Write a single line-protocol point into the event bucket
    pub async fn write_line(&self, line: &str) -> Result<(), GatewayError> {
        let url = format!("{}/api/v2/write", self.config.base_url);

        let response = self
            .http_client
            .post(&url)
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket_events.as_str()),
                ("precision", "ns"),
            ])
            .header(AUTHORIZATION, format!("Token {}", self.config.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line.to_string())
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(())
    }

    async fn last_signal(&self, flux: &str) -> Result<Option<Signal>, GatewayError> {
        let records = self.query(flux).await?;

        let Some(record) = records.iter().find(|r| r.value().is_some()) else {
            return Ok(None);
        };

        let raw = record.value().unwrap_or_default();
        let state = PowerState::parse(raw);
        if !state.is_known() {
            tracing::warn!(value = %raw, "Unrecognised status value in store");
        }

        let observed_at = match record.time() {
            Some(time) => parse_time(time)?,
            None => Utc::now(),
        };

        Ok(Some(Signal::new(state, observed_at)))
    }
}

#[async_trait]
impl TimeSeriesGateway for InfluxGateway {
    async fn last_sensor_state(&self) -> Result<Option<Signal>, GatewayError> {
        self.last_signal(&flux::last_sensor_state(&self.config)).await
    }

    async fn last_acknowledged_state(&self) -> Result<Option<Signal>, GatewayError> {
        self.last_signal(&flux::last_acknowledged_state(&self.config))
            .await
    }

    async fn count_down_events(&self, lookback: Duration) -> Result<u64, GatewayError> {
        let records = self
            .query(&flux::count_down_events(&self.config, lookback))
            .await?;

        // count() yields nothing at all when no row matched
        let mut total = 0u64;
        for record in &records {
            if let Some(raw) = record.value() {
                total += raw
                    .parse::<u64>()
                    .map_err(|e| GatewayError::Decode(format!("count {:?}: {}", raw, e)))?;
            }
        }
        Ok(total)
    }

    async fn time_since_last_event(&self) -> Result<Option<Duration>, GatewayError> {
        let records = self.query(&flux::last_event_time(&self.config)).await?;

        let Some(time) = records.iter().find_map(|r| r.time()) else {
            return Ok(None);
        };

        let recorded_at = parse_time(time)?;
        let elapsed = (Utc::now() - recorded_at).to_std().unwrap_or(Duration::ZERO);
        Ok(Some(elapsed))
    }

    async fn append_event(&self, event: &MonitorEvent) -> Result<(), GatewayError> {
        let line = encode_event(&self.config, event);
        self.write_line(&line).await
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, GatewayError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| GatewayError::Decode(format!("time {:?}: {}", raw, e)))
}

/// InfluxDB reports errors as `{"code": "...", "message": "..."}`
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DispatchOutcome;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct FakeInflux {
        writes: Mutex<Vec<(HashMap<String, String>, String)>>,
        queries: Mutex<Vec<String>>,
    }

    /// `status` field of a written line, as the store would hand it back
    fn written_status(line: &str) -> Option<String> {
        let start = line.find(r#"status=""#)? + r#"status=""#.len();
        let len = line[start..].find('"')?;
        Some(line[start..start + len].to_string())
    }

    fn body_for(query: &str, last_write: Option<&str>) -> (StatusCode, String) {
        if query.contains(r#"from(bucket: "broken")"#) {
            return (
                StatusCode::BAD_REQUEST,
                r#"{"code":"invalid","message":"bucket not found"}"#.to_string(),
            );
        }
        if query.contains("count()") {
            if query.contains("-6h") {
                return (StatusCode::OK, String::new());
            }
            return (
                StatusCode::OK,
                ",result,table,_value\r\n,count,0,3\r\n\r\n".to_string(),
            );
        }
        if query.contains("keep(columns") {
            let time = (Utc::now() - chrono::Duration::seconds(90)).to_rfc3339();
            return (
                StatusCode::OK,
                format!(",result,table,_time\r\n,_result,0,{}\r\n\r\n", time),
            );
        }
        if query.contains("range(start: -1d)") && query.contains(r#"r["tweet"] == "monitor""#) {
            return match last_write.and_then(written_status) {
                Some(status) => (
                    StatusCode::OK,
                    format!(
                        ",result,table,_time,_value,_field,_measurement,tweet\r\n\
                         ,_result,0,2026-10-18T08:00:05Z,{},status,twitter,monitor\r\n\r\n",
                        status
                    ),
                ),
                None => (StatusCode::OK, String::new()),
            };
        }
        if query.contains(r#"r["_measurement"] == "lab""#) {
            return (
                StatusCode::OK,
                ",result,table,_start,_stop,_time,_value,_field,_measurement\r\n\
                 ,_result,0,2026-10-18T08:00:00Z,2026-10-18T08:00:02Z,2026-10-18T08:00:01Z,down,status,lab\r\n\r\n"
                    .to_string(),
            );
        }
        (StatusCode::OK, String::new())
    }

    async fn handle_query(
        State(state): State<Arc<FakeInflux>>,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, String) {
        let query = body["query"].as_str().unwrap_or_default().to_string();
        state.queries.lock().push(query.clone());
        let writes = state.writes.lock();
        body_for(&query, writes.last().map(|(_, body)| body.as_str()))
    }

    async fn handle_write(
        State(state): State<Arc<FakeInflux>>,
        Query(params): Query<HashMap<String, String>>,
        body: String,
    ) -> StatusCode {
        state.writes.lock().push((params, body));
        StatusCode::NO_CONTENT
    }

    async fn spawn_fake() -> (String, Arc<FakeInflux>) {
        let state = Arc::new(FakeInflux::default());
        let app = Router::new()
            .route("/ping", get(|| async { StatusCode::NO_CONTENT }))
            .route("/api/v2/query", post(handle_query))
            .route("/api/v2/write", post(handle_write))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), state)
    }

    fn config(base_url: String) -> InfluxConfig {
        InfluxConfig {
            base_url,
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

    #[tokio::test]
    async fn test_ping_and_sensor_state() {
        let (url, _state) = spawn_fake().await;
        let gateway = InfluxGateway::new(config(url), Duration::from_secs(2)).unwrap();

        gateway.ping().await.unwrap();

        let signal = gateway.last_sensor_state().await.unwrap().unwrap();
        assert_eq!(signal.state, PowerState::Down);
        assert_eq!(signal.observed_at.to_rfc3339(), "2026-10-18T08:00:01+00:00");
    }

    #[tokio::test]
    async fn test_empty_acknowledged_state() {
        let (url, _state) = spawn_fake().await;
        let gateway = InfluxGateway::new(config(url), Duration::from_secs(2)).unwrap();

        assert!(gateway.last_acknowledged_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_and_elapsed() {
        let (url, _state) = spawn_fake().await;
        let gateway = InfluxGateway::new(config(url), Duration::from_secs(2)).unwrap();

        assert_eq!(
            gateway
                .count_down_events(Duration::from_secs(6 * 3600))
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            gateway
                .count_down_events(Duration::from_secs(24 * 3600))
                .await
                .unwrap(),
            3
        );

        let elapsed = gateway.time_since_last_event().await.unwrap().unwrap();
        assert!(elapsed >= Duration::from_secs(89) && elapsed < Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_append_event_writes_line() {
        let (url, state) = spawn_fake().await;
        let gateway = InfluxGateway::new(config(url), Duration::from_secs(2)).unwrap();

        let event = MonitorEvent::new(
            PowerState::Down,
            "Power Status: down",
            DispatchOutcome::Failed {
                reason: "boom".to_string(),
            },
        );
        gateway.append_event(&event).await.unwrap();

        let writes = state.writes.lock();
        assert_eq!(writes.len(), 1);
        let (params, body) = &writes[0];
        assert_eq!(params.get("bucket").map(String::as_str), Some("twitter"));
        assert_eq!(params.get("org").map(String::as_str), Some("home"));
        assert_eq!(
            body,
            r#"twitter,tweet=monitor id=-1,status="down",content="Power Status: down",error="boom""#
        );
    }

    #[tokio::test]
    async fn test_appended_event_becomes_acknowledged() {
        let (url, state) = spawn_fake().await;
        let gateway = InfluxGateway::new(config(url), Duration::from_secs(2)).unwrap();
        assert!(gateway.last_acknowledged_state().await.unwrap().is_none());

        let event = MonitorEvent::new(
            PowerState::Down,
            "Power Status: down",
            DispatchOutcome::Delivered { id: 7 },
        );
        gateway.append_event(&event).await.unwrap();

        let signal = gateway.last_acknowledged_state().await.unwrap().unwrap();
        assert_eq!(signal.state, PowerState::Down);
        assert_eq!(signal.observed_at.to_rfc3339(), "2026-10-18T08:00:05+00:00");

        let queries = state.queries.lock();
        let acknowledged = queries.last().unwrap();
        assert!(acknowledged.starts_with(r#"from(bucket: "twitter")"#));
        assert!(acknowledged.contains("range(start: -1d)"));
    }

    #[tokio::test]
    async fn test_status_error_is_reported() {
        let (url, _state) = spawn_fake().await;
        let mut cfg = config(url);
        cfg.bucket_power = "broken".to_string();
        let gateway = InfluxGateway::new(cfg, Duration::from_secs(2)).unwrap();

        match gateway.last_sensor_state().await {
            Err(GatewayError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bucket not found");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let gateway = InfluxGateway::new(
            config("http://127.0.0.1:9".to_string()),
            Duration::from_millis(500),
        )
        .unwrap();

        assert!(gateway.last_acknowledged_state().await.is_err());
    }
}
