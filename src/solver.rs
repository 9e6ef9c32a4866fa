//! Challenge Solver Client
//!
//! Talks to an external asynchronous solver service using the classic
//! submit/poll wire shape: one submission call returns a request id, then the
//! client polls on a fixed cadence until the service reports the token, an
//! error, or the attempt budget runs out.
//!
//! With no API key configured the client runs in an explicit offline mode
//! and produces a synthetic token without any network call, so the rest of
//! the pipeline can exercise its control flow in a demo configuration.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SolverConfig;
use crate::error::TaskError;

/// Poll body meaning "keep waiting" (the service's own spelling).
const NOT_READY: &str = "CAPCHA_NOT_READY";

/// Handle for one in-flight solve request. Owned by the executor that
/// created it; never reused across tasks.
#[derive(Debug, Clone)]
pub struct SolveRequest {
    pub id: String,
    pub challenge_key: String,
    pub page_url: String,
}

#[derive(Debug, Deserialize)]
struct SolverResponse {
    status: i64,
    request: String,
}

pub struct SolverClient {
    http: Client,
    config: SolverConfig,
}

impl SolverClient {
    pub fn new(config: SolverConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// True when no credential is configured and tokens are synthesized.
    pub fn offline(&self) -> bool {
        self.config.api_key.is_none()
    }

    /// Submit + poll. The caller observes a single synchronous-looking
    /// result or an error; the cadence lives below.
    pub async fn solve(&self, challenge_key: &str, page_url: &str) -> Result<String, TaskError> {
        if self.offline() {
            info!("no solver credential configured, producing offline token");
            return Ok(format!(
                "offline-token-{}",
                chrono::Utc::now().timestamp_millis()
            ));
        }

        let request = self.submit(challenge_key, page_url).await?;
        self.poll_until_resolved(&request).await
    }

    /// Contact the service once; a non-accepted response or transport
    /// failure is terminal for the attempt.
    pub async fn submit(
        &self,
        challenge_key: &str,
        page_url: &str,
    ) -> Result<SolveRequest, TaskError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| TaskError::Submission("no solver credential configured".to_string()))?;

        let resp = self
            .http
            .get(format!("{}/in.php", self.config.api_base))
            .query(&[
                ("key", api_key),
                ("method", "userrecaptcha"),
                ("googlekey", challenge_key),
                ("pageurl", page_url),
                ("json", "1"),
            ])
            .send()
            .await
            .map_err(|e| TaskError::Submission(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TaskError::Submission(format!(
                "submit endpoint returned {}",
                resp.status()
            )));
        }

        let body: SolverResponse = resp
            .json()
            .await
            .map_err(|e| TaskError::Submission(e.to_string()))?;

        if body.status != 1 {
            return Err(TaskError::Submission(body.request));
        }

        debug!("solve request accepted: id={}", body.request);
        Ok(SolveRequest {
            id: body.request,
            challenge_key: challenge_key.to_string(),
            page_url: page_url.to_string(),
        })
    }

    /// Poll every `poll_interval_ms` up to `max_poll_attempts` times.
    /// Any answer other than "not ready" or the token is terminal.
    pub async fn poll_until_resolved(&self, request: &SolveRequest) -> Result<String, TaskError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| TaskError::Solve("no solver credential configured".to_string()))?;
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        debug!(
            "polling solver for challenge {} on {} (id={})",
            request.challenge_key, request.page_url, request.id
        );

        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(interval).await;

            let resp = self
                .http
                .get(format!("{}/res.php", self.config.api_base))
                .query(&[
                    ("key", api_key),
                    ("action", "get"),
                    ("id", request.id.as_str()),
                    ("json", "1"),
                ])
                .send()
                .await
                .map_err(|e| TaskError::Solve(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(TaskError::Solve(format!(
                    "poll endpoint returned {}",
                    resp.status()
                )));
            }

            let body: SolverResponse = resp
                .json()
                .await
                .map_err(|e| TaskError::Solve(e.to_string()))?;

            if body.status == 1 {
                debug!("challenge solved after {} polls", attempt);
                return Ok(body.request);
            }
            if body.request != NOT_READY {
                return Err(TaskError::Solve(body.request));
            }
            debug!("solve not ready (poll {}/{})", attempt, self.config.max_poll_attempts);
        }

        Err(TaskError::SolveTimeout {
            attempts: self.config.max_poll_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_config(base: String, key: Option<&str>) -> SolverConfig {
        SolverConfig {
            api_base: base,
            api_key: key.map(String::from),
            poll_interval_ms: 1,
            max_poll_attempts: 3,
            request_timeout_secs: 5,
        }
    }

    fn request_for(id: &str) -> SolveRequest {
        SolveRequest {
            id: id.to_string(),
            challenge_key: "site-key".to_string(),
            page_url: "https://example.com/form".to_string(),
        }
    }

    #[test]
    fn test_solver_response_wire_shape() {
        let parsed: SolverResponse =
            serde_json::from_str(r#"{"status":0,"request":"CAPCHA_NOT_READY"}"#).unwrap();
        assert_eq!(parsed.status, 0);
        assert_eq!(parsed.request, NOT_READY);
    }

    #[tokio::test]
    async fn test_submit_accepted() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/in.php")
                .query_param("method", "userrecaptcha")
                .query_param("googlekey", "site-key");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"status":1,"request":"req-42"}"#);
        });

        let client = SolverClient::new(test_config(server.base_url(), Some("demo-key"))).unwrap();
        let request = client
            .submit("site-key", "https://example.com/form")
            .await
            .unwrap();
        assert_eq!(request.id, "req-42");
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/in.php");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"status":0,"request":"ERROR_WRONG_USER_KEY"}"#);
        });

        let client = SolverClient::new(test_config(server.base_url(), Some("bad-key"))).unwrap();
        let err = client
            .submit("site-key", "https://example.com/form")
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Submission(ref r) if r == "ERROR_WRONG_USER_KEY"));
    }

    #[tokio::test]
    async fn test_poll_returns_token_on_first_solved_answer() {
        let server = MockServer::start();
        let poll = server.mock(|when, then| {
            when.method(GET).path("/res.php").query_param("id", "req-1");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"status":1,"request":"TOKEN123"}"#);
        });

        let client = SolverClient::new(test_config(server.base_url(), Some("demo-key"))).unwrap();
        let token = client.poll_until_resolved(&request_for("req-1")).await.unwrap();
        assert_eq!(token, "TOKEN123");
        poll.assert_hits(1);
    }

    #[tokio::test]
    async fn test_poll_times_out_after_attempt_budget() {
        let server = MockServer::start();
        let poll = server.mock(|when, then| {
            when.method(GET).path("/res.php");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"status":0,"request":"CAPCHA_NOT_READY"}"#);
        });

        let client = SolverClient::new(test_config(server.base_url(), Some("demo-key"))).unwrap();
        let err = client
            .poll_until_resolved(&request_for("req-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::SolveTimeout { attempts: 3 }));
        poll.assert_hits(3);
    }

    #[tokio::test]
    async fn test_poll_service_error_is_terminal() {
        let server = MockServer::start();
        let poll = server.mock(|when, then| {
            when.method(GET).path("/res.php");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"status":0,"request":"ERROR_CAPTCHA_UNSOLVABLE"}"#);
        });

        let client = SolverClient::new(test_config(server.base_url(), Some("demo-key"))).unwrap();
        let err = client
            .poll_until_resolved(&request_for("req-3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Solve(ref r) if r == "ERROR_CAPTCHA_UNSOLVABLE"));
        poll.assert_hits(1);
    }

    #[tokio::test]
    async fn test_offline_mode_produces_token_without_network() {
        // Unroutable base: any network call would fail loudly.
        let client =
            SolverClient::new(test_config("http://127.0.0.1:9".to_string(), None)).unwrap();
        assert!(client.offline());

        let token = client
            .solve("site-key", "https://example.com/form")
            .await
            .unwrap();
        assert!(token.starts_with("offline-token-"));
    }

    /// Minimal scripted HTTP responder: one canned body per connection, in
    /// order. Lets the poll test observe a not-ready -> solved sequence,
    /// which a stateless mock cannot express.
    async fn scripted_server(bodies: Vec<&'static str>) -> (String, tokio::task::JoinHandle<usize>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut served = 0usize;
            for body in bodies {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await.unwrap();
                let resp = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                stream.write_all(resp.as_bytes()).await.unwrap();
                served += 1;
            }
            served
        });
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_solve_polls_through_not_ready_sequence() {
        let (base, handle) = scripted_server(vec![
            r#"{"status":1,"request":"req-9"}"#,
            r#"{"status":0,"request":"CAPCHA_NOT_READY"}"#,
            r#"{"status":0,"request":"CAPCHA_NOT_READY"}"#,
            r#"{"status":1,"request":"TOKEN123"}"#,
        ])
        .await;

        let mut config = test_config(base, Some("demo-key"));
        config.max_poll_attempts = 24;
        let client = SolverClient::new(config).unwrap();

        let token = client
            .solve("site-key", "https://example.com/form")
            .await
            .unwrap();
        assert_eq!(token, "TOKEN123");

        // 1 submission + exactly 3 polls (two not-ready, one solved).
        assert_eq!(handle.await.unwrap(), 4);
    }
}
