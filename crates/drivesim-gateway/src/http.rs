//! HTTP client for the portal's results endpoint.
//!
//! The simulation loop is synchronous, so the client owns a small tokio
//! runtime and posts on it in the background. No retry: a failed post is
//! reported through the handle and then forgotten.

use std::time::Duration;

use tokio::runtime::Runtime;

use crate::error::{GatewayError, Result};
use crate::{Delivery, PersistenceGateway, SessionPayload, SubmitHandle};

pub struct HttpGateway {
    runtime: Runtime,
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(endpoint: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("drivesim-gateway")
            .enable_all()
            .build()?;

        Ok(Self {
            runtime,
            client,
            endpoint: endpoint.to_string(),
            token: token.map(String::from),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PersistenceGateway for HttpGateway {
    fn name(&self) -> &'static str {
        "http"
    }

    fn submit(&self, payload: SessionPayload) -> SubmitHandle {
        let (handle, tx) = SubmitHandle::pending();
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let token = self.token.clone();

        tracing::info!(
            "Submitting session {} to {} ({}/{} correct)",
            payload.session_id,
            endpoint,
            payload.correct_answers,
            payload.total_scenarios
        );

        self.runtime.spawn(async move {
            let result = post(&client, &endpoint, token.as_deref(), &payload).await;
            match &result {
                Ok(Delivery::Http { status }) => {
                    tracing::info!("Session {} stored (status {})", payload.session_id, status)
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Session {} not stored: {}", payload.session_id, e),
            }
            // Receiver may be gone if the caller stopped waiting.
            let _ = tx.send(result);
        });

        handle
    }
}

async fn post(
    client: &reqwest::Client,
    endpoint: &str,
    token: Option<&str>,
    payload: &SessionPayload,
) -> Result<Delivery> {
    let mut request = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .json(payload);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let resp = request.send().await?;

    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(Delivery::Http {
        status: status.as_u16(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn unreachable_endpoint_reports_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let gateway =
            HttpGateway::new("http://127.0.0.1:9/results", None, Duration::from_secs(2)).unwrap();
        assert_eq!(gateway.endpoint(), "http://127.0.0.1:9/results");

        let mut handle = gateway.submit(SessionPayload {
            session_id: "offline".into(),
            simulation_type: "driving_simulation".into(),
            total_scenarios: 5,
            correct_answers: 4,
            wrong_answers: 1,
            score_percentage: 80.0,
            completion_time: 120,
            scenario_results: Vec::new(),
            started_at: Utc::now(),
        });

        let result = handle.wait(Duration::from_secs(5)).expect("settles within timeout");
        assert!(result.is_err());
    }
}
