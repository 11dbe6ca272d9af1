//! Conversational-AI adapter.
//!
//! Single-turn JSON chat endpoint: POST `{messages: [{role, content}], model}`,
//! answer in the `response` string field.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use warden_core::{errors::Error, ports::ConversationPort, Result};

#[derive(Clone, Debug)]
pub struct ChatEndpointClient {
    endpoint: String,
    model: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl ChatEndpointClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("ai client build error: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            timeout,
            http,
        })
    }

    pub async fn complete(&self, text: &str) -> Result<String> {
        let body = json!({
            "messages": [{ "role": "user", "content": text }],
            "model": self.model,
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "ai endpoint returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: serde_json::Value = resp.json().await.map_err(|e| self.map_err(e))?;

        let text = v
            .get("response")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string();

        if text.trim().is_empty() {
            return Err(Error::External(
                "ai endpoint response has no usable `response` field".to_string(),
            ));
        }

        debug!(chars = text.chars().count(), "ai answer received");
        Ok(text)
    }

    fn map_err(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            return Error::Timeout {
                operation: "ai request",
                after: self.timeout,
            };
        }
        Error::External(format!("ai request error: {e}"))
    }
}

#[async_trait]
impl ConversationPort for ChatEndpointClient {
    async fn reply(&self, text: &str) -> Result<String> {
        self.complete(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, timeout: Duration) -> ChatEndpointClient {
        ChatEndpointClient::new(
            format!("{}/api/chat", server.uri()),
            "mistral-7b-instruct",
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn sends_single_turn_request_and_returns_response_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({
                "messages": [{ "role": "user", "content": "capital of France?" }],
                "model": "mistral-7b-instruct",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response": "Paris." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server, Duration::from_secs(5));
        assert_eq!(c.reply("capital of France?").await.unwrap(), "Paris.");
    }

    #[tokio::test]
    async fn missing_or_non_string_field_is_an_error() {
        for body in [json!({ "answer": "x" }), json!({ "response": 7 }), json!({ "response": "" })] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
                .mount(&server)
                .await;

            let err = client(&server, Duration::from_secs(5))
                .reply("hi")
                .await
                .unwrap_err();
            assert!(matches!(err, Error::External(_)), "{body}");
        }
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .reply("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5))
            .reply("hi")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "late" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_millis(100))
            .reply("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
