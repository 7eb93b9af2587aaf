use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tempmail_domain::*;
use tempmail_error::MailError;
use tracing::{debug, warn};

use crate::extract;

pub const DEFAULT_BASE_URL: &str = "https://apiok.us/api/cbea";
pub const DEFAULT_MAILBOX_TYPE: &str = "*";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(65);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct ApiOkConfig {
    pub api_key: String,
    pub base_url: String,
    pub mailbox_type: String,
}

impl ApiOkConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            mailbox_type: DEFAULT_MAILBOX_TYPE.to_string(),
        }
    }
}

pub struct ApiOkAdapter {
    config: ApiOkConfig,
    client: Client,
}

impl ApiOkAdapter {
    pub fn new(config: ApiOkConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MailError::network(format!("failed to build http client: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ApiOkConfig, client: Client) -> Self {
        Self { config, client }
    }

    async fn api_get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, MailError> {
        let url = format!("{}/{path}", self.config.base_url.trim_end_matches('/'));
        debug!(url = %url, "apiok GET");
        let mut query = vec![("apikey", self.config.api_key.as_str())];
        query.extend_from_slice(params);

        let resp = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&query)
            .send()
            .await
            .map_err(|e| MailError::network(format!("apiok request failed: {e}")))?;
        parse_apiok_response(resp).await
    }
}

#[async_trait]
impl TempMailPort for ApiOkAdapter {
    async fn generate_mailbox(&self) -> Result<Mailbox, MailError> {
        let body = self
            .api_get("generate/v1", &[("type", self.config.mailbox_type.as_str())])
            .await?;
        let mailbox = extract::extract_mailbox(&body)?;
        debug!(%mailbox, "generated mailbox");
        Ok(mailbox)
    }

    async fn list_messages(&self, mailbox_id: &str) -> Result<Vec<MessageSummary>, MailError> {
        let body = self.api_get("messages/v1", &[("id", mailbox_id)]).await?;
        let messages = extract::extract_messages(&body);
        if let Some(latest) = messages.first() {
            debug!(mailbox_id, count = messages.len(), %latest, "listed messages");
        }
        Ok(messages)
    }

    async fn fetch_message_detail(&self, message_id: &str) -> Result<MessageDetail, MailError> {
        let body = self
            .api_get("message/detail/v1", &[("id", message_id)])
            .await?;
        extract::extract_detail(&body, message_id)
    }
}

async fn parse_apiok_response(resp: reqwest::Response) -> Result<Value, MailError> {
    let status = resp.status();
    if status != StatusCode::OK {
        warn!(status = status.as_u16(), "apiok returned non-200");
        return Err(MailError::Status(status.as_u16()));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| MailError::network(format!("apiok body read failed: {e}")))?;
    serde_json::from_str(&text).map_err(|e| MailError::decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers exactly one request with a canned response and hands back the
    /// raw request head.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&head).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn adapter(base_url: String) -> ApiOkAdapter {
        let config = ApiOkConfig {
            api_key: "k-123".to_string(),
            base_url,
            mailbox_type: DEFAULT_MAILBOX_TYPE.to_string(),
        };
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap();
        ApiOkAdapter::with_client(config, client)
    }

    #[tokio::test]
    async fn generate_sends_key_type_and_headers() {
        let (base, server) =
            serve_once("200 OK", r#"{"result":{"id":"abc123","email":"x@y.z"}}"#).await;
        let mailbox = adapter(base).generate_mailbox().await.unwrap();
        assert_eq!(mailbox.email_id, "abc123");
        assert_eq!(mailbox.email_address, "x@y.z");

        let head = server.await.unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("GET /generate/v1?"));
        assert!(request_line.contains("apikey=k-123"));
        assert!(request_line.contains("type=%2A") || request_line.contains("type=*"));
        let lower = head.to_ascii_lowercase();
        assert!(lower.contains("accept: application/json"));
        assert!(lower.contains("user-agent: mozilla/5.0"));
    }

    #[tokio::test]
    async fn list_passes_mailbox_id() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"result":{"messages":[{"id":"m1","from":"a@b.c","subject":"hi","time":1700000000}]}}"#,
        )
        .await;
        let messages = adapter(base).list_messages("abc123").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id.as_deref(), Some("m1"));

        let head = server.await.unwrap();
        assert!(head.starts_with("GET /messages/v1?"));
        assert!(head.lines().next().unwrap().contains("id=abc123"));
    }

    #[tokio::test]
    async fn non_200_is_status_error() {
        let (base, _server) = serve_once("503 Service Unavailable", "{}").await;
        let err = adapter(base).list_messages("abc123").await.unwrap_err();
        assert!(matches!(err, MailError::Status(503)));
    }

    #[tokio::test]
    async fn malformed_json_is_decode_error() {
        let (base, _server) = serve_once("200 OK", "{not json").await;
        let err = adapter(base).generate_mailbox().await.unwrap_err();
        assert!(matches!(err, MailError::Decode(_)));
    }

    #[tokio::test]
    async fn detail_with_string_result_is_malformed() {
        let (base, _server) = serve_once("200 OK", r#"{"result":"nope"}"#).await;
        let err = adapter(base).fetch_message_detail("m1").await.unwrap_err();
        assert!(matches!(err, MailError::MalformedDetail(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = adapter(format!("http://{addr}"))
            .fetch_message_detail("m1")
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Network(_)));
    }
}
