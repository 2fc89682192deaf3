//! HTTP transport backed by reqwest

use async_trait::async_trait;
use tracing::{debug, warn};

use super::logging::{log_exchange, ExchangeLog};
use super::{Transport, TurnRequest};
use crate::config::EndpointConfig;
use crate::error::TransportError;

/// POSTs each turn as JSON to a fixed endpoint
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: url::Url,
    api_key: Option<String>,
    api_key_header: String,
    timeout_secs: u64,
}

impl HttpTransport {
    /// Build a transport from endpoint settings
    pub fn new(config: &EndpointConfig) -> Result<Self, TransportError> {
        let endpoint = url::Url::parse(&config.url)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", config.url, e)))?;

        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(TransportError::InvalidEndpoint(
                "Only HTTP and HTTPS endpoints are supported".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("Agentline/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.get_api_key(),
            api_key_header: config.api_key_header.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Endpoint host, for display
    pub fn host(&self) -> &str {
        self.endpoint.host_str().unwrap_or("?")
    }

    fn map_send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout_secs)
        } else {
            TransportError::Network(e.to_string())
        }
    }

    async fn post(&self, request: &TurnRequest) -> Result<(u16, serde_json::Value), TransportError> {
        let mut builder = self.client.post(self.endpoint.clone()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header(self.api_key_header.as_str(), key);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let value = serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok((status.as_u16(), value))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_turn(&self, request: &TurnRequest) -> Result<serde_json::Value, TransportError> {
        if request.message.trim().is_empty() {
            return Err(TransportError::EmptyMessage);
        }

        debug!(
            agent_id = %request.agent_id,
            session_id = %request.session_id,
            "Sending turn to {}",
            self.endpoint
        );

        match self.post(request).await {
            Ok((status, body)) => {
                log_exchange(ExchangeLog {
                    endpoint: self.endpoint.as_str(),
                    request,
                    status: Some(status),
                    body: Some(&body),
                    error: None,
                });
                Ok(body)
            }
            Err(e) => {
                warn!(agent_id = %request.agent_id, "Turn failed: {}", e);
                let error = e.to_string();
                log_exchange(ExchangeLog {
                    endpoint: self.endpoint.as_str(),
                    request,
                    status: match &e {
                        TransportError::Status { status, .. } => Some(*status),
                        _ => None,
                    },
                    body: None,
                    error: Some(&error),
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, answer with a canned response, and hand back
    /// the raw request text
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/chat", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).into_owned()
        });

        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn keyed_config(url: String) -> EndpointConfig {
        EndpointConfig {
            url,
            api_key: Some("secret-key".to_string()),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    fn hello() -> TurnRequest {
        TurnRequest::new("user_1", "agent", "agent-1", "hello")
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let config = EndpointConfig {
            url: "ftp://agents.example.com/chat".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_endpoint() {
        let config = EndpointConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(HttpTransport::new(&config).is_err());
    }

    #[test]
    fn test_host_from_endpoint() {
        let transport = HttpTransport::new(&EndpointConfig::default()).unwrap();
        assert_eq!(transport.host(), "agents.example.com");
    }

    #[tokio::test]
    async fn test_blank_message_never_hits_network() {
        let config = EndpointConfig {
            url: "http://127.0.0.1:9/unreachable".to_string(),
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let request = TurnRequest::new("user_1", "agent", "agent-1", "   ");
        assert!(matches!(
            transport.send_turn(&request).await,
            Err(TransportError::EmptyMessage)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let config = EndpointConfig {
            url: "http://127.0.0.1:9/unreachable".to_string(),
            timeout_secs: 5,
            ..Default::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let request = TurnRequest::new("user_1", "agent", "agent-1", "hello");
        assert!(transport.send_turn(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_success_returns_body_and_sends_key() {
        let (url, server) = serve_once("200 OK", r#"{"response": "{\"response\": \"Hi\"}"}"#).await;
        let transport = HttpTransport::new(&keyed_config(url)).unwrap();

        let body = transport.send_turn(&hello()).await.unwrap();
        assert!(body["response"].is_string());

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /chat"));
        assert!(request.contains("x-api-key: secret-key"));
        assert!(request.contains("\"message\":\"hello\""));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, server) = serve_once("500 Internal Server Error", "{}").await;
        let transport = HttpTransport::new(&keyed_config(url)).unwrap();

        let result = transport.send_turn(&hello()).await;
        assert!(matches!(
            result,
            Err(TransportError::Status { status: 500, .. })
        ));
        assert!(server.await.unwrap().to_lowercase().contains("x-api-key: secret-key"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_a_decode_error() {
        let (url, server) = serve_once("200 OK", "not json").await;
        let transport = HttpTransport::new(&keyed_config(url)).unwrap();

        let result = transport.send_turn(&hello()).await;
        assert!(matches!(result, Err(TransportError::Decode(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_key_header() {
        let (url, server) = serve_once("200 OK", "{}").await;
        let config = EndpointConfig {
            api_key_header: "authorization-token".to_string(),
            ..keyed_config(url)
        };
        let transport = HttpTransport::new(&config).unwrap();

        transport.send_turn(&hello()).await.unwrap();
        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("authorization-token: secret-key"));
        assert!(!request.contains("x-api-key"));
    }
}
