use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::TransportError;
use super::types::{
    ApiStatus, ChatRequest, ChatResponse, HealthStatus, HistoryEntry, ModelList,
    ModelSelectRequest, ModelSelection,
};
use crate::state::HISTORY_WINDOW;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// The two calls a chat session makes. Implemented by [`ApiClient`] and by
/// substitutes in tests.
pub trait ChatBackend: Send + Sync {
    fn send_message(
        &self,
        text: &str,
        history: &[HistoryEntry],
    ) -> impl Future<Output = Result<ChatResponse, TransportError>> + Send;

    fn check_status(&self) -> impl Future<Output = Result<ApiStatus, TransportError>> + Send;
}

/// HTTP client for the backend, rooted at a base URL such as `http://host:5000/api`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        self.get_json("health").await
    }

    pub async fn list_models(&self) -> Result<ModelList, TransportError> {
        self.get_json("models").await
    }

    pub async fn select_model(&self, model: &str) -> Result<ModelSelection, TransportError> {
        let request = ModelSelectRequest {
            model: model.to_string(),
        };
        self.post_json("models/select", &request).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");

        let response = self.client.get(&url).send().await?;
        if let Some(err) = TransportError::from_status(response.status()) {
            return Err(err);
        }
        Ok(response.json().await?)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(%url, "POST");

        let response = self.client.post(&url).json(body).send().await?;
        if let Some(err) = TransportError::from_status(response.status()) {
            return Err(err);
        }
        Ok(response.json().await?)
    }
}

impl ChatBackend for ApiClient {
    async fn send_message(
        &self,
        text: &str,
        history: &[HistoryEntry],
    ) -> Result<ChatResponse, TransportError> {
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        let request = ChatRequest {
            message: text.to_string(),
            history: history[start..].to_vec(),
        };
        debug!(history = request.history.len(), "sending chat message");
        self.post_json("chat", &request).await
    }

    async fn check_status(&self) -> Result<ApiStatus, TransportError> {
        self.get_json("status").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Role;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accept one connection, capture the raw request, and answer with `response`.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });
        (format!("http://{}/api", addr), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn request_body(raw: &str) -> serde_json::Value {
        let body = raw.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or_default();
        serde_json::from_str(body).unwrap()
    }

    fn history(n: usize) -> Vec<HistoryEntry> {
        (1..=n)
            .map(|i| HistoryEntry {
                role: if i % 2 == 1 { Role::User } else { Role::Assistant },
                content: format!("message {}", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_send_message_posts_capped_history() {
        let (base, server) =
            serve_once(http_response("200 OK", r#"{"response": "hello there"}"#)).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let reply = client.send_message("twelfth", &history(11)).await.unwrap();
        assert_eq!(reply.response, "hello there");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/chat "));
        let body = request_body(&raw);
        assert_eq!(body["message"], "twelfth");
        let sent = body["history"].as_array().unwrap();
        assert_eq!(sent.len(), 10);
        assert_eq!(sent[0]["content"], "message 2");
        assert_eq!(sent[0]["role"], "assistant");
        assert_eq!(sent[9]["content"], "message 11");
        assert_eq!(sent[9]["role"], "user");
    }

    #[tokio::test]
    async fn test_server_error_is_classified() {
        let (base, _server) = serve_once(http_response(
            "500 Internal Server Error",
            r#"{"error": "Internal server error"}"#,
        ))
        .await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client.send_message("hi", &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::Server(_)));
    }

    #[tokio::test]
    async fn test_not_found_is_classified() {
        let (base, _server) =
            serve_once(http_response("404 Not Found", r#"{"error": "Endpoint not found"}"#)).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client.check_status().await.unwrap_err();
        assert!(matches!(err, TransportError::NotFound));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _request = read_request(&mut socket).await;
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client =
            ApiClient::new(&format!("http://{}/api", addr), Duration::from_millis(200)).unwrap();
        assert_eq!(client.timeout(), Duration::from_millis(200));
        let err = client.send_message("hi", &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
    }

    // Linger of zero makes the close send RST instead of FIN
    #[allow(deprecated)]
    #[tokio::test]
    async fn test_reset_mid_request_is_classified() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _request = read_request(&mut socket).await;
            socket.set_linger(Some(Duration::ZERO)).unwrap();
            drop(socket);
        });

        let client =
            ApiClient::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();
        let err = client.send_message("hi", &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionReset), "got {:?}", err);
        assert_eq!(
            err.user_message(),
            "Connection was reset while Spectra was responding. Please try again 💜"
        );
    }

    #[tokio::test]
    async fn test_refused_connection_is_generic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            ApiClient::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();
        let err = client.check_status().await.unwrap_err();
        assert!(matches!(err, TransportError::Other(_)));
    }

    #[tokio::test]
    async fn test_select_model_round_trip() {
        let (base, server) = serve_once(http_response(
            "200 OK",
            r#"{"status": "success", "selected": "phi:latest", "previous": "mistral",
                "available": ["phi:latest", "mistral"], "message": "Model updated",
                "timestamp": "t"}"#,
        ))
        .await;
        let client = ApiClient::new(&format!("{}/", base), Duration::from_secs(5)).unwrap();

        let selection = client.select_model("phi").await.unwrap();
        assert_eq!(selection.selected, "phi:latest");
        assert_eq!(selection.previous, "mistral");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/models/select "));
        assert_eq!(request_body(&raw)["model"], "phi");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_generic() {
        let (base, _server) = serve_once(http_response("200 OK", "not json")).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client.list_models().await.unwrap_err();
        assert!(matches!(err, TransportError::Other(_)));
    }
}
