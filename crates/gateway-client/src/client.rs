//! REST client for the gateway HTTP API.
//!
//! One method per endpoint, mirroring the gateway surface: notebook
//! contents (fetch/save), kernelspecs, running kernels, and sessions.
//! Non-2xx responses always surface as [`ClientError::Status`] with the
//! body attached; a fire-and-forget save is deliberately not offered.

use log::{debug, info};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use notebook_doc::Notebook;

use crate::models::{Kernel, KernelSpecs, Session, SessionRequest};

/// Error type for gateway REST operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error talking to gateway: {0}")]
    Network(#[from] reqwest::Error),

    #[error("gateway returned {status} for {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    #[error("malformed gateway response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid gateway URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("cannot derive a websocket URL from base {0}")]
    BadBaseUrl(Url),
}

/// Envelope around a notebook returned by the contents endpoint.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: Notebook,
}

/// Client for a Jupyter-compatible kernel gateway.
///
/// Holds the base URL and a connection-pooling HTTP client; cheap to clone.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Url,
    http: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for the given base URL (e.g. `http://localhost:8888`).
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Parse `base` and create a client for it.
    pub fn from_base(base: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Url::parse(base)?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Load a notebook document: `POST {base}/api/contents?type=notebook&hash=0`.
    pub async fn fetch_notebook(&self, path: &str) -> Result<Notebook, ClientError> {
        let url = self.endpoint("api/contents")?;
        debug!("[gateway] fetching notebook {}", path);
        let response = self
            .http
            .post(url)
            .query(&[("type", "notebook"), ("hash", "0")])
            .json(&serde_json::json!({ "path": path }))
            .send()
            .await?;
        let response = Self::expect_ok(response).await?;
        let contents: ContentsResponse = Self::decode(response).await?;
        info!(
            "[gateway] loaded notebook {} ({} cells)",
            path,
            contents.content.len()
        );
        Ok(contents.content)
    }

    /// Save a notebook document: `PUT {base}/api/contents/{path}`.
    ///
    /// The response status is checked; a failed save is an error, never
    /// fire-and-forget.
    pub async fn save_notebook(&self, path: &str, notebook: &Notebook) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("api/contents/{path}"))?;
        let body = serde_json::json!({
            "content": serde_json::to_string(notebook)?,
            "type": "file",
            "format": "text",
        });
        let response = self.http.put(url).json(&body).send().await?;
        Self::expect_ok(response).await?;
        info!("[gateway] saved notebook {}", path);
        Ok(())
    }

    /// `GET {base}/api/kernelspecs`.
    pub async fn kernel_specs(&self) -> Result<KernelSpecs, ClientError> {
        let url = self.endpoint("api/kernelspecs")?;
        let response = Self::expect_ok(self.http.get(url).send().await?).await?;
        Ok(Self::decode(response).await?)
    }

    /// `GET {base}/api/kernels` - kernels currently running on the gateway.
    pub async fn running_kernels(&self) -> Result<Vec<Kernel>, ClientError> {
        let url = self.endpoint("api/kernels")?;
        let response = Self::expect_ok(self.http.get(url).send().await?).await?;
        Ok(Self::decode(response).await?)
    }

    /// `GET {base}/api/sessions` - sessions currently running on the gateway.
    pub async fn running_sessions(&self) -> Result<Vec<Session>, ClientError> {
        let url = self.endpoint("api/sessions")?;
        let response = Self::expect_ok(self.http.get(url).send().await?).await?;
        Ok(Self::decode(response).await?)
    }

    /// `POST {base}/api/sessions` - create (or reuse, gateway-side) a session.
    pub async fn create_session(&self, request: &SessionRequest) -> Result<Session, ClientError> {
        let url = self.endpoint("api/sessions")?;
        let response = Self::expect_ok(self.http.post(url).json(request).send().await?).await?;
        let session: Session = Self::decode(response).await?;
        info!(
            "[gateway] session {} created on kernel {} ({})",
            session.id, session.kernel.id, session.kernel.name
        );
        Ok(session)
    }

    /// The kernel channel endpoint for a session:
    /// `ws(s)://{host}/api/kernels/{kernel_id}/channels?session_id={session_id}`.
    pub fn channel_url(&self, kernel_id: &str, session_id: &str) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(&format!("api/kernels/{kernel_id}/channels"))?;
        let scheme = match self.base_url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::BadBaseUrl(self.base_url.clone()))?;
        url.set_query(Some(&format!("session_id={session_id}")));
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Decode a response body, surfacing parse failures as [`ClientError::Malformed`].
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status { status, url, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_url_from_http_base() {
        let client = GatewayClient::from_base("http://localhost:8888").unwrap();
        let url = client.channel_url("k-1", "s-1").unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:8888/api/kernels/k-1/channels?session_id=s-1"
        );
    }

    #[test]
    fn test_channel_url_from_https_base() {
        let client = GatewayClient::from_base("https://hub.example.com").unwrap();
        let url = client.channel_url("k-2", "s-2").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://hub.example.com/api/kernels/k-2/channels?session_id=s-2"
        );
    }

    #[test]
    fn test_endpoint_join() {
        let client = GatewayClient::from_base("http://localhost:8888").unwrap();
        let url = client.endpoint("api/contents/dir/demo.ipynb").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8888/api/contents/dir/demo.ipynb"
        );
    }

    #[tokio::test]
    async fn test_garbled_gateway_body_surfaces_malformed_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // A gateway that answers 200 OK with a body that is not JSON.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let body = "not json";
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });

        let client = GatewayClient::from_base(&format!("http://{addr}")).unwrap();
        let err = client.running_kernels().await.unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_surfaces_network_error() {
        // Nothing listens on the discard port; the fetch must fail loudly.
        let client = GatewayClient::from_base("http://127.0.0.1:9").unwrap();
        let err = client.running_kernels().await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
