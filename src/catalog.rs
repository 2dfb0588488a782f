use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::domain::AppError;
use crate::item::{Item, ItemPage};

pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response of {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("invalid username or password")]
    Unauthorized,
    #[error("{url} answered without a token")]
    MissingToken { url: String },
}

#[derive(Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

// Older catalog deployments answer with `token`, current ones with
// `accessToken`, some send both.
#[derive(Debug, Deserialize)]
struct LoginReply {
    token: Option<String>,
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

impl LoginReply {
    fn into_token(self) -> Option<String> {
        self.access_token.or(self.token)
    }
}

/// Remote source of catalog data and credential exchange.
pub trait CatalogSource: Send + Sync + 'static {
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Item>, FetchError>> + Send;

    fn fetch_product(&self, id: u64) -> impl Future<Output = Result<Item, FetchError>> + Send;

    /// Exchange credentials for a bearer token.
    fn login(
        &self,
        credentials: Credentials,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("catalog-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FetchError> {
        let started = tokio::time::Instant::now();
        let response = match tokio::time::timeout(self.timeout, request.send()).await {
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                });
            }
            Ok(Err(e)) if e.is_timeout() => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                });
            }
            Ok(Err(source)) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    source,
                });
            }
            Ok(Ok(response)) => response,
        };
        debug!(
            "{} answered {} in {}ms",
            url,
            response.status(),
            started.elapsed().as_millis()
        );
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        let response = self.send(&url, self.client.get(&url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| FetchError::Decode { url, source })
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Item>, FetchError>> + Send {
        async move {
            let page: ItemPage = self.get_json("/products").await?;
            trace!("Received {} products", page.products.len());
            Ok(page.products)
        }
    }

    fn fetch_product(&self, id: u64) -> impl Future<Output = Result<Item, FetchError>> + Send {
        async move { self.get_json(&format!("/products/{id}")).await }
    }

    fn login(
        &self,
        credentials: Credentials,
    ) -> impl Future<Output = Result<String, FetchError>> + Send {
        async move {
            let url = self.url("/auth/login");
            let request = self.client.post(&url).json(&credentials);
            let response = self.send(&url, request).await?;
            match response.status() {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                    return Err(FetchError::Unauthorized);
                }
                status if !status.is_success() => {
                    return Err(FetchError::Status {
                        url,
                        status: status.as_u16(),
                    });
                }
                _ => {}
            }
            let reply: LoginReply = response
                .json()
                .await
                .map_err(|source| FetchError::Decode {
                    url: url.clone(),
                    source,
                })?;
            reply.into_token().ok_or(FetchError::MissingToken { url })
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one request on a local port with a canned http response.
    async fn serve_once(reply: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Read head and body so closing the socket does not reset it.
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
            }
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    fn http_reply(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[test]
    fn login_reply_accepts_both_token_names() {
        let old: LoginReply = serde_json::from_str(r#"{"id": 1, "token": "abc"}"#).unwrap();
        assert_eq!(old.into_token().as_deref(), Some("abc"));
        let new: LoginReply =
            serde_json::from_str(r#"{"accessToken": "xyz", "refreshToken": "r"}"#).unwrap();
        assert_eq!(new.into_token().as_deref(), Some("xyz"));
        let both: LoginReply =
            serde_json::from_str(r#"{"token": "abc", "accessToken": "xyz"}"#).unwrap();
        assert_eq!(both.into_token().as_deref(), Some("xyz"));
        let none: LoginReply = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(none.into_token(), None);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials {
            username: "emilys".to_string(),
            password: "emilyspass".to_string(),
        };
        let printed = format!("{credentials:?}");
        assert!(printed.contains("emilys"));
        assert!(!printed.contains("emilyspass"));
    }

    #[test]
    fn credentials_serialize_as_login_body() {
        let credentials = Credentials {
            username: "emilys".to_string(),
            password: "pw".to_string(),
        };
        let body = serde_json::to_value(&credentials).unwrap();
        assert_eq!(body, serde_json::json!({"username": "emilys", "password": "pw"}));
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let catalog = HttpCatalog::new("https://dummyjson.com/", Duration::from_secs(1)).unwrap();
        assert_eq!(catalog.url("/products/7"), "https://dummyjson.com/products/7");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let catalog = HttpCatalog::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        match catalog.fetch_products().await {
            Err(FetchError::Transport { url, .. }) => {
                assert_eq!(url, "http://127.0.0.1:9/products")
            }
            Err(FetchError::Timeout { .. }) => {}
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn silent_server_is_a_timeout() {
        // Connections are queued by the kernel but never answered.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let catalog = HttpCatalog::new(&base, Duration::from_millis(300)).unwrap();
        match catalog.fetch_product(7).await {
            Err(FetchError::Timeout { url, timeout }) => {
                assert_eq!(url, format!("{base}/products/7"));
                assert_eq!(timeout, Duration::from_millis(300));
            }
            other => panic!("unexpected result {other:?}"),
        }
        drop(listener);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let base = serve_once(http_reply("503 Service Unavailable", "")).await;
        let catalog = HttpCatalog::new(&base, Duration::from_secs(5)).unwrap();
        match catalog.fetch_products().await {
            Err(FetchError::Status { url, status }) => {
                assert_eq!(url, format!("{base}/products"));
                assert_eq!(status, 503);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn products_are_decoded_from_envelope() {
        let body = r#"{"products": [{"id": 3, "title": "Lipstick", "description": "Red",
            "category": "beauty", "price": 12.5, "discountPercentage": 3.1, "rating": 4.2,
            "stock": 9, "tags": ["beauty"], "brand": "Essence"}], "total": 1, "skip": 0, "limit": 30}"#;
        let base = serve_once(http_reply("200 OK", body)).await;
        let catalog = HttpCatalog::new(&base, Duration::from_secs(5)).unwrap();
        let items = catalog.fetch_products().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 3);
        assert_eq!(items[0].title, "Lipstick");
    }

    #[tokio::test]
    async fn rejected_login_is_unauthorized() {
        let body = r#"{"message": "Invalid credentials"}"#;
        let base = serve_once(http_reply("400 Bad Request", body)).await;
        let catalog = HttpCatalog::new(&base, Duration::from_secs(5)).unwrap();
        let credentials = Credentials {
            username: "emilys".to_string(),
            password: "wrong".to_string(),
        };
        assert!(matches!(
            catalog.login(credentials).await,
            Err(FetchError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn login_reply_with_both_token_names_succeeds() {
        let body = r#"{"id": 1, "token": "old", "accessToken": "new", "refreshToken": "r"}"#;
        let base = serve_once(http_reply("200 OK", body)).await;
        let catalog = HttpCatalog::new(&base, Duration::from_secs(5)).unwrap();
        let credentials = Credentials {
            username: "emilys".to_string(),
            password: "emilyspass".to_string(),
        };
        assert_eq!(catalog.login(credentials).await.unwrap(), "new");
    }
}
