// Authenticated call pipeline: credential attachment, dispatch, and
// session-expiry recovery for every backend request.
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::alert::{AlertGate, AlertKind};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::router::{login_redirect, Navigator};
use crate::session::TokenStore;

/// Versioned prefix every endpoint lives under.
pub const API_PREFIX: &str = "/api/v1";

/// Header the tunnel fronting the backend expects on API traffic.
const HEADER_SKIP_ANTIPHISHING: &str = "X-Tunnel-Skip-AntiPhishing-Page";

/// Request body accepted by [`ApiClient::call`].
#[derive(Default)]
pub enum CallBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
    Raw {
        content_type: String,
        data: Vec<u8>,
    },
}

/// Per-call options: extra headers, query pairs, and the body.
#[derive(Default)]
pub struct CallOptions {
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: CallBody,
}

impl CallOptions {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            body: CallBody::Json(value),
            ..Self::default()
        }
    }

    pub fn multipart(form: reqwest::multipart::Form) -> Self {
        Self {
            body: CallBody::Multipart(form),
            ..Self::default()
        }
    }
}

/// Standard response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
}

/// HTTP client for the backend API.
///
/// Owns the outbound pipeline: path normalization, bearer attachment,
/// dispatch, and auth-failure recovery. Constructed by the application root
/// with explicit collaborators so tests can build isolated instances.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<TokenStore>,
    gate: Arc<AlertGate>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        session: Arc<TokenStore>,
        gate: Arc<AlertGate>,
        navigator: Arc<dyn Navigator>,
    ) -> anyhow::Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(HEADER_SKIP_ANTIPHISHING, HeaderValue::from_static("true"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|err| anyhow::anyhow!("failed to build HTTP client: {err}"))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            gate,
            navigator,
        })
    }

    /// The token store this client reads its credential from.
    pub fn session(&self) -> &Arc<TokenStore> {
        &self.session
    }

    /// Perform one request against the backend.
    ///
    /// On 401 the credential is cleared, the session-expired alert shown
    /// (coalesced across concurrent failures), and the navigator pointed at
    /// the login route with the current path as the redirect target. On 403
    /// the user is notified but the credential and route are left alone.
    /// Other non-2xx statuses surface as [`ClientError::Http`]; 2xx hands
    /// the response back for body decoding.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        options: CallOptions,
    ) -> Result<reqwest::Response, ClientError> {
        let path = normalize_path(path);
        let mut request = self.http.request(method, format!("{}{}", self.base_url, path));

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }

        let mut headers = options.headers;
        let token = self.session.get();
        if token.is_none() {
            // A caller-supplied option object may still carry a credential
            // from an earlier call; it must not leak into this one.
            headers.remove(AUTHORIZATION);
        }
        request = request.headers(headers);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request = match options.body {
            CallBody::Empty => request,
            CallBody::Json(value) => request.json(&value),
            CallBody::Multipart(form) => request.multipart(form),
            CallBody::Raw { content_type, data } => {
                request.header(CONTENT_TYPE, content_type).body(data)
            }
        };

        let response = request.send().await.map_err(ClientError::Transport)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(%path, "session expired, clearing credential");
            self.session.clear();
            let redirect = self.navigator.current_path();
            self.gate.show_once(AlertKind::SessionExpired).await;
            self.navigator.go(login_redirect(&redirect));
            return Err(ClientError::AuthExpired);
        }

        if status == StatusCode::FORBIDDEN {
            tracing::info!(%path, "request forbidden for current credential");
            self.gate.show_once(AlertKind::InsufficientPrivileges).await;
            return Err(ClientError::AuthForbidden);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::http(status.as_u16(), body));
        }

        Ok(response)
    }

    /// GET a JSON resource, unwrapping the response envelope.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.call(Method::GET, path, CallOptions::default()).await?;
        Self::decode_data(response).await
    }

    /// GET with query parameters.
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ClientError> {
        let options = CallOptions {
            query,
            ..CallOptions::default()
        };
        let response = self.call(Method::GET, path, options).await?;
        Self::decode_data(response).await
    }

    /// POST a JSON payload, unwrapping the response envelope.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(ClientError::Encode)?;
        let response = self.call(Method::POST, path, CallOptions::json(body)).await?;
        Self::decode_data(response).await
    }

    /// PUT a JSON payload, unwrapping the response envelope.
    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(ClientError::Encode)?;
        let response = self.call(Method::PUT, path, CallOptions::json(body)).await?;
        Self::decode_data(response).await
    }

    /// DELETE a resource, ignoring the response body.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.call(Method::DELETE, path, CallOptions::default())
            .await?;
        Ok(())
    }

    /// POST a multipart form (file uploads), unwrapping the envelope.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ClientError> {
        let response = self
            .call(Method::POST, path, CallOptions::multipart(form))
            .await?;
        Self::decode_data(response).await
    }

    /// GET a binary body (file downloads) as raw bytes.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.call(Method::GET, path, CallOptions::default()).await?;
        let bytes = response.bytes().await.map_err(ClientError::Transport)?;
        Ok(bytes.to_vec())
    }

    async fn decode_data<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let bytes = response.bytes().await.map_err(ClientError::Transport)?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            // The backend pairs failure envelopes with non-2xx statuses, but
            // an error envelope behind a 2xx must not read as decodable data.
            let detail = envelope
                .error
                .or(envelope.message)
                .unwrap_or_else(|| "backend reported failure".to_string());
            return Err(ClientError::Decode(serde::de::Error::custom(detail)));
        }
        envelope.data.ok_or_else(|| {
            let detail = envelope
                .message
                .unwrap_or_else(|| "response envelope carried no data".to_string());
            ClientError::Decode(serde::de::Error::custom(detail))
        })
    }
}

/// Root `path` under the versioned API prefix exactly once.
///
/// Callers may pass `/users/`, `users/`, `/api/users/` or `/api/v1/users/`;
/// all normalize to `/api/v1/users/`.
pub fn normalize_path(path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    if path == "/api" || path.starts_with("/api/") || path.starts_with("/api?") {
        if path == API_PREFIX
            || path.starts_with("/api/v1/")
            || path.starts_with("/api/v1?")
        {
            path
        } else {
            format!("{}{}", API_PREFIX, &path["/api".len()..])
        }
    } else {
        format!("{API_PREFIX}{path}")
    }
}
