// AI Detector API Client
// Typed HTTP client for the detection service

use crate::models::{
    AnalysisDetail, AnalysisListItem, AnalyzeResponse, AuthResponse, HealthResponse,
    ProblemDetails, StatsResponse, UserProfile,
};
use crate::services::session::SessionStore;
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::env;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const BASE_URL_ENV: &str = "AIDETECTOR_API_BASE_URL";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const PROBLEM_JSON: &str = "application/problem+json";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Network or transport failure, including decode failures on a
    /// successful response body. Not classified further.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server rejected the bearer token (HTTP 401). The session has
    /// already been invalidated when this is returned.
    #[error("session expired")]
    SessionExpired,
    /// Any other non-2xx response. `detail` carries the server's
    /// problem-details explanation when one was present, else the status
    /// reason phrase.
    #[error("{detail}")]
    Http { status: u16, detail: String },
    /// A typed endpoint negotiated an empty body where JSON was expected.
    #[error("empty response body: {path}")]
    EmptyBody { path: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            ApiError::SessionExpired => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            ApiError::EmptyBody { .. } => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Http { detail, .. } => Some(detail.as_str()),
            _ => None,
        }
    }
}

// ============ Configuration ============

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Any trailing slash on the base URL is stripped so paths concatenate
    /// cleanly.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read the base URL from `AIDETECTOR_API_BASE_URL`, falling back to the
    /// local development endpoint.
    pub fn from_env() -> Self {
        let base_url = env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============ Client ============

type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// A downloaded export payload with the server-suggested filename.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionStore,
    on_session_expired: Option<SessionExpiredHook>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: SessionStore) -> Self {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.base_url,
            session,
            on_session_expired: None,
        }
    }

    /// Register the boundary-layer reaction to session expiry (for the
    /// dashboard this is the redirect to the login page). The hook fires at
    /// most once per invalidation even when concurrent requests all hit 401;
    /// the session latch re-arms on the next `set_token`.
    pub fn with_session_expired_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ============ Generic executor ============

    /// Issue a request and negotiate the response body.
    ///
    /// A JSON body defaults the content type to `application/json`; explicit
    /// `headers` are applied afterwards and win. Returns `Ok(None)` for 204
    /// or a successful response whose content type is not JSON. Non-2xx
    /// responses surface exactly one [`ApiError`]; a 401 additionally
    /// invalidates the session before returning.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
        auth: bool,
    ) -> Result<Option<T>, ApiError> {
        let response = self.execute(method, path, body, headers, auth).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !content_type_contains(&response, "application/json") {
            return Ok(None);
        }
        Ok(Some(response.json::<T>().await?))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
        auth: bool,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, path = path, "api request");

        let mut request = self.http.request(method, &url);
        if auth {
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(self.classify_error(response).await);
        }
        Ok(response)
    }

    /// Convert a non-success response into the one error the caller sees.
    /// The 401 branch never reads the body.
    async fn classify_error(&self, response: Response) -> ApiError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            if self.session.invalidate() {
                if let Some(hook) = &self.on_session_expired {
                    hook();
                }
            }
            return ApiError::SessionExpired;
        }

        let detail = parse_problem(response)
            .await
            .and_then(|p| p.detail)
            .unwrap_or_else(|| status_reason(status));
        ApiError::Http {
            status: status.as_u16(),
            detail,
        }
    }

    // ============ Auth ============

    /// Authenticate and store the returned token in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self
            .request_json(
                Method::POST,
                "/auth/login",
                Some(json!({ "email": email, "password": password })),
                None,
                false,
            )
            .await?
            .ok_or_else(|| empty_body("/auth/login"))?;
        self.session.set_token(&auth.access_token);
        Ok(auth)
    }

    /// Create an account and store the returned token in the session.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self
            .request_json(
                Method::POST,
                "/auth/register",
                Some(json!({ "email": email, "password": password })),
                None,
                false,
            )
            .await?
            .ok_or_else(|| empty_body("/auth/register"))?;
        self.session.set_token(&auth.access_token);
        Ok(auth)
    }

    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.request_json(Method::GET, "/auth/me", None, None, true)
            .await?
            .ok_or_else(|| empty_body("/auth/me"))
    }

    // ============ Analysis ============

    pub async fn analyze(&self, text: &str) -> Result<AnalyzeResponse, ApiError> {
        self.request_json(Method::POST, "/analyze", Some(json!({ "text": text })), None, true)
            .await?
            .ok_or_else(|| empty_body("/analyze"))
    }

    pub async fn list_analyses(&self, limit: usize) -> Result<Vec<AnalysisListItem>, ApiError> {
        let path = format!("/analyses?limit={}", limit);
        self.request_json(Method::GET, &path, None, None, true)
            .await?
            .ok_or_else(|| empty_body(&path))
    }

    pub async fn analysis(&self, id: i64) -> Result<AnalysisDetail, ApiError> {
        let path = format!("/analyses/{}", id);
        self.request_json(Method::GET, &path, None, None, true)
            .await?
            .ok_or_else(|| empty_body(&path))
    }

    pub async fn stats(&self) -> Result<StatsResponse, ApiError> {
        self.request_json(Method::GET, "/stats", None, None, true)
            .await?
            .ok_or_else(|| empty_body("/stats"))
    }

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.request_json(Method::GET, "/health", None, None, false)
            .await?
            .ok_or_else(|| empty_body("/health"))
    }

    // ============ Exports ============

    pub async fn export_csv(&self) -> Result<Download, ApiError> {
        self.download("/export/csv", "analyses.csv").await
    }

    pub async fn export_pdf(&self) -> Result<Download, ApiError> {
        self.download("/export/pdf", "analyses.pdf").await
    }

    /// Fetch a binary payload, deriving the filename from the response's
    /// content-disposition header (RFC 5987 `filename*` first, then plain
    /// `filename=`, then the caller-supplied fallback).
    pub async fn download(&self, path: &str, fallback_name: &str) -> Result<Download, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path = path, "download request");

        let mut request = self.http.get(&url);
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(self.classify_error(response).await);
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(|v| extract_filename(v, fallback_name))
            .unwrap_or_else(|| fallback_name.to_string());
        let bytes = response.bytes().await?.to_vec();

        debug!(filename = %filename, size = bytes.len(), "download complete");
        Ok(Download { filename, bytes })
    }
}

// ============ Response helpers ============

fn empty_body(path: &str) -> ApiError {
    ApiError::EmptyBody {
        path: path.to_string(),
    }
}

fn status_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(|r| r.to_string())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn content_type_contains(response: &Response, needle: &str) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains(needle))
        .unwrap_or(false)
}

/// Parse a problem-details body, but only when the response declares itself
/// as one. A body that fails to parse degrades to `None` rather than
/// surfacing a second error.
async fn parse_problem(response: Response) -> Option<ProblemDetails> {
    if !content_type_contains(&response, PROBLEM_JSON) {
        return None;
    }
    match response.json::<ProblemDetails>().await {
        Ok(problem) => Some(problem),
        Err(err) => {
            warn!(error = %err, "failed to parse problem+json body");
            None
        }
    }
}

// ============ Content-disposition filename ============

fn filename_ext_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)filename\*=UTF-8''([^;]+)").expect("filename* regex"))
}

fn filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)filename\s*=\s*"?([^";]+)"?"#).expect("filename regex"))
}

fn extract_filename(content_disposition: &str, fallback: &str) -> String {
    if let Some(caps) = filename_ext_re().captures(content_disposition) {
        return percent_decode(caps[1].trim());
    }
    if let Some(caps) = filename_re().captures(content_disposition) {
        return percent_decode(caps[1].trim());
    }
    fallback.to_string()
}

/// Decode %XX escapes. Malformed escapes are kept literally, and a result
/// that is not valid UTF-8 falls back to the raw input.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(decoded) = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok())
            {
                out.push(decoded);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_string())
}
