use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum RemoteFetchError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("request to {url} returned unexpected status {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} could not be decoded: {reason}")]
    Decode { url: String, reason: String },
}

impl RemoteFetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RemoteFetchError> {
        serde_json::from_str(&self.body).map_err(|e| RemoteFetchError::Decode {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }

    fn error_for_status(self) -> Result<Self, RemoteFetchError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(RemoteFetchError::Status {
            url: self.url,
            status: self.status,
        })
    }
}

/// Blocking client shared by every remote call in one invocation. Each call
/// gets the same overall timeout and is never retried.
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("tfdoctor/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }

    pub fn with_timeout_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, RemoteFetchError> {
        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        read_response(url, request.call())?.error_for_status()
    }

    pub fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, RemoteFetchError> {
        self.post_json_any_status(url, headers, body)?
            .error_for_status()
    }

    /// Like `post_json`, but hands back non-2xx replies with their body
    /// instead of failing. Only transport failures are errors.
    pub fn post_json_any_status(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, RemoteFetchError> {
        let mut request = self.agent.post(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        read_response(url, request.send_json(body.clone()))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::with_timeout_secs(DEFAULT_TIMEOUT_SECS)
    }
}

/// Bodies are decoded lossily: a stray non-UTF-8 byte in a log or source
/// file becomes U+FFFD instead of failing the whole read.
fn read_response(
    url: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<HttpResponse, RemoteFetchError> {
    let response = match result {
        Ok(response) | Err(ureq::Error::Status(_, response)) => response,
        Err(err) => {
            return Err(RemoteFetchError::Request {
                url: url.to_string(),
                reason: err.to_string(),
            })
        }
    };

    let status = response.status();
    let mut headers = BTreeMap::new();
    for name in response.headers_names() {
        if let Some(value) = response.header(&name) {
            headers.insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| RemoteFetchError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    Ok(HttpResponse {
        url: url.to_string(),
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
