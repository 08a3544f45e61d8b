use super::diagnosis::{DiagnosisHandler, DiagnosisRequest, DiagnosisResponse};
use crate::shared::{HttpClient, RemoteFetchError};

/// Synchronous request/response call into stage one.
pub trait DiagnosisInvoker: Send + Sync {
    fn invoke(&self, request: &DiagnosisRequest) -> Result<DiagnosisResponse, RemoteFetchError>;
}

/// Both stages deployed in one process.
pub struct LocalInvoker {
    handler: DiagnosisHandler,
}

impl LocalInvoker {
    pub fn new(handler: DiagnosisHandler) -> Self {
        Self { handler }
    }
}

impl DiagnosisInvoker for LocalInvoker {
    fn invoke(&self, request: &DiagnosisRequest) -> Result<DiagnosisResponse, RemoteFetchError> {
        Ok(self.handler.handle(request))
    }
}

/// Stage one deployed behind its own function URL; blocks until it answers.
#[derive(Debug, Clone)]
pub struct HttpInvoker {
    http: HttpClient,
    url: String,
}

impl HttpInvoker {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

impl DiagnosisInvoker for HttpInvoker {
    fn invoke(&self, request: &DiagnosisRequest) -> Result<DiagnosisResponse, RemoteFetchError> {
        let payload = serde_json::to_value(request).map_err(|e| RemoteFetchError::Decode {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        tracing::info!(url = %self.url, "invoking diagnosis function");
        let response =
            self.http
                .post_json_any_status(&self.url, &[("Accept", "application/json")], &payload)?;
        if response.is_success() {
            return response.json();
        }

        // A gateway may map `statusCode` onto the HTTP status; the body is
        // still the stage-one reply, or its raw `{"error": ...}` payload.
        tracing::warn!(url = %self.url, status = response.status, "diagnosis function failed");
        Ok(response
            .json::<DiagnosisResponse>()
            .unwrap_or_else(|_| DiagnosisResponse {
                status_code: response.status,
                body: response.body.clone(),
            }))
    }
}
