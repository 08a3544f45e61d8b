use crate::config::Settings;
use crate::inference::HttpInferenceClient;
use crate::secrets::SecretStore;
use crate::shared::HttpClient;
use std::sync::Arc;

pub mod diagnosis;
pub mod invoke;
pub mod prompt;
pub mod troubleshoot;

pub use diagnosis::{
    DiagnosisError, DiagnosisHandler, DiagnosisRequest, DiagnosisResponse, DiagnosisResult,
    DEFAULT_BRANCH,
};
pub use invoke::{DiagnosisInvoker, HttpInvoker, LocalInvoker};
pub use prompt::{build_prompt, escalation_instructions};
pub use troubleshoot::{
    AgentEvent, AgentParameter, AgentResponse, TroubleshootError, TroubleshootHandler,
};

pub fn diagnosis_handler(settings: &Settings, secrets: Arc<dyn SecretStore>) -> DiagnosisHandler {
    DiagnosisHandler::new(settings.clone(), secrets)
}

/// Wires stage two to stage one: over HTTP when a diagnosis function URL is
/// configured, in-process otherwise.
pub fn troubleshoot_handler(settings: &Settings, secrets: Arc<dyn SecretStore>) -> TroubleshootHandler {
    let http = HttpClient::with_timeout_secs(settings.http_timeout_secs);
    let invoker: Box<dyn DiagnosisInvoker> = match &settings.invocation.diagnosis_function_url {
        Some(url) => Box::new(HttpInvoker::new(http.clone(), url.clone())),
        None => Box::new(LocalInvoker::new(diagnosis_handler(settings, Arc::clone(&secrets)))),
    };
    let inference = HttpInferenceClient::new(http, settings.inference.clone(), secrets);
    TroubleshootHandler::new(
        invoker,
        Box::new(inference),
        settings.inference.escalations.clone(),
    )
}
