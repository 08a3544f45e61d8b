use super::api::{Phase, RunStatus, TerraformApiClient};
use super::locator::{RunLocator, RunLookup};
use super::log_extract::{extract_error_with_context, DEFAULT_CONTEXT_LINES};
use super::reference::WorkspaceReference;
use crate::shared::RemoteFetchError;
use std::fmt;

pub const NO_RUNS_FOUND: &str = "No runs found for the workspace.";
pub const NO_ERRORS_FOUND: &str = "No errors found in the latest run's plan or apply output.";

/// Outcome of diagnosing one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorReport {
    PlanError(String),
    ApplyError(String),
    NoRunsFound,
    NoErrorsFound,
}

impl ErrorReport {
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlanError(lines) => write!(f, "Plan Error:\n{lines}"),
            Self::ApplyError(lines) => write!(f, "Apply Error:\n{lines}"),
            Self::NoRunsFound => f.write_str(NO_RUNS_FOUND),
            Self::NoErrorsFound => f.write_str(NO_ERRORS_FOUND),
        }
    }
}

/// Result of probing one phase. Probing has no error channel: a failed fetch
/// is logged and reported as `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Probe {
    Found(String),
    NotFound,
}

#[derive(Debug, Clone, Copy)]
pub struct RunDiagnoser<'a> {
    api: &'a TerraformApiClient,
    context_lines: usize,
}

impl<'a> RunDiagnoser<'a> {
    pub fn new(api: &'a TerraformApiClient) -> Self {
        Self {
            api,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    /// Only the run lookup can fail; plan and apply probing is best-effort.
    pub fn diagnose(&self, reference: &WorkspaceReference) -> Result<ErrorReport, RemoteFetchError> {
        let run = match RunLocator::new(self.api).locate(reference)? {
            RunLookup::Found(run) => run,
            RunLookup::NoRuns => return Ok(ErrorReport::NoRunsFound),
        };
        tracing::info!(run_id = %run.id, status = %run.status, "checking run");

        if run.status != RunStatus::Errored {
            tracing::warn!("{NO_ERRORS_FOUND}");
            return Ok(ErrorReport::NoErrorsFound);
        }

        if let Some(plan_id) = &run.plan_id {
            if let Probe::Found(lines) = self.probe(Phase::Plan, plan_id) {
                return Ok(ErrorReport::PlanError(lines));
            }
        }
        if let Some(apply_id) = &run.apply_id {
            if let Probe::Found(lines) = self.probe(Phase::Apply, apply_id) {
                return Ok(ErrorReport::ApplyError(lines));
            }
        }

        tracing::warn!("{NO_ERRORS_FOUND}");
        Ok(ErrorReport::NoErrorsFound)
    }

    fn probe(&self, phase: Phase, id: &str) -> Probe {
        match self.phase_error_lines(phase, id) {
            Ok(Some(lines)) => {
                tracing::error!("{} Error Lines:\n{lines}", phase.label());
                Probe::Found(lines)
            }
            Ok(None) => Probe::NotFound,
            Err(err) => {
                tracing::error!(
                    phase = %phase,
                    error = %err,
                    "failed to fetch phase details or logs"
                );
                Probe::NotFound
            }
        }
    }

    fn phase_error_lines(&self, phase: Phase, id: &str) -> Result<Option<String>, RemoteFetchError> {
        tracing::info!(phase = %phase, id = %id, "fetching phase details");
        let Some(log_read_url) = self.api.phase_log_url(phase, id)? else {
            return Ok(None);
        };

        tracing::info!(phase = %phase, "fetching logs from log-read-url");
        let log = self.api.fetch_log(&log_read_url)?;
        let lines = extract_error_with_context(&log, self.context_lines);
        Ok(Some(lines).filter(|lines| !lines.is_empty()))
    }
}
