pub mod api;
pub mod diagnose;
pub mod locator;
pub mod log_extract;
pub mod reference;

pub use api::{Phase, RunRecord, RunStatus, TerraformApiClient};
pub use diagnose::{ErrorReport, RunDiagnoser, NO_ERRORS_FOUND, NO_RUNS_FOUND};
pub use locator::{RunLocator, RunLookup};
pub use log_extract::{extract_error_with_context, DEFAULT_CONTEXT_LINES};
pub use reference::{MalformedReferenceError, WorkspaceReference};
