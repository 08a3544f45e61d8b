use super::api::{RunRecord, TerraformApiClient};
use super::reference::WorkspaceReference;
use crate::shared::RemoteFetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunLookup {
    Found(RunRecord),
    NoRuns,
}

/// Finds the run a diagnosis should inspect. Lookup failures are fatal and
/// propagate to the caller unchanged.
#[derive(Debug, Clone, Copy)]
pub struct RunLocator<'a> {
    api: &'a TerraformApiClient,
}

impl<'a> RunLocator<'a> {
    pub fn new(api: &'a TerraformApiClient) -> Self {
        Self { api }
    }

    pub fn locate(&self, reference: &WorkspaceReference) -> Result<RunLookup, RemoteFetchError> {
        if let Some(run_id) = &reference.run_id {
            tracing::info!(run_id = %run_id, "fetching details for specific run");
            return self.api.run(run_id).map(RunLookup::Found);
        }

        tracing::info!(
            organization = %reference.organization,
            workspace = %reference.workspace,
            "fetching workspace details"
        );
        let workspace_id = self
            .api
            .workspace_id(&reference.organization, &reference.workspace)
            .inspect_err(|err| tracing::error!(error = %err, "failed to fetch workspace id"))?;
        tracing::info!(workspace_id = %workspace_id, "retrieved workspace id");

        let runs = self
            .api
            .workspace_runs(&workspace_id)
            .inspect_err(|err| tracing::error!(error = %err, "failed to fetch workspace runs"))?;
        tracing::info!(count = runs.len(), "retrieved runs for the workspace");

        match runs.into_iter().next() {
            Some(run) => Ok(RunLookup::Found(run)),
            None => {
                tracing::warn!("no runs found for the workspace");
                Ok(RunLookup::NoRuns)
            }
        }
    }
}
