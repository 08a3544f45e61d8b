use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed workspace reference `{url}`: {reason}")]
pub struct MalformedReferenceError {
    pub url: String,
    pub reason: String,
}

/// Organization, workspace and optional run named by a workspace or run URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceReference {
    pub organization: String,
    pub workspace: String,
    pub run_id: Option<String>,
}

impl WorkspaceReference {
    /// Accepts the two URL shapes the platform UI produces:
    /// `.../<org>/workspaces/<workspace>` and
    /// `.../<org>/workspaces/<workspace>/runs/<run-id>`.
    /// A bare `.../runs` suffix names the workspace's latest run.
    pub fn parse(url: &str) -> Result<Self, MalformedReferenceError> {
        let malformed = |reason: &str| MalformedReferenceError {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = url.trim();
        let path = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').collect();

        let (organization, workspace, run_id) = match segments.as_slice() {
            [.., org, "workspaces", ws, "runs", run] => (*org, *ws, Some(*run)),
            [.., org, "workspaces", ws, "runs"] => (*org, *ws, None),
            [.., org, "workspaces", ws] => (*org, *ws, None),
            _ => {
                return Err(malformed(
                    "expected `<organization>/workspaces/<workspace>[/runs/<run-id>]`",
                ))
            }
        };

        if organization.is_empty() || organization.ends_with(':') {
            return Err(malformed("organization segment is empty"));
        }
        if workspace.is_empty() {
            return Err(malformed("workspace segment is empty"));
        }
        if run_id.is_some_and(str::is_empty) {
            return Err(malformed("run id segment is empty"));
        }

        Ok(Self {
            organization: organization.to_string(),
            workspace: workspace.to_string(),
            run_id: run_id.map(str::to_string),
        })
    }
}

impl fmt::Display for WorkspaceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.workspace)?;
        if let Some(run_id) = &self.run_id {
            write!(f, "@{run_id}")?;
        }
        Ok(())
    }
}
