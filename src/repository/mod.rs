use crate::shared::{bearer, HttpClient, HttpResponse, RemoteFetchError};
use serde::Deserialize;
use std::fmt;

pub mod bundle;

pub use bundle::{BundleSection, RepositoryBundle};

pub const CONFIG_EXTENSIONS: [&str; 2] = [".tf", ".tfvars"];
const TREE_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

impl TreeEntry {
    fn is_config_file(&self) -> bool {
        self.kind == "blob" && is_config_path(&self.path)
    }
}

pub fn is_config_path(path: &str) -> bool {
    CONFIG_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Pulls configuration-language files from one branch of a source-control
/// project. Any failed call aborts the whole bundle.
#[derive(Clone)]
pub struct RepositoryFetcher {
    http: HttpClient,
    api_base: String,
    host_prefix: String,
    token: String,
}

impl fmt::Debug for RepositoryFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryFetcher")
            .field("api_base", &self.api_base)
            .field("host_prefix", &self.host_prefix)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl RepositoryFetcher {
    pub fn new(http: HttpClient, api_base: &str, host_prefix: &str, token: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            host_prefix: host_prefix.to_string(),
            token,
        }
    }

    /// Project path relative to the host, e.g. `group/infra` for
    /// `https://gitlab.com/group/infra/`.
    pub fn repository_path(&self, repo_url: &str) -> String {
        let trimmed = repo_url.trim();
        trimmed
            .strip_prefix(self.host_prefix.as_str())
            .unwrap_or(trimmed)
            .trim_end_matches('/')
            .to_string()
    }

    fn project_endpoint(&self, project: &str, rest: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.api_base,
            urlencoding::encode(project),
            rest
        )
    }

    fn get(&self, url: &str) -> Result<HttpResponse, RemoteFetchError> {
        let authorization = bearer(&self.token);
        self.http
            .get(url, &[("Authorization", authorization.as_str())])
    }

    fn list_tree(&self, project: &str, branch: &str) -> Result<Vec<TreeEntry>, RemoteFetchError> {
        let mut entries = Vec::new();
        let mut page: u32 = 1;
        loop {
            let url = self.project_endpoint(
                project,
                &format!(
                    "repository/tree?ref={}&recursive=true&per_page={TREE_PAGE_SIZE}&page={page}",
                    urlencoding::encode(branch)
                ),
            );
            let response = self.get(&url)?;
            let batch: Vec<TreeEntry> = response.json()?;
            tracing::info!(page, count = batch.len(), "listed repository tree page");
            entries.extend(batch);

            let next = response
                .header("x-next-page")
                .and_then(|v| v.trim().parse::<u32>().ok());
            match next {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }
        Ok(entries)
    }

    fn raw_file(&self, project: &str, path: &str, branch: &str) -> Result<String, RemoteFetchError> {
        let url = self.project_endpoint(
            project,
            &format!(
                "repository/files/{}/raw?ref={}",
                urlencoding::encode(path),
                urlencoding::encode(branch)
            ),
        );
        Ok(self.get(&url)?.body)
    }

    pub fn fetch_bundle(&self, repo_url: &str, branch: &str) -> Result<RepositoryBundle, RemoteFetchError> {
        let project = self.repository_path(repo_url);
        tracing::info!(project = %project, branch = %branch, "listing repository tree");

        let mut bundle = RepositoryBundle::new();
        for entry in self.list_tree(&project, branch)? {
            if !entry.is_config_file() {
                continue;
            }
            tracing::info!(path = %entry.path, "fetching repository file");
            let contents = self.raw_file(&project, &entry.path, branch)?;
            bundle.push(entry.path, contents);
        }

        tracing::info!(files = bundle.len(), "fetched repository files content");
        Ok(bundle)
    }
}
