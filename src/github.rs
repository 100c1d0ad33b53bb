//! GitHub API helpers for reading pull request metadata and changed files.

use anyhow::{Context as _, Result};
use serde::Deserialize;
use tracing::debug;

use crate::error::ReporterError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: u32 = 100;

/// Authenticated access to one repository.
pub struct Context {
    token: String,
    api_url: String,
    /// Repository full name, `owner/repo`.
    pub repo: String,
}

impl Context {
    pub fn new(token: &str, repo: &str, api_url: &str) -> Self {
        Self {
            token: token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
        }
    }

    /// Fetch head/base metadata for a pull request.
    pub fn fetch_pull_request(&self, number: u64) -> Result<PullRequest> {
        let url = format!("{}/repos/{}/pulls/{}", self.api_url, self.repo, number);
        debug!(%url, "fetching pull request");
        let resp = self.get(&url).context("Failed to fetch pull request from GitHub")?;
        resp.into_json()
            .context("Failed to parse pull request JSON")
    }

    /// List every file path touched by a pull request, following pagination.
    pub fn fetch_changed_files(&self, number: u64) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{}/repos/{}/pulls/{}/files?per_page={}&page={}",
                self.api_url, self.repo, number, PAGE_SIZE, page
            );
            let resp = self
                .get(&url)
                .context("Failed to list pull request files")?;
            let batch: Vec<PullFile> = resp
                .into_json()
                .context("Failed to parse pull request files JSON")?;
            let count = batch.len();
            files.extend(batch.into_iter().map(|f| f.filename));
            if count < PAGE_SIZE as usize {
                break;
            }
            page += 1;
        }
        debug!(count = files.len(), pr = number, "fetched changed files");
        Ok(files)
    }

    fn get(&self, url: &str) -> Result<ureq::Response> {
        let resp = ureq::get(url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "lcov-reporter")
            .set("X-GitHub-Api-Version", API_VERSION)
            .call();
        match resp {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(ReporterError::GitHub(format!("HTTP {code} from {url}: {body}")).into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// The parts of a pull request the report needs.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub head: GitRef,
    pub base: GitRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Deserialize)]
struct PullFile {
    filename: String,
}

/// Extract PR number from a ref like "refs/pull/42/merge".
pub fn pr_number_from_ref(github_ref: &str) -> Option<u64> {
    let parts: Vec<&str> = github_ref.split('/').collect();
    if parts.len() >= 3 && parts[0] == "refs" && parts[1] == "pull" {
        parts[2].parse().ok()
    } else {
        None
    }
}
