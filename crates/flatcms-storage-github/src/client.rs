//! GitHub REST API client.
//!
//! Sync HTTP client for the handful of GitHub endpoints the backend
//! needs: repository contents, git references, and pull requests.

use std::time::Duration;

use serde_json::json;
use tracing::debug;
use ureq::Agent;

use crate::error::ApiError;
use crate::types::{ContentFile, GitRef, PullRequest};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Default API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub REST API client scoped to one repository.
pub struct GithubClient {
    agent: Agent,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
}

impl GithubClient {
    /// Create a client for the given repository.
    #[must_use]
    pub fn new(token: &str, owner: &str, repo: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            api_base: DEFAULT_API_BASE.to_owned(),
            token: token.to_owned(),
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        }
    }

    /// Point the client at a different API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_owned();
        self
    }

    /// Whether a (possibly invalid) token is configured at all.
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    fn repo_url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}/{tail}", self.api_base, self.owner, self.repo)
    }

    fn read_ok(
        response: ureq::http::Response<ureq::Body>,
    ) -> Result<ureq::Body, ApiError> {
        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_string());
            return Err(ApiError::Response {
                status,
                body: error_body,
            });
        }

        Ok(body)
    }

    fn get_json(&self, url: &str) -> Result<ureq::Body, ApiError> {
        let response = self
            .agent
            .get(url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "flatcms")
            .call()?;
        Self::read_ok(response)
    }

    /// Get the contents of a path: a JSON array for a directory, an object
    /// for a file.
    pub fn get_contents(
        &self,
        path: &str,
        reference: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}?ref={reference}", self.repo_url(&format!("contents/{path}")));
        debug!("Getting contents of {path} at {reference}");
        Ok(self.get_json(&url)?.read_json()?)
    }

    /// Get a single file with its content and current hash.
    pub fn get_content_file(
        &self,
        path: &str,
        reference: &str,
    ) -> Result<ContentFile, ApiError> {
        let url = format!("{}?ref={reference}", self.repo_url(&format!("contents/{path}")));
        debug!("Getting file {path} at {reference}");
        Ok(self.get_json(&url)?.read_json()?)
    }

    /// Create or update a file on a branch.
    ///
    /// `sha` must be the file's current hash when updating; omit it for a
    /// new file. A stale hash is rejected by the remote.
    pub fn put_content(
        &self,
        path: &str,
        message: &str,
        content_base64: &str,
        branch: &str,
        sha: Option<&str>,
    ) -> Result<(), ApiError> {
        let url = self.repo_url(&format!("contents/{path}"));

        let mut payload = json!({
            "message": message,
            "content": content_base64,
            "branch": branch,
        });
        if let Some(sha) = sha {
            payload["sha"] = json!(sha);
        }

        debug!("Committing {path} to {branch}");

        let payload_bytes = serde_json::to_vec(&payload)?;
        let response = self
            .agent
            .put(&url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "flatcms")
            .send(&payload_bytes[..])?;
        Self::read_ok(response)?;
        Ok(())
    }

    /// Delete a file on a branch, keyed to its current hash.
    pub fn delete_content(
        &self,
        path: &str,
        message: &str,
        sha: &str,
        branch: &str,
    ) -> Result<(), ApiError> {
        let url = self.repo_url(&format!("contents/{path}"));

        let payload = json!({
            "message": message,
            "sha": sha,
            "branch": branch,
        });

        debug!("Deleting {path} on {branch}");

        let payload_bytes = serde_json::to_vec(&payload)?;
        let response = self
            .agent
            .delete(&url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "flatcms")
            .force_send_body()
            .send(&payload_bytes[..])?;
        Self::read_ok(response)?;
        Ok(())
    }

    /// Get the head commit of a branch.
    pub fn get_branch_ref(&self, branch: &str) -> Result<GitRef, ApiError> {
        let url = self.repo_url(&format!("git/ref/heads/{branch}"));
        debug!("Getting ref for branch {branch}");
        Ok(self.get_json(&url)?.read_json()?)
    }

    /// Create a new branch pointing at the given commit.
    pub fn create_branch_ref(&self, branch: &str, sha: &str) -> Result<(), ApiError> {
        let url = self.repo_url("git/refs");

        let payload = json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": sha,
        });

        debug!("Creating branch {branch} at {sha}");

        let payload_bytes = serde_json::to_vec(&payload)?;
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "flatcms")
            .send(&payload_bytes[..])?;
        Self::read_ok(response)?;
        Ok(())
    }

    /// Open a pull request from `head` into `base`.
    pub fn create_pull(
        &self,
        title: &str,
        head: &str,
        base: &str,
        body: &str,
    ) -> Result<PullRequest, ApiError> {
        let url = self.repo_url("pulls");

        let payload = json!({
            "title": title,
            "head": head,
            "base": base,
            "body": body,
        });

        debug!("Opening pull request {head} -> {base}");

        let payload_bytes = serde_json::to_vec(&payload)?;
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "flatcms")
            .send(&payload_bytes[..])?;
        Ok(Self::read_ok(response)?.read_json()?)
    }
}
