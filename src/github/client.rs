//! Blocking GitHub REST client scoped to a single repository.

use super::pagination::{drain_pages, next_link, Page};
use super::{GithubClient, NewRelease, RepoId};
use crate::domain::PullRequest;
use crate::error::{ReleaseError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Public GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: u32 = 100;

/// Waits longer than this are capped; the request is retried afterwards.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(15 * 60);

/// Secondary rate limits without `retry-after` ask for at least a minute.
const SECONDARY_LIMIT_WAIT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiPull {
    number: u64,
    merged_at: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiComparison {
    #[serde(default)]
    commits: Vec<ApiCommit>,
}

#[derive(Debug, Deserialize)]
struct ApiNotes {
    body: String,
}

/// GitHub REST client using bearer-token authentication.
pub struct RestClient {
    http: Client,
    api_url: String,
    token: Option<String>,
    repo: Option<RepoId>,
    max_rate_limit_waits: u32,
    max_wait: Duration,
}

impl RestClient {
    /// Create a client for `repo` against `api_url` (GitHub.com or an Enterprise
    /// `https://host/api/v3` base).
    ///
    /// Without a repository every API call fails with a configuration error, so
    /// runs that never reach the API (first releases) need no `owner/name`.
    pub fn new(
        api_url: impl Into<String>,
        token: Option<String>,
        user_agent: &str,
        repo: impl Into<Option<RepoId>>,
    ) -> Result<Self> {
        let http = Client::builder().user_agent(user_agent.to_string()).build()?;
        Ok(RestClient {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            repo: repo.into(),
            max_rate_limit_waits: 10,
            max_wait: DEFAULT_MAX_WAIT,
        })
    }

    /// Bound how often and how long the client waits out rate limits
    pub fn with_rate_limit_policy(mut self, max_waits: u32, max_wait: Duration) -> Self {
        self.max_rate_limit_waits = max_waits;
        self.max_wait = max_wait;
        self
    }

    fn repo_url(&self, path: &str) -> Result<String> {
        let repo = self.repo.as_ref().ok_or_else(|| {
            ReleaseError::config("repo must be set as owner/name to query GitHub")
        })?;
        Ok(format!(
            "{}/repos/{}/{}/{}",
            self.api_url, repo.owner, repo.name, path
        ))
    }

    /// Send a request, sleeping through rate limits, and fail on any other
    /// non-success status.
    fn send(&self, method: Method, url: &str, body: Option<&serde_json::Value>) -> Result<Response> {
        let mut waits = 0;
        loop {
            let mut request = self
                .http
                .request(method.clone(), url)
                .header(ACCEPT, "application/vnd.github+json")
                .header("X-GitHub-Api-Version", API_VERSION);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(method = %method, url = %url, "GitHub request");
            let response = request.send()?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let headers = response.headers().clone();
            let text = response.text().unwrap_or_default();
            if let Some(wait) = rate_limit_wait(status, &headers, &text, SystemTime::now()) {
                if waits >= self.max_rate_limit_waits {
                    return Err(ReleaseError::RateLimited {
                        url: url.to_string(),
                        attempts: waits,
                    });
                }
                waits += 1;
                let wait = wait.min(self.max_wait);
                warn!(url = %url, wait_secs = wait.as_secs(), attempt = waits, "GitHub rate limit hit, waiting");
                std::thread::sleep(wait);
                continue;
            }

            return Err(ReleaseError::GithubApi {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
    }

    fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<(T, Option<String>)> {
        let response = self.send(Method::GET, url, None)?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_link);
        Ok((response.json()?, next))
    }
}

/// How long to wait before retrying a rate-limited response, or `None` when the
/// response is not a rate limit.
///
/// Secondary limits may arrive as a 403 with no rate-limit headers at all; those
/// are recognized from the error message in the body.
pub fn rate_limit_wait(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now: SystemTime,
) -> Option<Duration> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
    };

    if let Some(secs) = header("retry-after").and_then(|v| v.parse::<u64>().ok()) {
        return Some(Duration::from_secs(secs));
    }

    if header("x-ratelimit-remaining") == Some("0") {
        let reset = header("x-ratelimit-reset").and_then(|v| v.parse::<u64>().ok())?;
        let now = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        // One extra second absorbs clock skew between us and GitHub.
        return Some(Duration::from_secs(reset.saturating_sub(now) + 1));
    }

    if status == StatusCode::TOO_MANY_REQUESTS || is_secondary_limit_message(body) {
        return Some(SECONDARY_LIMIT_WAIT);
    }
    None
}

fn is_secondary_limit_message(body: &str) -> bool {
    body.to_ascii_lowercase().contains("secondary rate limit")
}

impl GithubClient for RestClient {
    fn merged_pulls_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>> {
        let first = format!(
            "{}?per_page={}",
            self.repo_url(&format!("commits/{}/pulls", sha))?,
            PER_PAGE
        );
        drain_pages(first, |url| {
            let (pulls, next): (Vec<ApiPull>, _) = self.get_page(url)?;
            let items = pulls
                .into_iter()
                .filter(|pull| pull.merged_at.is_some())
                .map(|pull| PullRequest::new(pull.number, pull.labels.into_iter().map(|l| l.name)))
                .collect();
            Ok(Page { items, next })
        })
    }

    fn commits_between(&self, base: &str, head: &str) -> Result<Vec<String>> {
        let first = format!(
            "{}?per_page={}",
            self.repo_url(&format!("compare/{}...{}", base, head))?,
            PER_PAGE
        );
        drain_pages(first, |url| {
            let (comparison, next): (ApiComparison, _) = self.get_page(url)?;
            Ok(Page {
                items: comparison.commits.into_iter().map(|c| c.sha).collect(),
                next,
            })
        })
    }

    fn generate_release_notes(&self, tag: &str, previous_tag: &str) -> Result<String> {
        let body = serde_json::json!({
            "tag_name": tag,
            "previous_tag_name": previous_tag,
        });
        let url = self.repo_url("releases/generate-notes")?;
        let notes: ApiNotes = self.send(Method::POST, &url, Some(&body))?.json()?;
        Ok(notes.body)
    }

    fn create_release(&self, release: &NewRelease) -> Result<()> {
        let body = serde_json::to_value(release)
            .map_err(|e| ReleaseError::config(format!("Cannot encode release: {}", e)))?;
        let url = self.repo_url("releases")?;
        self.send(Method::POST, &url, Some(&body))?;
        Ok(())
    }
}
