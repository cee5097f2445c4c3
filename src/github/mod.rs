//! Blocking GitHub REST client.
//!
//! One attempt per call, no retries or rate-limit backoff. Failures keep the
//! API's own `message` text so the CLI can print it next to remediation
//! guidance.

use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::traits::GithubApi;

mod stub;
mod templates;

pub use stub::StubGithub;
pub use templates::{
    COMMON_GITIGNORE_TEMPLATES, COMMON_LICENSES, normalize_gitignore, normalize_license,
};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GITIGNORE_BASE: &str = "https://raw.githubusercontent.com/github/gitignore/main";
pub const API_VERSION: &str = "2022-11-28";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GitHub refused to create the repository ({status}): {message}")]
    CreationDenied { status: u16, message: String },

    #[error("could not reach GitHub: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response from GitHub: {0}")]
    Decode(String),

    #[error("no gitignore template named '{0}'")]
    TemplateNotFound(String),
}

impl GithubError {
    /// What the user can do about this failure, if anything
    #[must_use]
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            GithubError::Api { status: 401, .. } => {
                Some("The token is invalid or expired. Run `glc auth --login` with a fresh token.")
            }
            GithubError::CreationDenied { .. } => Some(
                "The token lacks repo-creation scope. Grant it the `repo` (or `public_repo`) scope and log in again.",
            ),
            GithubError::Api { status: 403 | 429, message } if is_rate_limit(message) => Some(
                "GitHub's rate limit was reached. Wait a while, or log in so requests count against your token.",
            ),
            GithubError::Api { status: 403, .. } => {
                Some("The token is not allowed to do this. Check its scopes and repository access.")
            }
            GithubError::Api { status: 404, .. } => Some(
                "Not found. Check the owner and repository name; private repositories need a token that can see them.",
            ),
            GithubError::Api { status: 422, .. } => {
                Some("A repository with this name may already exist, or the name is invalid.")
            }
            GithubError::Api { status, .. } if *status >= 500 => {
                Some("GitHub is having trouble right now. Try again in a few minutes.")
            }
            GithubError::Network(_) => Some("Check your internet connection and try again."),
            GithubError::TemplateNotFound(_) => Some(
                "Template names are case-sensitive, see https://github.com/github/gitignore for the list.",
            ),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            GithubError::Api { status, .. } | GithubError::CreationDenied { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

fn is_rate_limit(message: &str) -> bool {
    message.to_ascii_lowercase().contains("rate limit")
}

/// Where the client sends its requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubEndpoints {
    pub api_base: String,
    pub gitignore_base: String,
}

impl Default for GithubEndpoints {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            gitignore_base: DEFAULT_GITIGNORE_BASE.to_string(),
        }
    }
}

impl GithubEndpoints {
    /// Defaults, overridable through `GLC_GITHUB_API` and `GLC_GITIGNORE_BASE`
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("GLC_GITHUB_API")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            gitignore_base: std::env::var("GLC_GITIGNORE_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gitignore_base),
        }
    }
}

/// Cached projection of a GitHub user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_view_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub id: u64,
    pub html_url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub user_view_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub private: bool,
    pub html_url: String,
    pub clone_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    pub owner: Owner,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateRepoRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
}

impl CreateRepoRequest {
    /// GitHub makes an initial commit when any template is requested
    #[must_use]
    pub fn has_templates(&self) -> bool {
        self.gitignore_template.is_some() || self.license_template.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct EmailEntry {
    email: String,
    primary: bool,
    verified: bool,
}

pub struct GithubClient {
    http: Client,
    endpoints: GithubEndpoints,
}

impl GithubClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed (TLS backend failure)
    pub fn new(endpoints: GithubEndpoints) -> Result<Self, GithubError> {
        let http = Client::builder()
            .user_agent(format!("glc/{}", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, endpoints })
    }

    fn api(&self, method: reqwest::Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.endpoints.api_base, path);
        debug!(%method, %url, authenticated = token.is_some(), "GitHub request");

        let request = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GithubError> {
    let response = request.send()?;
    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        return Err(api_error(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| GithubError::Decode(e.to_string()))
}

fn api_error(status: StatusCode, body: &str) -> GithubError {
    let message = api_error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    debug!(status = status.as_u16(), %message, "GitHub request failed");
    GithubError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Extract the human readable failure from a GitHub error body
///
/// GitHub answers `{"message": "...", "errors": [{"message": "..."}|{"code": "..."}]}`.
#[must_use]
pub fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let mut message = value.get("message")?.as_str()?.to_string();

    let details: Vec<String> = value
        .get("errors")
        .and_then(serde_json::Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|error| {
                    error
                        .get("message")
                        .or_else(|| error.get("code"))
                        .and_then(serde_json::Value::as_str)
                        .map(String::from)
                })
                .collect()
        })
        .unwrap_or_default();

    if !details.is_empty() {
        message = format!("{message} ({})", details.join("; "));
    }
    Some(message)
}

impl GithubApi for GithubClient {
    fn current_user(&self, token: &str) -> Result<UserSummary, GithubError> {
        send_json(self.api(reqwest::Method::GET, "/user", Some(token)))
    }

    fn primary_email(&self, token: &str) -> Result<Option<String>, GithubError> {
        let emails: Vec<EmailEntry> =
            send_json(self.api(reqwest::Method::GET, "/user/emails", Some(token)))?;
        Ok(emails
            .into_iter()
            .find(|entry| entry.primary && entry.verified)
            .map(|entry| entry.email))
    }

    fn create_repository(
        &self,
        token: &str,
        request: &CreateRepoRequest,
    ) -> Result<Repository, GithubError> {
        send_json(
            self.api(reqwest::Method::POST, "/user/repos", Some(token))
                .json(request),
        )
        .map_err(|error| match error {
            GithubError::Api {
                status: status @ (403 | 404),
                message,
            } if !is_rate_limit(&message) => GithubError::CreationDenied { status, message },
            other => other,
        })
    }

    fn repository(
        &self,
        token: Option<&str>,
        owner: &str,
        name: &str,
    ) -> Result<Repository, GithubError> {
        let path = format!("/repos/{owner}/{name}");
        send_json(self.api(reqwest::Method::GET, &path, token))
    }

    fn gitignore_template(&self, name: &str) -> Result<String, GithubError> {
        let url = format!("{}/{}.gitignore", self.endpoints.gitignore_base, name);
        debug!(%url, "fetching gitignore template");

        let response = self.http.get(&url).send()?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GithubError::TemplateNotFound(name.to_string()));
        }
        let body = response.text()?;
        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        Ok(body)
    }

    fn is_reachable(&self) -> bool {
        self.http
            .get(&self.endpoints.api_base)
            .timeout(REACHABILITY_TIMEOUT)
            .send()
            .is_ok_and(|response| !response.status().is_server_error())
    }
}

/// Owner and repository name of a GitHub remote URL (https or ssh form)
#[must_use]
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    let pattern = Regex::new(
        r"^(?:https?://(?:[^@/]+@)?github\.com/|git@github\.com:|ssh://git@github\.com/)([^/\s]+)/([^/\s]+?)(?:\.git)?/?$",
    )
    .ok()?;
    let captures = pattern.captures(url.trim())?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// Directory name `git clone` would pick for `url`
#[must_use]
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Classic (`ghp_` + 36 alphanumerics) or fine-grained (`github_pat_…`) token shape
#[must_use]
pub fn is_valid_token_format(token: &str) -> bool {
    Regex::new(r"^(?:ghp_[A-Za-z0-9]{36}|github_pat_[A-Za-z0-9_]{22,255})$")
        .is_ok_and(|pattern| pattern.is_match(token.trim()))
}
