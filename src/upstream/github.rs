//! Content-repository client (GitHub contents API)
//!
//! Recipes live as markdown files in a repository directory. Reads use
//! conditional requests (If-None-Match) so an unchanged file costs no
//! rate-limit budget; transient failures are retried with backoff.
//! Mutations (create/update/delete commits) are not retried.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::{
    retry_with_backoff, CommitInfo, FileFetch, RecipeRepository, RepoFile, RetryPolicy,
    UpstreamError,
};
use crate::config::RepositoryConfig;

const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("forkful/", env!("CARGO_PKG_VERSION"));

/// GitHub contents API client
pub struct GithubContentClient {
    http: reqwest::Client,
    config: RepositoryConfig,
    retry: RetryPolicy,
}

fn request_error(err: reqwest::Error) -> UpstreamError {
    UpstreamError::Unavailable(err.to_string())
}

fn classify(status: StatusCode, what: &str) -> UpstreamError {
    match status.as_u16() {
        401 => UpstreamError::NotConfigured(format!("credentials rejected for {}", what)),
        403 | 429 => UpstreamError::RateLimited,
        404 => UpstreamError::NotFound(what.to_string()),
        s if s >= 500 => UpstreamError::Unavailable(format!("{} returned {}", what, s)),
        s => UpstreamError::Malformed(format!("{} returned unexpected status {}", what, s)),
    }
}

fn str_field<'a>(value: &'a Value, field: &str) -> Result<&'a str, UpstreamError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| UpstreamError::Malformed(format!("missing field '{}'", field)))
}

fn etag_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::ETAG)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

impl GithubContentClient {
    /// Build a client from configuration
    pub fn new(config: RepositoryConfig, retry: RetryPolicy) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            config,
            retry,
        })
    }

    fn ensure_configured(&self) -> Result<(), UpstreamError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(UpstreamError::NotConfigured(
                "repository owner, repo, and token are required".to_string(),
            ))
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base, self.config.owner, self.config.repo, path
        )
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", self.config.token))
            .header(reqwest::header::ACCEPT, ACCEPT_JSON)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    /// Decode the base64 content payload the contents API returns
    /// (base64 with embedded newlines)
    fn decode_content(encoded: &str) -> Result<String, UpstreamError> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(compact)
            .map_err(|e| UpstreamError::Malformed(format!("invalid base64 content: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| UpstreamError::Malformed(format!("content is not UTF-8: {}", e)))
    }
}

#[async_trait]
impl RecipeRepository for GithubContentClient {
    async fn list_recipe_files(&self) -> Result<Vec<RepoFile>, UpstreamError> {
        self.ensure_configured()?;
        let url = self.contents_url(&self.config.recipes_dir);

        let body: Value = retry_with_backoff(&self.retry, || {
            let url = url.clone();
            async move {
                let response = self
                    .authed(self.http.get(&url))
                    .send()
                    .await
                    .map_err(request_error)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(classify(status, "recipe listing"));
                }
                response
                    .json::<Value>()
                    .await
                    .map_err(|e| UpstreamError::Malformed(e.to_string()))
            }
        })
        .await?;

        let entries = body
            .as_array()
            .ok_or_else(|| UpstreamError::Malformed("recipe listing is not an array".to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let name = str_field(entry, "name")?;
            let kind = entry.get("type").and_then(|v| v.as_str()).unwrap_or("");
            if kind != "file" || !name.ends_with(".md") {
                continue;
            }
            files.push(RepoFile {
                name: name.to_string(),
                path: str_field(entry, "path")?.to_string(),
                sha: str_field(entry, "sha")?.to_string(),
            });
        }

        tracing::debug!(count = files.len(), "listed recipe files");
        Ok(files)
    }

    async fn fetch_file(
        &self,
        path: &str,
        validator: Option<&str>,
    ) -> Result<FileFetch, UpstreamError> {
        self.ensure_configured()?;
        let url = self.contents_url(path);

        retry_with_backoff(&self.retry, || {
            let url = url.clone();
            async move {
                let mut request = self.authed(self.http.get(&url));
                if let Some(etag) = validator {
                    request = request.header(reqwest::header::IF_NONE_MATCH, etag);
                }

                let response = request.send().await.map_err(request_error)?;
                let status = response.status();

                // Unchanged since the presented validator; costs nothing
                if status == StatusCode::NOT_MODIFIED {
                    tracing::debug!(path, "file not modified (304)");
                    return Ok(FileFetch::NotModified);
                }
                if !status.is_success() {
                    return Err(classify(status, path));
                }

                let new_validator = etag_of(&response);
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

                Ok(FileFetch::Fetched {
                    content: Self::decode_content(str_field(&body, "content")?)?,
                    sha: str_field(&body, "sha")?.to_string(),
                    validator: new_validator,
                })
            }
        })
        .await
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<CommitInfo, UpstreamError> {
        self.ensure_configured()?;
        let url = self.contents_url(path);

        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .authed(self.http.put(&url))
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify(status, path));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let commit = body
            .get("commit")
            .ok_or_else(|| UpstreamError::Malformed("missing commit in response".to_string()))?;

        tracing::info!(path, message, "committed file to repository");
        Ok(CommitInfo {
            sha: str_field(commit, "sha")?.to_string(),
            message: commit
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or(message)
                .to_string(),
        })
    }

    async fn delete_file(
        &self,
        path: &str,
        message: &str,
        sha: &str,
    ) -> Result<CommitInfo, UpstreamError> {
        self.ensure_configured()?;
        let url = self.contents_url(path);

        let response = self
            .authed(self.http.delete(&url))
            .json(&json!({ "message": message, "sha": sha }))
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify(status, path));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        let commit = body
            .get("commit")
            .ok_or_else(|| UpstreamError::Malformed("missing commit in response".to_string()))?;

        tracing::info!(path, message, "deleted file from repository");
        Ok(CommitInfo {
            sha: str_field(commit, "sha")?.to_string(),
            message: commit
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or(message)
                .to_string(),
        })
    }
}
