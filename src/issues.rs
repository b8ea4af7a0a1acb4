//! Contributor helpers: beginner-friendly issues and basic repository facts.
//! Both are fail-soft; an unreachable repo yields an empty list / `None`.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::ingest::http::HttpClient;
use crate::ingest::providers::github::{repo_path, GhRepo, SearchResponse};

/// Labels tried in order; the first one with open issues wins.
pub const GOOD_FIRST_ISSUE_LABELS: &[&str] = &["good first issue", "good-first-issue", "beginner"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub labels: Vec<String>,
    pub created_at: String,
    pub comments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDetails {
    pub open_issues: u64,
    pub good_first_issues: u64,
    pub language: String,
    pub languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    id: u64,
    number: u64,
    title: String,
    html_url: String,
    #[serde(default)]
    labels: Vec<GhLabel>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    comments: u64,
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
}

impl From<GhIssue> for Issue {
    fn from(i: GhIssue) -> Self {
        Self {
            id: i.id,
            number: i.number,
            title: i.title,
            url: i.html_url,
            labels: i.labels.into_iter().map(|l| l.name).collect(),
            created_at: i.created_at,
            comments: i.comments,
        }
    }
}

#[derive(Clone)]
pub struct IssueFinder {
    http: HttpClient,
    api_base: String,
}

impl IssueFinder {
    pub fn new(http: HttpClient, cfg: &AppConfig) -> Self {
        Self {
            http,
            api_base: cfg.upstream.github_api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Open issues carrying a beginner label, at most `limit`.
    pub async fn good_first_issues(&self, repo_url: &str, limit: usize) -> Vec<Issue> {
        let Some(path) = repo_path(repo_url) else {
            return Vec::new();
        };
        for label in GOOD_FIRST_ISSUE_LABELS {
            match self.issues_with_label(&path, label, limit).await {
                Ok(found) if !found.is_empty() => return found,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(target: "issues", repo = %path, label, error = %e, "label lookup failed");
                }
            }
        }
        Vec::new()
    }

    async fn issues_with_label(&self, path: &str, label: &str, limit: usize) -> Result<Vec<Issue>> {
        let url = format!("{}/repos/{path}/issues", self.api_base);
        let per_page = limit.clamp(1, 100).to_string();
        let raw: Vec<GhIssue> = self
            .http
            .get_json_with(
                &url,
                &[("labels", label), ("state", "open"), ("per_page", per_page.as_str())],
            )
            .await?;
        Ok(raw.into_iter().map(Issue::from).collect())
    }

    /// Open issue count, beginner issue count and primary language.
    pub async fn repo_details(&self, repo_url: &str) -> Option<RepoDetails> {
        let path = repo_path(repo_url)?;
        let repo: GhRepo = match self
            .http
            .get_json(&format!("{}/repos/{path}", self.api_base))
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(target: "issues", repo = %path, error = ?e, "repo details failed");
                return None;
            }
        };

        let q = format!("repo:{path} is:issue is:open label:\"good first issue\"");
        let good_first_issues = self
            .http
            .get_json_with::<SearchResponse<serde_json::Value>, _>(
                &format!("{}/search/issues", self.api_base),
                &[("q", q.as_str()), ("per_page", "1")],
            )
            .await
            .map(|s| s.total_count)
            .unwrap_or(0);

        let languages = repo.language_list();
        Some(RepoDetails {
            open_issues: repo.open_issues_count,
            good_first_issues,
            language: repo.language.unwrap_or_default(),
            languages,
        })
    }
}
