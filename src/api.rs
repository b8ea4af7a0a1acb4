use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::CACHE_CONTROL, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregate::{Aggregator, StartupQuery, DEFAULT_LIMIT, DEFAULT_SOURCE};
use crate::config::AppConfig;
use crate::ingest::http::HttpClient;
use crate::issues::IssueFinder;

/// Diagnostics header: `HIT` when served from the record cache.
pub const CACHE_HEADER: &str = "x-cache";

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub issues: IssueFinder,
    pub cache_control: String,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let http = HttpClient::from_config(cfg)?;
        Ok(Self {
            aggregator: Arc::new(Aggregator::with_http(cfg, http.clone())),
            issues: IssueFinder::new(http, cfg),
            cache_control: cfg.cache_control(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/startups", get(startups))
        .route("/api/issues", get(issues))
        .route("/api/repo", get(repo_details))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Query pairs reduced to the first value per key. Repeated or malformed
/// keys never reject the request.
fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    let mut out = HashMap::with_capacity(pairs.len());
    for (k, v) in pairs {
        out.entry(k).or_insert(v);
    }
    out
}

/// `/api/startups` parameters, before defaults are applied.
#[derive(Debug, Default)]
struct StartupsParams {
    source: Option<String>,
    new_only: Option<String>,
    limit: Option<String>,
    language: Option<String>,
    q: Option<String>,
}

impl StartupsParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut m = first_values(pairs);
        Self {
            source: m.remove("source"),
            new_only: m.remove("newOnly"),
            limit: m.remove("limit"),
            language: m.remove("language"),
            q: m.remove("q"),
        }
    }
}

impl From<StartupsParams> for StartupQuery {
    fn from(p: StartupsParams) -> Self {
        Self {
            source: p
                .source
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            new_only: p.new_only.as_deref() == Some("true"),
            limit: p
                .limit
                .and_then(|l| l.trim().parse::<usize>().ok())
                .unwrap_or(DEFAULT_LIMIT),
            language: p.language.unwrap_or_default(),
            search: p.q.unwrap_or_default(),
        }
    }
}

async fn startups(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let q = StartupQuery::from(StartupsParams::from_pairs(pairs));
    match state.aggregator.query(&q).await {
        Ok(body) => {
            let hit = if body.cached { "HIT" } else { "MISS" };
            let mut resp = (StatusCode::OK, Json(body)).into_response();
            let headers = resp.headers_mut();
            if let Ok(v) = HeaderValue::from_str(&state.cache_control) {
                headers.insert(CACHE_CONTROL, v);
            }
            headers.insert(CACHE_HEADER, HeaderValue::from_static(hit));
            resp
        }
        Err(e) => {
            tracing::error!(target: "api", error = ?e, source = %q.source, "aggregation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(state.aggregator.degraded(&q)),
            )
                .into_response()
        }
    }
}

const DEFAULT_ISSUE_LIMIT: usize = 5;

#[derive(Debug)]
struct RepoParams {
    repo: String,
    limit: usize,
}

impl RepoParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut m = first_values(pairs);
        Self {
            repo: m.remove("repo").unwrap_or_default(),
            limit: m
                .remove("limit")
                .and_then(|l| l.trim().parse::<usize>().ok())
                .unwrap_or(DEFAULT_ISSUE_LIMIT),
        }
    }
}

#[derive(serde::Serialize)]
struct IssuesOut {
    repo: String,
    issues: Vec<crate::issues::Issue>,
}

async fn issues(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<IssuesOut> {
    let p = RepoParams::from_pairs(pairs);
    let issues = state.issues.good_first_issues(&p.repo, p.limit).await;
    Json(IssuesOut {
        repo: p.repo,
        issues,
    })
}

async fn repo_details(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let p = RepoParams::from_pairs(pairs);
    match state.issues.repo_details(&p.repo).await {
        Some(details) => Json(details).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Repository not found", "repo": p.repo })),
        )
            .into_response(),
    }
}
