// src/ingest/providers/curated.rs
//! Verified YC companies with public GitHub orgs. The roster is config data;
//! each org's most-starred repository becomes one record.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::AppConfig;
use crate::ingest::http::HttpClient;
use crate::ingest::providers::github::GhRepo;
use crate::ingest::types::{FetchParams, SourceFetcher};
use crate::record::{non_empty, Record, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CuratedOrg {
    pub name: &'static str,
    pub github: &'static str,
    pub batch: &'static str,
    pub description: &'static str,
}

const fn org(
    name: &'static str,
    github: &'static str,
    batch: &'static str,
    description: &'static str,
) -> CuratedOrg {
    CuratedOrg {
        name,
        github,
        batch,
        description,
    }
}

pub const VERIFIED_ORGS: &[CuratedOrg] = &[
    org("Stripe", "stripe", "S09", "Payment processing platform"),
    org("GitLab", "gitlabhq", "W15", "DevOps platform"),
    org("Supabase", "supabase", "S20", "Open source Firebase alternative"),
    org("PlanetScale", "planetscale", "S18", "Serverless MySQL platform"),
    org("Retool", "tryretool", "W17", "Internal tools builder"),
    org("PostHog", "PostHog", "W20", "Open source product analytics"),
    org("Cal.com", "calcom", "W21", "Open source scheduling"),
    org("Airbyte", "airbytehq", "W20", "Open source data integration"),
    org("Temporal", "temporalio", "W20", "Workflow orchestration"),
    org("Render", "render-oss", "S19", "Cloud platform"),
    org("Railway", "railwayapp", "W20", "Infrastructure platform"),
    org("Buildkite", "buildkite", "W14", "CI/CD platform"),
    org("Zapier", "zapier", "S12", "Workflow automation"),
    org("Segment", "segmentio", "S11", "Customer data platform"),
    org("Mux", "muxinc", "S16", "Video infrastructure"),
    org("Loom", "loomhq", "S16", "Video messaging"),
    org("Vercel", "vercel", "S16", "Frontend cloud platform"),
    org("Instacart", "instacart", "S12", "Grocery delivery"),
    org("Figma", "figma", "W12", "Design tool"),
    org("Plaid", "plaid", "S13", "Financial data platform"),
    org("Algolia", "algolia", "W14", "Search API"),
    org("Webflow", "webflow", "S13", "Website builder"),
    org("Sentry", "getsentry", "W16", "Error tracking"),
    org("Clerk", "clerk", "S21", "Authentication"),
    org("Resend", "resend", "W23", "Email API"),
    org("Trigger.dev", "triggerdotdev", "W23", "Background jobs"),
    org("Infisical", "Infisical", "W23", "Secret management"),
    org("Novu", "novuhq", "W22", "Notification infrastructure"),
    org("Dub", "dubinc", "S22", "Link management"),
    org("Tinybird", "tinybirdco", "W20", "Real-time analytics"),
    org("Replicate", "replicate", "W20", "AI model hosting"),
    org("Modal", "modal-labs", "S21", "Cloud compute"),
    org("Turso", "tursodatabase", "W23", "Edge database"),
    org("Fly.io", "superfly", "W17", "Edge compute platform"),
    org("Prisma", "prisma", "S19", "Database ORM"),
    org("Hasura", "hasura", "S18", "GraphQL engine"),
    org("Appsmith", "appsmithorg", "W21", "Low-code platform"),
    org("n8n", "n8n-io", "W20", "Workflow automation"),
    org("Windmill", "windmill-labs", "S22", "Developer platform"),
];

pub struct CuratedFetcher {
    http: HttpClient,
    api_base: String,
    per_org: usize,
    roster: Vec<CuratedOrg>,
}

impl CuratedFetcher {
    pub fn new(http: HttpClient, cfg: &AppConfig) -> Self {
        Self::with_roster(http, cfg, VERIFIED_ORGS.to_vec())
    }

    pub fn with_roster(http: HttpClient, cfg: &AppConfig, roster: Vec<CuratedOrg>) -> Self {
        Self {
            http,
            api_base: cfg.upstream.github_api_base.trim_end_matches('/').to_string(),
            per_org: cfg.limits.curated_per_org,
            roster,
        }
    }

    async fn top_repo(&self, org: &CuratedOrg) -> Result<Option<GhRepo>> {
        let url = format!("{}/orgs/{}/repos", self.api_base, org.github);
        let per_page = self.per_org.to_string();
        let repos: Vec<GhRepo> = self
            .http
            .get_json_with(&url, &[("sort", "stars"), ("per_page", per_page.as_str())])
            .await
            .with_context(|| format!("org repos for {}", org.github))?;
        Ok(pick_top(repos))
    }
}

/// Highest-starred repository; ties keep the earlier one.
pub fn pick_top(repos: Vec<GhRepo>) -> Option<GhRepo> {
    repos.into_iter().fold(None, |best, r| match best {
        Some(b) if b.stargazers_count >= r.stargazers_count => Some(b),
        _ => Some(r),
    })
}

pub fn normalize_org(org: &CuratedOrg, repo: GhRepo) -> Record {
    let languages = repo.language_list();
    let mut r = Record::new(Source::YcVerified, org.github, org.name);
    r.slug = org.github.to_string();
    r.description = org.description.to_string();
    r.website = non_empty(repo.homepage)
        .or_else(|| Some(format!("https://github.com/{}", org.github)));
    r.github_url = Some(repo.html_url);
    r.batch = org.batch.to_string();
    r.tags = ["yc-funded", "verified"]
        .iter()
        .map(|s| s.to_string())
        .chain(repo.topics.into_iter().take(3))
        .collect();
    r.stars = repo.stargazers_count;
    r.languages = languages;
    r.last_activity = repo.pushed_at;
    r
}

#[async_trait]
impl SourceFetcher for CuratedFetcher {
    async fn fetch(&self, _params: &FetchParams) -> Result<Vec<Record>> {
        let mut out = Vec::with_capacity(self.roster.len());
        for org in &self.roster {
            match self.top_repo(org).await {
                Ok(Some(repo)) => out.push(normalize_org(org, repo)),
                Ok(None) => {
                    tracing::debug!(target: "ingest", org = org.github, "org has no public repos");
                }
                Err(e) => {
                    tracing::debug!(target: "ingest", org = org.github, error = %e, "skipping org");
                }
            }
        }
        out.sort_by(|a, b| b.stars.cmp(&a.stars));
        tracing::info!(target: "ingest", source = "yc_verified", count = out.len(), "verified repos");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "yc_verified"
    }
}
