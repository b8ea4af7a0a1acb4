// tests/providers_http.rs
//
// Real fetchers against an in-process axum server standing in for the YC
// directory, GitHub and Hacker News. No external network.
//
// Covered:
// - directory: status/repo filtering, year floor, README fallback
// - trending: search qualifiers, per_page, identifying headers
// - curated: per-org failure isolation, top-repo pick, star ordering
// - hackernews: GitHub-only qualification, limit/attempt bounds
// - aggregator "all" fan-out over the real fetchers

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use gitgrow::aggregate::{Aggregator, StartupQuery};
use gitgrow::config::AppConfig;
use gitgrow::ingest::fetch_soft;
use gitgrow::ingest::http::HttpClient;
use gitgrow::ingest::providers::curated::{CuratedFetcher, CuratedOrg};
use gitgrow::ingest::providers::directory::DirectoryFetcher;
use gitgrow::ingest::providers::hackernews::HackerNewsFetcher;
use gitgrow::ingest::providers::trending::TrendingFetcher;
use gitgrow::ingest::types::{FetchParams, SourceFetcher};
use gitgrow::record::Source;

const YC_OPEN_SOURCE: &str = include_str!("fixtures/yc_open_source.json");
const YC_ALL: &str = include_str!("fixtures/yc_all.json");
const GH_SEARCH: &str = include_str!("fixtures/gh_search.json");
const README: &str = include_str!("fixtures/open_source_readme.md");

#[derive(Clone, Default)]
struct Upstream {
    /// (raw query, user-agent) of every search request.
    searches: Arc<Mutex<Vec<(String, String)>>>,
    hn_item_calls: Arc<Mutex<Vec<String>>>,
}

fn json_body(raw: &'static str) -> Response {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        raw,
    )
        .into_response()
}

async fn search(
    State(up): State<Upstream>,
    RawQuery(q): RawQuery,
    headers: HeaderMap,
) -> Response {
    let ua = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    up.searches.lock().unwrap().push((q.unwrap_or_default(), ua));
    json_body(GH_SEARCH)
}

async fn org_repos(Path(org): Path<String>) -> Response {
    match org.as_str() {
        "acme" => Json(json!([
            {"name":"docs","full_name":"acme/docs","html_url":"https://github.com/acme/docs","stargazers_count":12,"language":"MDX"},
            {"name":"cloud","full_name":"acme/cloud","html_url":"https://github.com/acme/cloud","homepage":"https://acme.dev","stargazers_count":950,"language":"Go","topics":["k8s","paas","selfhost","infra"]}
        ]))
        .into_response(),
        "ledger" => Json(json!([
            {"name":"ledger","full_name":"ledger/ledger","html_url":"https://github.com/ledger/ledger","stargazers_count":4100,"language":"Rust"}
        ]))
        .into_response(),
        "empty" => Json(json!([])).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn hn_item(State(up): State<Upstream>, Path(file): Path<String>) -> Response {
    let id = file.trim_end_matches(".json").to_string();
    up.hn_item_calls.lock().unwrap().push(id.clone());
    let body = match id.as_str() {
        "101" => json!({"id":101,"title":"Show HN: Fastgrep – grep, but fast","url":"https://github.com/grepco/fastgrep","score":88,"time":1748736000}),
        "102" => json!({"id":102,"title":"Show HN: My blog","url":"https://blog.example.com/post","score":12,"time":1748736000}),
        "103" => json!({"id":103,"title":"Ask HN: anything?","score":3,"time":1748736000}),
        "104" => return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "105" => json!({"id":105,"title":"Show HN: Notebook - notes in your terminal","url":"https://github.com/inkwell/notebook.git","score":40,"time":1748822400}),
        "106" => json!({"id":106,"title":"Show HN: Extra","url":"https://github.com/extra/extra","score":5,"time":1748822400}),
        _ => serde_json::Value::Null,
    };
    Json(body).into_response()
}

async fn spawn_upstream(up: Upstream) -> String {
    let app = Router::new()
        .route("/yc/open-source.json", get(|| async { json_body(YC_OPEN_SOURCE) }))
        .route("/yc/all.json", get(|| async { json_body(YC_ALL) }))
        .route(
            "/broken/open-source.json",
            get(|| async { (StatusCode::BAD_GATEWAY, "down").into_response() }),
        )
        .route("/readme.md", get(|| async { README }))
        .route("/gh/search/repositories", get(search))
        .route("/gh/orgs/{org}/repos", get(org_repos))
        .route(
            "/hn/showstories.json",
            get(|| async { Json(json!([101, 102, 103, 104, 105, 106, 107])) }),
        )
        .route("/hn/item/{file}", get(hn_item))
        .with_state(up);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock upstream");
    });
    format!("http://{addr}")
}

fn config_for(base: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.upstream.directory_base = format!("{base}/yc");
    cfg.upstream.readme_fallback_url = format!("{base}/readme.md");
    cfg.upstream.github_api_base = format!("{base}/gh");
    cfg.upstream.hn_api_base = format!("{base}/hn");
    cfg
}

fn http(cfg: &AppConfig) -> HttpClient {
    HttpClient::from_config(cfg).expect("http client")
}

#[tokio::test]
async fn directory_open_source_keeps_live_companies_with_repos() {
    let base = spawn_upstream(Upstream::default()).await;
    let cfg = config_for(&base);
    let f = DirectoryFetcher::open_source(http(&cfg), &cfg);

    let out = f.fetch(&FetchParams::default()).await.expect("fetch");
    let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["yc_oss:acme-cloud", "yc_oss:ledger-base"]);
    assert_eq!(out[1].description, "Double-entry ledger database.");
    assert!(out.iter().all(|r| r.source == Source::YcOss));
    assert!(out.iter().all(|r| r.tags.iter().any(|t| t == "open-source")));
    assert!(!f.capabilities().new_only_at_source);
}

#[tokio::test]
async fn directory_open_source_falls_back_to_readme() {
    let base = spawn_upstream(Upstream::default()).await;
    let mut cfg = config_for(&base);
    cfg.upstream.directory_base = format!("{base}/broken");
    let f = DirectoryFetcher::open_source(http(&cfg), &cfg);

    let out = f.fetch(&FetchParams::default()).await.expect("readme fallback");
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].name, "Acme Cloud");
    assert_eq!(out[0].github_url.as_deref(), Some("https://github.com/acme/cloud"));
    assert!(out.iter().all(|r| r.batch.is_empty()));
}

#[tokio::test]
async fn directory_all_applies_year_floor_from_params() {
    let base = spawn_upstream(Upstream::default()).await;
    let cfg = config_for(&base);
    let f = DirectoryFetcher::all(http(&cfg), &cfg);
    assert!(f.capabilities().new_only_at_source);

    let default_floor = f.fetch(&FetchParams::default()).await.unwrap();
    let ids: Vec<&str> = default_floor.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["yc:acme-cloud", "yc:quill-ai"]);

    let new_only = f
        .fetch(&FetchParams {
            min_year: Some(2025),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(new_only.len(), 1);
    assert_eq!(new_only[0].batch, "W25");
}

#[tokio::test]
async fn trending_sends_qualifiers_and_identifying_header() {
    let up = Upstream::default();
    let base = spawn_upstream(up.clone()).await;
    let cfg = config_for(&base);
    let f = TrendingFetcher::new(http(&cfg), &cfg);

    let out = f
        .fetch(&FetchParams {
            language: Some("Rust".into()),
            limit: Some(5),
            min_year: None,
        })
        .await
        .expect("search");
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].id, "trending:grepco-fastgrep");
    assert_eq!(out[0].website.as_deref(), Some("https://fastgrep.dev"));
    assert_eq!(out[1].website.as_deref(), Some("https://github.com/inkwell/notebook"));
    assert!(out[1].languages.is_empty());

    let searches = up.searches.lock().unwrap().clone();
    assert_eq!(searches.len(), 1);
    let (query, ua) = &searches[0];
    assert_eq!(ua, "GitGrow");
    assert!(query.contains("sort=stars"), "{query}");
    assert!(query.contains("order=desc"), "{query}");
    assert!(query.contains("per_page=5"), "{query}");
    assert!(query.contains("created%3A%3E"), "{query}");
    assert!(query.contains("stars%3A%3E50"), "{query}");
    assert!(query.contains("language%3ARust"), "{query}");
}

#[tokio::test]
async fn curated_skips_failing_orgs_and_sorts_by_stars() {
    let base = spawn_upstream(Upstream::default()).await;
    let cfg = config_for(&base);
    let roster = vec![
        CuratedOrg { name: "Acme", github: "acme", batch: "W25", description: "Clouds" },
        CuratedOrg { name: "Broken", github: "broken", batch: "S20", description: "Fails" },
        CuratedOrg { name: "Empty", github: "empty", batch: "S20", description: "No repos" },
        CuratedOrg { name: "Ledger", github: "ledger", batch: "W21", description: "Ledgers" },
    ];
    let f = CuratedFetcher::with_roster(http(&cfg), &cfg, roster);

    let out = f.fetch(&FetchParams::default()).await.expect("curated never fails as a whole");
    let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["yc_verified:ledger", "yc_verified:acme"]);

    let acme = &out[1];
    assert_eq!(acme.github_url.as_deref(), Some("https://github.com/acme/cloud"));
    assert_eq!(acme.stars, 950);
    assert_eq!(acme.website.as_deref(), Some("https://acme.dev"));
    assert_eq!(acme.tags, vec!["yc-funded", "verified", "k8s", "paas", "selfhost"]);
    assert_eq!(out[0].website.as_deref(), Some("https://github.com/ledger"));
}

#[tokio::test]
async fn hackernews_keeps_github_posts_only() {
    let up = Upstream::default();
    let base = spawn_upstream(up.clone()).await;
    let cfg = config_for(&base);
    let f = HackerNewsFetcher::new(http(&cfg), &cfg);

    let out = f
        .fetch(&FetchParams {
            limit: Some(3),
            ..Default::default()
        })
        .await
        .expect("hn");
    let names: Vec<&str> = out.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Fastgrep", "Notebook", "Extra"]);
    assert_eq!(out[0].id, "hn:101");
    assert_eq!(out[0].batch, "2025-06-01");
    assert_eq!(out[1].github_url.as_deref(), Some("https://github.com/inkwell/notebook"));

    // 104 failed upstream and was skipped without failing the fetch.
    let calls = up.hn_item_calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["101", "102", "103", "104", "105", "106"]);
}

#[tokio::test]
async fn hackernews_stops_at_limit() {
    let up = Upstream::default();
    let base = spawn_upstream(up.clone()).await;
    let cfg = config_for(&base);
    let f = HackerNewsFetcher::new(http(&cfg), &cfg);

    let out = f
        .fetch(&FetchParams {
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(*up.hn_item_calls.lock().unwrap(), vec!["101".to_string()]);
}

#[tokio::test]
async fn hackernews_attempts_are_bounded() {
    let up = Upstream::default();
    let base = spawn_upstream(up.clone()).await;
    let cfg = config_for(&base);

    // Twice the limit: 101..104 examined, only 101 qualifies.
    let f = HackerNewsFetcher::new(http(&cfg), &cfg);
    let out = f
        .fetch(&FetchParams {
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(up.hn_item_calls.lock().unwrap().len(), 4);

    // Configured window wins when it is tighter.
    up.hn_item_calls.lock().unwrap().clear();
    let mut narrow = cfg.clone();
    narrow.limits.hackernews_window = 3;
    let f = HackerNewsFetcher::new(http(&narrow), &narrow);
    let out = f
        .fetch(&FetchParams {
            limit: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(up.hn_item_calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn unreachable_upstream_is_an_empty_outcome_with_diagnostic() {
    let cfg = config_for("http://127.0.0.1:9");
    let f = TrendingFetcher::new(http(&cfg), &cfg);
    let outcome = fetch_soft(&f, &FetchParams::default()).await;
    assert!(outcome.records.is_empty());
    let diag = outcome.diagnostic.expect("diagnostic");
    assert!(diag.starts_with("github_trending:"), "{diag}");
}

#[tokio::test]
async fn all_fans_out_over_real_fetchers_in_fixed_order() {
    let base = spawn_upstream(Upstream::default()).await;
    let cfg = config_for(&base);
    let agg = Aggregator::from_config(&cfg).expect("aggregator");

    let resp = agg
        .query(&StartupQuery {
            source: "all".into(),
            limit: 100,
            ..Default::default()
        })
        .await
        .expect("query");

    let sources: Vec<Source> = resp.startups.iter().map(|r| r.source).collect();
    let first_hn = sources.iter().position(|s| *s == Source::Hackernews).unwrap();
    let first_trending = sources.iter().position(|s| *s == Source::GithubTrending).unwrap();
    assert!(sources[..first_hn].iter().all(|s| *s == Source::YcOss));
    assert!(first_hn < first_trending);
    // 2 directory + 3 Show HN + 2 trending
    assert_eq!(resp.total_cached, 7);
    assert!(!resp.cached);
}
