// src/ingest/http.rs
//! Shared outbound client for every upstream.
//! Carries the identifying headers GitHub requires and checks status before decoding.

use anyhow::{anyhow, Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, Response,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::AppConfig;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, token: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).context("invalid user agent")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        if let Some(token) = token {
            let mut v = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("invalid GitHub token")?;
            v.set_sensitive(true);
            headers.insert(AUTHORIZATION, v);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().context("building http client")?;
        Ok(Self { client })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Self::new(
            &cfg.user_agent,
            cfg.github_token.as_deref(),
            cfg.http_timeout_secs.map(Duration::from_secs),
        )
    }

    /// GET and decode JSON. Non-2xx is an error carrying the status.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.send(url, &[] as &[(&str, &str)]).await?;
        resp.json::<T>()
            .await
            .with_context(|| format!("decoding json from {url}"))
    }

    /// GET with query parameters and decode JSON.
    pub async fn get_json_with<T, Q>(&self, url: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let resp = self.send(url, query).await?;
        resp.json::<T>()
            .await
            .with_context(|| format!("decoding json from {url}"))
    }

    /// GET a text body (markdown fallback).
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.send(url, &[] as &[(&str, &str)]).await?;
        resp.text()
            .await
            .with_context(|| format!("reading body from {url}"))
    }

    async fn send<Q: serde::Serialize + ?Sized>(&self, url: &str, query: &Q) -> Result<Response> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("GET {url} returned HTTP {}", status.as_u16()));
        }
        Ok(resp)
    }
}
