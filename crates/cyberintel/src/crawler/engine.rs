//! Scope-aware breadth-first crawl driver

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};
use url::Url;

use super::{Page, PageKind, Spider, SpiderOutput};
use crate::models::DocumentRecord;

const USER_AGENT: &str = concat!("cyberintel/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct CrawlConfig {
  /// Upper bound on fetched pages per spider
  pub max_pages: usize,
  /// Pause between consecutive requests
  pub delay_ms: u64,
  pub timeout_secs: u64,
}

impl Default for CrawlConfig {
  fn default() -> Self {
    Self { max_pages: 200, delay_ms: 500, timeout_secs: 30 }
  }
}

#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
  pub pages_fetched: usize,
  /// Duplicates, out-of-scope links and links past the page limit
  pub pages_skipped: usize,
  /// Failed fetches as (url, error)
  pub errors: Vec<(String, String)>,
  pub duration: Duration,
}

/// Source of page bodies
#[async_trait]
pub trait Fetcher: Send + Sync {
  async fn fetch(&self, url: &Url) -> Result<String>;
}

pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new(timeout_secs: u64) -> Result<Self> {
    let client = Client::builder()
      .user_agent(USER_AGENT)
      .redirect(reqwest::redirect::Policy::limited(5))
      .timeout(Duration::from_secs(timeout_secs))
      .build()
      .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, url: &Url) -> Result<String> {
    let response = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|e| anyhow!("Request failed: {}", e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(anyhow!("HTTP {}", status));
    }

    response.text().await.map_err(|e| anyhow!("Failed to read body: {}", e))
  }
}

pub struct CrawlEngine {
  config: CrawlConfig,
  fetcher: Box<dyn Fetcher>,
}

impl CrawlEngine {
  pub fn new(config: CrawlConfig) -> Result<Self> {
    let fetcher = HttpFetcher::new(config.timeout_secs)?;
    Ok(Self::with_fetcher(config, Box::new(fetcher)))
  }

  pub fn with_fetcher(config: CrawlConfig, fetcher: Box<dyn Fetcher>) -> Self {
    Self { config, fetcher }
  }

  /// Run one spider to completion. Fetch failures are recorded, never fatal.
  pub async fn crawl(&self, spider: &dyn Spider) -> Result<(Vec<DocumentRecord>, CrawlReport)> {
    let started = Instant::now();
    let mut report = CrawlReport::default();
    let mut records = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(Url, PageKind)> = VecDeque::new();

    for start in spider.start_urls() {
      let url = Url::parse(start).map_err(|e| anyhow!("Invalid start URL {}: {}", start, e))?;
      queue.push_back((url, PageKind::Index));
    }

    tracing::info!(spider = spider.name(), max_pages = self.config.max_pages, "starting crawl");

    while let Some((url, kind)) = queue.pop_front() {
      if !visited.insert(normalize_url(&url)) {
        report.pages_skipped += 1;
        continue;
      }

      if !in_scope(&url, spider.allowed_domains()) {
        tracing::debug!(%url, "out of scope, skipping");
        report.pages_skipped += 1;
        continue;
      }

      if report.pages_fetched >= self.config.max_pages {
        report.pages_skipped += 1;
        continue;
      }

      if report.pages_fetched > 0 && self.config.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
      }

      let html = match self.fetcher.fetch(&url).await {
        Ok(html) => html,
        Err(e) => {
          tracing::warn!(%url, error = %e, "fetch failed");
          report.errors.push((url.to_string(), e.to_string()));
          continue;
        }
      };
      report.pages_fetched += 1;

      let page = Page { url, kind, html, fetched_at: chrono::Utc::now().to_rfc3339() };
      for output in spider.parse(&page) {
        match output {
          SpiderOutput::Item(record) => records.push(record),
          SpiderOutput::Follow(next) => queue.push_back((next, PageKind::Article)),
        }
      }
    }

    report.duration = started.elapsed();
    tracing::info!(
      spider = spider.name(),
      pages_fetched = report.pages_fetched,
      pages_skipped = report.pages_skipped,
      errors = report.errors.len(),
      records = records.len(),
      duration_ms = report.duration.as_millis() as u64,
      "crawl completed"
    );

    Ok((records, report))
  }
}

/// URL without its fragment, used as the visited-set key
pub fn normalize_url(url: &Url) -> String {
  let mut normalized = url.clone();
  normalized.set_fragment(None);
  normalized.to_string()
}

/// http(s) URL whose host is an allowed domain or a subdomain of one
pub fn in_scope(url: &Url, allowed_domains: &[&str]) -> bool {
  if url.scheme() != "http" && url.scheme() != "https" {
    return false;
  }

  let Some(host) = url.host_str() else {
    return false;
  };

  allowed_domains
    .iter()
    .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}
