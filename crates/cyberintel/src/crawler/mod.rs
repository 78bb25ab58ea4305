//! Portal crawler
//!
//! A `Spider` knows one portal's layout: where to start, which links to
//! follow and how to turn a page into document records. The `CrawlEngine`
//! owns fetching, scope checks and de-duplication.

pub mod engine;
pub mod spiders;

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use url::Url;

use crate::models::{DocumentRecord, Region};

pub use engine::{CrawlConfig, CrawlEngine, CrawlReport, Fetcher, HttpFetcher};

/// Which parser a fetched page goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
  /// A start URL (landing or index page)
  Index,
  /// A page reached by following a link
  Article,
}

/// A fetched HTML page
#[derive(Debug, Clone)]
pub struct Page {
  pub url: Url,
  pub kind: PageKind,
  pub html: String,
  pub fetched_at: String,
}

/// What a spider yields for a page
#[derive(Debug, Clone, PartialEq)]
pub enum SpiderOutput {
  Item(DocumentRecord),
  Follow(Url),
}

pub trait Spider: Send + Sync {
  fn name(&self) -> &'static str;

  fn region(&self) -> Region;

  /// Hosts (and their subdomains) the crawl may visit
  fn allowed_domains(&self) -> &'static [&'static str];

  fn start_urls(&self) -> &'static [&'static str];

  /// File the crawl result is written to
  fn output_file(&self) -> &'static str;

  fn parse(&self, page: &Page) -> Vec<SpiderOutput>;
}

/// Write records as a pretty-printed JSON array
pub fn write_records(path: &Path, records: &[DocumentRecord]) -> Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  let json = serde_json::to_string_pretty(records)?;
  std::fs::write(path, json).map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))
}

// HTML extraction helpers
// =======================

/// Elements never mined for text
const SKIPPED_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Elements matching `css`; an invalid selector matches nothing
pub fn select<'a>(doc: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
  match Selector::parse(css) {
    Ok(selector) => doc.select(&selector).collect(),
    Err(_) => Vec::new(),
  }
}

/// Descendants of `el` matching `css`; an invalid selector matches nothing
pub fn select_in<'a>(el: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
  match Selector::parse(css) {
    Ok(selector) => el.select(&selector).collect(),
    Err(_) => Vec::new(),
  }
}

/// Text nodes directly under `el`, trimmed
pub fn own_text(el: ElementRef<'_>) -> String {
  el.children()
    .filter_map(|child| child.value().as_text().map(|text| &**text))
    .collect::<String>()
    .trim()
    .to_string()
}

/// First non-empty direct text among the matches of `css`
pub fn first_own_text(doc: &Html, css: &str) -> Option<String> {
  select(doc, css).into_iter().map(own_text).find(|text| !text.is_empty())
}

/// All text below `el`, excluding script and style content
pub fn element_text(el: ElementRef<'_>) -> String {
  let mut parts: Vec<&str> = Vec::new();

  for node in el.descendants() {
    let Some(text) = node.value().as_text() else {
      continue;
    };
    let hidden = node.ancestors().any(|ancestor| {
      ancestor.value().as_element().is_some_and(|element| SKIPPED_TAGS.contains(&element.name()))
    });
    if !hidden {
      parts.push(&**text);
    }
  }

  parts.join(" ")
}

/// Whitespace-collapsed text of every match of `css`
pub fn text_of_all(doc: &Html, css: &str) -> String {
  let joined = select(doc, css).into_iter().map(element_text).collect::<Vec<_>>().join(" ");
  collapse_whitespace(&joined)
}

pub fn collapse_whitespace(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve every `a[href]` on the page against its URL
pub fn links(doc: &Html, base: &Url) -> Vec<(String, Url)> {
  select(doc, "a[href]")
    .into_iter()
    .filter_map(|a| a.value().attr("href"))
    .filter_map(|href| base.join(href).ok().map(|url| (href.to_string(), url)))
    .collect()
}
