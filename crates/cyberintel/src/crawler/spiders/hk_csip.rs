//! Hong Kong Cybersecurity Information Portal (cybersecurity.hk)

use scraper::Html;

use crate::crawler::{first_own_text, links, text_of_all, Page, PageKind, Spider, SpiderOutput};
use crate::models::{DocumentRecord, Region};

/// Link fragments that mark Expert Corner and Learning Centre articles
const ARTICLE_MARKERS: [&str; 2] = ["expert-", "learning-"];

const TITLE_SELECTORS: [&str; 3] = ["h1.page-title", "div.content-area h2", "h2"];
const CONTENT_SELECTORS: [&str; 3] = ["div.content-area", "div#main_content", "body"];

pub struct HkCsipSpider;

impl Spider for HkCsipSpider {
  fn name(&self) -> &'static str {
    "hk_csip"
  }

  fn region(&self) -> Region {
    Region::Hk
  }

  fn allowed_domains(&self) -> &'static [&'static str] {
    &["cybersecurity.hk"]
  }

  fn start_urls(&self) -> &'static [&'static str] {
    &["https://www.cybersecurity.hk/en/index.php"]
  }

  fn output_file(&self) -> &'static str {
    "output.json"
  }

  fn parse(&self, page: &Page) -> Vec<SpiderOutput> {
    let doc = Html::parse_document(&page.html);
    match page.kind {
      PageKind::Index => parse_index(&doc, page),
      PageKind::Article => parse_article(&doc, page).map(SpiderOutput::Item).into_iter().collect(),
    }
  }
}

fn parse_index(doc: &Html, page: &Page) -> Vec<SpiderOutput> {
  let found = links(doc, &page.url);
  tracing::debug!(url = %page.url, links = found.len(), "parsed HK index page");

  found
    .into_iter()
    .filter(|(href, _)| ARTICLE_MARKERS.iter().any(|marker| href.contains(marker)))
    .map(|(_, url)| SpiderOutput::Follow(url))
    .collect()
}

fn parse_article(doc: &Html, page: &Page) -> Option<DocumentRecord> {
  let title = TITLE_SELECTORS.iter().find_map(|css| first_own_text(doc, css));
  let content = CONTENT_SELECTORS
    .iter()
    .map(|css| text_of_all(doc, css))
    .find(|text| !text.is_empty())
    .unwrap_or_default();

  let Some(title) = title.filter(|_| !content.is_empty()) else {
    tracing::warn!(url = %page.url, "failed to extract title or content");
    return None;
  };

  Some(DocumentRecord {
    region: Region::Hk,
    source_url: page.url.to_string(),
    title,
    content_block: content,
    published_date: first_own_text(doc, "span.date"),
    scraped_at: page.fetched_at.clone(),
  })
}
