//! New York City Office of Technology and Innovation cybersecurity pages (nyc.gov)

use scraper::Html;

use crate::crawler::{first_own_text, links, select, text_of_all, Page, PageKind, Spider, SpiderOutput};
use crate::models::{DocumentRecord, Region};

const MAIN_CONTENT: &str = "div.main-content, div.content-area, article";
const DEFAULT_TITLE: &str = "NYC Cybersecurity Information";
const MIN_CONTENT_CHARS: usize = 100;

/// Lower-cased href fragments worth following from the landing page
const LINK_KEYWORDS: [&str; 4] = ["cyber", "security", "privacy", "data-protection"];

pub struct NycCyberSpider;

impl Spider for NycCyberSpider {
  fn name(&self) -> &'static str {
    "nyc_cyber"
  }

  fn region(&self) -> Region {
    Region::Nyc
  }

  fn allowed_domains(&self) -> &'static [&'static str] {
    &["nyc.gov"]
  }

  fn start_urls(&self) -> &'static [&'static str] {
    &["https://www1.nyc.gov/content/oti/pages/cybersecurity.html"]
  }

  fn output_file(&self) -> &'static str {
    "output_nyc.json"
  }

  fn parse(&self, page: &Page) -> Vec<SpiderOutput> {
    let doc = Html::parse_document(&page.html);
    match page.kind {
      PageKind::Index => parse_landing(&doc, page),
      PageKind::Article => parse_article(&doc, page).map(SpiderOutput::Item).into_iter().collect(),
    }
  }
}

fn parse_landing(doc: &Html, page: &Page) -> Vec<SpiderOutput> {
  let mut outputs = Vec::new();

  if !select(doc, MAIN_CONTENT).is_empty() {
    let title = first_own_text(doc, "h1, title").unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let content = text_of_all(doc, MAIN_CONTENT);
    if content.chars().count() > MIN_CONTENT_CHARS {
      outputs.push(SpiderOutput::Item(record(page, title, content)));
    }
  }

  outputs.extend(
    links(doc, &page.url)
      .into_iter()
      .filter(|(href, _)| {
        let href = href.to_lowercase();
        LINK_KEYWORDS.iter().any(|keyword| href.contains(keyword))
      })
      .map(|(_, url)| SpiderOutput::Follow(url)),
  );

  outputs
}

fn parse_article(doc: &Html, page: &Page) -> Option<DocumentRecord> {
  let title = first_own_text(doc, "h1").or_else(|| first_own_text(doc, "title"))?;

  let mut content = text_of_all(doc, MAIN_CONTENT);
  if content.is_empty() {
    content = text_of_all(doc, "body");
  }

  if content.chars().count() <= MIN_CONTENT_CHARS {
    tracing::debug!(url = %page.url, chars = content.len(), "article too short, skipping");
    return None;
  }

  Some(record(page, title, content))
}

fn record(page: &Page, title: String, content_block: String) -> DocumentRecord {
  DocumentRecord {
    region: Region::Nyc,
    source_url: page.url.to_string(),
    title,
    content_block,
    published_date: None,
    scraped_at: page.fetched_at.clone(),
  }
}
