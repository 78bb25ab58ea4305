//! Japan National center of Incident readiness and Strategy for Cybersecurity (nisc.go.jp)

use scraper::Html;

use crate::crawler::{collapse_whitespace, element_text, own_text, select, select_in, Page, Spider, SpiderOutput};
use crate::models::{DocumentRecord, Region};

/// Sections shorter than this are navigation chrome
const MIN_SECTION_CHARS: usize = 100;

pub struct JapanNiscSpider;

impl Spider for JapanNiscSpider {
  fn name(&self) -> &'static str {
    "japan_nisc"
  }

  fn region(&self) -> Region {
    Region::Jp
  }

  fn allowed_domains(&self) -> &'static [&'static str] {
    &["nisc.go.jp"]
  }

  fn start_urls(&self) -> &'static [&'static str] {
    &["https://www.nisc.go.jp/eng/"]
  }

  fn output_file(&self) -> &'static str {
    "output_japan.json"
  }

  /// Only the landing page is mined; nothing is followed
  fn parse(&self, page: &Page) -> Vec<SpiderOutput> {
    let doc = Html::parse_document(&page.html);

    let mut outputs: Vec<SpiderOutput> = pdf_records(&doc, page).into_iter().map(SpiderOutput::Item).collect();
    outputs.extend(section_records(&doc, page).into_iter().map(SpiderOutput::Item));

    tracing::debug!(url = %page.url, records = outputs.len(), "parsed NISC page");
    outputs
  }
}

fn record(page: &Page, source_url: String, title: String, content_block: String) -> DocumentRecord {
  DocumentRecord {
    region: Region::Jp,
    source_url,
    title,
    content_block,
    published_date: None,
    scraped_at: page.fetched_at.clone(),
  }
}

/// PDFs are not downloaded; each link is recorded as a pointer
fn pdf_records(doc: &Html, page: &Page) -> Vec<DocumentRecord> {
  select(doc, "a[href$='.pdf']")
    .into_iter()
    .filter_map(|a| a.value().attr("href"))
    .filter_map(|href| {
      let url = page.url.join(href).ok()?;
      Some(record(page, url.to_string(), pdf_title(href), format!("Document available at: {url}")))
    })
    .collect()
}

/// File stem of the link with underscores as spaces
fn pdf_title(href: &str) -> String {
  let file_name = href.rsplit('/').next().unwrap_or(href);
  file_name.replace(".pdf", "").replace('_', " ")
}

fn section_records(doc: &Html, page: &Page) -> Vec<DocumentRecord> {
  select(doc, "div.section")
    .into_iter()
    .filter_map(|section| {
      let title = select_in(section, "h3").into_iter().map(own_text).find(|t| !t.is_empty())?;
      let content = collapse_whitespace(&element_text(section));
      (content.chars().count() > MIN_SECTION_CHARS).then(|| record(page, page.url.to_string(), title, content))
    })
    .collect()
}
