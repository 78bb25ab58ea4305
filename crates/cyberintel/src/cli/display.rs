//! Display formatting utilities for CLI output

use colored::*;
use std::collections::BTreeMap;

use crate::models::{Region, SourceCitation};
use crate::rag::UNAVAILABLE_MARKER;

const WRAP_WIDTH: usize = 80;

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    if paragraph.trim().is_empty() {
      lines.push(String::new());
      continue;
    }

    let mut current_line = String::new();

    for word in paragraph.split_whitespace() {
      if current_line.is_empty() {
        current_line = word.to_string();
      } else if current_line.chars().count() + 1 + word.chars().count() <= width {
        current_line.push(' ');
        current_line.push_str(word);
      } else {
        lines.push(current_line);
        current_line = word.to_string();
      }
    }

    if !current_line.is_empty() {
      lines.push(current_line);
    }
  }

  lines
}

/// `[k] title (REGION)` without colour, numbered from 1
pub fn format_source(position: usize, source: &SourceCitation) -> String {
  format!("[{}] {} ({})", position + 1, source.title, source.region)
}

pub fn display_answer(answer: &str, sources: &[SourceCitation]) {
  if answer.starts_with(UNAVAILABLE_MARKER) {
    println!("{} Language model unavailable, showing retrieved context", "⚠".yellow());
    println!();
  }

  for line in wrap_text(answer, WRAP_WIDTH) {
    println!("{line}");
  }

  if sources.is_empty() {
    return;
  }

  println!();
  println!("{}", "Sources".bold());
  for (i, source) in sources.iter().enumerate() {
    println!("  {}", format_source(i, source).cyan());
    println!("      {}", source.url.dimmed());
  }
}

/// One line per region, in region order
pub fn display_region_breakdown(by_region: &BTreeMap<Region, usize>) {
  for (region, count) in by_region {
    println!("  {} {:<4} {}", "•".cyan(), region.code().bold(), count);
  }
}
