//! Grounding policy: relevance filtering, context assembly, prompt and fallbacks

use crate::models::{Region, RetrievedDocument};

/// Answer given whenever nothing relevant was retrieved
pub const REFUSAL_MESSAGE: &str = "I can only answer using official cybersecurity information from the selected region's government portals. No relevant data was found.";

/// Marker heading every answer produced without the language model
pub const UNAVAILABLE_MARKER: &str = "**AI Engine Unavailable**";

pub const TRUNCATION_SUFFIX: &str = "... (truncated)";

/// Keep candidates strictly closer than `threshold`, preserving order
pub fn filter_relevant(candidates: Vec<RetrievedDocument>, threshold: f32) -> Vec<RetrievedDocument> {
  candidates.into_iter().filter(|candidate| candidate.distance < threshold).collect()
}

/// `[Source k] <title>\nContent: <document>` per source, numbered from 1,
/// separated by a blank line
pub fn assemble_context(sources: &[RetrievedDocument]) -> String {
  sources
    .iter()
    .enumerate()
    .map(|(i, doc)| format!("[Source {}] {}\nContent: {}", i + 1, doc.metadata.title, doc.document))
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Render the grounding prompt for the generator
pub fn build_prompt(context: &str, question: &str, region: Option<Region>) -> String {
  let region_context = match region {
    Some(region) => format!(" for {region}"),
    None => " from multiple regions".to_string(),
  };

  format!(
    "You are a cybersecurity expert assistant{region_context}.\n\
     Answer the user's question strictly based on the provided context from official government sources.\n\
     \n\
     IMPORTANT: When you reference information from a source, cite it using the source number in square brackets like [1] or [2].\n\
     For example: \"Ransomware is malicious software [1] that encrypts files [2].\"\n\
     \n\
     If the answer is not in the context, say \"{REFUSAL_MESSAGE}\"\n\
     \n\
     Context:\n\
     {context}\n\
     \n\
     Question:\n\
     {question}\n\
     \n\
     Answer (remember to cite sources with [1], [2], etc.):"
  )
}

/// Answer when the generator was called and failed
pub fn generator_failed_answer(context: &str) -> String {
  format!(
    "{UNAVAILABLE_MARKER}\n\n\
     Unable to generate summary. Please ensure the Ollama service is running.\n\n\
     **Relevant Information:**\n\n\
     {context}"
  )
}

/// Answer when no generator is configured; the context is cut to `budget` chars
pub fn no_generator_answer(context: &str, budget: usize) -> String {
  format!(
    "{UNAVAILABLE_MARKER}\n\n\
     No language model is configured. Showing retrieved context directly:\n\n\
     {}",
    truncate_chars(context, budget)
  )
}

/// Cut `text` to at most `budget` characters, appending the truncation suffix
pub fn truncate_chars(text: &str, budget: usize) -> String {
  match text.char_indices().nth(budget) {
    Some((byte_index, _)) => format!("{}{TRUNCATION_SUFFIX}", &text[..byte_index]),
    None => text.to_string(),
  }
}
