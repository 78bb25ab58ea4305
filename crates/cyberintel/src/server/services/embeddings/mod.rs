//! Sentence embeddings
//!
//! The `Embedder` trait is the seam the pipeline and ingestion depend on. The
//! ONNX-backed implementation lives behind the `ml-features` feature; the
//! pooling maths below is shared and testable without it.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

#[cfg(feature = "ml-features")]
mod onnx;
#[cfg(feature = "ml-features")]
pub use onnx::OnnxEmbedder;

/// Turns text into a fixed-size unit vector
#[async_trait]
pub trait Embedder: Send + Sync {
  async fn embed(&self, text: &str) -> Result<Vec<f32>>;

  fn dimension(&self) -> usize;

  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let mut embeddings = Vec::with_capacity(texts.len());
    for text in texts {
      embeddings.push(self.embed(text).await?);
    }
    Ok(embeddings)
  }
}

/// Average the token vectors of a `[1, seq, hidden]` tensor, counting only
/// positions whose attention mask is set
pub fn mean_pool(shape: &[i64], data: &[f32], attention_mask: &[u32]) -> Result<Vec<f32>> {
  if shape.len() != 3 {
    return Err(anyhow!("Expected a [batch, seq, hidden] tensor, got shape {:?}", shape));
  }

  let seq_length = shape[1] as usize;
  let hidden_size = shape[2] as usize;

  if data.len() < seq_length * hidden_size {
    return Err(anyhow!(
      "Tensor data too short: {} values for {} tokens x {} dims",
      data.len(),
      seq_length,
      hidden_size
    ));
  }

  let mut pooled = vec![0.0f32; hidden_size];
  let mut counted = 0usize;

  for token_idx in 0..seq_length {
    if attention_mask.get(token_idx).copied().unwrap_or(1) == 0 {
      continue;
    }
    let start = token_idx * hidden_size;
    for (i, &value) in data[start..start + hidden_size].iter().enumerate() {
      pooled[i] += value;
    }
    counted += 1;
  }

  if counted == 0 {
    return Err(anyhow!("Attention mask excludes every token"));
  }

  for value in pooled.iter_mut() {
    *value /= counted as f32;
  }

  Ok(pooled)
}

/// Normalize to unit length; zero vectors are returned unchanged
pub fn normalize_embedding(mut embedding: Vec<f32>) -> Vec<f32> {
  let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

  if magnitude < f32::EPSILON {
    bentley::warn!("Zero-magnitude embedding detected - returning unchanged");
    return embedding;
  }

  for value in embedding.iter_mut() {
    *value /= magnitude;
  }
  embedding
}
