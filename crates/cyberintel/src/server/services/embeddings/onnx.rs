use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hf_hub::api::tokio::Api;
use ndarray::Array2;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tokenizers::{Tokenizer, TruncationParams};

use ort::{
  execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch},
  session::Session,
  value::Value,
};

#[cfg(target_os = "linux")]
use ort::execution_providers::CUDAExecutionProvider;

#[cfg(target_os = "macos")]
use ort::execution_providers::CoreMLExecutionProvider;

use super::{mean_pool, normalize_embedding, Embedder};

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";
const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_FILE: &str = "onnx/model.onnx";

/// all-MiniLM-L6-v2 hidden size
pub const EMBEDDING_DIMENSION: usize = 384;

/// Inputs are truncated to this many word pieces
const MAX_TOKENS: usize = 256;

struct EmbeddingModel {
  session: Session,
  tokenizer: Tokenizer,
  input_names: Vec<String>,
}

struct ModelFiles {
  tokenizer_file: PathBuf,
  model_path: PathBuf,
}

/// MiniLM sentence embedder running on ONNX Runtime
pub struct OnnxEmbedder {
  model: Mutex<EmbeddingModel>,
}

// Public API
impl OnnxEmbedder {
  /// Download (or reuse the cached copy of) the model and start a session
  pub async fn load() -> Result<Self> {
    bentley::info!(&format!("Loading embedding model {MODEL_NAME}..."));

    let files = download_model().await?;
    let tokenizer = load_tokenizer(files.tokenizer_file)?;
    let session = load_session(files.model_path)?;
    let input_names = session.inputs.iter().map(|input| input.name.to_string()).collect();

    tracing::info!(model = MODEL_NAME, "embedding model ready");
    Ok(Self { model: Mutex::new(EmbeddingModel { session, tokenizer, input_names }) })
  }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let mut model = self.model.lock().map_err(|_| anyhow!("Failed to lock model mutex"))?;
    model.embed(text)
  }

  fn dimension(&self) -> usize {
    EMBEDDING_DIMENSION
  }
}

impl EmbeddingModel {
  fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
    let encoding =
      self.tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;

    let ids = encoding.get_ids();
    let mask = encoding.get_attention_mask();
    let type_ids = encoding.get_type_ids();

    let mut input = HashMap::new();
    input.insert("input_ids".to_string(), to_tensor(ids)?);
    input.insert("attention_mask".to_string(), to_tensor(mask)?);
    if expects_token_type_ids(&self.input_names) {
      input.insert("token_type_ids".to_string(), to_tensor(type_ids)?);
    }

    let outputs = self.session.run(input)?;
    let tensor = outputs
      .get("last_hidden_state")
      .or_else(|| outputs.get("token_embeddings"))
      .ok_or_else(|| anyhow!("No output found from model - expected 'last_hidden_state'"))?;

    let (shape, data) = tensor.try_extract_tensor::<f32>()?;
    let pooled = mean_pool(shape.as_ref(), data, mask)?;
    Ok(normalize_embedding(pooled))
  }
}

// Model initialization
async fn download_model() -> Result<ModelFiles> {
  let api = Api::new().map_err(|e| anyhow!("HF API initialization failed: {}", e))?;
  let repo = api.model(MODEL_NAME.to_string());

  let tokenizer_file =
    repo.get(TOKENIZER_FILE).await.map_err(|e| anyhow!("Failed to download tokenizer: {}", e))?;
  let model_path =
    repo.get(MODEL_FILE).await.map_err(|e| anyhow!("Failed to download ONNX model: {}", e))?;

  Ok(ModelFiles { tokenizer_file, model_path })
}

fn load_tokenizer(path: PathBuf) -> Result<Tokenizer> {
  let mut tokenizer =
    Tokenizer::from_file(path).map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;

  tokenizer.with_padding(None);
  tokenizer
    .with_truncation(Some(TruncationParams { max_length: MAX_TOKENS, ..Default::default() }))
    .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

  Ok(tokenizer)
}

fn load_session(model_path: PathBuf) -> Result<Session> {
  let session = Session::builder()?
    .with_execution_providers(execution_providers())?
    .commit_from_file(model_path)?;
  Ok(session)
}

// Hardware detection
fn execution_providers() -> Vec<ExecutionProviderDispatch> {
  let mut providers = Vec::new();

  #[cfg(target_os = "macos")]
  {
    providers.push(CoreMLExecutionProvider::default().into());
  }

  #[cfg(target_os = "linux")]
  {
    if is_cuda_available() {
      providers.push(CUDAExecutionProvider::default().build());
    }
  }

  providers.push(CPUExecutionProvider::default().into());
  providers
}

#[cfg(target_os = "linux")]
fn is_cuda_available() -> bool {
  std::process::Command::new("nvidia-smi")
    .output()
    .map(|output| output.status.success())
    .unwrap_or(false)
}

fn expects_token_type_ids(input_names: &[String]) -> bool {
  input_names.iter().any(|name| name == "token_type_ids")
}

fn to_tensor(values: &[u32]) -> Result<Value> {
  let ids: Vec<i64> = values.iter().map(|&x| i64::from(x)).collect();
  let array: Array2<i64> = Array2::from_shape_vec((1, values.len()), ids)?;
  Ok(Value::from_array(array)?.into())
}
