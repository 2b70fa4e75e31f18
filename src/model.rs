//! Pretrained model loading.
//!
//! Downloads the tokenizer, config and weights of a T5-family checkpoint from
//! the Hugging Face hub and builds a candle model from them. The loader keeps
//! the result, so asking it again does not reload anything.

use crate::config::{DeviceKind, ModelConfig};
use crate::generation::Seq2SeqModel;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use thiserror::Error;
use tokenizers::Tokenizer;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model hub request failed: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),
    #[error("failed to read model files: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid model config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model error: {0}")]
    Candle(#[from] candle_core::Error),
    #[error("failed to load tokenizer: {0}")]
    Tokenizer(String),
}

/// Local paths of the files a checkpoint is made of
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Fetch (or find in the hub cache) the files for `config.repo`
    pub fn fetch(config: &ModelConfig) -> Result<Self, ModelError> {
        let api = Api::new()?;
        let repo = api.repo(Repo::with_revision(
            config.repo.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));
        log::info!("resolving {}@{}", config.repo, config.revision);
        Ok(Self {
            config: repo.get("config.json")?,
            tokenizer: repo.get("tokenizer.json")?,
            weights: repo.get("model.safetensors")?,
        })
    }
}

/// A T5 encoder-decoder running on candle
pub struct T5Model {
    inner: t5::T5ForConditionalGeneration,
    device: Device,
    decoder_start_token_id: u32,
    eos_token_id: u32,
}

impl T5Model {
    pub fn load(files: &ModelFiles, device: Device) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(&files.config)?;
        let mut config: t5::Config = serde_json::from_str(&raw)?;
        // Beams are re-scored from their full prefix each step, so the
        // single-sequence KV cache must stay off.
        config.use_cache = false;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                std::slice::from_ref(&files.weights),
                DType::F32,
                &device,
            )?
        };
        let inner = t5::T5ForConditionalGeneration::load(vb, &config)?;
        let decoder_start_token_id = config
            .decoder_start_token_id
            .unwrap_or(config.pad_token_id) as u32;

        Ok(Self {
            inner,
            device,
            decoder_start_token_id,
            eos_token_id: config.eos_token_id as u32,
        })
    }
}

impl Seq2SeqModel for T5Model {
    type Encoded = Tensor;
    type Error = candle_core::Error;

    fn encode(&mut self, input_ids: &[u32]) -> candle_core::Result<Tensor> {
        let input = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        self.inner.encode(&input)
    }

    fn next_token_logits(
        &mut self,
        encoded: &Tensor,
        decoder_ids: &[u32],
    ) -> candle_core::Result<Vec<f32>> {
        let decoder_input = Tensor::new(decoder_ids, &self.device)?.unsqueeze(0)?;
        let logits = self.inner.decode(&decoder_input, encoded)?;
        logits.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()
    }

    fn decoder_start_token_id(&self) -> u32 {
        self.decoder_start_token_id
    }

    fn eos_token_id(&self) -> u32 {
        self.eos_token_id
    }
}

/// The tokenizer and model pair every request shares
pub struct ModelHandle<M = T5Model> {
    pub tokenizer: Tokenizer,
    pub model: M,
}

type Builder<M> = Box<dyn Fn(&ModelConfig) -> Result<ModelHandle<M>, ModelError>>;

/// Builds the [`ModelHandle`] on first use and hands out the same one afterwards
pub struct ModelLoader<M = T5Model> {
    config: ModelConfig,
    build: Builder<M>,
    handle: Option<ModelHandle<M>>,
}

impl ModelLoader<T5Model> {
    /// A loader that fetches `config.repo` from the hub and runs it on candle
    pub fn new(config: ModelConfig) -> Self {
        Self::with_builder(config, build_t5)
    }
}

impl<M> ModelLoader<M> {
    pub fn with_builder<F>(config: ModelConfig, build: F) -> Self
    where
        F: Fn(&ModelConfig) -> Result<ModelHandle<M>, ModelError> + 'static,
    {
        Self {
            config,
            build: Box::new(build),
            handle: None,
        }
    }

    /// Whether the model has been loaded already
    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// Load the model, or return the one loaded earlier
    pub fn load(&mut self) -> Result<&mut ModelHandle<M>, ModelError> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => (self.build)(&self.config)?,
        };
        Ok(self.handle.insert(handle))
    }

    /// Load if needed and give up the loader in exchange for the handle
    pub fn into_handle(mut self) -> Result<ModelHandle<M>, ModelError> {
        match self.handle.take() {
            Some(handle) => Ok(handle),
            None => (self.build)(&self.config),
        }
    }
}

fn build_t5(config: &ModelConfig) -> Result<ModelHandle, ModelError> {
    let device = select_device(config.device)?;
    let files = ModelFiles::fetch(config)?;

    let tokenizer =
        Tokenizer::from_file(&files.tokenizer).map_err(|e| ModelError::Tokenizer(e.to_string()))?;
    let model = T5Model::load(&files, device)?;
    log::info!("loaded {} from {}", config.repo, files.weights.display());

    Ok(ModelHandle { tokenizer, model })
}

fn select_device(kind: DeviceKind) -> Result<Device, ModelError> {
    match kind {
        DeviceKind::Cpu => Ok(Device::Cpu),
        DeviceKind::Cuda => Ok(Device::cuda_if_available(0)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    fn tiny_tokenizer() -> Tokenizer {
        let json = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": null,
  "pre_tokenizer": {"type": "WhitespaceSplit"},
  "post_processor": null,
  "decoder": null,
  "model": {"type": "WordLevel", "vocab": {"<unk>": 0, "cat": 1}, "unk_token": "<unk>"}
}"#;
        Tokenizer::from_bytes(json.as_bytes()).unwrap()
    }

    /// A loader whose builder counts how often it runs
    fn counting_loader() -> (ModelLoader<u32>, Rc<Cell<usize>>) {
        let builds = Rc::new(Cell::new(0));
        let counter = Rc::clone(&builds);
        let loader = ModelLoader::with_builder(ModelConfig::default(), move |_| {
            counter.set(counter.get() + 1);
            Ok(ModelHandle {
                tokenizer: tiny_tokenizer(),
                model: counter.get() as u32,
            })
        });
        (loader, builds)
    }

    #[test]
    fn loader_starts_empty() {
        let loader = ModelLoader::new(ModelConfig::default());
        assert!(!loader.is_loaded());
    }

    #[test]
    fn load_builds_once_and_returns_the_same_handle() {
        let (mut loader, builds) = counting_loader();

        let first = loader.load().unwrap() as *const ModelHandle<u32>;
        assert!(loader.is_loaded());
        let second = loader.load().unwrap();
        assert_eq!(second.model, 1);
        assert!(std::ptr::eq(first, second));
        assert_eq!(builds.get(), 1);

        let handle = loader.into_handle().unwrap();
        assert_eq!(handle.model, 1);
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn into_handle_builds_when_nothing_was_loaded() {
        let (loader, builds) = counting_loader();
        assert_eq!(loader.into_handle().unwrap().model, 1);
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn failed_build_leaves_the_loader_empty() {
        let mut loader: ModelLoader<u32> = ModelLoader::with_builder(ModelConfig::default(), |_| {
            Err(ModelError::Tokenizer("broken".into()))
        });
        assert!(matches!(loader.load(), Err(ModelError::Tokenizer(_))));
        assert!(!loader.is_loaded());
    }

    #[test]
    fn cpu_device_is_always_available() {
        assert!(matches!(select_device(DeviceKind::Cpu), Ok(Device::Cpu)));
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = ModelFiles {
            config: dir.path().join("config.json"),
            tokenizer: dir.path().join("tokenizer.json"),
            weights: dir.path().join("model.safetensors"),
        };
        assert!(matches!(
            T5Model::load(&files, Device::Cpu),
            Err(ModelError::Io(_))
        ));
    }
}
