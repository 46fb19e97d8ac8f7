//! Local Llama-family causal language model backed by candle.
//!
//! Behaviour:
//! - Load `config.json`, `tokenizer.json` and safetensors weights (single
//!   file or sharded with `model.safetensors.index.json`) from one directory.
//! - Pick the device once at load time and keep the weights resident for the
//!   lifetime of the process.
//! - Use the end-of-sequence token as padding token.
//! - Generate with a fresh KV cache per call so the loaded model stays
//!   read-only and can be shared across requests without locking.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig, LlamaEosToks};
use candle_transformers::utils::apply_repeat_penalty;
use serde::Deserialize;
use tokenizers::{PaddingParams, Tokenizer};

use super::config::GenerationConfig;
use super::device::{device_label, dtype_for, select_device};
use super::error::{LlmError, LlmResult};
use super::generator::TextGenerator;

/// Model configuration file name.
pub const CONFIG_FILE: &str = "config.json";
/// Tokenizer file name.
pub const TOKENIZER_FILE: &str = "tokenizer.json";
/// Single-file weights name.
pub const WEIGHTS_FILE: &str = "model.safetensors";
/// Index file of sharded weights.
pub const WEIGHTS_INDEX_FILE: &str = "model.safetensors.index.json";

/// EOS token looked up in the vocabulary when `config.json` has none.
const FALLBACK_EOS_TOKEN: &str = "</s>";

/// Resolved file paths of a model directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelArtifacts {
    /// Path to `config.json`.
    pub config: PathBuf,
    /// Path to `tokenizer.json`.
    pub tokenizer: PathBuf,
    /// Safetensors files holding the weights.
    pub weights: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct WeightIndex {
    weight_map: HashMap<String, String>,
}

impl ModelArtifacts {
    /// Locate every file needed to load a model from `dir`.
    ///
    /// # Errors
    /// Returns [`LlmError::MissingArtifact`] for the first missing file, or a
    /// JSON error if the shard index cannot be parsed.
    pub fn discover(dir: &Path) -> LlmResult<Self> {
        let config = require_file(dir.join(CONFIG_FILE))?;
        let tokenizer = require_file(dir.join(TOKENIZER_FILE))?;

        let single = dir.join(WEIGHTS_FILE);
        let weights = if single.is_file() {
            vec![single]
        } else {
            let index_path = require_file(dir.join(WEIGHTS_INDEX_FILE))?;
            let index: WeightIndex = serde_json::from_slice(&std::fs::read(&index_path)?)?;
            let shards: BTreeSet<String> = index.weight_map.into_values().collect();
            shards
                .into_iter()
                .map(|shard| require_file(dir.join(shard)))
                .collect::<LlmResult<Vec<_>>>()?
        };

        if weights.is_empty() {
            return Err(LlmError::MissingArtifact(dir.join(WEIGHTS_FILE)));
        }

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }
}

fn require_file(path: PathBuf) -> LlmResult<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(LlmError::MissingArtifact(path))
    }
}

/// End-of-sequence ids from the model config, else the tokenizer fallback.
fn eos_token_ids(configured: Option<&LlamaEosToks>, fallback: Option<u32>) -> LlmResult<Vec<u32>> {
    match configured {
        Some(LlamaEosToks::Single(id)) => Ok(vec![*id]),
        Some(LlamaEosToks::Multiple(ids)) if !ids.is_empty() => Ok(ids.clone()),
        _ => fallback.map(|id| vec![id]).ok_or_else(|| {
            LlmError::InvalidConfig(
                "no end-of-sequence token in config.json or tokenizer".to_string(),
            )
        }),
    }
}

/// Llama-family model with its tokenizer, loaded once per process.
pub struct CausalLm {
    name: String,
    model: Llama,
    config: Config,
    tokenizer: Tokenizer,
    device: Device,
    dtype: DType,
    eos_token_ids: Vec<u32>,
    generation: GenerationConfig,
}

impl CausalLm {
    /// Load model, tokenizer and weights from `model_dir`.
    ///
    /// # Errors
    /// Returns an error if an artifact is missing or malformed, or if the
    /// weights cannot be placed on the selected device.
    pub fn load(model_dir: &Path, generation: GenerationConfig) -> LlmResult<Self> {
        generation.validate()?;
        let started = Instant::now();

        let artifacts = ModelArtifacts::discover(model_dir)?;
        let device = select_device(generation.device)?;
        let dtype = dtype_for(&device);
        tracing::info!(
            "Loading model from {} on {} ({:?})",
            model_dir.display(),
            device_label(&device),
            dtype
        );

        let llama_config: LlamaConfig = serde_json::from_slice(&std::fs::read(&artifacts.config)?)?;
        let config = llama_config.into_config(false);

        let mut tokenizer =
            Tokenizer::from_file(&artifacts.tokenizer).map_err(|e| LlmError::InvalidArtifact {
                path: artifacts.tokenizer.clone(),
                reason: e.to_string(),
            })?;
        let eos_token_ids = eos_token_ids(
            config.eos_token_id.as_ref(),
            tokenizer.token_to_id(FALLBACK_EOS_TOKEN),
        )?;
        let pad_id = eos_token_ids
            .first()
            .copied()
            .ok_or_else(|| LlmError::InvalidConfig("empty end-of-sequence list".to_string()))?;
        let pad_token = tokenizer
            .id_to_token(pad_id)
            .unwrap_or_else(|| FALLBACK_EOS_TOKEN.to_string());
        tokenizer.with_padding(Some(PaddingParams {
            pad_id,
            pad_token,
            ..PaddingParams::default()
        }));

        let mut tensors = HashMap::new();
        for path in &artifacts.weights {
            tracing::debug!("Reading weights {}", path.display());
            tensors.extend(candle_core::safetensors::load(path, &device)?);
        }
        let vb = VarBuilder::from_tensors(tensors, dtype, &device);
        let model = Llama::load(vb, &config)?;

        let name = model_dir
            .file_name()
            .map_or_else(|| model_dir.display().to_string(), |n| n.to_string_lossy().into_owned());

        tracing::info!(
            "Model {name} loaded in {} ms ({} weight file(s), eos={eos_token_ids:?})",
            started.elapsed().as_millis(),
            artifacts.weights.len()
        );

        Ok(Self {
            name,
            model,
            config,
            tokenizer,
            device,
            dtype,
            eos_token_ids,
            generation,
        })
    }

    /// Run the decoding loop and return prompt plus generated token ids.
    fn generate_tokens(&self, prompt_tokens: Vec<u32>) -> LlmResult<Vec<u32>> {
        let limit = self.config.max_position_embeddings;
        let mut tokens = prompt_tokens;
        let mut cache = Cache::new(true, self.dtype, &self.config, &self.device)?;
        let mut sampler = LogitsProcessor::new(
            self.generation.seed,
            self.generation.temperature,
            self.generation.top_p,
        );
        let mut index_pos = 0_usize;

        for step in 0..self.generation.max_new_tokens {
            if tokens.len() >= limit {
                tracing::debug!("Context window of {limit} tokens reached");
                break;
            }

            // Whole prompt on the first pass, one token at a time afterwards.
            let context_size = if step == 0 { tokens.len() } else { 1 };
            let start = tokens.len() - context_size;
            let input = Tensor::new(&tokens[start..], &self.device)?.unsqueeze(0)?;
            let logits = self.model.forward(&input, index_pos, &mut cache)?;
            let logits = logits.squeeze(0)?.to_dtype(DType::F32)?;
            let logits = if (self.generation.repeat_penalty - 1.0).abs() < f32::EPSILON {
                logits
            } else {
                let window = tokens.len().saturating_sub(self.generation.repeat_last_n);
                apply_repeat_penalty(&logits, self.generation.repeat_penalty, &tokens[window..])?
            };
            index_pos += context_size;

            let next = sampler.sample(&logits)?;
            tokens.push(next);
            if self.eos_token_ids.contains(&next) {
                break;
            }
        }

        Ok(tokens)
    }
}

impl TextGenerator for CausalLm {
    fn complete(&self, prompt: &str) -> LlmResult<String> {
        let started = Instant::now();

        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| LlmError::Tokenizer(e.to_string()))?;
        let prompt_tokens = encoding.get_ids().to_vec();
        let prompt_len = prompt_tokens.len();
        if prompt_len == 0 {
            return Err(LlmError::EmptyPrompt);
        }
        let limit = self.config.max_position_embeddings;
        if prompt_len >= limit {
            return Err(LlmError::ContextOverflow {
                tokens: prompt_len,
                limit,
            });
        }

        let tokens = self.generate_tokens(prompt_tokens)?;
        let text = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(|e| LlmError::Tokenizer(e.to_string()))?;

        tracing::info!(
            prompt_tokens = prompt_len,
            new_tokens = tokens.len() - prompt_len,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Generation finished"
        );

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::llm::config::DevicePreference;

    const VOCAB_SIZE: u32 = 6;

    const WORD_LEVEL_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"<unk>": 0, "the": 1, "cat": 2, "sat": 3, "mat": 4, "</s>": 5},
            "unk_token": "<unk>"
        }
    }"#;

    /// One-layer Llama with zeroed weights, on CPU.
    fn tiny_model(
        max_positions: usize,
        eos_token_ids: Vec<u32>,
        max_new_tokens: usize,
    ) -> Result<CausalLm, Box<dyn std::error::Error>> {
        let llama_config: LlamaConfig = serde_json::from_value(serde_json::json!({
            "hidden_size": 8,
            "intermediate_size": 16,
            "vocab_size": VOCAB_SIZE,
            "num_hidden_layers": 1,
            "num_attention_heads": 2,
            "num_key_value_heads": 2,
            "rms_norm_eps": 1e-5,
            "rope_theta": 10000.0,
            "max_position_embeddings": max_positions,
            "tie_word_embeddings": false
        }))?;
        let config = llama_config.into_config(false);
        let device = Device::Cpu;
        let model = Llama::load(VarBuilder::zeros(DType::F32, &device), &config)?;
        let tokenizer = Tokenizer::from_str(WORD_LEVEL_TOKENIZER)
            .map_err(|e| LlmError::Tokenizer(e.to_string()))?;

        Ok(CausalLm {
            name: "tiny".to_string(),
            model,
            config,
            tokenizer,
            device,
            dtype: DType::F32,
            eos_token_ids,
            generation: GenerationConfig::new()
                .with_max_new_tokens(max_new_tokens)
                .with_device(DevicePreference::Cpu),
        })
    }

    #[test]
    fn test_generation_stops_at_token_budget() -> Result<(), Box<dyn std::error::Error>> {
        let model = tiny_model(64, Vec::new(), 5)?;
        let tokens = model.generate_tokens(vec![1, 2])?;

        assert_eq!(tokens.len(), 2 + 5);
        assert_eq!(&tokens[..2], &[1, 2]);
        assert!(tokens.iter().all(|&id| id < VOCAB_SIZE));
        Ok(())
    }

    #[test]
    fn test_generation_stops_after_eos() -> Result<(), Box<dyn std::error::Error>> {
        // Every id ends the sequence, so decoding stops after one token.
        let model = tiny_model(64, (0..VOCAB_SIZE).collect(), 5)?;
        let tokens = model.generate_tokens(vec![1, 2])?;

        assert_eq!(tokens.len(), 3);
        assert!(model.eos_token_ids.contains(&tokens[2]));
        Ok(())
    }

    #[test]
    fn test_generation_stops_at_context_limit() -> Result<(), Box<dyn std::error::Error>> {
        let model = tiny_model(4, Vec::new(), 10)?;
        let tokens = model.generate_tokens(vec![1, 2])?;

        assert_eq!(tokens.len(), 4);
        Ok(())
    }

    #[test]
    fn test_complete_returns_prompt_and_continuation() -> Result<(), Box<dyn std::error::Error>> {
        let model = tiny_model(64, Vec::new(), 3)?;
        let text = model.complete("the cat")?;

        assert!(text.starts_with("the cat"));
        assert_eq!(text.split_whitespace().count(), 2 + 3);
        assert_eq!(model.model_name(), "tiny");
        Ok(())
    }

    #[test]
    fn test_complete_rejects_prompt_filling_context() -> Result<(), Box<dyn std::error::Error>> {
        let model = tiny_model(4, Vec::new(), 3)?;
        let result = model.complete("the cat sat mat");

        assert!(matches!(
            result,
            Err(LlmError::ContextOverflow {
                tokens: 4,
                limit: 4
            })
        ));
        Ok(())
    }

    #[test]
    fn test_complete_rejects_empty_prompt() -> Result<(), Box<dyn std::error::Error>> {
        let model = tiny_model(64, Vec::new(), 3)?;
        assert!(matches!(model.complete("   "), Err(LlmError::EmptyPrompt)));
        Ok(())
    }

    #[test]
    fn test_load_reports_unreadable_tokenizer() -> LlmResult<()> {
        let dir = tempfile::tempdir()?;
        touch(
            dir.path(),
            CONFIG_FILE,
            r#"{"hidden_size":8,"intermediate_size":16,"vocab_size":6,
                "num_hidden_layers":1,"num_attention_heads":2,"rms_norm_eps":1e-5,
                "eos_token_id":5}"#,
        );
        touch(dir.path(), TOKENIZER_FILE, "not json");
        touch(dir.path(), WEIGHTS_FILE, "");

        let config = GenerationConfig::new().with_device(DevicePreference::Cpu);
        let result = CausalLm::load(dir.path(), config);
        assert!(matches!(
            result,
            Err(LlmError::InvalidArtifact { ref path, .. }) if path.ends_with(TOKENIZER_FILE)
        ));
        assert!(matches!(result, Err(ref e) if e.is_load_error()));
        Ok(())
    }

    fn touch(dir: &Path, name: &str, contents: &str) {
        let written = std::fs::write(dir.join(name), contents);
        assert!(written.is_ok());
    }

    #[test]
    fn test_discover_single_file_weights() -> LlmResult<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), CONFIG_FILE, "{}");
        touch(dir.path(), TOKENIZER_FILE, "{}");
        touch(dir.path(), WEIGHTS_FILE, "");

        let artifacts = ModelArtifacts::discover(dir.path())?;
        assert_eq!(artifacts.config, dir.path().join(CONFIG_FILE));
        assert_eq!(artifacts.weights, vec![dir.path().join(WEIGHTS_FILE)]);
        Ok(())
    }

    #[test]
    fn test_discover_sharded_weights() -> LlmResult<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), CONFIG_FILE, "{}");
        touch(dir.path(), TOKENIZER_FILE, "{}");
        touch(
            dir.path(),
            WEIGHTS_INDEX_FILE,
            r#"{"metadata":{},"weight_map":{
                "a.weight":"model-00002-of-00002.safetensors",
                "b.weight":"model-00001-of-00002.safetensors",
                "c.weight":"model-00001-of-00002.safetensors"}}"#,
        );
        touch(dir.path(), "model-00001-of-00002.safetensors", "");
        touch(dir.path(), "model-00002-of-00002.safetensors", "");

        let artifacts = ModelArtifacts::discover(dir.path())?;
        assert_eq!(
            artifacts.weights,
            vec![
                dir.path().join("model-00001-of-00002.safetensors"),
                dir.path().join("model-00002-of-00002.safetensors"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_discover_missing_tokenizer() -> LlmResult<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), CONFIG_FILE, "{}");

        let result = ModelArtifacts::discover(dir.path());
        assert!(
            matches!(result, Err(LlmError::MissingArtifact(ref p)) if p.ends_with(TOKENIZER_FILE))
        );
        Ok(())
    }

    #[test]
    fn test_discover_missing_shard() -> LlmResult<()> {
        let dir = tempfile::tempdir()?;
        touch(dir.path(), CONFIG_FILE, "{}");
        touch(dir.path(), TOKENIZER_FILE, "{}");
        touch(
            dir.path(),
            WEIGHTS_INDEX_FILE,
            r#"{"weight_map":{"a.weight":"model-00001-of-00001.safetensors"}}"#,
        );

        let result = ModelArtifacts::discover(dir.path());
        assert!(matches!(result, Err(LlmError::MissingArtifact(_))));
        Ok(())
    }

    #[test]
    fn test_load_fails_without_artifacts() {
        let result = CausalLm::load(
            Path::new("/nonexistent/results/final"),
            GenerationConfig::default(),
        );
        assert!(matches!(result, Err(ref e) if e.is_load_error()));
    }

    #[test]
    fn test_load_rejects_invalid_generation_config() {
        let config = GenerationConfig::new().with_max_new_tokens(0);
        let result = CausalLm::load(Path::new("/nonexistent"), config);
        assert!(matches!(result, Err(LlmError::InvalidConfig(_))));
    }

    #[test]
    fn test_eos_from_config() {
        let single = LlamaEosToks::Single(2);
        assert!(matches!(eos_token_ids(Some(&single), None), Ok(ref ids) if ids == &[2]));

        let multiple = LlamaEosToks::Multiple(vec![128_001, 128_009]);
        assert!(
            matches!(eos_token_ids(Some(&multiple), Some(2)), Ok(ref ids) if ids == &[128_001, 128_009])
        );
    }

    #[test]
    fn test_eos_fallback_to_tokenizer() {
        assert!(matches!(eos_token_ids(None, Some(2)), Ok(ref ids) if ids == &[2]));

        let empty = LlamaEosToks::Multiple(Vec::new());
        assert!(matches!(eos_token_ids(Some(&empty), Some(7)), Ok(ref ids) if ids == &[7]));

        assert!(matches!(eos_token_ids(None, None), Err(LlmError::InvalidConfig(_))));
    }
}
