use std::collections::HashMap;

use candle_core::{Device, Tensor, D};
use candle_nn::ops::softmax;
use candle_transformers::models::modernbert::{
    ClassifierConfig, ClassifierPooling, Config,
    ModernBertForSequenceClassification as CandleModernBertForSequenceClassification,
};
use tokenizers::Tokenizer;

use crate::error::Result;
use crate::pipelines::sentiment::model::PolarityModel;

use super::{
    encode_batch, load_model_files, load_tokenizer, pad_batch, polarity_indices,
    resolve_pad_token, ClassifierConfigJson,
};

/// Available ModernBERT model sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModernBertSize {
    /// Base model (~150M parameters).
    Base,
    /// Large model (~400M parameters).
    Large,
}

impl std::fmt::Display for ModernBertSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModernBertSize::Base => "modernbert-base",
            ModernBertSize::Large => "modernbert-large",
        };
        write!(f, "{name}")
    }
}

/// ModernBERT sentiment classifier producing signed polarity scores.
///
/// Polarity is `P(positive) - P(negative)` over the softmax of the
/// classifier logits, so scores fall in `(-1, 1)`.
pub struct ModernBertPolarityModel {
    model: CandleModernBertForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
    positive_idx: usize,
    negative_idx: usize,
}

impl ModernBertPolarityModel {
    /// Download (or reuse from the hub cache) and load the checkpoint for
    /// `size` onto `device`. Fails before any scoring when the weights,
    /// tokenizer, or label map cannot be resolved.
    pub fn new(size: ModernBertSize, device: Device) -> Result<Self> {
        let model_id = match size {
            ModernBertSize::Base => "clapAI/modernBERT-base-multilingual-sentiment",
            ModernBertSize::Large => "clapAI/modernBERT-large-multilingual-sentiment",
        };

        let (config_str, vb) = load_model_files(model_id, &device)?;
        let mut config: Config = serde_json::from_str(&config_str)?;
        let class_cfg: ClassifierConfigJson = serde_json::from_str(&config_str)?;

        let num_labels = class_cfg.label2id.len().max(class_cfg.id2label.len());
        patch_config_num_labels(&mut config, num_labels);

        let (positive_idx, negative_idx) = polarity_indices(&class_cfg.id2label)?;

        let model = CandleModernBertForSequenceClassification::load(vb, &config)?;
        let tokenizer = load_tokenizer(model_id)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            positive_idx,
            negative_idx,
        })
    }
}

impl PolarityModel for ModernBertPolarityModel {
    fn name(&self) -> &'static str {
        "modernbert"
    }

    fn score_batch(&self, texts: &[&str]) -> Result<Vec<f32>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = encode_batch(&self.tokenizer, texts)?;
        let pad_token_id = resolve_pad_token(&self.tokenizer);
        let (all_token_ids, all_attention_masks, max_len) = pad_batch(&encodings, pad_token_id);

        let batch_size = texts.len();
        let input_ids = Tensor::from_vec(all_token_ids, (batch_size, max_len), &self.device)?;
        let attention_mask =
            Tensor::from_vec(all_attention_masks, (batch_size, max_len), &self.device)?;

        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let probs = softmax(&logits, D::Minus1)?.to_vec2::<f32>()?;

        Ok(probs
            .iter()
            .map(|row| {
                row.get(self.positive_idx).copied().unwrap_or(0.0)
                    - row.get(self.negative_idx).copied().unwrap_or(0.0)
            })
            .collect())
    }
}

/// Some sentiment checkpoints ship a config without the classifier label
/// block the Candle loader expects; synthesize one of the right width.
fn patch_config_num_labels(config: &mut Config, num_labels: usize) {
    if config.classifier_config.is_none()
        || config
            .classifier_config
            .as_ref()
            .map(|c| c.id2label.len())
            .unwrap_or(0)
            != num_labels
    {
        let id2label: HashMap<String, String> = (0..num_labels)
            .map(|i| (i.to_string(), format!("label_{i}")))
            .collect();
        let label2id: HashMap<String, String> = id2label
            .iter()
            .map(|(k, v)| (v.clone(), k.clone()))
            .collect();

        config.classifier_config = Some(ClassifierConfig {
            id2label,
            label2id,
            classifier_pooling: ClassifierPooling::default(),
        });
    }
}
