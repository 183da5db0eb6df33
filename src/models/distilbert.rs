use candle_core::{Device, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::{linear, Linear, Module};
use candle_transformers::models::distilbert::{Config, DistilBertModel};
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::error::Result;
use crate::pipelines::sentiment::model::PolarityModel;

use super::{
    encode_batch, load_model_files, load_tokenizer, pad_batch, polarity_indices,
    resolve_pad_token, ClassifierConfigJson,
};

const MODEL_ID: &str = "distilbert-base-uncased-finetuned-sst-2-english";

/// Head dimensions not exposed through the Candle config type.
#[derive(Deserialize)]
struct HeadConfigJson {
    dim: usize,
}

/// DistilBERT fine-tuned on SST-2, producing signed polarity scores.
///
/// The sequence-classification head (pre-classifier, ReLU, classifier over
/// the first token's hidden state) is loaded from the checkpoint alongside
/// the backbone. Polarity is `P(positive) - P(negative)` over the softmax of
/// the two class logits, range `(-1, 1)`.
pub struct DistilBertPolarityModel {
    backbone: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    positive_idx: usize,
    negative_idx: usize,
}

impl DistilBertPolarityModel {
    /// Download (or reuse from the hub cache) and load the SST-2 checkpoint
    /// onto `device`. Fails before any scoring when the weights, tokenizer,
    /// or label map cannot be resolved.
    pub fn new(device: Device) -> Result<Self> {
        let (config_str, vb) = load_model_files(MODEL_ID, &device)?;
        let config: Config = serde_json::from_str(&config_str)?;
        let head: HeadConfigJson = serde_json::from_str(&config_str)?;
        let class_cfg: ClassifierConfigJson = serde_json::from_str(&config_str)?;

        let num_labels = class_cfg.id2label.len().max(2);
        let (positive_idx, negative_idx) = polarity_indices(&class_cfg.id2label)?;

        // Fine-tuned checkpoints prefix the backbone tensors; plain exports don't.
        let backbone = DistilBertModel::load(vb.pp("distilbert"), &config)
            .or_else(|_| DistilBertModel::load(vb.clone(), &config))?;
        let pre_classifier = linear(head.dim, head.dim, vb.pp("pre_classifier"))?;
        let classifier = linear(head.dim, num_labels, vb.pp("classifier"))?;
        let tokenizer = load_tokenizer(MODEL_ID)?;

        Ok(Self {
            backbone,
            pre_classifier,
            classifier,
            tokenizer,
            device,
            positive_idx,
            negative_idx,
        })
    }

    /// Attention mask marking padded key positions, broadcastable over the
    /// `(batch, heads, seq, seq)` attention scores.
    fn padding_mask(&self, attention_mask: &[u32], batch: usize, seq: usize) -> Result<Tensor> {
        let mask: Vec<u8> = attention_mask.iter().map(|&m| u8::from(m == 0)).collect();
        Ok(Tensor::from_vec(mask, (batch, 1, 1, seq), &self.device)?)
    }
}

impl PolarityModel for DistilBertPolarityModel {
    fn name(&self) -> &'static str {
        "distilbert"
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
        let mask = self.padding_mask(&all_attention_masks, batch_size, max_len)?;

        let hidden = self.backbone.forward(&input_ids, &mask)?;
        // Classification reads the first token's hidden state.
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let x = self.pre_classifier.forward(&cls)?.relu()?;
        let logits = self.classifier.forward(&x)?;
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
