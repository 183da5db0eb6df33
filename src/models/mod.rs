use std::collections::HashMap;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;
use tokenizers::Tokenizer;

use crate::error::{PipelineError, Result};

pub(crate) mod distilbert;
pub(crate) mod modernbert;

pub use distilbert::DistilBertPolarityModel;
pub use modernbert::{ModernBertPolarityModel, ModernBertSize};

/// Classifier label maps as serialized in a checkpoint's `config.json`.
#[derive(Deserialize)]
pub(crate) struct ClassifierConfigJson {
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    #[serde(default)]
    pub label2id: HashMap<String, u32>,
}

pub(crate) fn load_tokenizer(repo_id: &str) -> Result<Tokenizer> {
    let api = Api::new().map_err(|e| {
        PipelineError::BackendUnavailable(format!("failed building hub client: {e}"))
    })?;
    let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));
    let tokenizer_path = repo.get("tokenizer.json").map_err(|e| {
        PipelineError::BackendUnavailable(format!(
            "failed downloading tokenizer for '{repo_id}': {e}"
        ))
    })?;
    let path_str = tokenizer_path.display().to_string();
    Tokenizer::from_file(&tokenizer_path).map_err(|e| {
        PipelineError::Tokenization(format!("Failed to load tokenizer from '{path_str}': {e}"))
    })
}

/// Fetch a checkpoint's raw `config.json` and a mmapped [`VarBuilder`] over
/// its weights, preferring safetensors.
pub(crate) fn load_model_files(
    repo_id: &str,
    device: &Device,
) -> Result<(String, VarBuilder<'static>)> {
    let api = Api::new().map_err(|e| {
        PipelineError::BackendUnavailable(format!("failed building hub client: {e}"))
    })?;
    let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));

    let config_path = repo.get("config.json").map_err(|e| {
        PipelineError::BackendUnavailable(format!("failed downloading config for '{repo_id}': {e}"))
    })?;
    let weights_path = repo
        .get("model.safetensors")
        .or_else(|_| repo.get("pytorch_model.bin"))
        .map_err(|e| {
            PipelineError::BackendUnavailable(format!(
                "failed downloading weights for '{repo_id}': {e}"
            ))
        })?;

    let config_str = std::fs::read_to_string(&config_path)?;

    let vb = if weights_path.extension().is_some_and(|e| e == "safetensors") {
        unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? }
    } else {
        VarBuilder::from_pth(&weights_path, DType::F32, device)?
    };

    Ok((config_str, vb))
}

/// Resolve the (positive, negative) class indices from a checkpoint's
/// `id2label` map. Scoring needs both; a checkpoint without them cannot
/// produce a signed polarity.
pub(crate) fn polarity_indices(id2label: &HashMap<String, String>) -> Result<(usize, usize)> {
    let find = |wanted: &str| -> Option<usize> {
        id2label.iter().find_map(|(id, label)| {
            label
                .eq_ignore_ascii_case(wanted)
                .then(|| id.parse::<usize>().ok())
                .flatten()
        })
    };
    match (find("positive"), find("negative")) {
        (Some(pos), Some(neg)) => Ok((pos, neg)),
        _ => {
            let mut labels: Vec<&str> = id2label.values().map(String::as_str).collect();
            labels.sort_unstable();
            Err(PipelineError::BackendUnavailable(format!(
                "checkpoint labels lack positive/negative classes: [{}]",
                labels.join(", ")
            )))
        }
    }
}

/// Pad a set of encodings to a shared length and stack them into
/// `(input_ids, attention_mask)` vectors for a `(batch, max_len)` tensor.
pub(crate) fn pad_batch(
    encodings: &[tokenizers::Encoding],
    pad_token_id: u32,
) -> (Vec<u32>, Vec<u32>, usize) {
    let max_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
    let mut all_token_ids = Vec::with_capacity(encodings.len() * max_len);
    let mut all_attention_masks = Vec::with_capacity(encodings.len() * max_len);
    for encoding in encodings {
        let mut token_ids = encoding.get_ids().to_vec();
        let mut attention_mask = encoding.get_attention_mask().to_vec();
        token_ids.resize(max_len, pad_token_id);
        attention_mask.resize(max_len, 0);
        all_token_ids.extend(token_ids);
        all_attention_masks.extend(attention_mask);
    }
    (all_token_ids, all_attention_masks, max_len)
}

pub(crate) fn resolve_pad_token(tokenizer: &Tokenizer) -> u32 {
    tokenizer
        .get_padding()
        .map(|p| p.pad_id)
        .or_else(|| tokenizer.token_to_id("<pad>"))
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .unwrap_or(0)
}

pub(crate) fn encode_batch(
    tokenizer: &Tokenizer,
    texts: &[&str],
) -> Result<Vec<tokenizers::Encoding>> {
    texts
        .iter()
        .map(|text| {
            tokenizer.encode(*text, true).map_err(|e| {
                PipelineError::Tokenization(format!(
                    "Tokenization failed on '{}': {}",
                    &text.chars().take(50).collect::<String>(),
                    e
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarity_indices_resolve_case_insensitively() {
        let id2label: HashMap<String, String> = [
            ("0".to_string(), "NEGATIVE".to_string()),
            ("1".to_string(), "POSITIVE".to_string()),
        ]
        .into();
        assert_eq!(polarity_indices(&id2label).unwrap(), (1, 0));
    }

    #[test]
    fn missing_labels_fail_fast() {
        let id2label: HashMap<String, String> = [
            ("0".to_string(), "entailment".to_string()),
            ("1".to_string(), "contradiction".to_string()),
        ]
        .into();
        assert!(matches!(
            polarity_indices(&id2label),
            Err(PipelineError::BackendUnavailable(_))
        ));
    }
}
