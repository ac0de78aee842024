//! Polarity classification behind the [`SentimentClassifier`] seam.
//!
//! [`RemoteClassifier`] sends the sample to a hosted pretrained model;
//! [`LexiconClassifier`] is the offline keyword-based fallback choice. Tests
//! inject their own deterministic implementation.

use std::time::Duration;

use log::info;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "uer/roberta-base-finetuned-dianping-chinese";
const INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
const INFERENCE_TIMEOUT: Duration = Duration::from_secs(300);

pub const POSITIVE: &str = "positive";
pub const NEGATIVE: &str = "negative";

/// Label and confidence for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: String,
    pub score: f64,
}

pub trait SentimentClassifier {
    /// Classify every text; the output is parallel to `texts`.
    fn classify(&self, texts: &[&str]) -> Result<Vec<Sentiment>>;

    fn name(&self) -> &str;
}

// ---- Lexicon ----

const POSITIVE_KW: &[&str] = &[
    "哈哈", "好看", "喜欢", "爱了", "太棒", "好棒", "厉害", "牛", "666", "感动", "泪目",
    "好听", "可爱", "帅", "绝了", "神作", "名场面", "经典", "支持", "加油", "谢谢", "感谢",
    "开心", "高兴", "有趣", "好玩", "期待", "完美", "优秀", "赞", "yyds", "awesome", "great",
    "love", "nice", "good", "cool", "haha", "lol",
];

const NEGATIVE_KW: &[&str] = &[
    "难看", "无聊", "垃圾", "恶心", "讨厌", "失望", "难过", "伤心", "生气", "烦", "差评",
    "尴尬", "离谱", "烂", "退钱", "吐了", "可惜", "害怕", "痛苦", "不行", "不好", "算了",
    "bad", "boring", "hate", "awful", "terrible",
];

/// Keyword counting classifier. Ties (including no hits) lean positive with
/// a score of 0.5.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn classify_one(&self, text: &str) -> Sentiment {
        let lower = text.to_lowercase();
        let hits = |kws: &[&str]| kws.iter().filter(|k| lower.contains(*k)).count();
        let pos = hits(POSITIVE_KW);
        let neg = hits(NEGATIVE_KW);

        let margin = pos.abs_diff(neg) as f64 / (pos + neg + 1) as f64;
        let label = if neg > pos { NEGATIVE } else { POSITIVE };
        Sentiment {
            label: label.to_string(),
            score: 0.5 + 0.5 * margin,
        }
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn classify(&self, texts: &[&str]) -> Result<Vec<Sentiment>> {
        Ok(texts.iter().map(|t| self.classify_one(t)).collect())
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

// ---- Hosted model ----

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a [&'a str],
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Hugging Face inference API client for a text-classification model.
pub struct RemoteClassifier {
    http: Client,
    url: String,
    token: String,
    model: String,
}

impl RemoteClassifier {
    pub fn new(model: &str, token: &str) -> Result<Self> {
        let http = Client::builder().timeout(INFERENCE_TIMEOUT).build()?;
        Ok(Self {
            http,
            url: format!("{INFERENCE_URL}/{model}"),
            token: token.to_string(),
            model: model.to_string(),
        })
    }

    /// Build from `HF_TOKEN` and `DANMAKU_SENTIMENT_MODEL`; `None` when no
    /// token is configured.
    pub fn from_env() -> Option<Result<Self>> {
        let token = std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty())?;
        let model =
            std::env::var("DANMAKU_SENTIMENT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&model, &token))
    }
}

impl SentimentClassifier for RemoteClassifier {
    fn classify(&self, texts: &[&str]) -> Result<Vec<Sentiment>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        info!("Sending {} texts to {}", texts.len(), self.model);
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&InferenceRequest { inputs: texts })
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status,
                url: self.url.clone(),
            });
        }
        let ranked: Vec<Vec<LabelScore>> = response
            .json()
            .map_err(|e| Error::Classifier(format!("unexpected response shape: {e}")))?;
        if ranked.len() != texts.len() {
            return Err(Error::Classifier(format!(
                "{} results for {} texts",
                ranked.len(),
                texts.len()
            )));
        }

        ranked
            .into_iter()
            .map(|candidates| {
                candidates
                    .into_iter()
                    .max_by(|a, b| a.score.total_cmp(&b.score))
                    .map(|best| Sentiment {
                        label: best.label,
                        score: best.score,
                    })
                    .ok_or_else(|| Error::Classifier("empty label list".to_string()))
            })
            .collect()
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_labels_by_keyword_balance() {
        let c = LexiconClassifier;
        assert_eq!(c.classify_one("哈哈哈太好看了").label, POSITIVE);
        assert_eq!(c.classify_one("无聊，垃圾剧情").label, NEGATIVE);
        assert_eq!(c.classify_one("LOL nice").label, POSITIVE);
    }

    #[test]
    fn lexicon_scores_are_confidences() {
        let c = LexiconClassifier;
        let neutral = c.classify_one("第一集");
        assert_eq!(neutral.label, POSITIVE);
        assert_eq!(neutral.score, 0.5);

        let strong = c.classify_one("好看 喜欢 感动");
        assert!(strong.score > 0.5 && strong.score <= 1.0);
    }

    #[test]
    fn batch_output_is_parallel_to_input() {
        let out = LexiconClassifier.classify(&["好看", "垃圾", "嗯"]).unwrap();
        let labels: Vec<&str> = out.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec![POSITIVE, NEGATIVE, POSITIVE]);
    }

    #[test]
    fn remote_request_shape() {
        let body = serde_json::to_value(InferenceRequest {
            inputs: &["a", "b"],
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"inputs": ["a", "b"]}));
    }
}
