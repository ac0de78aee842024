//! Chinese segmentation and the counting stages built on it: TextRank
//! keywords, n-gram memes, and word-cloud frequencies.

use std::collections::{HashMap, HashSet};

use jieba_rs::{Jieba, KeywordExtract, TextRank};
use log::info;
use serde::Serialize;

/// Words dropped from the word cloud on top of single characters.
pub const CLOUD_STOPWORDS: &[&str] = &["的", "了", "是", "我", "在", "也", "啊", "吗", "哈"];

/// Parts of speech TextRank keeps: place names, nouns, verbal nouns, verbs.
const KEYWORD_POS: &[&str] = &["ns", "n", "vn", "v"];

/// Most frequent phrases of one n-gram size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemeTable {
    pub n: usize,
    pub phrases: Vec<(String, usize)>,
}

/// Owns the jieba dictionary; build once per run.
pub struct Segmenter {
    jieba: Jieba,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Segment `text` and keep tokens longer than one character.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.jieba
            .cut(text, true)
            .into_iter()
            .filter(|w| w.chars().count() > 1)
            .map(String::from)
            .collect()
    }

    /// Top `top_k` TextRank terms over all `texts` joined into one corpus.
    pub fn extract_keywords(&self, texts: &[&str], top_k: usize) -> Vec<String> {
        info!("Extracting top {top_k} keywords");
        let corpus = texts.join(" ");
        let allowed = KEYWORD_POS.iter().map(|p| p.to_string()).collect();
        TextRank::default()
            .extract_keywords(&self.jieba, &corpus, top_k, allowed)
            .into_iter()
            .map(|k| k.keyword)
            .collect()
    }

    /// Frequent 2- and 3-token phrases. Each text is segmented on its own so
    /// phrases never span two comments. Sizes without any phrase are omitted.
    pub fn find_memes(&self, texts: &[&str], top: usize) -> Vec<MemeTable> {
        info!("Discovering frequent phrases");
        let token_lists: Vec<Vec<String>> = texts.iter().map(|t| self.tokens(t)).collect();
        [2, 3]
            .into_iter()
            .filter_map(|n| {
                let mut phrases = ngram_counts(&token_lists, n);
                if phrases.is_empty() {
                    return None;
                }
                phrases.truncate(top);
                Some(MemeTable { n, phrases })
            })
            .collect()
    }

    /// Word frequencies for the cloud: whole corpus, stop words and single
    /// characters removed, single words only.
    pub fn word_frequencies(&self, texts: &[&str]) -> Vec<(String, usize)> {
        let stop: HashSet<&str> = CLOUD_STOPWORDS.iter().copied().collect();
        let corpus = texts.join(" ");
        let words: Vec<String> = self
            .tokens(&corpus)
            .into_iter()
            .filter(|w| !stop.contains(w.as_str()))
            .collect();
        count_in_order(words.iter().map(String::as_str))
    }
}

/// Count contiguous `n`-grams (tokens concatenated without separator) within
/// each token list, sorted by descending count. Equal counts keep the order
/// in which the phrase first appeared.
///
/// # Example
/// ```
/// use danmaku_analysis::ngram_counts;
/// let tokens = vec!["我", "爱", "学习", "我", "爱", "学习"]
///     .into_iter()
///     .map(String::from)
///     .collect::<Vec<_>>();
/// let counted = ngram_counts(&[tokens], 2);
/// assert_eq!(counted[0], ("我爱".to_string(), 2));
/// ```
pub fn ngram_counts(token_lists: &[Vec<String>], n: usize) -> Vec<(String, usize)> {
    if n == 0 {
        return Vec::new();
    }
    let grams: Vec<String> = token_lists
        .iter()
        .flat_map(|tokens| tokens.windows(n).map(|w| w.concat()))
        .collect();
    count_in_order(grams.iter().map(String::as_str))
}

/// Frequency count sorted by descending count, ties in first-seen order.
pub(crate) fn count_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counted: Vec<(String, usize)> = Vec::new();
    for item in items {
        match index.get(item) {
            Some(&i) => counted[i].1 += 1,
            None => {
                index.insert(item, counted.len());
                counted.push((item.to_string(), 1));
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted
}
