//! The analysis stage: row file in, charts + HTML report + spreadsheet out.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::charts::{ChartStyle, render_sentiment_pie, render_timeseries, render_wordcloud};
use crate::error::{Error, Result};
use crate::report::{ChartFiles, render_html};
use crate::sentiment::{Sentiment, SentimentClassifier};
use crate::store::{CommentRecord, load_comments};
use crate::temporal::{Peak, bucket_counts, top_buckets};
use crate::text::{MemeTable, Segmenter, count_in_order};
use crate::xlsx::{Cell, write_sheet};

pub const TIMESERIES_PNG: &str = "danmaku_timeseries_plot.png";
pub const SENTIMENT_PIE_PNG: &str = "danmaku_sentiment_pie_chart.png";
pub const WORDCLOUD_PNG: &str = "danmaku_wordcloud.png";
pub const REPORT_HTML: &str = "Bilibili_Danmaku_Analysis_Report.html";
pub const RESULTS_XLSX: &str = "danmaku_analysis_results.xlsx";

const PEAK_COUNT: usize = 3;

/// Options for one analysis run. `Default` reproduces the no-argument CLI.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub sample_size: usize,
    pub seed: u64,
    pub bucket_secs: u64,
    pub top_keywords: usize,
    pub top_memes: usize,
    pub chart_style: ChartStyle,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(crate::ROW_FILE),
            out_dir: PathBuf::from("."),
            sample_size: 1000,
            seed: 42,
            bucket_secs: 10,
            top_keywords: 20,
            top_memes: 10,
            chart_style: ChartStyle::default(),
        }
    }
}

/// A sampled comment with its sentiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedComment {
    pub timestamp: f64,
    pub text: String,
    pub sentiment: Sentiment,
}

/// Everything the report shows.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_comments: usize,
    pub classifier: String,
    pub language: Option<String>,
    pub keywords: Vec<String>,
    pub memes: Vec<MemeTable>,
    pub bucket_counts: Vec<usize>,
    pub peaks: Vec<Peak>,
    pub sentiment_counts: Vec<(String, usize)>,
    pub comments: Vec<AnnotatedComment>,
    pub generated_at: String,
}

/// Summary plus the paths of every artifact written.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub summary: AnalysisSummary,
    pub artifacts: Vec<PathBuf>,
}

/// At most `size` records in a seeded random order. Inputs below the cap are
/// still shuffled, so the annotated table never follows file order.
pub fn sample_records(mut records: Vec<CommentRecord>, size: usize, seed: u64) -> Vec<CommentRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    records.shuffle(&mut rng);
    records.truncate(size);
    records
}

/// Classify, extract and count. Writes nothing.
pub fn summarize(
    records: Vec<CommentRecord>,
    options: &AnalysisOptions,
    classifier: &dyn SentimentClassifier,
    segmenter: &Segmenter,
) -> Result<AnalysisSummary> {
    let total_comments = records.len();
    let sample = sample_records(records, options.sample_size, options.seed);
    info!("Analysing {} of {total_comments} comments", sample.len());

    let texts: Vec<&str> = sample.iter().map(|r| r.text.as_str()).collect();

    info!("Classifying sentiment with {}", classifier.name());
    let sentiments = classifier.classify(&texts)?;
    if sentiments.len() != texts.len() {
        return Err(Error::Classifier(format!(
            "{} labels for {} comments",
            sentiments.len(),
            texts.len()
        )));
    }

    let keywords = segmenter.extract_keywords(&texts, options.top_keywords);
    let memes = segmenter.find_memes(&texts, options.top_memes);

    info!("Computing comment density");
    let timestamps: Vec<f64> = sample.iter().map(|r| r.timestamp).collect();
    let counts = bucket_counts(&timestamps, options.bucket_secs)?;
    let peaks = top_buckets(&counts, options.bucket_secs, PEAK_COUNT);

    let sentiment_counts = count_in_order(sentiments.iter().map(|s| s.label.as_str()));
    let language = whatlang::detect(&texts.join(" ")).map(|info| info.lang().eng_name().to_string());

    let comments = sample
        .into_iter()
        .zip(sentiments)
        .map(|(r, sentiment)| AnnotatedComment {
            timestamp: r.timestamp,
            text: r.text,
            sentiment,
        })
        .collect();

    Ok(AnalysisSummary {
        total_comments,
        classifier: classifier.name().to_string(),
        language,
        keywords,
        memes,
        bucket_counts: counts,
        peaks,
        sentiment_counts,
        comments,
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

/// Run the whole stage. A missing row file fails before anything is written;
/// any later failure aborts the run.
pub fn run_analysis(
    options: &AnalysisOptions,
    classifier: &dyn SentimentClassifier,
) -> Result<AnalysisOutcome> {
    let records = load_comments(&options.input)?;
    info!("Loaded {} comments from {}", records.len(), options.input.display());

    let segmenter = Segmenter::new();
    let summary = summarize(records, options, classifier, &segmenter)?;
    let out = options.out_dir.as_path();
    fs::create_dir_all(out)?;
    let style = &options.chart_style;
    let mut artifacts = Vec::new();

    info!("Rendering density plot");
    let path = out.join(TIMESERIES_PNG);
    render_timeseries(&summary.bucket_counts, options.bucket_secs, &summary.peaks, &path, style)?;
    artifacts.push(path);

    info!("Rendering sentiment pie chart");
    let path = out.join(SENTIMENT_PIE_PNG);
    render_sentiment_pie(&summary.sentiment_counts, &path, style)?;
    artifacts.push(path);

    info!("Rendering word cloud");
    let texts: Vec<&str> = summary.comments.iter().map(|c| c.text.as_str()).collect();
    let path = out.join(WORDCLOUD_PNG);
    render_wordcloud(&segmenter.word_frequencies(&texts), &path, style)?;
    artifacts.push(path);

    artifacts.push(write_report(&summary, out)?);
    artifacts.push(write_results_sheet(&summary, out)?);

    Ok(AnalysisOutcome { summary, artifacts })
}

/// Write the HTML report next to the chart images.
pub fn write_report(summary: &AnalysisSummary, out_dir: &Path) -> Result<PathBuf> {
    info!("Writing HTML report");
    let html = render_html(
        summary,
        &ChartFiles {
            timeseries: TIMESERIES_PNG,
            sentiment_pie: SENTIMENT_PIE_PNG,
            wordcloud: WORDCLOUD_PNG,
        },
    );
    let path = out_dir.join(REPORT_HTML);
    fs::write(&path, html)?;
    Ok(path)
}

/// Write the annotated comment table as a spreadsheet.
pub fn write_results_sheet(summary: &AnalysisSummary, out_dir: &Path) -> Result<PathBuf> {
    info!("Writing spreadsheet export");
    let rows: Vec<Vec<Cell>> = summary
        .comments
        .iter()
        .map(|c| {
            vec![
                Cell::Number(c.timestamp),
                Cell::Text(c.text.clone()),
                Cell::Text(c.sentiment.label.clone()),
                Cell::Number(c.sentiment.score),
            ]
        })
        .collect();
    let path = out_dir.join(RESULTS_XLSX);
    write_sheet(
        &path,
        "danmaku",
        &["timestamp", "text", "sentiment_label", "sentiment_score"],
        &rows,
    )?;
    Ok(path)
}
