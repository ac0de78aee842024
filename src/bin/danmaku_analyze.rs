#![forbid(unsafe_code)]
//! # danmaku_analyze
//!
//! Second stage: reads `danmaku.csv` from the working directory and writes
//! the density plot, sentiment pie, word cloud, HTML report and XLSX table.
//!
//! ## Example
//! ```bash
//! HF_TOKEN=... cargo run --release --bin danmaku_analyze -- --font "Noto Sans CJK SC"
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use danmaku_analysis::{
    AnalysisOptions, ChartStyle, LexiconClassifier, ROW_FILE, RemoteClassifier,
    SentimentClassifier, run_analysis,
};
use log::{error, info};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClassifierChoice {
    /// Hosted model when HF_TOKEN is set, keyword lexicon otherwise
    Auto,
    /// Offline keyword lexicon
    Lexicon,
    /// Hosted pretrained model (requires HF_TOKEN)
    Remote,
}

#[derive(Parser)]
#[command(author, version, about = "Analyse a danmaku row file into charts and a report")]
struct Cli {
    /// Row file written by danmaku_fetch
    #[arg(long, default_value = ROW_FILE)]
    input: PathBuf,

    /// Directory for charts, report and spreadsheet
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Maximum number of comments to analyse
    #[arg(long, default_value_t = 1000)]
    sample_size: usize,

    /// Seed for the random sample
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Width of a density bucket in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    bucket_secs: u64,

    /// Number of TextRank keywords
    #[arg(long, default_value_t = 20)]
    top_keywords: usize,

    /// Phrases listed per n-gram size
    #[arg(long, default_value_t = 10)]
    top_memes: usize,

    /// Chart font family (needs CJK glyphs for Chinese text)
    #[arg(long, default_value = "sans-serif")]
    font: String,

    /// Sentiment classifier
    #[arg(long, value_enum, default_value_t = ClassifierChoice::Auto)]
    classifier: ClassifierChoice,
}

fn build_classifier(choice: ClassifierChoice) -> danmaku_analysis::Result<Box<dyn SentimentClassifier>> {
    match (choice, RemoteClassifier::from_env()) {
        (ClassifierChoice::Lexicon, _) | (ClassifierChoice::Auto, None) => {
            info!("Using the keyword lexicon classifier");
            Ok(Box::new(LexiconClassifier))
        }
        (ClassifierChoice::Auto | ClassifierChoice::Remote, Some(remote)) => Ok(Box::new(remote?)),
        (ClassifierChoice::Remote, None) => Err(danmaku_analysis::Error::Classifier(
            "HF_TOKEN is not set".to_string(),
        )),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let options = AnalysisOptions {
        input: cli.input,
        out_dir: cli.out_dir,
        sample_size: cli.sample_size,
        seed: cli.seed,
        bucket_secs: cli.bucket_secs,
        top_keywords: cli.top_keywords,
        top_memes: cli.top_memes,
        chart_style: ChartStyle { family: cli.font },
    };

    // checked before the classifier so a missing file never touches the network
    if !options.input.exists() {
        error!(
            "Error: {} not found. Run danmaku_fetch first to download comments.",
            options.input.display()
        );
        process::exit(1);
    }

    let outcome = build_classifier(cli.classifier).and_then(|c| run_analysis(&options, c.as_ref()));
    match outcome {
        Ok(outcome) => {
            let summary = &outcome.summary;
            println!(
                "Analysed {} of {} comments.",
                summary.comments.len(),
                summary.total_comments
            );
            if let Some(keyword) = summary.keywords.first() {
                println!("Top keyword: {keyword}");
            }
            if let Some(peak) = summary.peaks.first() {
                println!("{}", peak.describe());
            }
            for path in &outcome.artifacts {
                println!("Wrote {}", path.display());
            }
        }
        Err(e) => {
            error!("Error: {e}");
            process::exit(1);
        }
    }
}
