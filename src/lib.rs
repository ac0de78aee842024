#![forbid(unsafe_code)]
//! # Danmaku Analysis
//!
//! Two batch stages around one row file:
//!
//! 1. **fetch** resolves a Bilibili URL to a content id, downloads the
//!    comment ("danmaku") feed and writes `danmaku.csv`
//!    (`timestamp,text`, UTF-8 with BOM).
//! 2. **analyze** samples the rows and produces keywords, frequent phrases,
//!    peak moments and sentiment, rendered as three PNG charts, an HTML
//!    report and an XLSX table.
//!
//! Failures at the fetch boundaries are logged and end the run without
//! writing the row file; the analysis stage aborts on the first error.

mod analysis;
mod charts;
mod danmaku_xml;
mod error;
mod fetch;
mod report;
mod resolve;
mod sentiment;
mod store;
mod temporal;
mod text;
mod xlsx;

/// Row file handed from the fetch stage to the analysis stage.
pub const ROW_FILE: &str = "danmaku.csv";

pub use analysis::{
    AnalysisOptions, AnalysisOutcome, AnalysisSummary, AnnotatedComment, REPORT_HTML,
    RESULTS_XLSX, SENTIMENT_PIE_PNG, TIMESERIES_PNG, WORDCLOUD_PNG, run_analysis, sample_records,
    summarize, write_report, write_results_sheet,
};
pub use charts::{
    CLOUD_SIZE, ChartStyle, PlacedWord, layout_cloud, render_sentiment_pie, render_timeseries,
    render_wordcloud,
};
pub use danmaku_xml::parse_comments;
pub use error::{Error, Result};
pub use fetch::{BiliClient, Cid, Endpoints, extract_cid, run_fetch};
pub use report::{ChartFiles, render_html};
pub use resolve::{IdKind, Identifier, resolve_identifier};
pub use sentiment::{
    DEFAULT_MODEL, LexiconClassifier, NEGATIVE, POSITIVE, RemoteClassifier, Sentiment,
    SentimentClassifier,
};
pub use store::{CommentRecord, load_comments, save_comments};
pub use temporal::{MAX_BUCKETS, Peak, bucket_counts, top_buckets};
pub use text::{CLOUD_STOPWORDS, MemeTable, Segmenter, ngram_counts};
pub use xlsx::{Cell, write_sheet};
