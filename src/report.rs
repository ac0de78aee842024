use std::fmt::Write as _;

use quick_xml::escape::escape;

use crate::analysis::AnalysisSummary;
use crate::temporal::Peak;

/// File names of the three chart images, relative to the report.
pub struct ChartFiles<'a> {
    pub timeseries: &'a str,
    pub sentiment_pie: &'a str,
    pub wordcloud: &'a str,
}

const STYLE: &str = r#"
body { font-family: 'Microsoft YaHei', 'PingFang SC', sans-serif; margin: 20px; background-color: #f4f4f9; }
h1, h2, h3 { color: #333; border-bottom: 2px solid #4a90e2; padding-bottom: 10px; }
.container { max-width: 1200px; margin: auto; background-color: #fff; padding: 20px; box-shadow: 0 0 10px rgba(0,0,0,0.1); border-radius: 8px; }
.section { padding: 20px; margin-bottom: 20px; border-radius: 8px; }
.flex-container { display: flex; flex-wrap: wrap; gap: 20px; align-items: flex-start; }
.flex-item { flex: 1; min-width: 400px; }
.meta { color: #777; font-size: 0.9em; }
.dataframe { border-collapse: collapse; width: 100%; }
.dataframe th, .dataframe td { border: 1px solid #ccc; padding: 8px; text-align: left; }
.dataframe th { background-color: #4a90e2; color: white; }
img { max-width: 100%; height: auto; display: block; margin: 20px auto; border: 1px solid #ddd; border-radius: 4px; }
"#;

/// Render the whole report as one HTML document with embedded styling.
pub fn render_html(summary: &AnalysisSummary, charts: &ChartFiles<'_>) -> String {
    let keywords = list_items(summary.keywords.iter().map(String::as_str));
    let descriptions: Vec<String> = summary.peaks.iter().map(Peak::describe).collect();
    let moments = list_items(descriptions.iter().map(String::as_str));

    let mut memes = String::new();
    for table in &summary.memes {
        let _ = write!(memes, "<h4>Top {} {}-word phrases</h4><ul>", table.phrases.len(), table.n);
        for (phrase, count) in &table.phrases {
            let _ = write!(memes, "<li>'{}' appeared {count} times</li>", escape(phrase.as_str()));
        }
        memes.push_str("</ul>");
    }
    if memes.is_empty() {
        memes.push_str("<p>No repeated phrases found.</p>");
    }

    let language = summary
        .language
        .as_deref()
        .map(|l| format!(" &middot; dominant language: {}", escape(l)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="UTF-8">
<title>Bilibili Danmaku Analysis Report</title>
<style>{STYLE}</style>
</head>
<body>
<div class="container">
<h1>Bilibili Danmaku Analysis Report</h1>
<p class="meta">{sampled} of {total} comments analysed &middot; classifier: {classifier}{language}</p>
<div class="section">
<h2>1. Audience mood and hot spots</h2>
<div class="flex-container">
<div class="flex-item">
<h3>Sentiment distribution</h3>
<img src="{pie}" alt="Sentiment distribution pie chart">
</div>
<div class="flex-item">
<h3>Top 3 peak moments</h3>
<p>Comment density pinpoints the moments with the most audience interaction:</p>
<ul>{moments}</ul>
</div>
</div>
</div>
<div class="section">
<h2>2. Core topics</h2>
<div class="flex-container">
<div class="flex-item">
<h3>Word cloud</h3>
<img src="{cloud}" alt="Comment word cloud">
</div>
<div class="flex-item">
<h3>Top {keyword_count} keywords</h3>
<ul>{keywords}</ul>
<h3>Community memes</h3>
{memes}
</div>
</div>
</div>
<div class="section">
<h2>3. Peak moments in detail</h2>
<img src="{timeseries}" alt="Comment density over time">
</div>
<div class="section">
<h2>4. Comment data with sentiment</h2>
{table}
</div>
<p class="meta">Generated {generated}</p>
</div>
</body>
</html>
"#,
        sampled = summary.comments.len(),
        total = summary.total_comments,
        classifier = escape(summary.classifier.as_str()),
        pie = escape(charts.sentiment_pie),
        cloud = escape(charts.wordcloud),
        timeseries = escape(charts.timeseries),
        keyword_count = summary.keywords.len(),
        table = comment_table(summary),
        generated = summary.generated_at,
    )
}

fn list_items<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .map(|item| format!("<li>{}</li>", escape(item)))
        .collect()
}

fn comment_table(summary: &AnalysisSummary) -> String {
    let mut out = String::from(
        "<table class=\"dataframe\"><thead><tr><th>timestamp</th><th>text</th>\
         <th>sentiment_label</th><th>sentiment_score</th></tr></thead><tbody>",
    );
    for c in &summary.comments {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.4}</td></tr>",
            c.timestamp,
            escape(c.text.as_str()),
            escape(c.sentiment.label.as_str()),
            c.sentiment.score
        );
    }
    out.push_str("</tbody></table>");
    out
}
