//! PNG charts: comment density with peak markers, sentiment pie, word cloud.
//!
//! All text goes through [`ChartStyle`] so the font family is set once per
//! run instead of through global plotting state. The family must cover CJK
//! glyphs for Chinese comments to render.

use std::error::Error as StdError;
use std::path::Path;

use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{Error, Result};
use crate::temporal::Peak;

type DrawResult<T> = std::result::Result<T, Box<dyn StdError>>;

const LINE_COLOR: RGBColor = RGBColor(30, 144, 255);
const PIE_COLORS: &[RGBColor] = &[
    RGBColor(240, 128, 128),
    RGBColor(135, 206, 250),
    RGBColor(144, 238, 144),
    RGBColor(255, 215, 0),
    RGBColor(221, 160, 221),
];
const CLOUD_COLORS: &[RGBColor] = &[
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(230, 159, 0),
    RGBColor(213, 94, 0),
];

pub const CLOUD_SIZE: (u32, u32) = (1000, 700);
const CLOUD_MAX_WORDS: usize = 200;
const CLOUD_MIN_FONT: u32 = 12;
const CLOUD_MAX_FONT: u32 = 110;

#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub family: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
        }
    }
}

impl ChartStyle {
    fn font(&self, size: f64) -> FontDesc<'_> {
        (self.family.as_str(), size).into_font()
    }
}

fn chart_err(e: Box<dyn StdError>) -> Error {
    Error::Chart(e.to_string())
}

// ---- Density line plot ----

/// Line plot of comments per bucket with a red marker at each peak.
pub fn render_timeseries(
    counts: &[usize],
    bucket_secs: u64,
    peaks: &[Peak],
    path: &Path,
    style: &ChartStyle,
) -> Result<()> {
    draw_timeseries(counts, bucket_secs, peaks, path, style).map_err(chart_err)
}

fn draw_timeseries(
    counts: &[usize],
    bucket_secs: u64,
    peaks: &[Peak],
    path: &Path,
    style: &ChartStyle,
) -> DrawResult<()> {
    let root = BitMapBackend::new(path, (1500, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = (counts.len().max(1) as u64 * bucket_secs) as f64;
    let y_max = counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.2;

    let mut chart = ChartBuilder::on(&root)
        .caption("Comment density and peak moments", style.font(32.0))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("video time (s)")
        .y_desc(format!("comments per {bucket_secs}s"))
        .label_style(style.font(16.0))
        .draw()?;

    let points = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| ((i as u64 * bucket_secs) as f64, c as f64));
    chart
        .draw_series(LineSeries::new(points, LINE_COLOR.stroke_width(2)))?
        .label(format!("comments / {bucket_secs}s"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LINE_COLOR));

    for peak in peaks {
        let x = peak.start as f64;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, 0.0), (x, y_max)],
            RED.mix(0.8),
        )))?;
        chart.draw_series(std::iter::once(Text::new(
            format!(" Top {} ({})", peak.rank, peak.count),
            (x, peak.count as f64),
            style.font(18.0).color(&RED),
        )))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(style.font(16.0))
        .draw()?;

    root.present()?;
    Ok(())
}

// ---- Sentiment pie ----

/// Pie of label counts with percentage annotations.
pub fn render_sentiment_pie(
    label_counts: &[(String, usize)],
    path: &Path,
    style: &ChartStyle,
) -> Result<()> {
    draw_pie(label_counts, path, style).map_err(chart_err)
}

fn draw_pie(label_counts: &[(String, usize)], path: &Path, style: &ChartStyle) -> DrawResult<()> {
    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Comment sentiment distribution", style.font(30.0))?;

    if label_counts.is_empty() {
        root.present()?;
        return Ok(());
    }

    let (w, h) = root.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.35;
    let sizes: Vec<f64> = label_counts.iter().map(|(_, c)| *c as f64).collect();
    let labels: Vec<String> = label_counts.iter().map(|(l, _)| l.clone()).collect();
    let colors: Vec<RGBColor> = (0..label_counts.len())
        .map(|i| PIE_COLORS[i % PIE_COLORS.len()])
        .collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(140.0);
    pie.label_style(style.font(22.0).color(&BLACK));
    pie.percentages(style.font(20.0).color(&BLACK));
    root.draw(&pie)?;

    root.present()?;
    Ok(())
}

// ---- Word cloud ----

/// A word with its font size and top-left corner on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub word: String,
    pub size: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PlacedWord {
    fn overlaps(&self, x: i32, y: i32, w: u32, h: u32) -> bool {
        x < self.x + self.width as i32
            && self.x < x + w as i32
            && y < self.y + self.height as i32
            && self.y < y + h as i32
    }
}

/// Place words by descending frequency along a spiral from the centre.
/// Font size scales with the square root of relative frequency; a word that
/// fits nowhere is retried smaller and dropped at the minimum size.
///
/// `measure(word, size)` returns the rendered `(width, height)`.
pub fn layout_cloud<F>(freqs: &[(String, usize)], canvas: (u32, u32), mut measure: F) -> Vec<PlacedWord>
where
    F: FnMut(&str, u32) -> (u32, u32),
{
    let Some(max) = freqs.iter().map(|(_, c)| *c).max().filter(|m| *m > 0) else {
        return Vec::new();
    };

    let mut placed: Vec<PlacedWord> = Vec::new();
    for (word, count) in freqs.iter().take(CLOUD_MAX_WORDS) {
        let ratio = (*count as f64 / max as f64).sqrt();
        let mut size =
            CLOUD_MIN_FONT + ((CLOUD_MAX_FONT - CLOUD_MIN_FONT) as f64 * ratio).round() as u32;
        loop {
            let (w, h) = measure(word, size);
            if let Some((x, y)) = find_spot(w, h, canvas, &placed) {
                placed.push(PlacedWord {
                    word: word.clone(),
                    size,
                    x,
                    y,
                    width: w,
                    height: h,
                });
                break;
            }
            if size <= CLOUD_MIN_FONT {
                break;
            }
            size = (size * 4 / 5).max(CLOUD_MIN_FONT);
        }
    }
    placed
}

fn find_spot(w: u32, h: u32, canvas: (u32, u32), placed: &[PlacedWord]) -> Option<(i32, i32)> {
    let (cw, ch) = canvas;
    if w > cw || h > ch {
        return None;
    }
    let cx = (cw - w) as f64 / 2.0;
    let cy = (ch - h) as f64 / 2.0;
    let reach = f64::from(cw.max(ch));

    let mut t = 0.0f64;
    while 1.5 * t <= reach {
        let r = 1.5 * t;
        let x = (cx + r * t.cos()).round() as i32;
        let y = (cy + r * t.sin()).round() as i32;
        let inside = x >= 0 && y >= 0 && x as u32 + w <= cw && y as u32 + h <= ch;
        if inside && !placed.iter().any(|p| p.overlaps(x, y, w, h)) {
            return Some((x, y));
        }
        t += 0.05;
    }
    None
}

/// Frequency-weighted word cloud on a white canvas.
pub fn render_wordcloud(freqs: &[(String, usize)], path: &Path, style: &ChartStyle) -> Result<()> {
    draw_wordcloud(freqs, path, style).map_err(chart_err)
}

fn draw_wordcloud(freqs: &[(String, usize)], path: &Path, style: &ChartStyle) -> DrawResult<()> {
    let root = BitMapBackend::new(path, CLOUD_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let placed = layout_cloud(freqs, CLOUD_SIZE, |word, size| {
        root.estimate_text_size(word, &TextStyle::from(style.font(f64::from(size))))
            .unwrap_or_else(|_| (word.chars().count() as u32 * size, size))
    });

    let anchor = Pos::new(HPos::Left, VPos::Top);
    for (i, word) in placed.iter().enumerate() {
        let color = CLOUD_COLORS[i % CLOUD_COLORS.len()];
        let text_style = style
            .font(f64::from(word.size))
            .color(&color)
            .pos(anchor);
        root.draw(&Text::new(word.word.as_str(), (word.x, word.y), text_style))?;
    }

    root.present()?;
    Ok(())
}
