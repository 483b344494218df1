//! Rendering collaborators.
//!
//! Renderers own pagination and the byte format; the report and series
//! themselves stay technology-free.

pub mod chart;
pub mod json;
pub mod text;

use crate::analysis::merge::MergedSeriesPoint;
use crate::report::{ReportDocument, Section};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use chart::{CsvChartRenderer, JsonChartRenderer};
pub use json::JsonReportRenderer;
pub use text::TextReportRenderer;

/// Pages never get smaller than this, so a title block always fits.
pub const MIN_LINES_PER_PAGE: usize = 8;
pub const DEFAULT_LINES_PER_PAGE: usize = 48;

// Title, header row and trailing blank line.
const TABLE_OVERHEAD: usize = 3;

pub trait ReportRenderer: Send + Sync {
    fn extension(&self) -> &'static str;

    fn content_type(&self) -> &'static str;

    fn render(&self, doc: &ReportDocument) -> anyhow::Result<Vec<u8>>;
}

pub trait ChartRenderer: Send + Sync {
    fn extension(&self) -> &'static str;

    fn content_type(&self) -> &'static str;

    fn render_chart(&self, series: &[MergedSeriesPoint]) -> anyhow::Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[value(name = "txt", alias = "text")]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unsupported report format: {other} (expected txt or json)"),
        }
    }
}

impl ReportFormat {
    pub fn renderer(&self, lines_per_page: usize) -> Box<dyn ReportRenderer> {
        match self {
            Self::Text => Box::new(TextReportRenderer::new(lines_per_page)),
            Self::Json => Box::new(JsonReportRenderer::new(lines_per_page)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChartFormat {
    Csv,
    Json,
}

impl FromStr for ChartFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unsupported chart format: {other} (expected csv or json)"),
        }
    }
}

impl ChartFormat {
    pub fn renderer(&self) -> Box<dyn ChartRenderer> {
        match self {
            Self::Csv => Box::new(CsvChartRenderer),
            Self::Json => Box::new(JsonChartRenderer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based.
    pub index: usize,
    /// Body sections followed by exactly one `PageFooter`.
    pub sections: Vec<Section>,
}

/// Plain-text lines of a section body. Footers are laid out by the renderer.
pub fn layout_lines(section: &Section) -> Vec<String> {
    match section {
        Section::TitleBlock {
            brand,
            title,
            generated_label,
            ..
        } => {
            let width = [brand, title, generated_label]
                .iter()
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0);
            vec![
                brand.clone(),
                title.clone(),
                generated_label.clone(),
                "=".repeat(width),
            ]
        }
        Section::ConfidenceSummary {
            heading,
            text,
            months_label,
            ..
        } => vec![
            format!("{heading} {}", text.as_deref().unwrap_or("Sin clasificación")),
            months_label.clone(),
        ],
        Section::Table {
            title,
            columns,
            rows,
            ..
        } => {
            let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
            for row in rows {
                for (idx, cell) in row.iter().enumerate() {
                    if let Some(w) = widths.get_mut(idx) {
                        *w = (*w).max(cell.chars().count());
                    }
                }
            }
            let fmt_row = |cells: &[String]| -> String {
                cells
                    .iter()
                    .enumerate()
                    .map(|(idx, cell)| {
                        let w = widths.get(idx).copied().unwrap_or(0);
                        let pad = w.saturating_sub(cell.chars().count());
                        format!("{cell}{}", " ".repeat(pad))
                    })
                    .collect::<Vec<_>>()
                    .join(" | ")
                    .trim_end()
                    .to_string()
            };

            let mut out = Vec::with_capacity(rows.len() + TABLE_OVERHEAD);
            out.push(title.clone());
            out.push(fmt_row(columns.as_slice()));
            out.extend(rows.iter().map(|r| fmt_row(r.as_slice())));
            out.push(String::new());
            out
        }
        Section::StatBlock { title, lines } => {
            let mut out = Vec::with_capacity(lines.len() + 1);
            out.push(title.clone());
            out.extend(lines.iter().cloned());
            out
        }
        Section::PageFooter { .. } => Vec::new(),
    }
}

/// Splits the document into pages of at most `lines_per_page` body lines.
///
/// Tables may break across pages (the header is repeated on each part);
/// other sections move whole to the next page when they do not fit. Every
/// page ends with one `PageFooter` carrying the final page count. A document
/// always has at least one page.
pub fn paginate(doc: &ReportDocument, lines_per_page: usize) -> Vec<Page> {
    let capacity = lines_per_page.max(MIN_LINES_PER_PAGE);
    let mut pages: Vec<Vec<Section>> = Vec::new();
    let mut current: Vec<Section> = Vec::new();
    let mut used: usize = 0;

    for section in &doc.sections {
        match section {
            Section::Table {
                kind,
                title,
                columns,
                rows,
            } => {
                let mut remaining = rows.as_slice();
                loop {
                    let need = TABLE_OVERHEAD + remaining.len().min(1);
                    if used > 0 && capacity - used < need {
                        pages.push(std::mem::take(&mut current));
                        used = 0;
                    }
                    let fit = remaining.len().min(capacity - used - TABLE_OVERHEAD);
                    current.push(Section::Table {
                        kind: *kind,
                        title: title.clone(),
                        columns: columns.clone(),
                        rows: remaining[..fit].to_vec(),
                    });
                    used += TABLE_OVERHEAD + fit;
                    remaining = &remaining[fit..];
                    if remaining.is_empty() {
                        break;
                    }
                    pages.push(std::mem::take(&mut current));
                    used = 0;
                }
            }
            Section::PageFooter { .. } => {}
            other => {
                let height = layout_lines(other).len();
                if used > 0 && used + height > capacity {
                    pages.push(std::mem::take(&mut current));
                    used = 0;
                }
                current.push(other.clone());
                used += height;
            }
        }
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }

    let page_count = pages.len();
    pages
        .into_iter()
        .enumerate()
        .map(|(idx, mut sections)| {
            sections.push(Section::PageFooter {
                page_index: idx + 1,
                page_count,
            });
            Page {
                index: idx + 1,
                sections,
            }
        })
        .collect()
}
