//! Report layout plan, independent of any document technology.
//!
//! The composer decides what goes in the report and in what order; a
//! [`crate::render::ReportRenderer`] decides pages and pixels.

pub mod compose;
pub mod format;

use crate::analysis::confidence::DisplayBadge;
use crate::analysis::trend::{TrendResult, DEFAULT_NOISE_FLOOR};
use crate::time::calendar::iso_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use compose::{compose, ReportComposer};

pub const REPORT_BRAND: &str = "AGROPREDICCIÓN";
pub const FOOTER_PAGE_TEMPLATE: &str = "Página {page} de {pages}";
pub const FOOTER_TAGLINE: &str = "AgroPredicción - Sistema de Predicción de Demanda Agrícola";
pub const FILENAME_PREFIX: &str = "Prediction";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Unit suffix for demand values.
    pub unit: String,
    /// How many trailing historical points the recent-demand table shows.
    pub recent_window: usize,
    pub noise_floor: f64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            unit: "TN".to_string(),
            recent_window: 6,
            noise_floor: DEFAULT_NOISE_FLOOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    RecentHistorical,
    Predictions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum Section {
    TitleBlock {
        brand: String,
        title: String,
        product: String,
        generated_on: NaiveDate,
        generated_label: String,
    },
    ConfidenceSummary {
        heading: String,
        badge: Option<DisplayBadge>,
        /// `"<level> (<score>%)"`, absent when no confidence was supplied.
        text: Option<String>,
        historical_months: usize,
        months_label: String,
    },
    Table {
        kind: TableKind,
        title: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    StatBlock {
        title: String,
        lines: Vec<String>,
    },
    PageFooter {
        page_index: usize,
        page_count: usize,
    },
}

impl Section {
    pub fn table(&self, kind: TableKind) -> Option<&[Vec<String>]> {
        match self {
            Section::Table { kind: k, rows, .. } if *k == kind => Some(rows.as_slice()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterTemplate {
    pub page_template: String,
    pub tagline: String,
}

impl Default for FooterTemplate {
    fn default() -> Self {
        Self {
            page_template: FOOTER_PAGE_TEMPLATE.to_string(),
            tagline: FOOTER_TAGLINE.to_string(),
        }
    }
}

impl FooterTemplate {
    /// Footer lines for a 1-based page index.
    pub fn lines(&self, page_index: usize, page_count: usize) -> [String; 2] {
        let page = self
            .page_template
            .replace("{page}", &page_index.to_string())
            .replace("{pages}", &page_count.to_string());
        [page, self.tagline.clone()]
    }
}

/// Raw numbers behind the stat block, before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportStats {
    pub average_prediction: Option<f64>,
    pub last_historical: Option<f64>,
    pub projected_change: Option<TrendResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub product: String,
    pub generated_on: NaiveDate,
    pub sections: Vec<Section>,
    pub stats: ReportStats,
    pub footer: FooterTemplate,
}

impl ReportDocument {
    /// `Prediction_<product>_<YYYY-MM-DD>.<ext>`. The product name is used
    /// verbatim; callers writing to disk must check it with
    /// [`is_path_safe_filename`].
    pub fn suggested_filename(&self, ext: &str) -> String {
        format!(
            "{FILENAME_PREFIX}_{}_{}.{}",
            self.product,
            iso_date(self.generated_on),
            ext.trim_start_matches('.')
        )
    }

    pub fn stat_lines(&self) -> &[String] {
        self.sections
            .iter()
            .find_map(|s| match s {
                Section::StatBlock { lines, .. } => Some(lines.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn table_rows(&self, kind: TableKind) -> &[Vec<String>] {
        self.sections
            .iter()
            .find_map(|s| s.table(kind))
            .unwrap_or(&[])
    }
}

/// False when the name could escape the target directory.
pub fn is_path_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(&['/', '\\', '\0'][..])
}
