use crate::render::{paginate, Page, ReportRenderer, DEFAULT_LINES_PER_PAGE, MIN_LINES_PER_PAGE};
use crate::report::{ReportDocument, ReportStats};
use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PaginatedReport<'a> {
    filename: String,
    product: &'a str,
    generated_on: NaiveDate,
    stats: &'a ReportStats,
    footer_lines: Vec<[String; 2]>,
    pages: Vec<Page>,
}

/// The paginated layout as JSON, for renderers living outside this process.
#[derive(Debug, Clone)]
pub struct JsonReportRenderer {
    lines_per_page: usize,
}

impl Default for JsonReportRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LINES_PER_PAGE)
    }
}

impl JsonReportRenderer {
    pub fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(MIN_LINES_PER_PAGE),
        }
    }
}

impl ReportRenderer for JsonReportRenderer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render(&self, doc: &ReportDocument) -> anyhow::Result<Vec<u8>> {
        let pages = paginate(doc, self.lines_per_page);
        let page_count = pages.len();
        let out = PaginatedReport {
            filename: doc.suggested_filename(self.extension()),
            product: &doc.product,
            generated_on: doc.generated_on,
            stats: &doc.stats,
            footer_lines: (1..=page_count)
                .map(|idx| doc.footer.lines(idx, page_count))
                .collect(),
            pages,
        };
        serde_json::to_vec_pretty(&out).context("failed to serialize paginated report")
    }
}
