use crate::render::{layout_lines, paginate, ReportRenderer, DEFAULT_LINES_PER_PAGE, MIN_LINES_PER_PAGE};
use crate::report::{ReportDocument, Section};

/// Plain-text pages separated by form feeds. Each page body is padded to the
/// same height so footers line up when printed.
#[derive(Debug, Clone)]
pub struct TextReportRenderer {
    lines_per_page: usize,
}

impl Default for TextReportRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LINES_PER_PAGE)
    }
}

impl TextReportRenderer {
    pub fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(MIN_LINES_PER_PAGE),
        }
    }

    pub fn render_string(&self, doc: &ReportDocument) -> String {
        let pages = paginate(doc, self.lines_per_page);
        let mut out = String::new();

        for (idx, page) in pages.iter().enumerate() {
            if idx > 0 {
                out.push('\u{000C}');
            }

            let mut body: Vec<String> = Vec::with_capacity(self.lines_per_page);
            let mut footer: Vec<String> = Vec::new();
            for section in &page.sections {
                match section {
                    Section::PageFooter {
                        page_index,
                        page_count,
                    } => footer.extend(doc.footer.lines(*page_index, *page_count)),
                    other => body.extend(layout_lines(other)),
                }
            }
            body.resize(body.len().max(self.lines_per_page), String::new());
            body.push(String::new());
            body.extend(footer);

            for line in body {
                out.push_str(&line);
                out.push('\n');
            }
        }

        out
    }
}

impl ReportRenderer for TextReportRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn render(&self, doc: &ReportDocument) -> anyhow::Result<Vec<u8>> {
        Ok(self.render_string(doc).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::{ConfidenceLevel, ConfidenceMetric, HistoricalPoint, PredictionPoint};
    use crate::report::compose;
    use chrono::{TimeZone, Utc};

    fn sample(predictions: usize) -> ReportDocument {
        let h = vec![
            HistoricalPoint {
                period: "2024-01".to_string(),
                demand: 100.0,
            },
            HistoricalPoint {
                period: "2024-02".to_string(),
                demand: 110.0,
            },
        ];
        let p: Vec<_> = (0..predictions)
            .map(|i| PredictionPoint {
                period: format!("2024-{:02}", i + 3),
                predicted: 120.0 + 5.0 * i as f64,
                lower_bound: 110.0,
                upper_bound: 140.0 + i as f64,
            })
            .collect();
        let c = ConfidenceMetric::new(ConfidenceLevel::High, 92.0);
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        compose("Papa", &h, &p, Some(&c), at)
    }

    #[test]
    fn renders_sections_and_footer() {
        let text = TextReportRenderer::default().render_string(&sample(2));
        assert!(text.starts_with("AGROPREDICCIÓN\nReporte de Predicción - Papa\n"));
        assert!(text.contains("Generado el: 15 de marzo de 2024"));
        assert!(text.contains("Nivel de Confianza del Modelo: Alta (92%)"));
        assert!(text.contains("Datos históricos analizados: 2 meses"));
        assert!(text.contains("2024-04 | 125.00 TN  | +4.2%  | 110.00 - 141.00 TN"));
        assert!(text.contains("• Cambio proyectado: +11.4%"));
        assert!(text.contains("Página 1 de 1\nAgroPredicción - Sistema de Predicción de Demanda Agrícola\n"));
        assert!(!text.contains('\u{000C}'));
    }

    #[test]
    fn multi_page_output_numbers_every_page() {
        let text = TextReportRenderer::new(12).render_string(&sample(30));
        let pages: Vec<_> = text.split('\u{000C}').collect();
        assert!(pages.len() > 1);
        let n = pages.len();
        for (idx, page) in pages.iter().enumerate() {
            assert!(page.contains(&format!("Página {} de {}", idx + 1, n)));
            assert_eq!(page.lines().count(), 12 + 3);
        }
    }

    #[test]
    fn renderer_metadata() {
        let r = TextReportRenderer::default();
        assert_eq!(r.extension(), "txt");
        assert_eq!(sample(1).suggested_filename(r.extension()), "Prediction_Papa_2024-03-15.txt");
    }
}
