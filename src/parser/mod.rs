pub mod assemble;
pub mod dates;
pub mod filter;
pub mod markers;
pub mod sections;

use tracing::debug;

use crate::config::ParseConfig;
use crate::error::ConfigError;
use assemble::Incident;
use markers::MarkerScanner;
use sections::SectionIndex;

/// Four-pass pipeline: markers + headings → filtered markers → incidents.
#[derive(Debug, Clone)]
pub struct IncidentExtractor {
    config: ParseConfig,
    scanner: MarkerScanner,
}

impl IncidentExtractor {
    pub fn new(config: ParseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let scanner = MarkerScanner::new(&config.marker_label, config.collapse_distance);
        Ok(IncidentExtractor { config, scanner })
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn extract(&self, text: &str) -> Vec<Incident> {
        let index = SectionIndex::scan(text, self.config.min_heading_len);
        let markers = self.scanner.scan(text);
        if markers.is_empty() {
            debug!("no boundary markers in document");
            return Vec::new();
        }
        let accepted = filter::filter_markers(text, &markers, &index, &self.scanner, &self.config);
        assemble::assemble(text, &accepted, &index, &self.scanner, &self.config)
    }
}

/// One-shot extraction with an explicit config.
pub fn extract_incidents(text: &str, config: &ParseConfig) -> Result<Vec<Incident>, ConfigError> {
    Ok(IncidentExtractor::new(config.clone())?.extract(text))
}

/// `(start, end)` byte offsets of each line in `text[start..end]`, newline excluded.
pub(crate) fn line_spans(text: &str, start: usize, end: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    let slice = &text[start..end];
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= slice.len() {
            return None;
        }
        let line_end = slice[pos..].find('\n').map_or(slice.len(), |i| pos + i);
        let item = (start + pos, start + line_end);
        pos = line_end + 1;
        Some(item)
    })
}

/// Stray page numbers left by text extraction.
pub(crate) fn is_page_number(line: &str) -> bool {
    (1..=3).contains(&line.len()) && line.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_spans_offsets() {
        let text = "ab\n\ncd\nef";
        let spans: Vec<_> = line_spans(text, 0, text.len()).collect();
        assert_eq!(spans, vec![(0, 2), (3, 3), (4, 6), (7, 9)]);
        let inner: Vec<_> = line_spans(text, 4, 8).collect();
        assert_eq!(inner, vec![(4, 6), (7, 8)]);
    }

    #[test]
    fn page_numbers() {
        assert!(is_page_number("7"));
        assert!(is_page_number("123"));
        assert!(!is_page_number("2019"));
        assert!(!is_page_number(""));
        assert!(!is_page_number("p7"));
    }

    #[test]
    fn resource_links_scenario() {
        let text = "RESOURCE LINKS\nKey Findings (Source)\nACTUAL SECTION\nTitle - Jan 1, 2020\nBody\n(Source)";
        let incidents = extract_incidents(text, &ParseConfig::default()).unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].category, "ACTUAL SECTION");
        assert_eq!(incidents[0].title, "Title - Jan 1, 2020");
        assert_eq!(incidents[0].body, "Body");
    }

    #[test]
    fn no_markers_is_empty_not_error() {
        let incidents = extract_incidents("COVER PAGE\nMonthly bulletin", &ParseConfig::default()).unwrap();
        assert!(incidents.is_empty());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = ParseConfig {
            marker_label: "  ".into(),
            ..ParseConfig::default()
        };
        assert!(IncidentExtractor::new(config).is_err());
    }
}
