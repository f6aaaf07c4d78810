use tracing::debug;

use super::dates;
use super::line_spans;

/// Category given to incidents that precede every heading.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub offset: usize,
    pub name: String,
}

/// Ordered heading list; each heading governs the text up to the next one.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    headings: Vec<Heading>,
}

impl SectionIndex {
    /// Scan every line of `text` for all-caps section headings. A heading that
    /// repeats the previous one is dropped even when incidents lie between the
    /// two; the category in force over that text is the same name either way.
    pub fn scan(text: &str, min_heading_len: usize) -> Self {
        let mut headings: Vec<Heading> = Vec::new();

        for (start, end) in line_spans(text, 0, text.len()) {
            let line = &text[start..end];
            if !is_heading_line(line, min_heading_len) {
                continue;
            }
            let name = normalize(line);
            // Running page headers repeat the section name on every page.
            if headings.last().is_some_and(|h| h.name == name) {
                continue;
            }
            let offset = start + (line.len() - line.trim_start().len());
            headings.push(Heading { offset, name });
        }

        debug!(headings = headings.len(), "scanned section headings");
        SectionIndex { headings }
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// End of the range governed by heading `idx`.
    pub fn range_end(&self, idx: usize, doc_len: usize) -> usize {
        self.headings.get(idx + 1).map_or(doc_len, |h| h.offset)
    }

    /// Category in force at `offset`: the last heading starting at or before it.
    pub fn category_at(&self, offset: usize) -> &str {
        let idx = self.headings.partition_point(|h| h.offset <= offset);
        match idx {
            0 => UNCATEGORIZED,
            i => &self.headings[i - 1].name,
        }
    }
}

/// A heading is a line without lowercase letters that starts with an uppercase
/// letter and does not itself end in a date suffix (an all-caps dated line is
/// an incident title).
pub fn is_heading_line(line: &str, min_len: usize) -> bool {
    let line = line.trim();
    if line.chars().count() < min_len {
        return false;
    }
    let starts_upper = line.chars().next().is_some_and(|c| c.is_uppercase());
    starts_upper
        && line.chars().all(is_heading_char)
        && !dates::ends_with_date(line)
}

fn is_heading_char(c: char) -> bool {
    (c.is_alphabetic() && !c.is_lowercase())
        || c.is_ascii_digit()
        || c.is_whitespace()
        || c.is_ascii_punctuation()
        || matches!(c, '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{2013}' | '\u{2014}')
}

fn normalize(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_lines() {
        assert!(is_heading_line("BANKING / FINANCIAL INSTITUTIONS", 5));
        assert!(is_heading_line("  STATE \u{2013} LOCAL GOVERNMENTS  ", 5));
        assert!(is_heading_line("EMPLOYEES\u{2019} CREDIT UNIONS", 5));
        assert!(is_heading_line("COVID-19 FRAUD", 5));
    }

    #[test]
    fn non_heading_lines() {
        assert!(!is_heading_line("Banking / Financial Institutions", 5));
        assert!(!is_heading_line("12", 5));
        assert!(!is_heading_line("FBI", 5));
        assert!(!is_heading_line("(SOURCE)", 5));
        assert!(!is_heading_line("", 5));
        // All-caps incident title with a date suffix
        assert!(!is_heading_line("CFO CHARGED WITH WIRE FRAUD - MAY 5, 2020", 5));
        assert!(!is_heading_line("TELLER ARRESTED - 2019", 5));
    }

    #[test]
    fn headings_are_normalized_and_deduplicated() {
        let text = "COVER\nBANKING   /  FINANCE\ntext\nBANKING / FINANCE\nmore\nRETAIL\n";
        let index = SectionIndex::scan(text, 5);
        let names: Vec<&str> = index.headings().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["COVER", "BANKING / FINANCE", "RETAIL"]);
        assert_eq!(index.headings()[1].offset, 6);
        assert!(index.headings().windows(2).all(|w| w[0].offset < w[1].offset));
    }

    #[test]
    fn repeated_heading_after_incident_keeps_category() {
        let text = "BANKING\nTeller steals - 2019\nBody.\n(Source)\n7\nBANKING\nLoan fraud - 2020\n";
        let index = SectionIndex::scan(text, 5);
        assert_eq!(index.headings().len(), 1);
        assert_eq!(index.category_at(text.find("Loan").unwrap()), "BANKING");
        assert_eq!(index.range_end(0, text.len()), text.len());
    }

    #[test]
    fn category_resolution() {
        let index = SectionIndex {
            headings: vec![
                Heading { offset: 100, name: "FIRST".into() },
                Heading { offset: 500, name: "SECOND".into() },
            ],
        };
        assert_eq!(index.category_at(150), "FIRST");
        assert_eq!(index.category_at(299), "FIRST");
        assert_eq!(index.category_at(100), "FIRST");
        assert_eq!(index.category_at(500), "SECOND");
        assert_eq!(index.category_at(10), UNCATEGORIZED);
        assert_eq!(index.range_end(0, 900), 500);
        assert_eq!(index.range_end(1, 900), 900);
    }

    #[test]
    fn empty_document() {
        let index = SectionIndex::scan("", 5);
        assert!(index.headings().is_empty());
        assert_eq!(index.category_at(0), UNCATEGORIZED);
    }
}
