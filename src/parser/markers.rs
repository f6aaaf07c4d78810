use regex::Regex;
use tracing::debug;

/// One boundary token occurrence, `[start, end)` in document byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub start: usize,
    pub end: usize,
    pub raw: String,
}

/// Finds parenthesized boundary labels such as `(Source)`, `( Source )`,
/// `(SOURCE\n)`, tolerating any whitespace run inside the parentheses.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    re: Regex,
    collapse_distance: usize,
}

impl MarkerScanner {
    pub fn new(label: &str, collapse_distance: usize) -> Self {
        let pattern = format!(r"(?i)\(\s*{}\s*\)", regex::escape(label.trim()));
        // The label is escaped, so the pattern is always valid.
        let re = Regex::new(&pattern).expect("escaped marker pattern");
        MarkerScanner {
            re,
            collapse_distance,
        }
    }

    /// All occurrences in document order, with doubled markers merged.
    pub fn scan(&self, text: &str) -> Vec<Marker> {
        let raw: Vec<Marker> = self
            .re
            .find_iter(text)
            .map(|m| Marker {
                start: m.start(),
                end: m.end(),
                raw: m.as_str().to_string(),
            })
            .collect();
        let merged = collapse(text, &raw, self.collapse_distance);
        debug!(raw = raw.len(), merged = merged.len(), "scanned boundary markers");
        merged
    }

    /// True when the line holds nothing but boundary markers.
    pub fn is_marker_only(&self, line: &str) -> bool {
        let line = line.trim();
        !line.is_empty() && self.re.replace_all(line, "").trim().is_empty()
    }

    /// Removes every marker occurrence from `s`.
    pub fn strip<'a>(&self, s: &'a str) -> std::borrow::Cow<'a, str> {
        self.re.replace_all(s, "")
    }
}

/// Merge occurrences whose start lies less than `distance` after the start of
/// the previous member of the current group. The merged marker keeps the
/// group's first start and last end, so collapsing twice changes nothing.
pub fn collapse(text: &str, markers: &[Marker], distance: usize) -> Vec<Marker> {
    let mut out: Vec<Marker> = Vec::with_capacity(markers.len());
    let mut last_start = 0usize;

    for m in markers {
        match out.last_mut() {
            Some(prev) if m.start.saturating_sub(last_start) < distance => {
                prev.end = prev.end.max(m.end);
                prev.raw = text[prev.start..prev.end].to_string();
            }
            _ => out.push(m.clone()),
        }
        last_start = m.start;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> MarkerScanner {
        MarkerScanner::new("Source", 20)
    }

    #[test]
    fn irregular_spacing() {
        let text = "a (Source) b ( Source ) c (\tsource\n) d (SOURCE)";
        let markers = MarkerScanner::new("Source", 0).scan(text);
        assert_eq!(markers.len(), 4);
        assert_eq!(markers[1].raw, "( Source )");
        assert!(markers.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn doubled_markers_merge() {
        let text = "Body text. (Source )  (Source )\nNext";
        let markers = scanner().scan(text);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].start, 11);
        assert_eq!(markers[0].raw, "(Source )  (Source )");
        assert_eq!(markers[0].end, 11 + "(Source )  (Source )".len());
    }

    #[test]
    fn distant_markers_stay_apart() {
        let text = "First incident body (Source)\nSecond incident body (Source)";
        let markers = scanner().scan(text);
        assert_eq!(markers.len(), 2);
    }

    #[test]
    fn collapse_is_idempotent() {
        let text = "(Source)(Source) x (Source) .......................... (Source) (Source)";
        let once = scanner().scan(text);
        let twice = collapse(text, &once, 20);
        assert_eq!(once, twice);
    }

    #[test]
    fn label_is_configurable() {
        let text = "Body (Link) more (Source)";
        let markers = MarkerScanner::new("Link", 20).scan(text);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].raw, "(Link)");
    }

    #[test]
    fn no_markers() {
        assert!(scanner().scan("cover page only\nnothing else").is_empty());
    }

    #[test]
    fn marker_only_lines() {
        let s = scanner();
        assert!(s.is_marker_only("  (Source) (Source) "));
        assert!(!s.is_marker_only("Key Findings (Source)"));
        assert!(!s.is_marker_only("   "));
    }
}
