use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dates::{self, DateInfo};
use super::markers::{Marker, MarkerScanner};
use super::sections::{is_heading_line, SectionIndex};
use super::{is_page_number, line_spans};
use crate::config::ParseConfig;

// A word of an all-caps section name, e.g. `CITY`, `/`, `(WPV)`, `COUNTY'S`.
static HEADER_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9/()&.,'\x{2019}\x{2013}\x{2014}-]+$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub title: String,
    pub body: String,
    pub date: Option<DateInfo>,
    pub category: String,
    /// From the first title character through the end of the closing marker.
    pub raw_span: Range<usize>,
}

struct TitleSpan {
    start: usize,
    end: usize,
    date: Option<DateInfo>,
}

/// Single forward pass over the accepted markers. Each marker closes the text
/// between the previous accepted marker and itself.
pub fn assemble(
    text: &str,
    markers: &[Marker],
    index: &SectionIndex,
    scanner: &MarkerScanner,
    config: &ParseConfig,
) -> Vec<Incident> {
    let mut incidents = Vec::with_capacity(markers.len());
    let mut cursor = initial_cursor(index, markers);

    for m in markers {
        let span = cursor..m.start;
        cursor = m.end;

        if text[span.clone()].trim().is_empty() {
            debug!(offset = span.start, "skipping empty incident span");
            continue;
        }
        let Some(loc) = locate_title(text, span.clone(), scanner, config) else {
            debug!(offset = span.start, "no title content before marker");
            continue;
        };
        let title = clean_title(&text[loc.start..loc.end]);
        if title.is_empty() {
            continue;
        }

        incidents.push(Incident {
            title,
            body: text[loc.end..m.start].trim().to_string(),
            date: loc.date,
            category: index.category_at(loc.start).to_string(),
            raw_span: loc.start..m.end,
        });
    }

    debug!(incidents = incidents.len(), "assembled incidents");
    incidents
}

/// The first incident starts at the first heading when one precedes the first
/// marker, so cover-page text ahead of it never reaches a title.
fn initial_cursor(index: &SectionIndex, markers: &[Marker]) -> usize {
    match (index.headings().first(), markers.first()) {
        (Some(h), Some(m)) if h.offset < m.start => h.offset,
        _ => 0,
    }
}

/// The title is the block of lines that ends in a date suffix, where blocks
/// are separated by blank lines and heading lines. Without any dated block,
/// the first paragraph after the last heading is the title (an empty section
/// such as "No Incidents To Report" may sit ahead of it).
fn locate_title(
    text: &str,
    span: Range<usize>,
    scanner: &MarkerScanner,
    config: &ParseConfig,
) -> Option<TitleSpan> {
    let mut block_start: Option<usize> = None;
    let mut content_start: Option<usize> = None;
    let mut after_heading: Option<usize> = None;

    for (s, e) in line_spans(text, span.start, span.end) {
        let raw = &text[s..e];
        let line = raw.trim();
        if line.is_empty() {
            block_start = None;
            continue;
        }
        if is_heading_line(line, config.min_heading_len) {
            block_start = None;
            after_heading = None;
            continue;
        }
        if block_start.is_none() && (is_page_number(line) || scanner.is_marker_only(line)) {
            continue;
        }

        let line_start = s + (raw.len() - raw.trim_start().len());
        let line_end = s + raw.trim_end().len();
        let start = *block_start.get_or_insert(line_start);
        content_start.get_or_insert(line_start);
        after_heading.get_or_insert(line_start);

        if line_end - start > config.max_title_chars {
            continue;
        }
        if let Some(date) = dates::match_trailing(&text[start..line_end]) {
            return Some(TitleSpan {
                start,
                end: line_end,
                date: Some(date),
            });
        }
    }

    let start = after_heading.or(content_start)?;
    let mut end = start;
    for (s, e) in line_spans(text, start, span.end) {
        let raw = &text[s..e];
        if raw.trim().is_empty() {
            break;
        }
        end = s + raw.trim_end().len();
    }
    Some(TitleSpan {
        start,
        end,
        date: None,
    })
}

/// Drop page-number lines, unwrap the title onto one line, and strip a
/// section name that ran into the title on the same line.
fn clean_title(raw: &str) -> String {
    let words: Vec<&str> = raw
        .lines()
        .filter(|l| !is_page_number(l.trim()))
        .flat_map(str::split_whitespace)
        .collect();
    let skip = header_prefix_len(&words);
    words[skip..].join(" ")
}

/// Number of leading all-caps words to drop. The prefix must start with a
/// letter and span at least five characters, and the word after it must be a
/// capitalized mixed-case word, so an all-caps title is left whole.
fn header_prefix_len(words: &[&str]) -> usize {
    let n = words.iter().take_while(|w| HEADER_WORD_RE.is_match(w)).count();
    let Some(next) = words.get(n) else {
        return 0;
    };
    let starts_letter = words
        .first()
        .and_then(|w| w.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase());
    let prefix_chars = words[..n].iter().map(|w| w.len()).sum::<usize>() + n.saturating_sub(1);
    let next_is_title = next.chars().next().is_some_and(|c| c.is_uppercase())
        && next.chars().any(|c| c.is_lowercase());

    if n > 0 && starts_letter && prefix_chars >= 5 && next_is_title {
        n
    } else {
        0
    }
}
