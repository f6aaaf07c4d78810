use std::ops::Range;

use tracing::debug;

use super::dates;
use super::line_spans;
use super::markers::{Marker, MarkerScanner};
use super::sections::{is_heading_line, SectionIndex};
use crate::config::ParseConfig;

/// Drop markers that do not close an incident: those inside a resource/reference
/// region, and those with no plausible title text since the last accepted one.
pub fn filter_markers(
    text: &str,
    markers: &[Marker],
    index: &SectionIndex,
    scanner: &MarkerScanner,
    config: &ParseConfig,
) -> Vec<Marker> {
    let regions = exclusion_regions(text, markers, index, scanner, config);
    let mut accepted: Vec<Marker> = Vec::with_capacity(markers.len());
    let mut in_region = 0usize;
    let mut too_short = 0usize;

    for m in markers {
        if regions.iter().any(|r| r.contains(&m.start)) {
            in_region += 1;
            continue;
        }
        let from = accepted.last().map_or(0, |prev| prev.end);
        if !has_plausible_title(text, from..m.start, scanner, config) {
            too_short += 1;
            continue;
        }
        accepted.push(m.clone());
    }

    debug!(
        accepted = accepted.len(),
        in_region, too_short, "filtered boundary markers"
    );
    accepted
}

/// Each trigger heading opens a region that runs until the next heading which
/// is neither a trigger nor empty of incidents.
fn exclusion_regions(
    text: &str,
    markers: &[Marker],
    index: &SectionIndex,
    scanner: &MarkerScanner,
    config: &ParseConfig,
) -> Vec<Range<usize>> {
    let headings = index.headings();
    let triggers = &config.exclusion_triggers;
    let mut regions = Vec::new();

    for (i, h) in headings.iter().enumerate() {
        if !is_trigger(&h.name, triggers) {
            continue;
        }
        let end = (i + 1..headings.len())
            .find(|&j| {
                let range = headings[j].offset..index.range_end(j, text.len());
                !is_trigger(&headings[j].name, triggers)
                    && is_incident_bearing(text, range, markers, scanner, config)
            })
            .map_or(text.len(), |j| headings[j].offset);
        regions.push(h.offset..end);
    }

    regions
}

fn is_trigger(name: &str, triggers: &[String]) -> bool {
    let upper = name.to_uppercase();
    triggers
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .any(|t| upper.contains(&t.to_uppercase()))
}

/// A section holds incidents when a title block in it ends in a date, or when
/// a marker standing on its own line closes enough title text. Inline markers
/// at the end of a credits entry do not count.
fn is_incident_bearing(
    text: &str,
    range: Range<usize>,
    markers: &[Marker],
    scanner: &MarkerScanner,
    config: &ParseConfig,
) -> bool {
    has_dated_block(text, range.clone(), config.min_heading_len)
        || markers
            .iter()
            .filter(|m| range.contains(&m.start) && stands_alone(text, m, scanner))
            .any(|m| has_plausible_title(text, range.start..m.start, scanner, config))
}

/// Blocks are runs of lines between blank lines and headings, so a date that
/// wraps onto the next line still ends its block.
fn has_dated_block(text: &str, range: Range<usize>, min_heading_len: usize) -> bool {
    let mut block_start: Option<usize> = None;
    for (s, e) in line_spans(text, range.start, range.end) {
        let raw = &text[s..e];
        let line = raw.trim();
        if line.is_empty() || is_heading_line(line, min_heading_len) {
            block_start = None;
            continue;
        }
        let start = *block_start.get_or_insert(s);
        if dates::ends_with_date(&text[start..s + raw.trim_end().len()]) {
            return true;
        }
    }
    false
}

fn stands_alone(text: &str, m: &Marker, scanner: &MarkerScanner) -> bool {
    let line_start = text[..m.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[m.end..].find('\n').map_or(text.len(), |i| m.end + i);
    scanner.is_marker_only(&text[line_start..line_end])
}

fn has_plausible_title(
    text: &str,
    span: Range<usize>,
    scanner: &MarkerScanner,
    config: &ParseConfig,
) -> bool {
    let mut chars = 0usize;
    for (s, e) in line_spans(text, span.start, span.end) {
        let line = text[s..e].trim();
        if line.is_empty() || is_heading_line(line, config.min_heading_len) {
            continue;
        }
        chars += scanner.strip(line).trim().chars().count();
        if chars >= config.min_title_len {
            return true;
        }
    }
    false
}
