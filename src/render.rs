//! Markdown and JSON output for extracted incidents.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use unicode_normalization::UnicodeNormalization;

use crate::error::OutputError;
use crate::parser::assemble::Incident;

pub const INDEX_FILE: &str = "000_INDEX.md";
const SLUG_MAX_LEN: usize = 80;
const INDEX_TITLE_LEN: usize = 120;

/// File name stem built from an incident title: compatibility-decomposed
/// (NFKD), hostile characters dropped, words joined by `_`, cut at a word boundary.
pub fn slugify(title: &str, max_len: usize) -> String {
    let cleaned: String = title
        .nfkd()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' | '$' | '\'' | ',' | '&' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    let slug = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    if slug.chars().count() <= max_len {
        return slug;
    }
    let cut: String = slug.chars().take(max_len).collect();
    match cut.rsplit_once('_') {
        Some((head, _)) if !head.is_empty() => head.to_string(),
        _ => cut,
    }
}

pub fn file_name(seq: usize, incident: &Incident) -> String {
    format!("{:03}_{}.md", seq, slugify(&incident.title, SLUG_MAX_LEN))
}

fn date_label(incident: &Incident) -> &str {
    incident.date.as_ref().map_or("Unknown", |d| d.text.as_str())
}

pub fn render_incident(incident: &Incident) -> String {
    let mut out = format!("# {}\n\n", incident.title);
    out.push_str(&format!("**Date:** {}\n\n", date_label(incident)));
    out.push_str(&format!("**Category:** {}\n\n", incident.category));
    out.push_str("---\n\n");

    for para in paragraphs(&incident.body) {
        out.push_str(&para);
        out.push_str("\n\n");
    }
    out
}

/// Blank-line separated paragraphs with wrapped lines joined.
fn paragraphs(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in body.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
            continue;
        }
        current.extend(line.split_whitespace());
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

pub fn render_index(incidents: &[Incident]) -> String {
    let mut out = String::from("# Insider Threat Incidents \u{2013} Extracted Index\n\n");
    out.push_str(&format!("**Total incidents extracted:** {}\n\n", incidents.len()));
    out.push_str("| # | Date | Category | Title |\n");
    out.push_str("|---|------|----------|-------|\n");
    for (i, inc) in incidents.iter().enumerate() {
        let seq = i + 1;
        let short: String = inc.title.chars().take(INDEX_TITLE_LEN).collect();
        out.push_str(&format!(
            "| {} | {} | {} | [{}]({}) |\n",
            seq,
            date_label(inc),
            escape_cell(&inc.category),
            escape_cell(&short),
            file_name(seq, inc),
        ));
    }
    out
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Write one Markdown file per incident plus the index. Returns the index path.
pub fn write_markdown(incidents: &[Incident], out_dir: &Path) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(out_dir).map_err(|source| OutputError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let index_path = out_dir.join(INDEX_FILE);
    write_file(&index_path, &render_index(incidents))?;
    for (i, inc) in incidents.iter().enumerate() {
        write_file(&out_dir.join(file_name(i + 1, inc)), &render_incident(inc))?;
    }

    info!(dir = %out_dir.display(), incidents = incidents.len(), "wrote markdown");
    Ok(index_path)
}

pub fn to_json(incidents: &[Incident]) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(incidents)?)
}

pub fn write_json(incidents: &[Incident], path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write_file(path, &to_json(incidents)?)
}

fn write_file(path: &Path, contents: &str) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
