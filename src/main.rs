use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use incident_extractor::{db, render, Incident, IncidentExtractor, ParseConfig};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "incident_extractor", about = "Split extracted bulletin text into incident records")]
struct Cli {
    /// Config file (TOML/YAML/JSON); defaults to ./incidents.* when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Merge markers whose starts are closer than this many bytes
    #[arg(long, global = true)]
    collapse_distance: Option<usize>,
    /// Minimal title text for a marker to close an incident
    #[arg(long, global = true)]
    min_title_len: Option<usize>,
    /// Heading that opens a resource/reference region (repeatable, replaces defaults)
    #[arg(long = "exclusion-trigger", global = true)]
    exclusion_triggers: Vec<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract incidents from text files and write them out
    Extract {
        /// Text files, or directories of .txt files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "extracted_incidents")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
    },
    /// Extract incidents and store them in the SQLite database
    Ingest {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Show database statistics
    Stats,
    /// Incidents overview table
    List {
        /// Filter by category heading (exact)
        #[arg(short, long)]
        category: Option<String>,
        /// Filter by incident year
        #[arg(short, long)]
        year: Option<i32>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

struct Document {
    path: PathBuf,
    chars: usize,
    incidents: Vec<Incident>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let result = match cli.command {
        Commands::Extract { inputs, out, format } => {
            let docs = process_inputs(&inputs, config)?;
            let multi = docs.len() > 1;
            for doc in &docs {
                let stem = file_stem(&doc.path);
                match format {
                    Format::Markdown => {
                        let dir = if multi { out.join(&stem) } else { out.clone() };
                        let index = render::write_markdown(&doc.incidents, &dir)?;
                        println!(
                            "{}: {} incidents -> {}",
                            doc.path.display(),
                            doc.incidents.len(),
                            index.display()
                        );
                    }
                    Format::Json => {
                        let path = out.join(format!("{}.json", stem));
                        render::write_json(&doc.incidents, &path)?;
                        println!(
                            "{}: {} incidents -> {}",
                            doc.path.display(),
                            doc.incidents.len(),
                            path.display()
                        );
                    }
                }
                if doc.incidents.is_empty() {
                    println!("  No incidents found. Check that the text contains boundary markers.");
                }
            }
            Ok(())
        }
        Commands::Ingest { inputs } => {
            let docs = process_inputs(&inputs, config)?;
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let mut total = 0;
            for doc in &docs {
                let path = doc.path.to_string_lossy();
                db::save_document(&conn, &path, doc.chars, &doc.incidents)?;
                total += doc.incidents.len();
            }
            println!("Saved {} incidents from {} documents.", total, docs.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Documents:  {}", s.documents);
            println!("Incidents:  {}", s.incidents);
            println!("Full date:  {}", s.full_dates);
            println!("Year only:  {}", s.year_only);
            println!("Undated:    {}", s.undated);
            println!("Categories: {}", s.categories);
            Ok(())
        }
        Commands::List { category, year, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, category.as_deref(), year, limit)?;
            if rows.is_empty() {
                println!("No incidents found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<20} | {:>3} | {:<18} | {:<24} | {:<40}",
                "#", "Document", "Seq", "Date", "Category", "Title"
            );
            println!("{}", "-".repeat(122));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<20} | {:>3} | {:<18} | {:<24} | {:<40}",
                    i + 1,
                    truncate(&file_stem(Path::new(&r.document)), 20),
                    r.seq,
                    truncate(&r.date, 18),
                    truncate(&r.category, 24),
                    truncate(&r.title, 40),
                );
            }
            println!("\n{} incidents", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn load_config(cli: &Cli) -> anyhow::Result<ParseConfig> {
    let mut config = ParseConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(d) = cli.collapse_distance {
        config.collapse_distance = d;
    }
    if let Some(n) = cli.min_title_len {
        config.min_title_len = n;
    }
    if !cli.exclusion_triggers.is_empty() {
        config.exclusion_triggers = cli.exclusion_triggers.clone();
    }
    Ok(config)
}

/// Read every input and extract incidents; documents are independent and
/// parsed in parallel.
fn process_inputs(inputs: &[PathBuf], config: ParseConfig) -> anyhow::Result<Vec<Document>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let files = collect_files(inputs)?;
    let extractor = IncidentExtractor::new(config)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let docs: Vec<Document> = files
        .par_iter()
        .filter_map(|path| {
            let doc = match std::fs::read_to_string(path) {
                Ok(text) => {
                    let incidents = extractor.extract(&text);
                    info!(path = %path.display(), incidents = incidents.len(), "extracted");
                    Some(Document {
                        path: path.clone(),
                        chars: text.chars().count(),
                        incidents,
                    })
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            };
            pb.inc(1);
            doc
        })
        .collect();

    pb.finish_and_clear();
    Ok(docs)
}

/// Expand directories into their `.txt` files, sorted by name.
fn collect_files(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("reading directory {}", input.display()))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
