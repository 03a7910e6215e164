mod db;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scraper::Html;
use serp_parser::dom::get_text;
use serp_parser::parser::dispatch;
use serp_parser::SerpParser;
use tracing::{debug, info, warn};

use settings::Settings;

#[derive(Parser)]
#[command(name = "serp_parser", about = "Segment, classify and parse search result pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one HTML file and print its records as JSON
    Parse {
        file: PathBuf,
        /// Include page-level features
        #[arg(short, long)]
        features: bool,
        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },
    /// Show the layout and classified components of one HTML file
    Inspect { file: PathBuf },
    /// Store every *.html file in a directory as a SERP
    Ingest {
        dir: PathBuf,
        /// Max files to ingest
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Parse stored SERPs that have not been parsed yet
    Process {
        /// Max pages to process (default: all unparsed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show page and record counts
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parser panics are caught and logged by the dispatcher; keep them off stderr.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if dispatch::in_parser() {
            debug!(panic = %info, "contained parser panic");
        } else {
            default_hook(info);
        }
    }));

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { file, features, pretty } => {
            let html = read_html(&file)?;
            let output = SerpParser::new().process(html, features);
            let json = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{}", json);
            Ok(())
        }
        Commands::Inspect { file } => {
            let mut doc = Html::parse_document(&read_html(&file)?);
            let components = SerpParser::new().segment_and_classify(&mut doc);
            println!("Layout: {}\n", components.layout());
            println!("{:>3} | {:<7} | {:<24} | {}", "#", "Section", "Type", "Text");
            println!("{}", "-".repeat(90));
            for cmpt in &components {
                let text = get_text(cmpt.elem, " ");
                println!(
                    "{:>3} | {:<7} | {:<24} | {}",
                    cmpt.cmpt_rank,
                    cmpt.section.as_str(),
                    cmpt.kind.as_str(),
                    truncate(&text, 48)
                );
            }
            println!("\n{} components", components.len());
            Ok(())
        }
        Commands::Ingest { dir, limit } => {
            let settings = Settings::load()?;
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let serps = read_dir_serps(&dir, limit)?;
            if serps.is_empty() {
                println!("No .html files found in {}.", dir.display());
                return Ok(());
            }
            let ingested_at = chrono::Utc::now().to_rfc3339();
            let inserted = db::insert_serps(&conn, &serps, &ingested_at)?;
            println!("Inserted {} new SERPs ({} files found)", inserted, serps.len());
            Ok(())
        }
        Commands::Process { limit } => {
            let settings = Settings::load()?;
            info!(settings_loaded = ?settings, msg = "Starting SERP processing");
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let serps = db::fetch_unparsed(&conn, limit)?;
            if serps.is_empty() {
                println!("No unparsed SERPs. Run 'ingest' first.");
                return Ok(());
            }
            println!("Processing {} SERPs...", serps.len());
            let counts = process_serps(&conn, &serps, &settings)?;
            counts.print();
            Ok(())
        }
        Commands::Stats => {
            let settings = Settings::load()?;
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("SERPs:    {}", s.serps);
            println!("Parsed:   {}", s.parsed);
            println!("Pending:  {}", s.serps - s.parsed);
            println!("Records:  {}", s.results);
            println!("Unknown:  {}", s.unknown);
            println!("Errors:   {}", s.errors);
            if !s.types.is_empty() {
                println!("\n--- Types ---");
                for (kind, n) in &s.types {
                    println!("  {:<24} {:>7}", kind, n);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn read_html(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// `*.html` files in `dir`, sorted by name; the file stem becomes the SERP id.
fn read_dir_serps(dir: &Path, limit: Option<usize>) -> Result<Vec<db::NewSerp>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
        .collect();
    paths.sort();
    if let Some(n) = limit {
        paths.truncate(n);
    }

    let mut serps = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            warn!(path = %path.display(), "skipping file with non UTF-8 name");
            continue;
        };
        serps.push(db::NewSerp {
            serp_id: stem.to_string(),
            source: Some(path.display().to_string()),
            html: read_html(&path)?,
        });
    }
    Ok(serps)
}

struct ProcessCounts {
    serps: usize,
    records: usize,
    errors: usize,
    unknown: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Saved {} SERPs, {} records ({} unknown, {} parser errors).",
            self.serps, self.records, self.unknown, self.errors,
        );
    }
}

fn process_serps(
    conn: &rusqlite::Connection,
    serps: &[db::StoredSerp],
    settings: &Settings,
) -> Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(serps.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let parser = SerpParser::new();
    let mut counts = ProcessCounts {
        serps: 0,
        records: 0,
        errors: 0,
        unknown: 0,
    };

    for chunk in serps.chunks(settings.batch_size) {
        let pages: Vec<db::ParsedPage> = chunk
            .par_iter()
            .map(|serp| {
                let output = parser.process(serp.html.as_str(), settings.with_features);
                db::ParsedPage {
                    serp_id: serp.serp_id.clone(),
                    results: output.results,
                    features: output.features,
                }
            })
            .collect();

        for page in &pages {
            counts.records += page.results.len();
            counts.errors += page.results.iter().filter(|r| r.record.error.is_some()).count();
            counts.unknown += page
                .results
                .iter()
                .filter(|r| r.record.kind.is_unknown())
                .count();
        }
        counts.serps += pages.len();
        db::save_parsed(conn, &pages)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
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
