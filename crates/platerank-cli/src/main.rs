use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use platerank_core::{FeatureBuilder, FeaturedCorpus, QueryParams, RankedRestaurant};
use platerank_storage::{ingest, FeatureExportWriter};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "platerank")]
#[command(about = "Restaurant recommendations from a cleaned corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Rank restaurants against cuisine, price and area preferences
    Recommend {
        #[arg(long)]
        data: PathBuf,
        /// Repeat for several cuisines; any one of them matches
        #[arg(long = "cuisine")]
        cuisines: Vec<String>,
        #[arg(long)]
        min_cost: Option<f64>,
        #[arg(long)]
        max_cost: Option<f64>,
        #[arg(long, default_value = "any")]
        area: String,
        #[arg(long, default_value_t = platerank_core::DEFAULT_TOP_N)]
        top_n: usize,
        #[arg(long)]
        json: bool,
    },
    /// List the cuisines, areas and cost span available for filtering
    Options {
        #[arg(long)]
        data: PathBuf,
    },
    /// Write the feature matrix as JSON Lines
    ExportFeatures {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn load(path: &Path) -> Result<FeaturedCorpus> {
    let records = ingest::load_path(path)
        .with_context(|| format!("reading corpus {}", path.display()))?;
    FeatureBuilder::build(records).context("building features")
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "Yes"
    } else {
        "No"
    }
}

fn render_card(r: &RankedRestaurant) -> String {
    let rec = &r.record;
    let cuisines: Vec<&str> = rec.cuisines.iter().collect();
    format!(
        "{}\n  area: {} | cost for two: {}\n  rating: {} ({} ratings, weighted {:.2})\n  cuisines: {}\n  online order: {} | table booking: {}\n",
        rec.name,
        rec.area,
        rec.avg_cost,
        rec.rating,
        rec.num_ratings,
        r.weighted_rating,
        cuisines.join(", "),
        yes_no(rec.online_order),
        yes_no(rec.table_booking),
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Recommend {
            data,
            cuisines,
            min_cost,
            max_cost,
            area,
            top_n,
            json,
        } => {
            let corpus = load(&data)?;
            // unset bounds default to the corpus span, like the filter form
            let (lo, hi) = corpus.cost_bounds();
            let params = QueryParams::new()
                .with_cuisines(cuisines)
                .with_cost_range(min_cost.unwrap_or(lo), max_cost.unwrap_or(hi))
                .with_area(area.as_str())
                .with_top_n(top_n);
            let results = platerank_core::recommend(&corpus, &params)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No restaurants match these preferences.");
            } else {
                for r in &results {
                    println!("{}", render_card(r));
                }
            }
        }
        Cmd::Options { data } => {
            let corpus = load(&data)?;
            let (lo, hi) = corpus.cost_bounds();
            println!("cuisines: {}", corpus.cuisines().join(", "));
            println!("areas: {}", corpus.areas().join(", "));
            println!("cost for two: {} - {}", lo, hi);
        }
        Cmd::ExportFeatures { data, out } => {
            let corpus = load(&data)?;
            let mut writer = FeatureExportWriter::create(out.clone())
                .with_context(|| format!("creating {}", out.display()))?;
            let rows = writer.write_corpus(&corpus)?;
            println!("wrote {} rows to {}", rows, out.display());
        }
    }
    Ok(())
}
