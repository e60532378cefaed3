use anyhow::{Context, Result};
use clap::Parser;
use dashgraph::chart::build_chart;
use dashgraph::config::Config;
use dashgraph::data::Dataset;
use dashgraph::loader::DataLoader;
use dashgraph::parser::parse_request;
use dashgraph::runtime::{render_chart, run_page};
use dashgraph::OutputFormat;
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dashgraph")]
#[command(about = "Render survey dashboard charts from published CSV data", long_about = None)]
struct Args {
    /// Selection pipeline (e.g., 'chart(type: bar, x: Departamento, y: Valor) | agg(sum)')
    pipeline: Option<String>,

    /// Load the CSV from this URL instead of stdin
    #[arg(long)]
    url: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a configured page and print its JSON report
    #[arg(long)]
    page: Option<String>,

    /// Output format: png, svg, json or csv
    #[arg(long)]
    format: Option<OutputFormat>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Print the chart's data preview as CSV instead of the chart
    #[arg(long)]
    preview: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(format) = args.format {
        config.render.format = format;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let output = if let Some(name) = &args.page {
        let page = config.page(name)?;
        let mut loader = DataLoader::http(config.cache_ttl())?;
        let report = run_page(&mut loader, page, &config.export);
        serde_json::to_vec_pretty(&report).context("Failed to serialize page report")?
    } else {
        let pipeline = args
            .pipeline
            .as_deref()
            .context("A selection pipeline is required unless --page is given")?;

        let dataset = match &args.url {
            Some(url) => DataLoader::http(config.cache_ttl())?.load(url)?,
            None => Dataset::from_reader(io::stdin().lock())
                .context("Failed to read CSV from stdin")?,
        };
        info!("dataset has {} rows", dataset.len());

        let request = parse_request(pipeline)?;
        let mut spec = build_chart(&dataset, &request)?;
        spec.config = config.export.clone();

        if args.preview {
            spec.preview(config.preview_rows)
                .to_csv_string()
                .context("Failed to export preview")?
                .into_bytes()
        } else {
            render_chart(&spec, &config.render).context("Failed to render chart")?
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(&output)
        .context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
