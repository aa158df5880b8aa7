//! # Lookbook CLI (`lookbook`)
//!
//! Upload photos to the recommender service and print the products that
//! look like them.
//!
//! ## Usage
//!
//! ```bash
//! lookbook --config ./config/lookbook.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lookbook recommend <IMAGE>...` | Upload each image and render its matches |
//! | `lookbook catalog list` | Print the parsed product catalog |
//! | `lookbook catalog lookup <ID>` | Print one catalog row |
//!
//! ## Examples
//!
//! ```bash
//! # Text output against a local service
//! lookbook recommend ./shoe.jpg --base-url http://localhost:8000
//!
//! # Bootstrap cards using the catalog's image URLs
//! lookbook recommend ./shoe.jpg --format html --policy catalog > results.html
//!
//! # Which product is behind an identifier?
//! lookbook catalog lookup 15970.jpg
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lookbook::catalog::{parse_catalog, CatalogIndex};
use lookbook::client::{HttpBackend, SimilarityBackend};
use lookbook::config::{self, Config};
use lookbook::controller::{Controller, SubmitOutcome};
use lookbook::logging;
use lookbook::models::ImageUpload;
use lookbook::render::RenderPolicy;
use lookbook::view::{OutputFormat, TerminalView};

const DEFAULT_CONFIG_PATH: &str = "./config/lookbook.toml";

/// Lookbook: find catalog products that look like a photo.
#[derive(Parser)]
#[command(
    name = "lookbook",
    about = "Upload an image, find similar catalog products, and render them as product cards",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/lookbook.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `server.base_url` from the config file.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log requests and submission outcomes to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload images and render the most similar products.
    ///
    /// Each image is one submission. Giving no image reports that no image
    /// was selected.
    Recommend {
        /// Image files to upload, one submission each.
        images: Vec<PathBuf>,

        /// How cards are printed.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Override `render.policy` from the config file.
        #[arg(long, value_enum)]
        policy: Option<RenderPolicy>,

        /// Re-fetch the catalog for every submission.
        #[arg(long)]
        no_cache: bool,
    },

    /// Inspect the product catalog served by the recommender.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Print catalog rows in file order.
    List {
        /// Maximum number of rows to print.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the catalog row for one image identifier.
    Lookup {
        /// Image identifier, e.g. `15970.jpg`.
        identifier: String,
    },
}

fn load(cli: &Cli) -> anyhow::Result<Config> {
    let (path, explicit) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let mut cfg = config::load_config_or_default(&path, explicit)?;
    if let Some(base_url) = &cli.base_url {
        cfg.server.base_url = base_url.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut cfg = load(&cli)?;

    match cli.command {
        Commands::Recommend {
            images,
            format,
            policy,
            no_cache,
        } => {
            if let Some(policy) = policy {
                cfg.render.policy = policy;
            }
            if no_cache {
                cfg.catalog.cache = false;
            }
            let failed = run_recommend(&cfg, &images, format).await?;
            if failed > 0 {
                std::process::exit(1);
            }
        }
        Commands::Catalog { action } => {
            let backend = HttpBackend::new(&cfg).context("Failed to build HTTP client")?;
            let text = backend
                .fetch_catalog()
                .await
                .with_context(|| format!("Failed to fetch catalog from {}", backend.catalog_url()))?;
            match action {
                CatalogAction::List { limit } => print_catalog(&text, limit),
                CatalogAction::Lookup { identifier } => {
                    if !print_lookup(&text, &identifier) {
                        std::process::exit(1);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Submit every image in turn; returns how many submissions did not render.
async fn run_recommend(
    cfg: &Config,
    images: &[PathBuf],
    format: OutputFormat,
) -> anyhow::Result<usize> {
    let backend = HttpBackend::new(cfg).context("Failed to build HTTP client")?;
    let view = TerminalView::new(std::io::stdout(), std::io::stderr(), format);
    let controller = Controller::from_config(backend, view, cfg);

    if images.is_empty() {
        controller.submit(None).await;
        return Ok(1);
    }

    let mut failed = 0;
    for path in images {
        if images.len() > 1 && format == OutputFormat::Text {
            println!("==> {}", path.display());
        }
        let upload = match ImageUpload::from_path(path).await {
            Ok(upload) => upload,
            Err(e) => {
                controller.report_error(&e);
                failed += 1;
                continue;
            }
        };
        match controller.submit(Some(&upload)).await {
            SubmitOutcome::Rendered(0) if format == OutputFormat::Text => {
                println!("No similar products found.")
            }
            SubmitOutcome::Rendered(_) => {}
            _ => failed += 1,
        }
    }
    Ok(failed)
}

fn print_catalog(text: &str, limit: Option<usize>) {
    let rows = parse_catalog(text);
    println!("{:<16} {:<40} IMAGE URL", "IMAGE", "TITLE");
    for row in rows
        .iter()
        .filter(|row| !row.is_blank())
        .take(limit.unwrap_or(usize::MAX))
    {
        println!(
            "{:<16} {:<40} {}",
            row.image().unwrap_or("-"),
            row.product_title().unwrap_or("-"),
            row.image_url().unwrap_or("-")
        );
    }
}

fn print_lookup(text: &str, identifier: &str) -> bool {
    let index = CatalogIndex::parse(text);
    match index.get(identifier) {
        Some(row) => {
            for column in row.columns() {
                println!("{:<16} {}", column, row.get(column).unwrap_or("-"));
            }
            true
        }
        None => {
            eprintln!("No catalog entry for '{}'", identifier);
            false
        }
    }
}
