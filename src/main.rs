use biomarker_cart::application::cart_service::CartService;
use biomarker_cart::config::Config;
use biomarker_cart::domain::cart::{self, CartEntry};
use biomarker_cart::domain::catalog::Catalog;
use biomarker_cart::domain::ports::CartStoreBox;
use biomarker_cart::domain::pricing::{CartCalculation, PricingEngine};
use biomarker_cart::error::Result as CartResult;
use biomarker_cart::infrastructure::in_memory::InMemoryCartStore;
use biomarker_cart::infrastructure::json_file::JsonFileCartStore;
use biomarker_cart::interfaces::csv::cart_reader::CartReader;
use biomarker_cart::interfaces::csv::price_writer::PriceWriter;
use biomarker_cart::logging;
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog TOML file. Defaults to the built-in storefront catalog.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Directory for the JSON file cart store
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Key of the cart inside the store
    #[arg(long, global = true)]
    cart_key: Option<String>,

    /// Output format for prices and catalog listings
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Command {
    /// Price a cart file (CSV or JSON), or the stored cart if no file is given
    Price { input: Option<PathBuf> },
    /// Price the stored cart
    Show,
    /// Add a package by SKU or storefront page path
    Add {
        package: String,
        /// Image URL cached with the cart entry
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a package from the stored cart
    Remove { sku: String },
    /// Empty the stored cart
    Clear,
    /// Savings from adding a package to the stored cart
    Quote { package: String },
    /// Summarize the stored cart for booking
    Checkout,
    /// List the catalog packages
    Catalog,
}

#[derive(Serialize)]
struct CatalogRow<'a> {
    sku: &'a str,
    name: &'a str,
    base_price: i64,
    biomarkers: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    logging::init_cli_logger(cli.verbose, config.log_filter.as_deref());

    let catalog = match &config.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::reference()?,
    };
    let engine = PricingEngine::new(Arc::new(catalog));
    let store = open_store(&config)?;
    let service = CartService::new(store, engine, config.cart_key.clone());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Price { input: Some(path) } => {
            let items = read_cart_file(&path)?;
            let calculation = service.engine().calculate(&items);
            write_calculation(&mut out, &calculation, cli.format)?;
        }
        Command::Price { input: None } | Command::Show => {
            let calculation = service.calculate().await?;
            write_calculation(&mut out, &calculation, cli.format)?;
        }
        Command::Add { package, image } => {
            let outcome = service.add(&package, image).await?;
            write_json(&mut out, &outcome)?;
        }
        Command::Remove { sku } => {
            let sku = sku.trim().to_string();
            let removed = service.remove(&sku).await?;
            write_json(&mut out, &serde_json::json!({ "sku": sku, "removed": removed }))?;
        }
        Command::Clear => {
            service.clear().await?;
            write_json(&mut out, &serde_json::json!({ "cleared": true }))?;
        }
        Command::Quote { package } => {
            let savings = service.quote(&package).await?;
            tracing::info!(savings = %savings, "savings from biomarkers already in the cart");
            write_json(
                &mut out,
                &serde_json::json!({ "package": package, "savings": savings }),
            )?;
        }
        Command::Checkout => {
            let summary = service.checkout().await?;
            write_json(&mut out, &summary)?;
        }
        Command::Catalog => write_catalog(&mut out, service.engine().catalog(), cli.format)?,
    }

    out.flush().into_diagnostic()?;
    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(catalog) = &cli.catalog {
        config.catalog = Some(catalog.clone());
    }
    if let Some(store_dir) = &cli.store_dir {
        config.store_dir = Some(store_dir.clone());
    }
    if let Some(db_path) = &cli.db_path {
        config.db_path = Some(db_path.clone());
    }
    if let Some(cart_key) = &cli.cart_key {
        config.cart_key = cart_key.clone();
    }
}

fn open_store(config: &Config) -> CartResult<CartStoreBox> {
    if let Some(db_path) = &config.db_path
        && let Some(store) = open_persistent(db_path)?
    {
        return Ok(store);
    }
    if let Some(dir) = &config.store_dir {
        return Ok(Box::new(JsonFileCartStore::new(dir)));
    }
    Ok(Box::new(InMemoryCartStore::new()))
}

#[cfg(feature = "storage-rocksdb")]
fn open_persistent(path: &Path) -> CartResult<Option<CartStoreBox>> {
    use biomarker_cart::infrastructure::rocksdb::RocksDbCartStore;
    Ok(Some(Box::new(RocksDbCartStore::open(path)?)))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_persistent(path: &Path) -> CartResult<Option<CartStoreBox>> {
    tracing::warn!(
        path = %path.display(),
        "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back"
    );
    Ok(None)
}

/// Reads a JSON cart (storefront format) or a CSV cart, by file extension.
fn read_cart_file(path: &Path) -> CartResult<Vec<CartEntry>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let content = std::fs::read_to_string(path)?;
        return cart::parse_entries(&content);
    }

    let file = File::open(path)?;
    let mut entries = Vec::new();
    for (idx, result) in CartReader::new(file).entries().enumerate() {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::error!(row = idx + 1, error = %e, "error reading cart entry"),
        }
    }
    Ok(entries)
}

fn write_calculation<W: Write>(
    out: &mut W,
    calculation: &CartCalculation,
    format: OutputFormat,
) -> CartResult<()> {
    tracing::info!(
        packages = calculation.prices.len(),
        total = %calculation.total,
        deductions = %calculation.deductions,
        "cart priced"
    );
    match format {
        OutputFormat::Json => write_json(out, calculation),
        OutputFormat::Csv => PriceWriter::new(out).write_calculation(calculation),
    }
}

fn write_catalog<W: Write>(out: &mut W, catalog: &Catalog, format: OutputFormat) -> CartResult<()> {
    match format {
        OutputFormat::Json => write_json(out, &catalog.packages().collect::<Vec<_>>()),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for package in catalog.packages() {
                writer.serialize(CatalogRow {
                    sku: &package.sku,
                    name: &package.name,
                    base_price: package.base_price.value(),
                    biomarkers: package.biomarker_count(),
                })?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> CartResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
