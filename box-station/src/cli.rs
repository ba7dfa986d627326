use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "box-station",
    version,
    about = "OuterBox carton label station",
    long_about = "Manage the product catalog, print carton labels for scanned serials and query the print ledger"
)]
pub struct Cli {
    /// Station config file (JSON)
    #[arg(long, global = true, env = "OUTERBOX_CONFIG", default_value = box_station::core::CONFIG_FILE)]
    pub config: PathBuf,

    /// Preview through the in-memory engine: nothing is numbered or recorded
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, env = "OUTERBOX_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Also write daily log files into this directory
    #[arg(long, global = true, env = "OUTERBOX_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Product catalog operations
    #[command(subcommand)]
    Products(ProductCommands),

    /// Print one box label per collected batch
    Print(PrintArgs),

    /// Query the print ledger
    Records(RecordArgs),

    /// Box numbering settings
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products, optionally filtered by a 69-code fragment
    List {
        #[arg(long)]
        barcode: Option<String>,
    },
    /// Add or replace one product (matched by name)
    Add(ProductArgs),
    /// Upsert products from an xlsx file (first row is the header)
    Import { path: PathBuf },
    /// Write the catalog to an xlsx file
    Export { path: PathBuf },
    /// Upsert the products listed in the config file
    SyncConfig,
}

#[derive(Args, Debug)]
pub struct ProductArgs {
    pub name: String,
    #[arg(long, default_value = "")]
    pub spec: String,
    #[arg(long, default_value = "")]
    pub model: String,
    #[arg(long, default_value = "")]
    pub color: String,
    #[arg(long, default_value = "")]
    pub sku: String,
    /// 69 码
    #[arg(long, default_value = "")]
    pub barcode: String,
    /// Serials per box
    #[arg(long)]
    pub quantity: i64,
    #[arg(long, default_value_t = 0.0)]
    pub weight: f64,
    /// Template name under the template directory
    #[arg(long)]
    pub template: String,
}

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Product name
    #[arg(long, conflicts_with = "barcode", required_unless_present = "barcode")]
    pub product: Option<String>,

    /// 69-code fragment; must match exactly one product
    #[arg(long)]
    pub barcode: Option<String>,

    /// Production date (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Read one batch from a file (one serial per line) instead of scanning
    #[arg(long)]
    pub serials: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Serial number fragment
    #[arg(long)]
    pub serial: Option<String>,

    /// 69-code fragment
    #[arg(long)]
    pub barcode: Option<String>,

    /// Write the result to an xlsx file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show the box rule, counter and the next box number
    Show,
    /// Replace the box rule, e.g. "BOX-{YYYY}{MM}{DD}-{SEQ:0000}"
    SetRule { rule: String },
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    shared::util::parse_date(s).ok_or_else(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}
