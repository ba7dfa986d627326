mod cli;

use anyhow::{Context, Result, bail};
use box_printer::{DryRunEngine, LabelEngine};
use box_station::data_transfer::{export_products, export_records, import_products};
use box_station::db::repository::{print_record, product, settings};
use box_station::printing::format_box_id;
use box_station::{
    BatchCollector, CollectorEvent, DbService, PrintOutcome, PrintRequest, PrintSessionError,
    PrintStation, SerialBatch, StationConfig, init_logger_with_file,
};
use chrono::NaiveDate;
use clap::Parser;
use cli::{Cli, Commands, PrintArgs, ProductArgs, ProductCommands, RecordArgs, SettingsCommands};
use shared::models::{Product, ProductInput, RecordFilter};
use shared::util::today_local;
use sqlx::SqlitePool;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 环境变量 (.env)
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // 2. 日志
    let _log_guard = init_logger_with_file(Some(&cli.log_level), cli.log_dir.as_deref());

    // 3. 配置 + 数据库
    let config = StationConfig::load(&cli.config);
    let db = DbService::new(&config.database_path())
        .await
        .with_context(|| format!("opening database {}", config.database_path().display()))?;

    let result = run(&cli, &config, &db).await;
    db.close().await;
    result
}

async fn run(cli: &Cli, config: &StationConfig, db: &DbService) -> Result<()> {
    match &cli.command {
        Commands::Products(cmd) => products(cmd, config, &db.pool).await,
        Commands::Print(args) => print(cli.dry_run, args, config, db).await,
        Commands::Records(args) => records(args, &db.pool).await,
        Commands::Settings(cmd) => station_settings(cmd, &db.pool).await,
    }
}

// ========== products ==========

async fn products(cmd: &ProductCommands, config: &StationConfig, pool: &SqlitePool) -> Result<()> {
    match cmd {
        ProductCommands::List { barcode } => {
            let list = match barcode {
                Some(fragment) => product::search_by_barcode(pool, fragment).await?,
                None => product::list(pool).await?,
            };
            for p in &list {
                print_product(p);
            }
            println!("{} product(s)", list.len());
        }
        ProductCommands::Add(args) => {
            let saved = product::upsert(pool, &product_input(args)).await?;
            print_product(&saved);
        }
        ProductCommands::Import { path } => {
            let rows = import_products(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let summary = product::upsert_bulk(pool, &rows).await?;
            println!("导入完成: {} upserted, {} skipped", summary.upserted, summary.skipped);
        }
        ProductCommands::Export { path } => {
            let list = product::list(pool).await?;
            export_products(path, &list).with_context(|| format!("writing {}", path.display()))?;
            println!("导出完成: {} product(s) -> {}", list.len(), path.display());
        }
        ProductCommands::SyncConfig => {
            let summary = product::upsert_bulk(pool, &config.products).await?;
            println!(
                "Config products synced: {} upserted, {} skipped",
                summary.upserted, summary.skipped
            );
        }
    }
    Ok(())
}

fn product_input(args: &ProductArgs) -> ProductInput {
    ProductInput {
        name: args.name.clone(),
        spec: args.spec.clone(),
        model: args.model.clone(),
        color: args.color.clone(),
        sku: args.sku.clone(),
        barcode: args.barcode.clone(),
        case_quantity: args.quantity,
        weight: args.weight,
        template: args.template.clone(),
    }
}

fn print_product(p: &Product) {
    println!(
        "{:>4}  {}  {} {} {}  SKU={}  69={}  qty={}  weight={}  template={}",
        p.id, p.name, p.spec, p.model, p.color, p.sku, p.barcode, p.case_quantity, p.weight, p.template
    );
}

// ========== print ==========

async fn print(dry_run: bool, args: &PrintArgs, config: &StationConfig, db: &DbService) -> Result<()> {
    #[cfg(windows)]
    if !dry_run {
        let engine = box_printer::BarTenderEngine::new();
        return print_with(engine, false, args, config, db).await;
    }

    #[cfg(not(windows))]
    if !dry_run {
        bail!("BarTender automation is only available on Windows, use --dry-run to preview");
    }

    // dry run: nothing is printed, numbered or recorded
    let engine = DryRunEngine::new();
    print_with(engine, true, args, config, db).await
}

async fn print_with<E>(
    engine: E,
    preview: bool,
    args: &PrintArgs,
    config: &StationConfig,
    db: &DbService,
) -> Result<()>
where
    E: LabelEngine + 'static,
{
    let station =
        PrintStation::new(db.pool.clone(), engine, config.print_settings()).with_preview(preview);
    let selected = select_product(args, &db.pool).await?;
    let date = args.date.unwrap_or_else(today_local);

    println!(
        "Product: {} (qty {}, template {}), production date {}",
        selected.name, selected.case_quantity, selected.template, date
    );

    match &args.serials {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let request = PrintRequest {
                product: Some(selected),
                production_date: date,
                serials: SerialBatch::parse(&text),
            };
            let outcome = station.print_box(request).await?;
            report(&outcome);
            Ok(())
        }
        None => scan_loop(&station, &selected, date).await,
    }
}

async fn select_product(args: &PrintArgs, pool: &SqlitePool) -> Result<Product> {
    if let Some(name) = &args.product {
        return product::find_by_name(pool, name)
            .await?
            .with_context(|| format!("product '{name}' not found"));
    }
    let fragment = args.barcode.as_deref().unwrap_or_default();
    let mut found = product::search_by_barcode(pool, fragment).await?;
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => bail!("no product matches 69 code '{fragment}'"),
        n => bail!("{n} products match 69 code '{fragment}', use --product"),
    }
}

/// Interactive scanning: one serial per line, prints as soon as a box is full
async fn scan_loop<E>(station: &PrintStation<E>, selected: &Product, date: NaiveDate) -> Result<()>
where
    E: LabelEngine + 'static,
{
    let mut collector = BatchCollector::new();
    collector.set_target(usize::try_from(selected.case_quantity).ok());
    println!("Scan serials (empty input or Ctrl-D to finish, ':clear' to reset the box)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == ":clear" {
            collector.clear();
            println!("Batch cleared");
            continue;
        }
        if line.is_empty() && collector.is_empty() {
            break;
        }

        match collector.push_line(line) {
            CollectorEvent::Pending { have, need } => {
                if let Some(need) = need {
                    println!("  {have}/{need}");
                }
            }
            CollectorEvent::Ready(_) => {
                match station.print_collected(Some(selected), date, &mut collector).await {
                    Ok(outcome) => report(&outcome),
                    Err(e) => {
                        eprintln!("打印失败: {e}");
                        if settle_failed_batch(&mut collector, &e) {
                            eprintln!("The label may already be printed, check it before rescanning");
                            println!("Batch cleared, rescan the box");
                        } else {
                            println!("Batch kept: Enter to retry, ':clear' to rescan");
                        }
                    }
                }
            }
            CollectorEvent::Overflow { have, need } => {
                eprintln!("Too many serials ({have}/{need}), batch cleared");
                collector.clear();
            }
        }
    }

    if !collector.is_empty() {
        println!("{} serial(s) left unprinted", collector.len());
    }
    Ok(())
}

/// A label that may exist forces a rescan; a rejected batch stays for
/// correction. Returns true when the batch was cleared.
fn settle_failed_batch(collector: &mut BatchCollector, err: &PrintSessionError) -> bool {
    if err.after_print() {
        collector.clear();
        true
    } else {
        false
    }
}

fn report(outcome: &PrintOutcome) {
    if !outcome.recorded {
        println!(
            "预览完成: box {} would be next ({} serials, {} on label), nothing recorded",
            outcome.box_id,
            outcome.serials.len(),
            outcome.serials_written
        );
    } else {
        println!(
            "打印完成: box {} ({} serials, {} on label)",
            outcome.box_id,
            outcome.serials.len(),
            outcome.serials_written
        );
    }
    if !outcome.skipped_fields.is_empty() {
        println!("  fields not in template: {}", outcome.skipped_fields.join(", "));
    }
}

// ========== records ==========

async fn records(args: &RecordArgs, pool: &SqlitePool) -> Result<()> {
    let mut filter = RecordFilter::default();
    if let Some(serial) = &args.serial {
        filter = filter.serial(serial.as_str());
    }
    if let Some(barcode) = &args.barcode {
        filter = filter.barcode(barcode.as_str());
    }

    let rows = print_record::query(pool, &filter).await?;
    match &args.export {
        Some(path) => {
            export_records(path, &rows).with_context(|| format!("writing {}", path.display()))?;
            println!("导出完成: {} record(s) -> {}", rows.len(), path.display());
        }
        None => {
            for r in &rows {
                println!(
                    "{}  {}  {}  {}  {}  {}  {}  {}",
                    r.serial_number,
                    r.box_id,
                    r.production_date,
                    r.printed_at,
                    r.product_name,
                    r.spec,
                    r.barcode,
                    r.sku
                );
            }
            println!("{} record(s)", rows.len());
        }
    }
    Ok(())
}

// ========== settings ==========

async fn station_settings(cmd: &SettingsCommands, pool: &SqlitePool) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            let rule = settings::box_rule(pool).await?;
            let current = settings::current_sequence(pool).await?;
            println!("Box rule:      {rule}");
            println!("Box counter:   {current}");
            println!("Next box id:   {}", format_box_id(&rule, today_local(), current + 1));
        }
        SettingsCommands::SetRule { rule } => {
            settings::set_box_rule(pool, rule).await?;
            println!("Box rule set to {}", rule.trim());
        }
    }
    Ok(())
}
