//! FreightQuote Demo
//!
//! Prices one shipment from the command line and prints the itemized
//! breakdown in the requested display currency.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freightquote_common::{Currency, Money};
use freightquote_fx::{
    HttpRateProvider, JsonFileRateStore, MemoryRateStore, RateCache, RateCacheConfig, RateStore,
};
use freightquote_quoting::{
    format_money, ContainerKind, Incoterm, Locale, QuoteEngine, ShipmentInput, ShipmentMode,
    Tariff,
};

/// FreightQuote quoting CLI
#[derive(Parser, Debug)]
#[command(name = "quote")]
#[command(about = "Price a shipment and display the quote")]
struct Args {
    /// Freight mode: FCL, LCL or BreakBulk
    #[arg(short, long, default_value = "LCL")]
    mode: String,

    /// Container kind (FCL only): 20ft-standard, 40ft-standard, 40ft-high-cube
    #[arg(long)]
    container_kind: Option<String>,

    /// Number of containers (FCL only)
    #[arg(long)]
    containers: Option<u32>,

    /// Gross weight in kilograms
    #[arg(short, long, default_value = "1000")]
    weight_kg: Decimal,

    /// Volume in cubic meters
    #[arg(short, long, default_value = "5")]
    volume_cbm: Decimal,

    /// Incoterm: FOB, CIF, CFR, DAP or DDP
    #[arg(short, long, default_value = "FOB")]
    incoterm: String,

    /// Declared cargo value; enables insurance
    #[arg(long)]
    declared_value: Option<Decimal>,

    /// Display currency for the quote
    #[arg(short, long, default_value = "USD")]
    currency: String,

    /// FX provider base URL
    #[arg(long, default_value = "https://api.exchangerate.host")]
    provider_url: url::Url,

    /// Directory for the on-disk rate cache (in-memory when omitted)
    #[arg(long)]
    cache_dir: Option<std::path::PathBuf>,

    /// Serve stale rates if the provider is down
    #[arg(long)]
    best_effort: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let input = shipment_from(&args)?;
    let display_currency = Currency::new(&args.currency);

    let store: Arc<dyn RateStore> = match &args.cache_dir {
        Some(dir) => Arc::new(JsonFileRateStore::new(dir).context("opening rate cache")?),
        None => Arc::new(MemoryRateStore::new()),
    };
    let provider = Arc::new(HttpRateProvider::new(args.provider_url.clone()));
    let cache = RateCache::with_config(
        provider,
        store,
        RateCacheConfig {
            allow_stale_fallback: args.best_effort,
            ..Default::default()
        },
    );

    let engine = QuoteEngine::new(Arc::new(cache), Tariff::default(), Currency::usd());

    info!(mode = %input.mode, currency = %display_currency, "Pricing shipment");
    let breakdown = engine.quote(&input, &display_currency).await?;

    for (name, amount) in breakdown.line_items() {
        let money = Money::new(amount, breakdown.currency.clone());
        println!("{:<22} {}", name, format_money(&money, Locale::EnUs));
    }
    println!(
        "{:<22} {}",
        "total",
        format_money(&breakdown.total_money(), Locale::EnUs)
    );

    Ok(())
}

fn shipment_from(args: &Args) -> anyhow::Result<ShipmentInput> {
    let mode = match args.mode.to_uppercase().as_str() {
        "FCL" => ShipmentMode::Fcl,
        "LCL" => ShipmentMode::Lcl,
        "BREAKBULK" => ShipmentMode::BreakBulk,
        other => return Err(anyhow!("unknown mode: {other}")),
    };

    let container_kind = match args.container_kind.as_deref() {
        None => None,
        Some("20ft-standard") => Some(ContainerKind::TwentyFtStandard),
        Some("40ft-standard") => Some(ContainerKind::FortyFtStandard),
        Some("40ft-high-cube") => Some(ContainerKind::FortyFtHighCube),
        Some(other) => return Err(anyhow!("unknown container kind: {other}")),
    };

    let incoterm = match args.incoterm.to_uppercase().as_str() {
        "FOB" => Incoterm::Fob,
        "CIF" => Incoterm::Cif,
        "CFR" => Incoterm::Cfr,
        "DAP" => Incoterm::Dap,
        "DDP" => Incoterm::Ddp,
        other => return Err(anyhow!("unknown incoterm: {other}")),
    };

    let input = ShipmentInput {
        mode,
        container_kind,
        container_count: args.containers,
        weight_kg: args.weight_kg,
        volume_cbm: args.volume_cbm,
        incoterm,
        insured: args.declared_value.is_some(),
        declared_value: args.declared_value,
    };
    input.validate()?;
    Ok(input)
}
