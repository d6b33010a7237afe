use clap::Parser;
use delivery_dispatch::adapters::roster::{load_roster, random_couriers};
use delivery_dispatch::app::commands::CreateOrderCommand;
use delivery_dispatch::config::LogFormat;
use delivery_dispatch::utils::error::ErrorSeverity;
use delivery_dispatch::utils::{logger, validation::Validate};
use delivery_dispatch::{CliConfig, DispatchConfig, DispatchEngine, DispatchError, InMemoryStore, StaticGeocoder};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match DispatchConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(max_ticks) = args.max_ticks {
        config.scheduler.max_ticks = max_ticks;
        tracing::info!("🔧 Max ticks overridden to: {}", max_ticks);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No cycles will run");
        return Ok(());
    }

    match run(&config, args.json).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!(
                "❌ Dispatch run failed: {} (Kind: {:?}, Severity: {:?})",
                e,
                e.kind(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

async fn run(config: &DispatchConfig, print_json: bool) -> Result<(), DispatchError> {
    let cancel = CancellationToken::new();
    let store = InMemoryStore::new();
    let geocoder = StaticGeocoder::new(config.geocoder.fallback).with_streets(&config.geocoder.streets);
    let engine = DispatchEngine::new(store.clone(), geocoder);

    // 快遞員：名單檔 + 隨機產生
    let mut couriers = match &config.couriers.roster_path {
        Some(path) => load_roster(path)?,
        None => Vec::new(),
    };
    if config.couriers.random_count > 0 {
        let mut rng = match config.couriers.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        couriers.extend(random_couriers(config.couriers.random_count, &mut rng)?);
    }
    engine.seed_couriers(couriers, &cancel).await?;

    for order in &config.orders {
        let basket_id = order.basket_id.unwrap_or_else(Uuid::new_v4);
        let command = CreateOrderCommand::new(basket_id, order.street.as_str())?;
        engine.create_order(command, &cancel).await?;
    }

    // Ctrl-C 取消排程
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let summary = engine.run(&config.scheduler, &cancel).await;

    if print_json {
        let snapshot = json!({
            "service": config.service.name,
            "summary": summary,
            "active_orders": engine.active_orders().await?,
            "busy_couriers": engine.busy_couriers().await?,
        });
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("✅ Dispatch run finished");
        println!(
            "📦 {} assigned, {} delivered in {} ticks",
            summary.orders_assigned, summary.orders_delivered, summary.movement_ticks
        );
        let remaining = engine.active_orders().await?;
        if !remaining.is_empty() {
            println!("⏳ {} orders still active", remaining.len());
        }
    }

    Ok(())
}

fn display_config_summary(config: &DispatchConfig) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("   Service: {}", config.service.name);
    tracing::info!(
        "   Scheduler: assign {}ms, move {}ms, max {} ticks, stop when idle: {}",
        config.scheduler.assign_interval_ms,
        config.scheduler.move_interval_ms,
        config.scheduler.max_ticks,
        config.scheduler.stop_when_idle
    );
    if let Some(path) = &config.couriers.roster_path {
        tracing::info!("   Roster: {}", path);
    }
    tracing::info!("   Random couriers: {}", config.couriers.random_count);
    tracing::info!(
        "   Geocoder: {} streets, fallback {}",
        config.geocoder.streets.len(),
        config.geocoder.fallback
    );
    tracing::info!("   Orders to create: {}", config.orders.len());
}

