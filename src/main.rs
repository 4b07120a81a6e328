mod cli;
mod config;
mod ui;

use std::env;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use brigade::log::read_log;
use brigade::menu::{self, DISHES};
use brigade::order::load_orders;
use brigade::{Kitchen, WorkItem};
use cli::{Cli, Command};
use config::KitchenConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_tracing(verbose);

    let mut config = KitchenConfig::load()?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(path) = cli.log_file {
        config.log_path = path;
    }

    match cli.command {
        Command::Run {
            orders,
            orders_file,
            prep_ms,
            jitter_ms,
            format,
            seed,
        } => {
            if let Some(ms) = prep_ms {
                config.prep_time_ms = ms;
            }
            if let Some(ms) = jitter_ms {
                config.prep_jitter_ms = ms;
            }
            if let Some(format) = format {
                config.log_format = format.into();
            }
            let batch = match orders_file {
                Some(path) => load_orders(&path)
                    .with_context(|| format!("failed to load orders from {}", path.display()))?,
                None => generate_orders(&config, orders, seed)?,
            };
            run_service(&config, batch, verbose)
        }
        Command::Show { path } => {
            let path = path.unwrap_or_else(|| config.log_path.clone());
            show_log(&path)
        }
        Command::Menu => {
            for (i, dish) in DISHES.iter().enumerate() {
                println!("{:>2}. {dish}", i + 1);
            }
            Ok(())
        }
    }
}

fn generate_orders(
    config: &KitchenConfig,
    count: Option<usize>,
    seed: Option<u64>,
) -> Result<Vec<WorkItem>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let count = count
        .unwrap_or_else(|| menu::random_order_count(&mut rng, config.min_orders, config.max_orders));
    Ok(menu::random_orders(&mut rng, count)?)
}

fn run_service(config: &KitchenConfig, batch: Vec<WorkItem>, verbose: bool) -> Result<()> {
    if config.workers == 0 {
        bail!("at least one cook is required");
    }
    info!(
        orders = batch.len(),
        workers = config.workers,
        log = %config.log_path.display(),
        "preparing service"
    );

    ui::print_queue(&batch);

    let mut kitchen = Kitchen::open(&config.log_path, config.log_format)
        .with_context(|| format!("failed to open log {}", config.log_path.display()))?
        .with_prep_time(config.prep_time())
        .with_observer(ui::ConsoleObserver::new());
    for order in batch {
        kitchen.add_work(order)?;
    }

    let summary = kitchen.start(config.workers).context("kitchen service aborted")?;
    println!("Todos los pedidos han sido procesados.");
    println!("Log: {}", config.log_path.display());
    if verbose {
        ui::print_summary(&summary);
    }
    Ok(())
}

fn show_log(path: &Path) -> Result<()> {
    let parsed = read_log(path).with_context(|| format!("failed to read {}", path.display()))?;
    ui::print_parsed_log(&parsed);
    if !parsed.is_complete() {
        bail!("log {} is incomplete or inconsistent", path.display());
    }
    info!(records = parsed.records.len(), format = %parsed.format, "log verified");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BRIGADE_TRACE").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "brigade=debug,info"
        } else {
            "brigade=warn,warn"
        })
    });

    let format = env::var("BRIGADE_TRACE_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
