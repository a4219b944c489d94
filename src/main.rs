use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lumen::application::Lumen;
use lumen::domain::{ImageRequest, ImageState};
use lumen::infrastructure::config::{
    ClearArgs, CliArgs, Command, LoadArgs, LumenConfig, StorageManager,
};
use lumen::infrastructure::image::{ResizeTransformer, RoundedCornersTransformer};

fn init_logging(config: &LumenConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<LumenConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage
        .load_config(args.config.as_deref())
        .wrap_err("failed to load configuration")?;
    config.merge_with_args(args);
    Ok(config)
}

async fn run_load(lumen: &Lumen, args: LoadArgs) -> Result<()> {
    let mut request = ImageRequest::new(args.source);
    if let Some(bounds) = args.resize {
        request = request.with_transformer(Arc::new(ResizeTransformer::new(
            bounds.width,
            bounds.height,
        )));
    }
    if let Some(radius) = args.rounded {
        request = request.with_transformer(Arc::new(RoundedCornersTransformer::new(radius)));
    }
    println!("key: {}", request.full_key());

    let started = Instant::now();
    let mut load = lumen.load(request);
    while let Some(state) = load.next_state().await {
        match state {
            ImageState::Loading => println!("loading..."),
            ImageState::Success(loaded) => {
                println!(
                    "loaded {}x{} from {} in {:.1?}",
                    loaded.image.width(),
                    loaded.image.height(),
                    loaded.origin,
                    started.elapsed()
                );
                if let Some(path) = &args.output {
                    loaded
                        .image
                        .save(path)
                        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                    println!("wrote {}", path.display());
                }
            }
            ImageState::Fallback(reason) => println!("no image available: {reason}"),
            ImageState::Error(e) => {
                lumen.flush().await;
                return Err(eyre!("load failed ({}): {e}", e.category()));
            }
        }
    }

    lumen.flush().await;
    Ok(())
}

async fn run_info(lumen: &Lumen, config: &LumenConfig) {
    let memory = lumen.memory_cache();
    let disk = lumen.disk_cache();

    if let Some(path) = config.effective_config_path() {
        println!("config:       {}", path.display());
    }
    println!(
        "memory cache: {} images, {}/{} bytes",
        memory.len(),
        memory.size(),
        memory.max_size()
    );
    println!(
        "disk cache:   {} ({}/{} bytes)",
        config.effective_disk_cache_dir().display(),
        disk.size().await,
        disk.max_size()
    );
}

async fn run_clear(lumen: &Lumen, args: &ClearArgs) -> Result<()> {
    match (args.memory, args.disk) {
        (true, false) => lumen.clear_memory_cache().await,
        (false, true) => lumen.clear_disk_cache().await?,
        _ => lumen.clear_cache().await?,
    }
    println!("cache cleared");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = lumen::VERSION, "Starting lumen");

    let lumen = Lumen::get_default(&config)
        .await
        .wrap_err("failed to initialize image loader")?;

    match args.command {
        Command::Load(load) => run_load(&lumen, load).await,
        Command::Info => {
            run_info(&lumen, &config).await;
            Ok(())
        }
        Command::Clear(clear) => run_clear(&lumen, &clear).await,
    }
}
